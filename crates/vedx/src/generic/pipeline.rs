use std::{fmt, sync::Arc};

use crate::traits::Backend;

use super::{
    pipeline_layout::check_program, Device, Error, InputAssembler, PipelineKind, PipelineLayout,
    PixelFormat, ShaderModule, ShaderProgram, ShaderStage,
};

/// Maximum number of color targets of a render pipeline.
pub const MAX_COLOR_TARGETS: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    #[default]
    Solid,
    Wireframe,
    Point,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CullMode {
    FrontFaces,
    #[default]
    BackFaces,
    Both,
    Disabled,
}

/// Winding order of front faces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CullOrder {
    ClockWise,
    #[default]
    CounterClockWise,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rasterizer {
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullMode,
    pub cull_order: CullOrder,
    pub line_width: f32,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Rasterizer {
            polygon_mode: PolygonMode::Solid,
            cull_mode: CullMode::BackFaces,
            cull_order: CullOrder::CounterClockWise,
            line_width: 1.0,
        }
    }
}

pub struct ComputePipelineDesc<'a, B: Backend> {
    pub name: &'a str,
    pub layout: &'a PipelineLayout<B>,
    pub module: &'a ShaderModule<B>,
}

pub struct RenderPipelineDesc<'a, B: Backend> {
    pub name: &'a str,
    pub layout: &'a PipelineLayout<B>,
    pub program: &'a ShaderProgram<B>,
    pub input_assembler: &'a InputAssembler,
    pub rasterizer: &'a Rasterizer,
    pub color_formats: &'a [PixelFormat],
    pub depth_format: Option<PixelFormat>,
}

fn resolve_layout<B: Backend>(
    layout: Option<Arc<PipelineLayout<B>>>,
    kind: PipelineKind,
    name: &str,
) -> Result<Arc<PipelineLayout<B>>, Error> {
    let Some(layout) = layout else {
        return Err(Error::not_initialized(
            "layout",
            format!("{kind} pipeline `{name}` requires a pipeline layout"),
        ));
    };

    if layout.kind() != kind {
        return Err(Error::invalid(
            "layout",
            format!(
                "{kind} pipeline `{name}` cannot use a {} pipeline layout",
                layout.kind()
            ),
        ));
    }

    Ok(layout)
}

pub struct ComputePipeline<B: Backend> {
    native: B::ComputePipeline,
    name: String,
    layout: Arc<PipelineLayout<B>>,
    program: Arc<ShaderProgram<B>>,
}

impl<B: Backend> fmt::Debug for ComputePipeline<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputePipeline")
            .field("name", &self.name)
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> ComputePipeline<B> {
    pub fn builder(device: &Device<B>, name: &str) -> ComputePipelineBuilder<B> {
        ComputePipelineBuilder {
            device: device.clone(),
            name: name.to_owned(),
            layout: None,
            program: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn layout(&self) -> &Arc<PipelineLayout<B>> {
        &self.layout
    }

    #[inline]
    pub fn program(&self) -> &Arc<ShaderProgram<B>> {
        &self.program
    }

    #[inline]
    pub fn native(&self) -> &B::ComputePipeline {
        &self.native
    }
}

pub struct ComputePipelineBuilder<B: Backend> {
    device: Device<B>,
    name: String,
    layout: Option<Arc<PipelineLayout<B>>>,
    program: Option<Arc<ShaderProgram<B>>>,
}

impl<B: Backend> ComputePipelineBuilder<B> {
    pub fn layout(mut self, layout: Arc<PipelineLayout<B>>) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Overrides program of the layout.
    pub fn program(mut self, program: Arc<ShaderProgram<B>>) -> Self {
        self.program = Some(program);
        self
    }

    pub fn build(self) -> Result<ComputePipeline<B>, Error> {
        let layout = resolve_layout(self.layout, PipelineKind::Compute, &self.name)?;
        let program = self
            .program
            .unwrap_or_else(|| layout.program().clone());

        check_program(PipelineKind::Compute, &program)?;
        let Some(module) = program.module(ShaderStage::Compute) else {
            return Err(Error::invalid(
                "program",
                "compute pipeline requires a compute shader module",
            ));
        };

        let native = B::create_compute_pipeline(
            &self.device,
            &ComputePipelineDesc {
                name: &self.name,
                layout: &layout,
                module,
            },
        )?;

        self.device.diagnostics().trace(
            "pipeline",
            format_args!("created compute pipeline `{}`", self.name),
        );

        Ok(ComputePipeline {
            native,
            name: self.name,
            layout,
            program,
        })
    }
}

pub struct RenderPipeline<B: Backend> {
    native: B::RenderPipeline,
    name: String,
    layout: Arc<PipelineLayout<B>>,
    program: Arc<ShaderProgram<B>>,
    input_assembler: Arc<InputAssembler>,
    rasterizer: Rasterizer,
    color_formats: Vec<PixelFormat>,
    depth_format: Option<PixelFormat>,
}

impl<B: Backend> fmt::Debug for RenderPipeline<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("name", &self.name)
            .field("program", &self.program)
            .field("input_assembler", &self.input_assembler)
            .field("rasterizer", &self.rasterizer)
            .field("color_formats", &self.color_formats)
            .field("depth_format", &self.depth_format)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> RenderPipeline<B> {
    pub fn builder(device: &Device<B>, name: &str) -> RenderPipelineBuilder<B> {
        RenderPipelineBuilder {
            device: device.clone(),
            name: name.to_owned(),
            layout: None,
            program: None,
            input_assembler: None,
            rasterizer: Rasterizer::default(),
            color_formats: Vec::new(),
            depth_format: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn layout(&self) -> &Arc<PipelineLayout<B>> {
        &self.layout
    }

    #[inline]
    pub fn program(&self) -> &Arc<ShaderProgram<B>> {
        &self.program
    }

    #[inline]
    pub fn input_assembler(&self) -> &Arc<InputAssembler> {
        &self.input_assembler
    }

    #[inline]
    pub fn rasterizer(&self) -> &Rasterizer {
        &self.rasterizer
    }

    #[inline]
    pub fn color_formats(&self) -> &[PixelFormat] {
        &self.color_formats
    }

    #[inline]
    pub fn depth_format(&self) -> Option<PixelFormat> {
        self.depth_format
    }

    #[inline]
    pub fn native(&self) -> &B::RenderPipeline {
        &self.native
    }
}

pub struct RenderPipelineBuilder<B: Backend> {
    device: Device<B>,
    name: String,
    layout: Option<Arc<PipelineLayout<B>>>,
    program: Option<Arc<ShaderProgram<B>>>,
    input_assembler: Option<Arc<InputAssembler>>,
    rasterizer: Rasterizer,
    color_formats: Vec<PixelFormat>,
    depth_format: Option<PixelFormat>,
}

impl<B: Backend> RenderPipelineBuilder<B> {
    pub fn layout(mut self, layout: Arc<PipelineLayout<B>>) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Overrides program of the layout.
    pub fn program(mut self, program: Arc<ShaderProgram<B>>) -> Self {
        self.program = Some(program);
        self
    }

    pub fn input_assembler(mut self, input_assembler: Arc<InputAssembler>) -> Self {
        self.input_assembler = Some(input_assembler);
        self
    }

    pub fn rasterizer(mut self, rasterizer: Rasterizer) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn color_target(mut self, format: PixelFormat) -> Self {
        self.color_formats.push(format);
        self
    }

    pub fn depth_target(mut self, format: PixelFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    pub fn build(self) -> Result<RenderPipeline<B>, Error> {
        let layout = resolve_layout(self.layout, PipelineKind::Render, &self.name)?;
        let program = self
            .program
            .unwrap_or_else(|| layout.program().clone());
        check_program(PipelineKind::Render, &program)?;

        let Some(input_assembler) = self.input_assembler else {
            return Err(Error::not_initialized(
                "input_assembler",
                format!("render pipeline `{}` requires an input assembler", self.name),
            ));
        };

        if self.color_formats.len() > MAX_COLOR_TARGETS {
            return Err(Error::invalid(
                "color_formats",
                format!(
                    "render pipeline `{}` has {} color targets, at most {MAX_COLOR_TARGETS} are supported",
                    self.name,
                    self.color_formats.len()
                ),
            ));
        }

        if let Some(format) = self.color_formats.iter().find(|f| !f.is_color()) {
            return Err(Error::invalid(
                "color_formats",
                format!("{format:?} cannot be used as a color target"),
            ));
        }

        if let Some(format) = self.depth_format.filter(|f| !f.is_depth()) {
            return Err(Error::invalid(
                "depth_format",
                format!("{format:?} cannot be used as a depth target"),
            ));
        }

        if !(self.rasterizer.line_width > 0.0) {
            return Err(Error::invalid(
                "rasterizer",
                format!("line width {} must be positive", self.rasterizer.line_width),
            ));
        }

        let native = B::create_render_pipeline(
            &self.device,
            &RenderPipelineDesc {
                name: &self.name,
                layout: &layout,
                program: &program,
                input_assembler: &input_assembler,
                rasterizer: &self.rasterizer,
                color_formats: &self.color_formats,
                depth_format: self.depth_format,
            },
        )?;

        self.device.diagnostics().trace(
            "pipeline",
            format_args!(
                "created render pipeline `{}` with {} shader modules",
                self.name,
                program.modules().len()
            ),
        );

        Ok(RenderPipeline {
            native,
            name: self.name,
            layout,
            program,
            input_assembler,
            rasterizer: self.rasterizer,
            color_formats: self.color_formats,
            depth_format: self.depth_format,
        })
    }
}
