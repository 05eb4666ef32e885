use std::{fmt, sync::Arc};

use hashbrown::HashMap;

use crate::traits::Backend;

use super::{
    DescriptorLayout, DescriptorSetLayout, DescriptorSetLayoutDesc, DescriptorType, Device, Error,
    PushConstantsLayout, PushConstantsRange, ShaderProgram, ShaderStage, ShaderStages,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Render,
    Compute,
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineKind::Render => write!(f, "render"),
            PipelineKind::Compute => write!(f, "compute"),
        }
    }
}

/// Native slots assigned to logical bindings when pipeline layout is created.
///
/// For root signatures these are root parameter indices.
/// For Vulkan pipeline layouts these are set indices and push constant range indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NativeBindingTable {
    push_constants: HashMap<ShaderStage, u32>,
    descriptor_sets: HashMap<u32, u32>,
}

impl NativeBindingTable {
    pub fn new() -> Self {
        NativeBindingTable::default()
    }

    pub fn insert_push_constants(&mut self, stage: ShaderStage, index: u32) {
        self.push_constants.insert(stage, index);
    }

    pub fn insert_descriptor_set(&mut self, space: u32, index: u32) {
        self.descriptor_sets.insert(space, index);
    }

    pub fn push_constants_index(&self, stage: ShaderStage) -> Option<u32> {
        self.push_constants.get(&stage).copied()
    }

    pub fn descriptor_set_index(&self, space: u32) -> Option<u32> {
        self.descriptor_sets.get(&space).copied()
    }
}

/// Validated pieces of a pipeline layout handed to a backend.
pub struct PipelineLayoutDesc<'a, B: Backend> {
    pub kind: PipelineKind,
    pub program: &'a ShaderProgram<B>,
    pub descriptor_sets: &'a [DescriptorSetLayout<B>],
    pub push_constants: Option<&'a PushConstantsLayout>,
}

/// Shader program, descriptor set layouts and push constants bound into one native object.
pub struct PipelineLayout<B: Backend> {
    native: B::PipelineLayout,
    bindings: NativeBindingTable,
    kind: PipelineKind,
    program: Arc<ShaderProgram<B>>,
    descriptor_sets: Vec<DescriptorSetLayout<B>>,
    push_constants: Option<PushConstantsLayout>,
}

impl<B: Backend> fmt::Debug for PipelineLayout<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineLayout")
            .field("kind", &self.kind)
            .field("program", &self.program)
            .field("descriptor_sets", &self.descriptor_sets)
            .field("push_constants", &self.push_constants)
            .field("bindings", &self.bindings)
            .finish()
    }
}

impl<B: Backend> PipelineLayout<B> {
    pub fn new(
        device: &Device<B>,
        kind: PipelineKind,
        program: Arc<ShaderProgram<B>>,
        descriptor_sets: Vec<DescriptorSetLayout<B>>,
        push_constants: Option<PushConstantsLayout>,
    ) -> Result<Self, Error> {
        check_program(kind, &program)?;

        for (idx, set) in descriptor_sets.iter().enumerate() {
            if descriptor_sets[..idx]
                .iter()
                .any(|other| other.space() == set.space())
            {
                return Err(Error::invalid(
                    "descriptor_sets",
                    format!("space {} is used by more than one descriptor set", set.space()),
                ));
            }
        }

        let (native, bindings) = B::create_pipeline_layout(
            device,
            &PipelineLayoutDesc {
                kind,
                program: &program,
                descriptor_sets: &descriptor_sets,
                push_constants: push_constants.as_ref(),
            },
        )?;

        if device.config().trace_layouts {
            device.diagnostics().trace(
                "pipeline_layout",
                format_args!(
                    "created {kind} pipeline layout with {} descriptor sets and {} push constant ranges",
                    descriptor_sets.len(),
                    push_constants.as_ref().map_or(0, |p| p.ranges().len()),
                ),
            );
        }

        Ok(PipelineLayout {
            native,
            bindings,
            kind,
            program,
            descriptor_sets,
            push_constants,
        })
    }

    /// Builder for layouts of render pipelines.
    pub fn builder(device: &Device<B>) -> PipelineLayoutBuilder<B> {
        PipelineLayoutBuilder::new(device, PipelineKind::Render)
    }

    /// Builder for layouts of compute pipelines.
    pub fn compute_builder(device: &Device<B>) -> PipelineLayoutBuilder<B> {
        PipelineLayoutBuilder::new(device, PipelineKind::Compute)
    }

    #[inline]
    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    #[inline]
    pub fn program(&self) -> &Arc<ShaderProgram<B>> {
        &self.program
    }

    #[inline]
    pub fn descriptor_sets(&self) -> &[DescriptorSetLayout<B>] {
        &self.descriptor_sets
    }

    pub fn descriptor_set(&self, space: u32) -> Result<&DescriptorSetLayout<B>, Error> {
        self.descriptor_sets
            .iter()
            .find(|set| set.space() == space)
            .ok_or_else(|| {
                Error::out_of_range(
                    "space",
                    format!("no descriptor set layout uses space {space}"),
                )
            })
    }

    #[inline]
    pub fn push_constants(&self) -> Option<&PushConstantsLayout> {
        self.push_constants.as_ref()
    }

    #[inline]
    pub fn bindings(&self) -> &NativeBindingTable {
        &self.bindings
    }

    #[inline]
    pub fn native(&self) -> &B::PipelineLayout {
        &self.native
    }
}

/// Checks that program fits the kind of pipeline.
pub(crate) fn check_program<B: Backend>(
    kind: PipelineKind,
    program: &ShaderProgram<B>,
) -> Result<(), Error> {
    match kind {
        PipelineKind::Compute => {
            if program.modules().len() != 1 {
                return Err(Error::invalid(
                    "program",
                    format!(
                        "only one shader module must be bound to a compute pipeline, got {}",
                        program.modules().len()
                    ),
                ));
            }
            if program.module(ShaderStage::Compute).is_none() {
                return Err(Error::invalid(
                    "program",
                    "compute pipeline requires a compute shader module",
                ));
            }
        }
        PipelineKind::Render => {
            if program.stages().contains(ShaderStages::COMPUTE) {
                return Err(Error::invalid(
                    "program",
                    "render pipeline cannot contain a compute shader module",
                ));
            }
            if program.module(ShaderStage::Vertex).is_none() {
                return Err(Error::invalid(
                    "program",
                    "render pipeline requires a vertex shader module",
                ));
            }
        }
    }
    Ok(())
}

pub struct PipelineLayoutBuilder<B: Backend> {
    device: Device<B>,
    kind: PipelineKind,
    program: Option<Arc<ShaderProgram<B>>>,
    descriptor_sets: Vec<DescriptorSetLayout<B>>,
    push_constants: Option<PushConstantsLayout>,
}

impl<B: Backend> PipelineLayoutBuilder<B> {
    fn new(device: &Device<B>, kind: PipelineKind) -> Self {
        PipelineLayoutBuilder {
            device: device.clone(),
            kind,
            program: None,
            descriptor_sets: Vec::new(),
            push_constants: None,
        }
    }

    pub fn program(mut self, program: Arc<ShaderProgram<B>>) -> Self {
        if self.program.replace(program).is_some() {
            self.device.diagnostics().warn(
                "pipeline_layout",
                format_args!("shader program of {} pipeline layout replaced", self.kind),
            );
        }
        self
    }

    /// Starts declaring descriptor set bound to `space`.
    pub fn descriptor_set(
        self,
        space: u32,
        stages: ShaderStages,
        pool_size: u32,
    ) -> DescriptorSetLayoutBuilder<B> {
        DescriptorSetLayoutBuilder {
            parent: self,
            space,
            stages,
            pool_size,
            descriptors: Vec::new(),
        }
    }

    /// Same as [`descriptor_set`](Self::descriptor_set) with configured default pool size.
    pub fn descriptor_set_default(
        self,
        space: u32,
        stages: ShaderStages,
    ) -> DescriptorSetLayoutBuilder<B> {
        let pool_size = self.device.config().default_pool_size;
        self.descriptor_set(space, stages, pool_size)
    }

    pub fn push_constants(self, size: u32) -> PushConstantsLayoutBuilder<B> {
        PushConstantsLayoutBuilder {
            parent: self,
            size,
            ranges: Vec::new(),
        }
    }

    pub fn build(self) -> Result<PipelineLayout<B>, Error> {
        let Some(program) = self.program else {
            return Err(Error::not_initialized(
                "program",
                format!("{} pipeline layout requires a shader program", self.kind),
            ));
        };

        PipelineLayout::new(
            &self.device,
            self.kind,
            program,
            self.descriptor_sets,
            self.push_constants,
        )
    }
}

pub struct DescriptorSetLayoutBuilder<B: Backend> {
    parent: PipelineLayoutBuilder<B>,
    space: u32,
    stages: ShaderStages,
    pool_size: u32,
    descriptors: Vec<DescriptorLayout>,
}

impl<B: Backend> DescriptorSetLayoutBuilder<B> {
    pub fn descriptor(mut self, descriptor: DescriptorLayout) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Adds array of `count` descriptors.
    pub fn array(self, ty: DescriptorType, binding: u32, element_size: usize, count: u32) -> Self {
        self.descriptor(DescriptorLayout::new(ty, binding, element_size).with_count(count))
    }

    pub fn uniform(self, binding: u32, element_size: usize) -> Self {
        self.descriptor(DescriptorLayout::new(
            DescriptorType::Uniform,
            binding,
            element_size,
        ))
    }

    pub fn storage(self, binding: u32, element_size: usize, writable: bool) -> Self {
        let ty = match writable {
            false => DescriptorType::Storage,
            true => DescriptorType::WritableStorage,
        };
        self.descriptor(DescriptorLayout::new(ty, binding, element_size))
    }

    pub fn byte_address_buffer(self, binding: u32, writable: bool) -> Self {
        let ty = match writable {
            false => DescriptorType::ByteAddressBuffer,
            true => DescriptorType::WritableByteAddressBuffer,
        };
        self.descriptor(DescriptorLayout::new(ty, binding, 4))
    }

    pub fn texel_buffer(self, binding: u32, element_size: usize, writable: bool) -> Self {
        let ty = match writable {
            false => DescriptorType::TexelBuffer,
            true => DescriptorType::WritableTexelBuffer,
        };
        self.descriptor(DescriptorLayout::new(ty, binding, element_size))
    }

    pub fn texture(self, binding: u32, writable: bool) -> Self {
        let ty = match writable {
            false => DescriptorType::Texture,
            true => DescriptorType::WritableTexture,
        };
        self.descriptor(DescriptorLayout::new(ty, binding, 0))
    }

    pub fn sampler(self, binding: u32) -> Self {
        self.descriptor(DescriptorLayout::new(DescriptorType::Sampler, binding, 0))
    }

    pub fn input_attachment(self, binding: u32) -> Self {
        self.descriptor(DescriptorLayout::new(
            DescriptorType::InputAttachment,
            binding,
            0,
        ))
    }

    pub fn acceleration_structure(self, binding: u32) -> Self {
        self.descriptor(DescriptorLayout::new(
            DescriptorType::AccelerationStructure,
            binding,
            0,
        ))
    }

    /// Validates the set, creates its native layout and returns to the layout builder.
    pub fn add(self) -> Result<PipelineLayoutBuilder<B>, Error> {
        let mut parent = self.parent;
        let desc = DescriptorSetLayoutDesc::new(
            self.space,
            self.stages,
            self.pool_size,
            self.descriptors,
        )?;
        let set = DescriptorSetLayout::new(&parent.device, desc)?;
        parent.descriptor_sets.push(set);
        Ok(parent)
    }
}

pub struct PushConstantsLayoutBuilder<B: Backend> {
    parent: PipelineLayoutBuilder<B>,
    size: u32,
    ranges: Vec<PushConstantsRange>,
}

impl<B: Backend> PushConstantsLayoutBuilder<B> {
    pub fn range(
        mut self,
        stages: ShaderStages,
        offset: u32,
        size: u32,
        space: u32,
        binding: u32,
    ) -> Result<Self, Error> {
        let range = PushConstantsRange::new(stages, offset, size, space, binding)?;
        self.ranges.push(range);
        Ok(self)
    }

    pub fn add(self) -> Result<PipelineLayoutBuilder<B>, Error> {
        let mut parent = self.parent;
        if parent.push_constants.is_some() {
            return Err(Error::invalid(
                "push_constants",
                "pipeline layout already has a push constants layout",
            ));
        }

        let layout = PushConstantsLayout::with_limit(
            parent.device.diagnostics(),
            self.size,
            self.ranges,
            parent.device.config().push_constants_portable_size,
        )?;
        parent.push_constants = Some(layout);
        Ok(parent)
    }
}
