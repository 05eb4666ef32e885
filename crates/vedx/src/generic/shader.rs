use std::{fmt, fs, io::Read, path::Path};

use crate::traits::Backend;

use super::{Device, Error};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    TessellationControl,
    TessellationEvaluation,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 6] = [
        ShaderStage::Vertex,
        ShaderStage::TessellationControl,
        ShaderStage::TessellationEvaluation,
        ShaderStage::Geometry,
        ShaderStage::Fragment,
        ShaderStage::Compute,
    ];
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::TessellationControl => write!(f, "tessellation control"),
            ShaderStage::TessellationEvaluation => write!(f, "tessellation evaluation"),
            ShaderStage::Geometry => write!(f, "geometry"),
            ShaderStage::Fragment => write!(f, "fragment"),
            ShaderStage::Compute => write!(f, "compute"),
        }
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ShaderStages : u32 {
        const VERTEX = 1 << ShaderStage::Vertex as u32;
        const TESSELLATION_CONTROL = 1 << ShaderStage::TessellationControl as u32;
        const TESSELLATION_EVALUATION = 1 << ShaderStage::TessellationEvaluation as u32;
        const GEOMETRY = 1 << ShaderStage::Geometry as u32;
        const FRAGMENT = 1 << ShaderStage::Fragment as u32;
        const COMPUTE = 1 << ShaderStage::Compute as u32;
    }
}

impl From<ShaderStage> for ShaderStages {
    #[inline]
    fn from(stage: ShaderStage) -> Self {
        ShaderStages::from_bits_retain(1 << stage as u32)
    }
}

impl ShaderStages {
    /// Returns the stage if exactly one stage bit is set.
    pub fn single(&self) -> Option<ShaderStage> {
        if !self.bits().is_power_of_two() {
            return None;
        }
        ShaderStage::ALL
            .into_iter()
            .find(|&stage| ShaderStages::from(stage) == *self)
    }

    pub fn stages(&self) -> impl Iterator<Item = ShaderStage> + '_ {
        ShaderStage::ALL
            .into_iter()
            .filter(|&stage| self.contains(stage.into()))
    }
}

/// Bytecode handed to a backend for registration.
#[derive(Clone, Copy, Debug)]
pub struct ShaderModuleDesc<'a> {
    pub stage: ShaderStage,
    pub name: &'a str,
    pub entry: &'a str,
    pub code: &'a [u8],
}

/// Bytecode of one shader stage registered with a device.
pub struct ShaderModule<B: Backend> {
    native: B::ShaderModule,
    stage: ShaderStage,
    file_name: String,
    entry_point: String,
    bytecode: Box<[u8]>,
}

impl<B: Backend> fmt::Debug for ShaderModule<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderModule")
            .field("stage", &self.stage)
            .field("file_name", &self.file_name)
            .field("entry_point", &self.entry_point)
            .field("size", &self.bytecode.len())
            .finish()
    }
}

impl<B: Backend> ShaderModule<B> {
    /// Reads bytecode from file and registers it with the device.
    pub fn from_file(
        device: &Device<B>,
        stage: ShaderStage,
        path: impl AsRef<Path>,
        entry_point: &str,
    ) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytecode = fs::read(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        ShaderModule::from_bytes(device, stage, &path.to_string_lossy(), entry_point, bytecode)
    }

    pub fn from_reader(
        device: &Device<B>,
        stage: ShaderStage,
        name: &str,
        reader: &mut impl Read,
        entry_point: &str,
    ) -> Result<Self, Error> {
        let mut bytecode = Vec::new();
        reader
            .read_to_end(&mut bytecode)
            .map_err(|source| Error::Io {
                path: name.into(),
                source,
            })?;
        ShaderModule::from_bytes(device, stage, name, entry_point, bytecode)
    }

    pub fn from_bytes(
        device: &Device<B>,
        stage: ShaderStage,
        name: &str,
        entry_point: &str,
        bytecode: impl Into<Vec<u8>>,
    ) -> Result<Self, Error> {
        let bytecode = bytecode.into().into_boxed_slice();

        if entry_point.is_empty() {
            return Err(Error::invalid(
                "entry_point",
                format!("shader module `{name}` has empty entry point"),
            ));
        }

        if bytecode.is_empty() {
            return Err(Error::invalid(
                "bytecode",
                format!("shader module `{name}` has no bytecode"),
            ));
        }

        let native = B::create_shader_module(
            device,
            &ShaderModuleDesc {
                stage,
                name,
                entry: entry_point,
                code: &bytecode,
            },
        )?;

        device.diagnostics().trace(
            "shader",
            format_args!(
                "registered {stage} shader module `{name}` (entry point `{entry_point}`, {} bytes)",
                bytecode.len()
            ),
        );

        Ok(ShaderModule {
            native,
            stage,
            file_name: name.to_owned(),
            entry_point: entry_point.to_owned(),
            bytecode,
        })
    }

    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    #[inline]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[inline]
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    #[inline]
    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    #[inline]
    pub fn native(&self) -> &B::ShaderModule {
        &self.native
    }
}

/// Ordered collection of shader modules, at most one per stage.
pub struct ShaderProgram<B: Backend> {
    modules: Vec<ShaderModule<B>>,
}

impl<B: Backend> fmt::Debug for ShaderProgram<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.modules).finish()
    }
}

impl<B: Backend> ShaderProgram<B> {
    pub fn new(modules: Vec<ShaderModule<B>>) -> Result<Self, Error> {
        if modules.is_empty() {
            return Err(Error::not_initialized(
                "modules",
                "shader program has no modules",
            ));
        }

        let mut stages = ShaderStages::empty();
        for module in &modules {
            let stage = ShaderStages::from(module.stage());
            if stages.contains(stage) {
                return Err(Error::invalid(
                    "modules",
                    format!("more than one {} shader module", module.stage()),
                ));
            }
            stages |= stage;
        }

        Ok(ShaderProgram { modules })
    }

    pub fn builder(device: &Device<B>) -> ShaderProgramBuilder<B> {
        ShaderProgramBuilder {
            device: device.clone(),
            modules: Vec::new(),
        }
    }

    #[inline]
    pub fn modules(&self) -> &[ShaderModule<B>] {
        &self.modules
    }

    pub fn module(&self, stage: ShaderStage) -> Option<&ShaderModule<B>> {
        self.modules.iter().find(|m| m.stage() == stage)
    }

    pub fn stages(&self) -> ShaderStages {
        self.modules
            .iter()
            .fold(ShaderStages::empty(), |acc, m| acc | m.stage().into())
    }
}

pub struct ShaderProgramBuilder<B: Backend> {
    device: Device<B>,
    modules: Vec<ShaderModule<B>>,
}

impl<B: Backend> ShaderProgramBuilder<B> {
    pub fn module(mut self, module: ShaderModule<B>) -> Self {
        self.modules.push(module);
        self
    }

    /// Loads module from file.
    pub fn file(
        self,
        stage: ShaderStage,
        path: impl AsRef<Path>,
        entry_point: &str,
    ) -> Result<Self, Error> {
        let module = ShaderModule::from_file(&self.device, stage, path, entry_point)?;
        Ok(self.module(module))
    }

    pub fn vertex(self, path: impl AsRef<Path>, entry_point: &str) -> Result<Self, Error> {
        self.file(ShaderStage::Vertex, path, entry_point)
    }

    pub fn tessellation_control(
        self,
        path: impl AsRef<Path>,
        entry_point: &str,
    ) -> Result<Self, Error> {
        self.file(ShaderStage::TessellationControl, path, entry_point)
    }

    pub fn tessellation_evaluation(
        self,
        path: impl AsRef<Path>,
        entry_point: &str,
    ) -> Result<Self, Error> {
        self.file(ShaderStage::TessellationEvaluation, path, entry_point)
    }

    pub fn geometry(self, path: impl AsRef<Path>, entry_point: &str) -> Result<Self, Error> {
        self.file(ShaderStage::Geometry, path, entry_point)
    }

    pub fn fragment(self, path: impl AsRef<Path>, entry_point: &str) -> Result<Self, Error> {
        self.file(ShaderStage::Fragment, path, entry_point)
    }

    pub fn compute(self, path: impl AsRef<Path>, entry_point: &str) -> Result<Self, Error> {
        self.file(ShaderStage::Compute, path, entry_point)
    }

    pub fn build(self) -> Result<ShaderProgram<B>, Error> {
        ShaderProgram::new(self.modules)
    }
}
