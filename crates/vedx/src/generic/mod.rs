mod buffer_layout;
mod config;
mod descriptor;
mod device;
mod diagnostics;
mod error;
mod format;
mod input_assembler;
mod pipeline;
mod pipeline_layout;
mod push_constants;
mod shader;

pub use self::{
    buffer_layout::{
        BufferAttribute, BufferLayout, IndexBufferLayout, VertexBufferLayout,
        VertexBufferLayoutBuilder,
    },
    config::{Config, ConfigError, PORTABLE_PUSH_CONSTANTS_SIZE},
    descriptor::{
        DescriptorCounts, DescriptorLayout, DescriptorSet, DescriptorSetLayout,
        DescriptorSetLayoutDesc, DescriptorType,
    },
    device::{BackendKind, Device},
    diagnostics::{
        DiagnosticSink, Diagnostics, NoopSink, Record, RecordingSink, Severity, TracingSink,
    },
    error::Error,
    format::{
        AttributeSemantic, BufferType, ChannelKind, IndexType, PixelFormat, PrimitiveTopology,
        VertexFormat,
    },
    input_assembler::{InputAssembler, InputAssemblerBuilder},
    pipeline::{
        ComputePipeline, ComputePipelineBuilder, ComputePipelineDesc, CullMode, CullOrder,
        PolygonMode, Rasterizer, RenderPipeline, RenderPipelineBuilder, RenderPipelineDesc,
        MAX_COLOR_TARGETS,
    },
    pipeline_layout::{
        DescriptorSetLayoutBuilder, NativeBindingTable, PipelineKind, PipelineLayout,
        PipelineLayoutBuilder, PipelineLayoutDesc, PushConstantsLayoutBuilder,
    },
    push_constants::{PushConstantsLayout, PushConstantsRange},
    shader::{
        ShaderModule, ShaderModuleDesc, ShaderProgram, ShaderProgramBuilder, ShaderStage,
        ShaderStages,
    },
};
