use crate::generic::{
    BackendKind, ComputePipelineDesc, DescriptorSetLayoutDesc, Device, Error, NativeBindingTable,
    PipelineLayoutDesc, RenderPipelineDesc, ShaderModuleDesc,
};

/// Translation of the logical model into native objects of one graphics API.
///
/// Logical validation happens before any of these functions is called.
/// Implementations must release every native object they created
/// before returning an error.
pub trait Backend: Sized + 'static {
    const KIND: BackendKind;

    /// Native device wrapped by [`Device`].
    type Device: Send + Sync + 'static;

    type ShaderModule: Send + Sync + 'static;
    type DescriptorSetLayout: Send + Sync + 'static;
    type DescriptorSet: Send + Sync + 'static;
    type PipelineLayout: Send + Sync + 'static;
    type ComputePipeline: Send + Sync + 'static;
    type RenderPipeline: Send + Sync + 'static;

    /// Register shader bytecode with the device.
    fn create_shader_module(
        device: &Device<Self>,
        desc: &ShaderModuleDesc<'_>,
    ) -> Result<Self::ShaderModule, Error>;

    /// Create native set layout and the pool or heap that backs it.
    fn create_descriptor_set_layout(
        device: &Device<Self>,
        desc: &DescriptorSetLayoutDesc,
    ) -> Result<Self::DescriptorSetLayout, Error>;

    /// Allocate a new set from the pool or heap of the layout.
    ///
    /// Fails with [`Error::Native`] once the pool is exhausted.
    fn allocate_descriptor_set(
        layout: &Self::DescriptorSetLayout,
    ) -> Result<Self::DescriptorSet, Error>;

    /// Create native pipeline layout or root signature.
    fn create_pipeline_layout(
        device: &Device<Self>,
        desc: &PipelineLayoutDesc<'_, Self>,
    ) -> Result<(Self::PipelineLayout, NativeBindingTable), Error>;

    /// Create a new compute pipeline.
    fn create_compute_pipeline(
        device: &Device<Self>,
        desc: &ComputePipelineDesc<'_, Self>,
    ) -> Result<Self::ComputePipeline, Error>;

    /// Create a new render pipeline.
    fn create_render_pipeline(
        device: &Device<Self>,
        desc: &RenderPipelineDesc<'_, Self>,
    ) -> Result<Self::RenderPipeline, Error>;
}
