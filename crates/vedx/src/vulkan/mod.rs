//! Translation of the logical model into Vulkan objects via `ash`.

use std::{marker::PhantomData, sync::Arc};

use ash::vk;

mod device;
mod from;
mod layout;
mod pipeline;
mod shader;

pub use ash;

pub use self::{
    device::VulkanDevice,
    layout::{DescriptorSet, DescriptorSetLayout, PipelineLayout, MAX_BOUND_DESCRIPTOR_SETS},
    pipeline::Pipeline,
    shader::ShaderModule,
};

use crate::{
    generic::{
        BackendKind, ComputePipelineDesc, DescriptorSetLayoutDesc, Device, Error,
        NativeBindingTable, PipelineLayoutDesc, RenderPipelineDesc, ShaderModuleDesc,
    },
    traits::Backend,
};

/// Vulkan backend over native device `D`.
pub struct Vulkan<D = ash::Device>(PhantomData<fn() -> D>);

impl<D> Backend for Vulkan<D>
where
    D: VulkanDevice,
{
    const KIND: BackendKind = BackendKind::Vulkan;

    type Device = Arc<D>;
    type ShaderModule = ShaderModule<D>;
    type DescriptorSetLayout = DescriptorSetLayout<D>;
    type DescriptorSet = DescriptorSet;
    type PipelineLayout = PipelineLayout<D>;
    type ComputePipeline = Pipeline<D>;
    type RenderPipeline = Pipeline<D>;

    fn create_shader_module(
        device: &Device<Self>,
        desc: &ShaderModuleDesc<'_>,
    ) -> Result<ShaderModule<D>, Error> {
        shader::create_shader_module(device.native(), desc)
    }

    fn create_descriptor_set_layout(
        device: &Device<Self>,
        desc: &DescriptorSetLayoutDesc,
    ) -> Result<DescriptorSetLayout<D>, Error> {
        layout::create_descriptor_set_layout(device.native(), desc)
    }

    fn allocate_descriptor_set(layout: &DescriptorSetLayout<D>) -> Result<DescriptorSet, Error> {
        layout::allocate_descriptor_set(layout)
    }

    fn create_pipeline_layout(
        device: &Device<Self>,
        desc: &PipelineLayoutDesc<'_, Self>,
    ) -> Result<(PipelineLayout<D>, NativeBindingTable), Error> {
        layout::create_pipeline_layout(device.native(), desc)
    }

    fn create_compute_pipeline(
        device: &Device<Self>,
        desc: &ComputePipelineDesc<'_, Self>,
    ) -> Result<Pipeline<D>, Error> {
        pipeline::create_compute_pipeline(device.native(), desc)
    }

    fn create_render_pipeline(
        device: &Device<Self>,
        desc: &RenderPipelineDesc<'_, Self>,
    ) -> Result<Pipeline<D>, Error> {
        pipeline::create_render_pipeline(device.native(), desc)
    }
}

impl<D> Device<Vulkan<D>>
where
    D: VulkanDevice,
{
    /// Wraps native device.
    ///
    /// The native device must outlive every object created through the returned device.
    pub fn vulkan(device: D) -> Self {
        Device::new(Arc::new(device))
    }
}

fn native_error(err: vk::Result, what: &str) -> Error {
    Error::Native {
        backend: "vulkan",
        code: i64::from(err.as_raw()),
        message: format!("failed to create {what}: {err}"),
    }
}
