//! Translation of the logical model into D3D12 root signatures,
//! descriptor heaps and pipeline state objects.
//!
//! Everything except [`native`] is platform independent,
//! native device is abstracted by [`Dx12Device`].

use std::marker::PhantomData;

mod desc;
mod device;
mod layout;
mod pipeline;
mod shader;

#[cfg(all(windows, feature = "d3d12"))]
pub mod native;

pub use self::{
    desc::{
        DescriptorHeapDesc, DescriptorHeapType, DescriptorRange, DescriptorRangeFlags,
        DescriptorRangeType, GraphicsPipelineStateDesc, InputElementDesc, PrimitiveTopologyType,
        RootParameter, RootSignatureDesc, RootSignatureFlags, ShaderVisibility,
        StaticSamplerDesc, StripCutValue,
    },
    device::{Dx12Device, NativeError},
    layout::{DescriptorSet, DescriptorSetLayout, PipelineLayout},
    pipeline::PipelineState,
    shader::{ShaderLanguage, ShaderModule},
};

use crate::{
    generic::{
        BackendKind, ComputePipelineDesc, DescriptorSetLayoutDesc, Device, Error,
        NativeBindingTable, PipelineLayoutDesc, RenderPipelineDesc, ShaderModuleDesc,
    },
    traits::Backend,
};

/// D3D12 backend over native device `D`.
pub struct Dx12<D>(PhantomData<fn() -> D>);

impl<D> Backend for Dx12<D>
where
    D: Dx12Device,
{
    const KIND: BackendKind = BackendKind::Dx12;

    type Device = D;
    type ShaderModule = ShaderModule;
    type DescriptorSetLayout = DescriptorSetLayout<D>;
    type DescriptorSet = DescriptorSet;
    type PipelineLayout = PipelineLayout<D>;
    type ComputePipeline = PipelineState<D>;
    type RenderPipeline = PipelineState<D>;

    fn create_shader_module(
        _device: &Device<Self>,
        desc: &ShaderModuleDesc<'_>,
    ) -> Result<ShaderModule, Error> {
        shader::create_shader_module(desc)
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
        layout::create_pipeline_layout(device.native(), desc, device.diagnostics())
    }

    fn create_compute_pipeline(
        device: &Device<Self>,
        desc: &ComputePipelineDesc<'_, Self>,
    ) -> Result<PipelineState<D>, Error> {
        pipeline::create_compute_pipeline(device.native(), desc)
    }

    fn create_render_pipeline(
        device: &Device<Self>,
        desc: &RenderPipelineDesc<'_, Self>,
    ) -> Result<PipelineState<D>, Error> {
        pipeline::create_render_pipeline(device.native(), desc)
    }
}

impl<D> Device<Dx12<D>>
where
    D: Dx12Device,
{
    pub fn dx12(device: D) -> Self {
        Device::new(device)
    }
}

fn native_error(err: NativeError, what: &str) -> Error {
    Error::Native {
        backend: "d3d12",
        code: i64::from(err.code),
        message: format!("failed to create {what}: {}", err.message),
    }
}
