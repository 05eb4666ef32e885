use std::fmt;

use super::desc::{DescriptorHeapDesc, GraphicsPipelineStateDesc, RootSignatureDesc};

/// Failure reported by the native D3D12 device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeError {
    /// `HRESULT` of the failed call.
    pub code: i32,
    pub message: String,
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08X})", self.message, self.code as u32)
    }
}

/// Subset of `ID3D12Device` needed to create layouts and pipeline states.
///
/// Native objects release themselves when dropped.
pub trait Dx12Device: Send + Sync + 'static {
    type RootSignature: Send + Sync + 'static;
    type DescriptorHeap: Send + Sync + 'static;
    type PipelineState: Send + Sync + 'static;

    /// Serializes root signature as version 1.1 and creates it.
    fn create_root_signature(
        &self,
        desc: &RootSignatureDesc,
    ) -> Result<Self::RootSignature, NativeError>;

    fn create_descriptor_heap(
        &self,
        desc: &DescriptorHeapDesc,
    ) -> Result<Self::DescriptorHeap, NativeError>;

    fn create_compute_pipeline_state(
        &self,
        root_signature: &Self::RootSignature,
        shader: &[u8],
    ) -> Result<Self::PipelineState, NativeError>;

    fn create_graphics_pipeline_state(
        &self,
        root_signature: &Self::RootSignature,
        desc: &GraphicsPipelineStateDesc<'_>,
    ) -> Result<Self::PipelineState, NativeError>;
}
