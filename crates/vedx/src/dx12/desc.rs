//! Platform independent description of D3D12 objects.
//!
//! Mirrors the native structures closely enough to be translated field by field.

use std::ffi::CStr;

use crate::generic::{
    AttributeSemantic, DescriptorType, PixelFormat, PrimitiveTopology, Rasterizer, ShaderStage,
    ShaderStages, VertexFormat,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderVisibility {
    All,
    Vertex,
    Hull,
    Domain,
    Geometry,
    Pixel,
}

impl ShaderVisibility {
    /// Visibility of a parameter used by `stages`.
    ///
    /// Only exactly one graphics stage narrows visibility.
    pub fn from_stages(stages: ShaderStages) -> Self {
        match stages.single() {
            Some(stage) => ShaderVisibility::from_stage(stage),
            None => ShaderVisibility::All,
        }
    }

    pub fn from_stage(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => ShaderVisibility::Vertex,
            ShaderStage::TessellationControl => ShaderVisibility::Hull,
            ShaderStage::TessellationEvaluation => ShaderVisibility::Domain,
            ShaderStage::Geometry => ShaderVisibility::Geometry,
            ShaderStage::Fragment => ShaderVisibility::Pixel,
            ShaderStage::Compute => ShaderVisibility::All,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DescriptorRangeType {
    Srv,
    Uav,
    Cbv,
    Sampler,
}

impl DescriptorRangeType {
    pub fn from_descriptor_type(ty: DescriptorType) -> Self {
        match ty {
            DescriptorType::Uniform => DescriptorRangeType::Cbv,
            DescriptorType::Storage
            | DescriptorType::ByteAddressBuffer
            | DescriptorType::TexelBuffer
            | DescriptorType::Texture
            | DescriptorType::InputAttachment
            | DescriptorType::AccelerationStructure => DescriptorRangeType::Srv,
            DescriptorType::WritableStorage
            | DescriptorType::WritableByteAddressBuffer
            | DescriptorType::WritableTexelBuffer
            | DescriptorType::WritableTexture => DescriptorRangeType::Uav,
            DescriptorType::Sampler => DescriptorRangeType::Sampler,
        }
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DescriptorRangeFlags : u32 {
        const DESCRIPTORS_VOLATILE = 0x1;
        const DATA_VOLATILE = 0x2;
        const DATA_STATIC_WHILE_SET_AT_EXECUTE = 0x4;
        const DATA_STATIC = 0x8;
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RootSignatureFlags : u32 {
        const ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT = 0x1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DescriptorRange {
    pub range_type: DescriptorRangeType,
    pub num_descriptors: u32,
    pub base_shader_register: u32,
    pub register_space: u32,
    pub flags: DescriptorRangeFlags,
    pub offset_in_descriptors_from_table_start: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RootParameter {
    Constants {
        shader_register: u32,
        register_space: u32,
        num_32bit_values: u32,
        visibility: ShaderVisibility,
    },
    DescriptorTable {
        ranges: Vec<DescriptorRange>,
        visibility: ShaderVisibility,
    },
}

/// Linear wrapping sampler baked into the root signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StaticSamplerDesc {
    pub shader_register: u32,
    pub register_space: u32,
    pub visibility: ShaderVisibility,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RootSignatureDesc {
    pub parameters: Vec<RootParameter>,
    pub static_samplers: Vec<StaticSamplerDesc>,
    pub flags: RootSignatureFlags,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DescriptorHeapType {
    CbvSrvUav,
    Sampler,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DescriptorHeapDesc {
    pub heap_type: DescriptorHeapType,
    pub num_descriptors: u32,
    pub shader_visible: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveTopologyType {
    Point,
    Line,
    Triangle,
}

impl From<PrimitiveTopology> for PrimitiveTopologyType {
    fn from(topology: PrimitiveTopology) -> Self {
        match topology {
            PrimitiveTopology::PointList => PrimitiveTopologyType::Point,
            PrimitiveTopology::LineList | PrimitiveTopology::LineStrip => {
                PrimitiveTopologyType::Line
            }
            PrimitiveTopology::TriangleList | PrimitiveTopology::TriangleStrip => {
                PrimitiveTopologyType::Triangle
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StripCutValue {
    Disabled,
    MaxUInt16,
    MaxUInt32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InputElementDesc {
    pub semantic: AttributeSemantic,
    pub semantic_index: u32,
    pub format: VertexFormat,
    pub input_slot: u32,
    pub aligned_byte_offset: u32,
}

impl InputElementDesc {
    pub fn semantic_name(&self) -> &'static CStr {
        match self.semantic {
            AttributeSemantic::Binormal => c"BINORMAL",
            AttributeSemantic::BlendIndices => c"BLENDINDICES",
            AttributeSemantic::BlendWeight => c"BLENDWEIGHT",
            AttributeSemantic::Color => c"COLOR",
            AttributeSemantic::Normal => c"NORMAL",
            AttributeSemantic::Position => c"POSITION",
            AttributeSemantic::TransformedPosition => c"POSITIONT",
            AttributeSemantic::PointSize => c"PSIZE",
            AttributeSemantic::Tangent => c"TANGENT",
            AttributeSemantic::TextureCoordinate => c"TEXCOORD",
            AttributeSemantic::Unknown => c"ATTRIBUTE",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphicsPipelineStateDesc<'a> {
    pub shaders: Vec<(ShaderStage, &'a [u8])>,
    pub input_elements: Vec<InputElementDesc>,
    pub topology_type: PrimitiveTopologyType,
    pub strip_cut: StripCutValue,
    pub rasterizer: Rasterizer,
    pub render_target_formats: &'a [PixelFormat],
    pub depth_stencil_format: Option<PixelFormat>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_narrows_to_single_graphics_stage() {
        assert_eq!(
            ShaderVisibility::from_stages(ShaderStages::FRAGMENT),
            ShaderVisibility::Pixel
        );
        assert_eq!(
            ShaderVisibility::from_stages(ShaderStages::TESSELLATION_EVALUATION),
            ShaderVisibility::Domain
        );
        assert_eq!(
            ShaderVisibility::from_stages(ShaderStages::TESSELLATION_CONTROL),
            ShaderVisibility::Hull
        );
        assert_eq!(
            ShaderVisibility::from_stages(ShaderStages::VERTEX | ShaderStages::FRAGMENT),
            ShaderVisibility::All
        );
        assert_eq!(
            ShaderVisibility::from_stages(ShaderStages::COMPUTE),
            ShaderVisibility::All
        );
    }

    #[test]
    fn range_types() {
        use DescriptorRangeType::*;
        let cases = [
            (DescriptorType::Uniform, Cbv),
            (DescriptorType::Storage, Srv),
            (DescriptorType::WritableStorage, Uav),
            (DescriptorType::Texture, Srv),
            (DescriptorType::WritableTexture, Uav),
            (DescriptorType::InputAttachment, Srv),
            (DescriptorType::TexelBuffer, Srv),
            (DescriptorType::WritableByteAddressBuffer, Uav),
            (DescriptorType::Sampler, Sampler),
        ];
        for (ty, expected) in cases {
            assert_eq!(DescriptorRangeType::from_descriptor_type(ty), expected, "{ty}");
        }
    }
}
