use ash::vk;

use crate::generic::{
    CullMode, CullOrder, DescriptorType, PixelFormat, PolygonMode, PrimitiveTopology, ShaderStage,
    ShaderStages, VertexFormat,
};

pub trait AshFrom<T> {
    fn ash_from(t: T) -> Self;
}

pub trait IntoAsh<T> {
    fn into_ash(self) -> T;
}

impl<T, U> IntoAsh<U> for T
where
    U: AshFrom<T>,
{
    #[inline(always)]
    fn into_ash(self) -> U {
        U::ash_from(self)
    }
}

impl AshFrom<ShaderStage> for vk::ShaderStageFlags {
    #[inline(always)]
    fn ash_from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
            ShaderStage::TessellationControl => vk::ShaderStageFlags::TESSELLATION_CONTROL,
            ShaderStage::TessellationEvaluation => vk::ShaderStageFlags::TESSELLATION_EVALUATION,
            ShaderStage::Geometry => vk::ShaderStageFlags::GEOMETRY,
            ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
            ShaderStage::Compute => vk::ShaderStageFlags::COMPUTE,
        }
    }
}

impl AshFrom<ShaderStages> for vk::ShaderStageFlags {
    #[inline(always)]
    fn ash_from(stages: ShaderStages) -> Self {
        stages
            .stages()
            .fold(vk::ShaderStageFlags::empty(), |acc, stage| {
                acc | vk::ShaderStageFlags::ash_from(stage)
            })
    }
}

impl AshFrom<DescriptorType> for vk::DescriptorType {
    #[inline(always)]
    fn ash_from(ty: DescriptorType) -> Self {
        match ty {
            DescriptorType::Uniform => vk::DescriptorType::UNIFORM_BUFFER,
            DescriptorType::Storage
            | DescriptorType::WritableStorage
            | DescriptorType::ByteAddressBuffer
            | DescriptorType::WritableByteAddressBuffer => vk::DescriptorType::STORAGE_BUFFER,
            DescriptorType::TexelBuffer => vk::DescriptorType::UNIFORM_TEXEL_BUFFER,
            DescriptorType::WritableTexelBuffer => vk::DescriptorType::STORAGE_TEXEL_BUFFER,
            DescriptorType::Texture => vk::DescriptorType::SAMPLED_IMAGE,
            DescriptorType::WritableTexture => vk::DescriptorType::STORAGE_IMAGE,
            DescriptorType::Sampler => vk::DescriptorType::SAMPLER,
            DescriptorType::InputAttachment => vk::DescriptorType::INPUT_ATTACHMENT,
            DescriptorType::AccelerationStructure => {
                vk::DescriptorType::ACCELERATION_STRUCTURE_KHR
            }
        }
    }
}

impl AshFrom<VertexFormat> for vk::Format {
    #[inline(always)]
    fn ash_from(format: VertexFormat) -> Self {
        match format {
            VertexFormat::Float16 => vk::Format::R16_SFLOAT,
            VertexFormat::Float16x2 => vk::Format::R16G16_SFLOAT,
            VertexFormat::Float16x3 => vk::Format::R16G16B16_SFLOAT,
            VertexFormat::Float16x4 => vk::Format::R16G16B16A16_SFLOAT,
            VertexFormat::Sint16 => vk::Format::R16_SINT,
            VertexFormat::Sint16x2 => vk::Format::R16G16_SINT,
            VertexFormat::Sint16x3 => vk::Format::R16G16B16_SINT,
            VertexFormat::Sint16x4 => vk::Format::R16G16B16A16_SINT,
            VertexFormat::Uint16 => vk::Format::R16_UINT,
            VertexFormat::Uint16x2 => vk::Format::R16G16_UINT,
            VertexFormat::Uint16x3 => vk::Format::R16G16B16_UINT,
            VertexFormat::Uint16x4 => vk::Format::R16G16B16A16_UINT,
            VertexFormat::Float32 => vk::Format::R32_SFLOAT,
            VertexFormat::Float32x2 => vk::Format::R32G32_SFLOAT,
            VertexFormat::Float32x3 => vk::Format::R32G32B32_SFLOAT,
            VertexFormat::Float32x4 => vk::Format::R32G32B32A32_SFLOAT,
            VertexFormat::Sint32 => vk::Format::R32_SINT,
            VertexFormat::Sint32x2 => vk::Format::R32G32_SINT,
            VertexFormat::Sint32x3 => vk::Format::R32G32B32_SINT,
            VertexFormat::Sint32x4 => vk::Format::R32G32B32A32_SINT,
            VertexFormat::Uint32 => vk::Format::R32_UINT,
            VertexFormat::Uint32x2 => vk::Format::R32G32_UINT,
            VertexFormat::Uint32x3 => vk::Format::R32G32B32_UINT,
            VertexFormat::Uint32x4 => vk::Format::R32G32B32A32_UINT,
        }
    }
}

impl AshFrom<PixelFormat> for vk::Format {
    #[inline(always)]
    fn ash_from(format: PixelFormat) -> Self {
        match format {
            PixelFormat::R8Unorm => vk::Format::R8_UNORM,
            PixelFormat::Rg8Unorm => vk::Format::R8G8_UNORM,
            PixelFormat::Rgba8Unorm => vk::Format::R8G8B8A8_UNORM,
            PixelFormat::Rgba8Srgb => vk::Format::R8G8B8A8_SRGB,
            PixelFormat::Bgra8Unorm => vk::Format::B8G8R8A8_UNORM,
            PixelFormat::Bgra8Srgb => vk::Format::B8G8R8A8_SRGB,
            PixelFormat::R16Float => vk::Format::R16_SFLOAT,
            PixelFormat::Rgba16Float => vk::Format::R16G16B16A16_SFLOAT,
            PixelFormat::R32Float => vk::Format::R32_SFLOAT,
            PixelFormat::Rgba32Float => vk::Format::R32G32B32A32_SFLOAT,
            PixelFormat::D16Unorm => vk::Format::D16_UNORM,
            PixelFormat::D32Float => vk::Format::D32_SFLOAT,
            PixelFormat::D24UnormS8Uint => vk::Format::D24_UNORM_S8_UINT,
            PixelFormat::D32FloatS8Uint => vk::Format::D32_SFLOAT_S8_UINT,
        }
    }
}

impl AshFrom<PrimitiveTopology> for vk::PrimitiveTopology {
    #[inline(always)]
    fn ash_from(topology: PrimitiveTopology) -> Self {
        match topology {
            PrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
            PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
            PrimitiveTopology::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
            PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
            PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
        }
    }
}

impl AshFrom<PolygonMode> for vk::PolygonMode {
    #[inline(always)]
    fn ash_from(mode: PolygonMode) -> Self {
        match mode {
            PolygonMode::Solid => vk::PolygonMode::FILL,
            PolygonMode::Wireframe => vk::PolygonMode::LINE,
            PolygonMode::Point => vk::PolygonMode::POINT,
        }
    }
}

impl AshFrom<CullMode> for vk::CullModeFlags {
    #[inline(always)]
    fn ash_from(mode: CullMode) -> Self {
        match mode {
            CullMode::FrontFaces => vk::CullModeFlags::FRONT,
            CullMode::BackFaces => vk::CullModeFlags::BACK,
            CullMode::Both => vk::CullModeFlags::FRONT_AND_BACK,
            CullMode::Disabled => vk::CullModeFlags::NONE,
        }
    }
}

impl AshFrom<CullOrder> for vk::FrontFace {
    #[inline(always)]
    fn ash_from(order: CullOrder) -> Self {
        match order {
            CullOrder::ClockWise => vk::FrontFace::CLOCKWISE,
            CullOrder::CounterClockWise => vk::FrontFace::COUNTER_CLOCKWISE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_masks() {
        let flags: vk::ShaderStageFlags =
            (ShaderStages::VERTEX | ShaderStages::FRAGMENT).into_ash();
        assert_eq!(
            flags,
            vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT
        );

        let flags: vk::ShaderStageFlags = ShaderStages::all().into_ash();
        assert_eq!(flags, vk::ShaderStageFlags::ALL_GRAPHICS | vk::ShaderStageFlags::COMPUTE);
    }

    #[test]
    fn descriptor_types() {
        let ty: vk::DescriptorType = DescriptorType::WritableByteAddressBuffer.into_ash();
        assert_eq!(ty, vk::DescriptorType::STORAGE_BUFFER);
        let ty: vk::DescriptorType = DescriptorType::InputAttachment.into_ash();
        assert_eq!(ty, vk::DescriptorType::INPUT_ATTACHMENT);
    }
}
