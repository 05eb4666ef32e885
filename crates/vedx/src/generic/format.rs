use std::fmt;

/// Format of a single vertex attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float16,
    Float16x2,
    Float16x3,
    Float16x4,
    Sint16,
    Sint16x2,
    Sint16x3,
    Sint16x4,
    Uint16,
    Uint16x2,
    Uint16x3,
    Uint16x4,
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
    Sint32,
    Sint32x2,
    Sint32x3,
    Sint32x4,
    Uint32,
    Uint32x2,
    Uint32x3,
    Uint32x4,
}

/// Numeric interpretation of vertex format channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Float,
    Sint,
    Uint,
}

impl VertexFormat {
    pub fn channels(&self) -> u32 {
        use VertexFormat::*;
        match self {
            Float16 | Sint16 | Uint16 | Float32 | Sint32 | Uint32 => 1,
            Float16x2 | Sint16x2 | Uint16x2 | Float32x2 | Sint32x2 | Uint32x2 => 2,
            Float16x3 | Sint16x3 | Uint16x3 | Float32x3 | Sint32x3 | Uint32x3 => 3,
            Float16x4 | Sint16x4 | Uint16x4 | Float32x4 | Sint32x4 | Uint32x4 => 4,
        }
    }

    /// Size of one channel in bytes.
    pub fn channel_size(&self) -> u32 {
        use VertexFormat::*;
        match self {
            Float16 | Float16x2 | Float16x3 | Float16x4 | Sint16 | Sint16x2 | Sint16x3
            | Sint16x4 | Uint16 | Uint16x2 | Uint16x3 | Uint16x4 => 2,
            _ => 4,
        }
    }

    pub fn channel_kind(&self) -> ChannelKind {
        use VertexFormat::*;
        match self {
            Float16 | Float16x2 | Float16x3 | Float16x4 | Float32 | Float32x2 | Float32x3
            | Float32x4 => ChannelKind::Float,
            Sint16 | Sint16x2 | Sint16x3 | Sint16x4 | Sint32 | Sint32x2 | Sint32x3 | Sint32x4 => {
                ChannelKind::Sint
            }
            Uint16 | Uint16x2 | Uint16x3 | Uint16x4 | Uint32 | Uint32x2 | Uint32x3 | Uint32x4 => {
                ChannelKind::Uint
            }
        }
    }

    /// Size of the whole attribute in bytes.
    #[inline]
    pub fn size(&self) -> u32 {
        self.channels() * self.channel_size()
    }
}

/// Meaning of a vertex attribute, used by backends that bind attributes by name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AttributeSemantic {
    Binormal,
    BlendIndices,
    BlendWeight,
    Color,
    Normal,
    Position,
    TransformedPosition,
    PointSize,
    Tangent,
    TextureCoordinate,
    #[default]
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexType {
    UInt16,
    UInt32,
}

impl IndexType {
    /// Size of one index in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        match self {
            IndexType::UInt16 => 2,
            IndexType::UInt32 => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferType {
    Vertex,
    Index,
    Uniform,
    Storage,
    Texel,
    AccelerationStructure,
    Other,
}

impl fmt::Display for BufferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferType::Vertex => write!(f, "vertex"),
            BufferType::Index => write!(f, "index"),
            BufferType::Uniform => write!(f, "uniform"),
            BufferType::Storage => write!(f, "storage"),
            BufferType::Texel => write!(f, "texel"),
            BufferType::AccelerationStructure => write!(f, "acceleration structure"),
            BufferType::Other => write!(f, "other"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

impl PrimitiveTopology {
    #[inline]
    pub fn is_strip(&self) -> bool {
        matches!(
            self,
            PrimitiveTopology::LineStrip | PrimitiveTopology::TriangleStrip
        )
    }
}

/// Format of render targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    R8Unorm,
    Rg8Unorm,
    Rgba8Unorm,
    Rgba8Srgb,
    Bgra8Unorm,
    Bgra8Srgb,
    R16Float,
    Rgba16Float,
    R32Float,
    Rgba32Float,
    D16Unorm,
    D32Float,
    D24UnormS8Uint,
    D32FloatS8Uint,
}

impl PixelFormat {
    pub fn is_color(&self) -> bool {
        !self.is_depth()
    }

    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            PixelFormat::D16Unorm
                | PixelFormat::D32Float
                | PixelFormat::D24UnormS8Uint
                | PixelFormat::D32FloatS8Uint
        )
    }

    pub fn is_stencil(&self) -> bool {
        matches!(
            self,
            PixelFormat::D24UnormS8Uint | PixelFormat::D32FloatS8Uint
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_format_sizes() {
        assert_eq!(VertexFormat::Float32x3.size(), 12);
        assert_eq!(VertexFormat::Float32x3.channels(), 3);
        assert_eq!(VertexFormat::Uint16x2.size(), 4);
        assert_eq!(VertexFormat::Sint16x4.channel_kind(), ChannelKind::Sint);
        assert_eq!(VertexFormat::Uint32.channel_size(), 4);
    }

    #[test]
    fn index_sizes() {
        assert_eq!(IndexType::UInt16.size(), 2);
        assert_eq!(IndexType::UInt32.size(), 4);
    }

    #[test]
    fn depth_formats() {
        assert!(PixelFormat::D24UnormS8Uint.is_stencil());
        assert!(PixelFormat::D32Float.is_depth());
        assert!(!PixelFormat::D32Float.is_stencil());
        assert!(PixelFormat::Bgra8Srgb.is_color());
    }
}
