use super::{AttributeSemantic, BufferType, Error, IndexType, VertexFormat};

/// Common view of anything that describes a buffer binding.
pub trait BufferLayout {
    /// Size of one element in bytes.
    fn element_size(&self) -> usize;

    fn binding(&self) -> u32;

    fn buffer_type(&self) -> BufferType;
}

/// One field inside a vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferAttribute {
    location: u32,
    binding: u32,
    offset: u32,
    format: VertexFormat,
    semantic: AttributeSemantic,
    semantic_index: u32,
}

impl BufferAttribute {
    pub fn new(
        location: u32,
        binding: u32,
        offset: u32,
        format: VertexFormat,
        semantic: AttributeSemantic,
        semantic_index: u32,
    ) -> Self {
        BufferAttribute {
            location,
            binding,
            offset,
            format,
            semantic,
            semantic_index,
        }
    }

    #[inline]
    pub fn location(&self) -> u32 {
        self.location
    }

    #[inline]
    pub fn binding(&self) -> u32 {
        self.binding
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    #[inline]
    pub fn format(&self) -> VertexFormat {
        self.format
    }

    #[inline]
    pub fn semantic(&self) -> AttributeSemantic {
        self.semantic
    }

    #[inline]
    pub fn semantic_index(&self) -> u32 {
        self.semantic_index
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VertexBufferLayout {
    element_size: usize,
    binding: u32,
    attributes: Vec<BufferAttribute>,
}

impl VertexBufferLayout {
    /// Creates layout without attributes.
    pub fn new(element_size: usize, binding: u32) -> Self {
        VertexBufferLayout {
            element_size,
            binding,
            attributes: Vec::new(),
        }
    }

    pub fn builder(element_size: usize, binding: u32) -> VertexBufferLayoutBuilder {
        VertexBufferLayoutBuilder {
            layout: VertexBufferLayout::new(element_size, binding),
        }
    }

    /// Attributes in the order they were added.
    #[inline]
    pub fn attributes(&self) -> &[BufferAttribute] {
        &self.attributes
    }

    /// Layout without attributes or with zero stride carries no vertex data.
    pub fn is_initialized(&self) -> bool {
        self.element_size > 0 && !self.attributes.is_empty()
    }
}

impl BufferLayout for VertexBufferLayout {
    #[inline]
    fn element_size(&self) -> usize {
        self.element_size
    }

    #[inline]
    fn binding(&self) -> u32 {
        self.binding
    }

    #[inline]
    fn buffer_type(&self) -> BufferType {
        BufferType::Vertex
    }
}

pub struct VertexBufferLayoutBuilder {
    layout: VertexBufferLayout,
}

impl VertexBufferLayoutBuilder {
    pub fn attribute(mut self, attribute: BufferAttribute) -> Self {
        self.layout.attributes.push(attribute);
        self
    }

    /// Adds attribute in this layout's binding with unknown semantic.
    pub fn with_attribute(self, location: u32, offset: u32, format: VertexFormat) -> Self {
        let binding = self.layout.binding;
        self.attribute(BufferAttribute::new(
            location,
            binding,
            offset,
            format,
            AttributeSemantic::Unknown,
            0,
        ))
    }

    pub fn with_semantic_attribute(
        self,
        location: u32,
        offset: u32,
        format: VertexFormat,
        semantic: AttributeSemantic,
        semantic_index: u32,
    ) -> Self {
        let binding = self.layout.binding;
        self.attribute(BufferAttribute::new(
            location,
            binding,
            offset,
            format,
            semantic,
            semantic_index,
        ))
    }

    pub fn build(self) -> Result<VertexBufferLayout, Error> {
        let layout = self.layout;

        for (idx, attribute) in layout.attributes.iter().enumerate() {
            if attribute.binding != layout.binding {
                return Err(Error::invalid(
                    "attribute",
                    format!(
                        "attribute at location {} is bound to {}, but layout is bound to {}",
                        attribute.location, attribute.binding, layout.binding
                    ),
                ));
            }

            let end = attribute.offset as usize + attribute.format.size() as usize;
            if end > layout.element_size {
                return Err(Error::invalid(
                    "attribute",
                    format!(
                        "attribute at location {} ends at byte {end} past element size {}",
                        attribute.location, layout.element_size
                    ),
                ));
            }

            if layout.attributes[..idx]
                .iter()
                .any(|a| a.location == attribute.location)
            {
                return Err(Error::invalid(
                    "attribute",
                    format!("location {} is used twice", attribute.location),
                ));
            }
        }

        Ok(layout)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexBufferLayout {
    index_type: IndexType,
}

impl IndexBufferLayout {
    pub fn new(index_type: IndexType) -> Self {
        IndexBufferLayout { index_type }
    }

    #[inline]
    pub fn index_type(&self) -> IndexType {
        self.index_type
    }
}

impl BufferLayout for IndexBufferLayout {
    #[inline]
    fn element_size(&self) -> usize {
        self.index_type.size()
    }

    #[inline]
    fn binding(&self) -> u32 {
        0
    }

    #[inline]
    fn buffer_type(&self) -> BufferType {
        BufferType::Index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_keep_insertion_order() {
        let layout = VertexBufferLayout::builder(24, 0)
            .with_attribute(0, 0, VertexFormat::Float32x3)
            .with_attribute(1, 12, VertexFormat::Float32x3)
            .build()
            .unwrap();

        let attributes = layout.attributes();
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[0].location(), 0);
        assert_eq!(attributes[0].offset(), 0);
        assert_eq!(attributes[0].format(), VertexFormat::Float32x3);
        assert_eq!(attributes[1].location(), 1);
        assert_eq!(attributes[1].offset(), 12);
        assert_eq!(attributes[1].format(), VertexFormat::Float32x3);
        assert_eq!(attributes[1].binding(), 0);
    }

    #[test]
    fn queries_are_stable() {
        let layout = VertexBufferLayout::builder(16, 3)
            .with_semantic_attribute(0, 0, VertexFormat::Float32x4, AttributeSemantic::Color, 0)
            .build()
            .unwrap();

        for _ in 0..3 {
            assert_eq!(layout.element_size(), 16);
            assert_eq!(layout.binding(), 3);
            assert_eq!(layout.buffer_type(), BufferType::Vertex);
        }
        assert_eq!(layout.attributes()[0].semantic(), AttributeSemantic::Color);
    }

    #[test]
    fn attribute_past_element_end() {
        let err = VertexBufferLayout::builder(12, 0)
            .with_attribute(0, 4, VertexFormat::Float32x3)
            .build()
            .unwrap_err();
        assert_eq!(err.argument(), Some("attribute"));
    }

    #[test]
    fn duplicate_location() {
        let err = VertexBufferLayout::builder(32, 0)
            .with_attribute(0, 0, VertexFormat::Float32x3)
            .with_attribute(0, 12, VertexFormat::Float32x3)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("location 0"));
    }

    #[test]
    fn attribute_of_other_binding() {
        let err = VertexBufferLayout::builder(12, 1)
            .attribute(BufferAttribute::new(
                0,
                0,
                0,
                VertexFormat::Float32x3,
                AttributeSemantic::Position,
                0,
            ))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn index_layout() {
        let layout = IndexBufferLayout::new(IndexType::UInt16);
        assert_eq!(layout.element_size(), 2);
        assert_eq!(layout.binding(), 0);
        assert_eq!(layout.buffer_type(), BufferType::Index);
        assert_eq!(IndexBufferLayout::new(IndexType::UInt32).element_size(), 4);
    }
}
