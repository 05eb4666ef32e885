use std::{collections::BTreeMap, sync::Arc};

use super::{
    BufferLayout, Error, IndexBufferLayout, IndexType, PrimitiveTopology, VertexBufferLayout,
};

/// Vertex buffer layouts keyed by binding, optional index layout and topology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputAssembler {
    vertex_buffer_layouts: BTreeMap<u32, Arc<VertexBufferLayout>>,
    index_buffer_layout: Option<IndexBufferLayout>,
    topology: PrimitiveTopology,
}

impl InputAssembler {
    pub fn new(
        vertex_buffer_layouts: impl IntoIterator<Item = Arc<VertexBufferLayout>>,
        index_buffer_layout: Option<IndexBufferLayout>,
        topology: PrimitiveTopology,
    ) -> Result<Self, Error> {
        let mut layouts = BTreeMap::new();

        for layout in vertex_buffer_layouts {
            if !layout.is_initialized() {
                return Err(Error::not_initialized(
                    "vertex_buffer_layouts",
                    format!(
                        "vertex buffer layout for binding {} has no attributes or zero stride",
                        layout.binding()
                    ),
                ));
            }

            let binding = layout.binding();
            if layouts.insert(binding, layout).is_some() {
                return Err(Error::invalid(
                    "vertex_buffer_layouts",
                    format!("multiple vertex buffer layouts use binding {binding}"),
                ));
            }
        }

        Ok(InputAssembler {
            vertex_buffer_layouts: layouts,
            index_buffer_layout,
            topology,
        })
    }

    pub fn builder() -> InputAssemblerBuilder {
        InputAssemblerBuilder::default()
    }

    #[inline]
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Layouts ordered by binding.
    pub fn vertex_buffer_layouts(&self) -> impl ExactSizeIterator<Item = &VertexBufferLayout> {
        self.vertex_buffer_layouts.values().map(|layout| &**layout)
    }

    pub fn vertex_buffer_layout(&self, binding: u32) -> Result<&VertexBufferLayout, Error> {
        match self.vertex_buffer_layouts.get(&binding) {
            Some(layout) => Ok(layout),
            None => Err(Error::invalid(
                "binding",
                format!("no vertex buffer layout has been provided for binding {binding}"),
            )),
        }
    }

    #[inline]
    pub fn index_buffer_layout(&self) -> Option<&IndexBufferLayout> {
        self.index_buffer_layout.as_ref()
    }

    /// Indexed strips restart at the maximum index value.
    pub fn primitive_restart(&self) -> bool {
        self.index_buffer_layout.is_some() && self.topology.is_strip()
    }
}

#[derive(Default)]
pub struct InputAssemblerBuilder {
    vertex_buffer_layouts: Vec<Arc<VertexBufferLayout>>,
    index_buffer_layouts: Vec<IndexBufferLayout>,
    topology: PrimitiveTopology,
}

impl InputAssemblerBuilder {
    pub fn topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    pub fn vertex_buffer(self, layout: VertexBufferLayout) -> Self {
        self.shared_vertex_buffer(Arc::new(layout))
    }

    pub fn shared_vertex_buffer(mut self, layout: Arc<VertexBufferLayout>) -> Self {
        self.vertex_buffer_layouts.push(layout);
        self
    }

    /// Index layout may be provided only once.
    pub fn index_type(mut self, index_type: IndexType) -> Self {
        self.index_buffer_layouts
            .push(IndexBufferLayout::new(index_type));
        self
    }

    pub fn build(self) -> Result<InputAssembler, Error> {
        let mut index_layouts = self.index_buffer_layouts.into_iter();
        let index_layout = index_layouts.next();
        if index_layouts.next().is_some() {
            return Err(Error::invalid(
                "index_buffer_layout",
                "an index buffer layout has already been specified",
            ));
        }

        InputAssembler::new(self.vertex_buffer_layouts, index_layout, self.topology)
    }
}
