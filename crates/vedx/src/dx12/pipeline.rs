use std::fmt;

use crate::generic::{
    AttributeSemantic, BufferLayout, ComputePipelineDesc, CullMode, Error, IndexType,
    InputAssembler, PolygonMode, PrimitiveTopology, RenderPipelineDesc,
};

use super::{
    desc::{GraphicsPipelineStateDesc, InputElementDesc, PrimitiveTopologyType, StripCutValue},
    native_error, Dx12, Dx12Device,
};

pub struct PipelineState<D: Dx12Device> {
    state: D::PipelineState,
    topology: Option<PrimitiveTopology>,
}

impl<D: Dx12Device> fmt::Debug for PipelineState<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineState")
            .field("topology", &self.topology)
            .finish_non_exhaustive()
    }
}

impl<D: Dx12Device> PipelineState<D> {
    #[inline]
    pub fn state(&self) -> &D::PipelineState {
        &self.state
    }

    /// Topology to set on command lists before drawing.
    /// Pipeline state objects only record the topology type.
    /// `None` for compute pipelines.
    #[inline]
    pub fn topology(&self) -> Option<PrimitiveTopology> {
        self.topology
    }
}

pub(super) fn create_compute_pipeline<D: Dx12Device>(
    device: &D,
    desc: &ComputePipelineDesc<'_, Dx12<D>>,
) -> Result<PipelineState<D>, Error> {
    let state = device
        .create_compute_pipeline_state(
            desc.layout.native().root_signature(),
            desc.module.bytecode(),
        )
        .map_err(|err| native_error(err, "compute pipeline state"))?;

    Ok(PipelineState {
        state,
        topology: None,
    })
}

/// Input elements for every attribute of every vertex buffer.
///
/// Attributes without semantic are addressed by location.
fn input_elements(input_assembler: &InputAssembler) -> Result<Vec<InputElementDesc>, Error> {
    let mut elements = Vec::new();

    for layout in input_assembler.vertex_buffer_layouts() {
        for attribute in layout.attributes() {
            if attribute.format().channels() == 3 && attribute.format().channel_size() == 2 {
                return Err(Error::Unsupported(
                    "three channel 16 bit vertex formats are not supported by D3D12",
                ));
            }

            let semantic_index = match attribute.semantic() {
                AttributeSemantic::Unknown => attribute.location(),
                _ => attribute.semantic_index(),
            };

            elements.push(InputElementDesc {
                semantic: attribute.semantic(),
                semantic_index,
                format: attribute.format(),
                input_slot: layout.binding(),
                aligned_byte_offset: attribute.offset(),
            });
        }
    }

    Ok(elements)
}

fn strip_cut(input_assembler: &InputAssembler) -> StripCutValue {
    if !input_assembler.primitive_restart() {
        return StripCutValue::Disabled;
    }
    match input_assembler.index_buffer_layout().map(|l| l.index_type()) {
        Some(IndexType::UInt16) => StripCutValue::MaxUInt16,
        Some(IndexType::UInt32) => StripCutValue::MaxUInt32,
        None => StripCutValue::Disabled,
    }
}

pub(super) fn create_render_pipeline<D: Dx12Device>(
    device: &D,
    desc: &RenderPipelineDesc<'_, Dx12<D>>,
) -> Result<PipelineState<D>, Error> {
    match desc.rasterizer.polygon_mode {
        PolygonMode::Point => {
            return Err(Error::Unsupported(
                "point polygon mode is not supported by D3D12",
            ))
        }
        PolygonMode::Solid | PolygonMode::Wireframe => {}
    }

    if desc.rasterizer.cull_mode == CullMode::Both {
        return Err(Error::Unsupported(
            "culling both faces is not supported by D3D12",
        ));
    }

    let input_elements = input_elements(desc.input_assembler)?;
    let topology = desc.input_assembler.topology();

    let shaders = desc
        .program
        .modules()
        .iter()
        .map(|module| (module.stage(), module.bytecode()))
        .collect();

    let pso = GraphicsPipelineStateDesc {
        shaders,
        input_elements,
        topology_type: PrimitiveTopologyType::from(topology),
        strip_cut: strip_cut(desc.input_assembler),
        rasterizer: *desc.rasterizer,
        render_target_formats: desc.color_formats,
        depth_stencil_format: desc.depth_format,
    };

    let state = device
        .create_graphics_pipeline_state(desc.layout.native().root_signature(), &pso)
        .map_err(|err| native_error(err, "graphics pipeline state"))?;

    Ok(PipelineState {
        state,
        topology: Some(topology),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::{VertexBufferLayout, VertexFormat};

    #[test]
    fn strip_cut_follows_index_type() {
        let vertices = || {
            VertexBufferLayout::builder(12, 0)
                .with_attribute(0, 0, VertexFormat::Float32x3)
                .build()
                .unwrap()
        };

        let ia = InputAssembler::builder()
            .topology(PrimitiveTopology::TriangleStrip)
            .vertex_buffer(vertices())
            .index_type(IndexType::UInt16)
            .build()
            .unwrap();
        assert_eq!(strip_cut(&ia), StripCutValue::MaxUInt16);

        let ia = InputAssembler::builder()
            .topology(PrimitiveTopology::TriangleList)
            .vertex_buffer(vertices())
            .index_type(IndexType::UInt32)
            .build()
            .unwrap();
        assert_eq!(strip_cut(&ia), StripCutValue::Disabled);
    }

    #[test]
    fn unknown_semantics_use_locations() {
        let layout = VertexBufferLayout::builder(32, 1)
            .with_semantic_attribute(0, 0, VertexFormat::Float32x3, AttributeSemantic::Position, 0)
            .with_attribute(3, 12, VertexFormat::Float32x4)
            .build()
            .unwrap();
        let ia = InputAssembler::builder().vertex_buffer(layout).build().unwrap();

        let elements = input_elements(&ia).unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].semantic_name().to_str(), Ok("POSITION"));
        assert_eq!(elements[0].semantic_index, 0);
        assert_eq!(elements[1].semantic_name().to_str(), Ok("ATTRIBUTE"));
        assert_eq!(elements[1].semantic_index, 3);
        assert!(elements.iter().all(|e| e.input_slot == 1));
    }

    #[test]
    fn half_precision_triples_are_unsupported() {
        let layout = VertexBufferLayout::builder(8, 0)
            .with_attribute(0, 0, VertexFormat::Float16x3)
            .build()
            .unwrap();
        let ia = InputAssembler::builder().vertex_buffer(layout).build().unwrap();
        assert!(matches!(input_elements(&ia), Err(Error::Unsupported(_))));
    }
}
