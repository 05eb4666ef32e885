mod common;

use std::sync::Arc;

use vedx::{
    dx12::{
        DescriptorHeapType, DescriptorRangeType, PrimitiveTopologyType, RootParameter,
        RootSignatureFlags, ShaderLanguage, ShaderVisibility, StripCutValue,
    },
    AttributeSemantic, ComputePipeline, CullMode, Error, IndexType, InputAssembler,
    PipelineLayout, PixelFormat, PolygonMode, PrimitiveTopology, Rasterizer, RenderPipeline,
    ShaderModule, ShaderStage, ShaderStages, VertexBufferLayout, VertexFormat,
};

use common::{dx12_device, dx12_program, dxbc, Call};

#[test]
fn root_constants_come_before_tables() {
    let (device, sink) = dx12_device();
    let program = dx12_program(&device, &[ShaderStage::Vertex, ShaderStage::Fragment]);

    let layout = PipelineLayout::builder(&device)
        .program(program)
        .descriptor_set(1, ShaderStages::FRAGMENT, 2)
        .texture(0, false)
        .texture(1, true)
        .add()
        .unwrap()
        .descriptor_set(0, ShaderStages::VERTEX | ShaderStages::FRAGMENT, 1)
        .uniform(0, 64)
        .add()
        .unwrap()
        .push_constants(32)
        .range(ShaderStages::VERTEX, 0, 16, 0, 1)
        .unwrap()
        .range(ShaderStages::FRAGMENT, 16, 16, 0, 2)
        .unwrap()
        .add()
        .unwrap()
        .build()
        .unwrap();

    let desc = layout.native().desc();
    assert_eq!(desc.flags, RootSignatureFlags::ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT);
    assert!(desc.static_samplers.is_empty());
    assert_eq!(desc.parameters.len(), 4);

    assert_eq!(
        desc.parameters[0],
        RootParameter::Constants {
            shader_register: 1,
            register_space: 0,
            num_32bit_values: 4,
            visibility: ShaderVisibility::Vertex,
        }
    );
    assert!(matches!(
        desc.parameters[1],
        RootParameter::Constants {
            shader_register: 2,
            visibility: ShaderVisibility::Pixel,
            ..
        }
    ));

    match &desc.parameters[2] {
        RootParameter::DescriptorTable { ranges, visibility } => {
            assert_eq!(*visibility, ShaderVisibility::All);
            assert_eq!(ranges.len(), 1);
            assert_eq!(ranges[0].range_type, DescriptorRangeType::Cbv);
            assert_eq!(ranges[0].register_space, 0);
        }
        other => panic!("unexpected parameter {other:?}"),
    }

    match &desc.parameters[3] {
        RootParameter::DescriptorTable { ranges, visibility } => {
            assert_eq!(*visibility, ShaderVisibility::Pixel);
            let types: Vec<_> = ranges.iter().map(|r| r.range_type).collect();
            assert_eq!(types, [DescriptorRangeType::Srv, DescriptorRangeType::Uav]);
            assert!(ranges.iter().all(|r| r.register_space == 1));
        }
        other => panic!("unexpected parameter {other:?}"),
    }

    let bindings = layout.bindings();
    assert_eq!(bindings.push_constants_index(ShaderStage::Vertex), Some(0));
    assert_eq!(bindings.push_constants_index(ShaderStage::Fragment), Some(1));
    assert_eq!(bindings.descriptor_set_index(0), Some(2));
    assert_eq!(bindings.descriptor_set_index(1), Some(3));
    assert!(sink.warnings().is_empty());

    let state = device.native().state.lock();
    assert_eq!(state.root_signatures.len(), 1);
    let heap = state
        .heaps
        .iter()
        .find(|h| h.num_descriptors == 4)
        .unwrap();
    assert_eq!(heap.heap_type, DescriptorHeapType::CbvSrvUav);
    assert!(!heap.shader_visible);
}

#[test]
fn input_attachments_add_static_sampler() {
    let (device, _) = dx12_device();
    let program = dx12_program(&device, &[ShaderStage::Vertex, ShaderStage::Fragment]);

    let layout = PipelineLayout::builder(&device)
        .program(program)
        .descriptor_set(0, ShaderStages::FRAGMENT, 1)
        .input_attachment(0)
        .add()
        .unwrap()
        .build()
        .unwrap();

    let samplers = &layout.native().desc().static_samplers;
    assert_eq!(samplers.len(), 1);
    assert_eq!(samplers[0].shader_register, 0);
    assert_eq!(samplers[0].register_space, 0);
}

#[test]
fn sampler_at_first_register_warns() {
    let (device, sink) = dx12_device();
    let program = dx12_program(&device, &[ShaderStage::Vertex, ShaderStage::Fragment]);

    let layout = PipelineLayout::builder(&device)
        .program(program)
        .descriptor_set(0, ShaderStages::FRAGMENT, 1)
        .sampler(0)
        .add()
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(sink.warnings().len(), 1);
    assert_eq!(
        device.native().state.lock().heaps[0].heap_type,
        DescriptorHeapType::Sampler
    );

    let table = &layout.native().desc().parameters[0];
    match table {
        RootParameter::DescriptorTable { ranges, .. } => {
            assert_eq!(ranges[0].range_type, DescriptorRangeType::Sampler);
        }
        other => panic!("unexpected parameter {other:?}"),
    }
}

#[test]
fn compute_samplers_do_not_warn() {
    let (device, sink) = dx12_device();
    let program = dx12_program(&device, &[ShaderStage::Compute]);

    let layout = PipelineLayout::compute_builder(&device)
        .program(program)
        .descriptor_set(0, ShaderStages::COMPUTE, 1)
        .sampler(0)
        .add()
        .unwrap()
        .build()
        .unwrap();

    assert!(sink.warnings().is_empty());
    assert!(layout.native().desc().flags.is_empty());
}

#[test]
fn empty_sets_get_no_table() {
    let (device, _) = dx12_device();
    let program = dx12_program(&device, &[ShaderStage::Vertex]);

    let layout = PipelineLayout::builder(&device)
        .program(program)
        .descriptor_set(0, ShaderStages::VERTEX, 1)
        .add()
        .unwrap()
        .build()
        .unwrap();

    assert!(layout.native().desc().parameters.is_empty());
    assert_eq!(layout.bindings().descriptor_set_index(0), None);
    assert!(layout.descriptor_set(0).unwrap().native().heap().is_none());
}

#[test]
fn objects_are_released() {
    let (device, _) = dx12_device();
    let program = dx12_program(&device, &[ShaderStage::Vertex]);

    let layout = PipelineLayout::builder(&device)
        .program(program)
        .descriptor_set(0, ShaderStages::VERTEX, 1)
        .uniform(0, 16)
        .add()
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(device.native().live(), 2);

    drop(layout);
    assert_eq!(device.native().live(), 0);
}

#[test]
fn root_signature_failure_is_native_error() {
    let (device, _) = dx12_device();
    let program = dx12_program(&device, &[ShaderStage::Vertex]);
    device.native().fail(Call::RootSignature);

    let err = PipelineLayout::builder(&device)
        .program(program)
        .descriptor_set(0, ShaderStages::VERTEX, 1)
        .uniform(0, 16)
        .add()
        .unwrap()
        .build()
        .unwrap_err();

    match err {
        Error::Native { backend, code, .. } => {
            assert_eq!(backend, "d3d12");
            assert_eq!(code, i64::from(0x8007_000Eu32 as i32));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(device.native().live(), 0);
}

#[test]
fn heap_failure_is_native_error() {
    let (device, _) = dx12_device();
    device.native().fail(Call::Heap);

    let err = PipelineLayout::builder(&device)
        .descriptor_set(0, ShaderStages::VERTEX, 1)
        .uniform(0, 16)
        .add()
        .err()
        .unwrap();
    assert!(matches!(err, Error::Native { backend: "d3d12", .. }));
}

#[test]
fn shader_containers_are_validated() {
    let (device, _) = dx12_device();

    let module =
        ShaderModule::from_bytes(&device, ShaderStage::Vertex, "vs", "main", dxbc(&[b"SHEX"]))
            .unwrap();
    assert_eq!(module.native().language(), ShaderLanguage::Dxbc);

    let err = ShaderModule::from_bytes(&device, ShaderStage::Vertex, "vs", "main", common::spirv())
        .unwrap_err();
    assert_eq!(err.argument(), Some("bytecode"));
}

fn input_assembler() -> Arc<InputAssembler> {
    let vertices = VertexBufferLayout::builder(32, 0)
        .with_semantic_attribute(0, 0, VertexFormat::Float32x3, AttributeSemantic::Position, 0)
        .with_semantic_attribute(1, 12, VertexFormat::Float32x3, AttributeSemantic::Normal, 0)
        .with_semantic_attribute(
            2,
            24,
            VertexFormat::Float32x2,
            AttributeSemantic::TextureCoordinate,
            0,
        )
        .build()
        .unwrap();

    Arc::new(
        InputAssembler::builder()
            .topology(PrimitiveTopology::TriangleStrip)
            .vertex_buffer(vertices)
            .index_type(IndexType::UInt32)
            .build()
            .unwrap(),
    )
}

#[test]
fn graphics_pipeline_state() {
    let (device, _) = dx12_device();
    let program = dx12_program(&device, &[ShaderStage::Vertex, ShaderStage::Fragment]);
    let layout = Arc::new(
        PipelineLayout::builder(&device)
            .program(program)
            .build()
            .unwrap(),
    );

    let pipeline = RenderPipeline::builder(&device, "forward")
        .layout(layout.clone())
        .input_assembler(input_assembler())
        .color_target(PixelFormat::Bgra8Srgb)
        .depth_target(PixelFormat::D24UnormS8Uint)
        .build()
        .unwrap();
    assert_eq!(
        pipeline.native().topology(),
        Some(PrimitiveTopology::TriangleStrip)
    );

    let state = device.native().state.lock();
    let pso = &state.graphics[0];
    assert_eq!(pso.stages, [ShaderStage::Vertex, ShaderStage::Fragment]);
    assert_eq!(pso.topology_type, PrimitiveTopologyType::Triangle);
    assert_eq!(pso.strip_cut, StripCutValue::MaxUInt32);
    assert_eq!(pso.render_targets, [PixelFormat::Bgra8Srgb]);
    assert_eq!(pso.depth_stencil, Some(PixelFormat::D24UnormS8Uint));

    let names: Vec<_> = pso
        .input_elements
        .iter()
        .map(|e| e.semantic_name().to_str().unwrap())
        .collect();
    assert_eq!(names, ["POSITION", "NORMAL", "TEXCOORD"]);
    assert_eq!(pso.input_elements[2].aligned_byte_offset, 24);
}

#[test]
fn unsupported_rasterizer_states() {
    let (device, _) = dx12_device();
    let program = dx12_program(&device, &[ShaderStage::Vertex, ShaderStage::Fragment]);
    let layout = Arc::new(
        PipelineLayout::builder(&device)
            .program(program)
            .build()
            .unwrap(),
    );

    for rasterizer in [
        Rasterizer {
            polygon_mode: PolygonMode::Point,
            ..Rasterizer::default()
        },
        Rasterizer {
            cull_mode: CullMode::Both,
            ..Rasterizer::default()
        },
    ] {
        let err = RenderPipeline::builder(&device, "points")
            .layout(layout.clone())
            .input_assembler(input_assembler())
            .rasterizer(rasterizer)
            .color_target(PixelFormat::Rgba8Unorm)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }
    assert!(device.native().state.lock().graphics.is_empty());
}

#[test]
fn compute_pipeline_state() {
    let (device, _) = dx12_device();
    let program = dx12_program(&device, &[ShaderStage::Compute]);
    let layout = Arc::new(
        PipelineLayout::compute_builder(&device)
            .program(program)
            .descriptor_set(0, ShaderStages::COMPUTE, 1)
            .byte_address_buffer(0, true)
            .add()
            .unwrap()
            .build()
            .unwrap(),
    );

    let pipeline = ComputePipeline::builder(&device, "scan")
        .layout(layout)
        .build()
        .unwrap();
    assert_eq!(pipeline.native().topology(), None);
    assert_eq!(device.native().state.lock().compute, 1);
}

#[test]
fn descriptor_sets_are_carved_from_the_heap() {
    let (device, _) = dx12_device();
    let program = dx12_program(&device, &[ShaderStage::Fragment]);

    let layout = PipelineLayout::builder(&device)
        .program(program)
        .descriptor_set(0, ShaderStages::FRAGMENT, 3)
        .texture(0, false)
        .uniform(1, 16)
        .add()
        .unwrap()
        .build()
        .unwrap();

    let set_layout = layout.descriptor_set(0).unwrap();
    assert_eq!(set_layout.native().heap_desc().unwrap().num_descriptors, 6);

    let sets = set_layout.allocate_many(3).unwrap();
    let offsets: Vec<_> = sets.iter().map(|s| s.native().heap_offset()).collect();
    assert_eq!(offsets, [0, 2, 4]);
    assert!(sets.iter().all(|s| s.native().descriptor_count() == 2));

    match set_layout.allocate().unwrap_err() {
        Error::Native { backend, code, .. } => {
            assert_eq!(backend, "d3d12");
            assert_eq!(code, i64::from(0x8007_000Eu32 as i32));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(set_layout.native().allocated(), 3);

    let mut sets = sets;
    let middle = sets.remove(1);
    set_layout.free(middle).unwrap();
    let again = set_layout.allocate().unwrap();
    assert_eq!(again.native().heap_offset(), 2);
    assert_eq!(set_layout.native().allocated(), 3);

    drop(sets);
    drop(again);
    assert_eq!(set_layout.recycled(), 3);
}
