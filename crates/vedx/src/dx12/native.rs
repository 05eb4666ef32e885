//! [`Dx12Device`] implementation for `ID3D12Device`.

use std::{mem::ManuallyDrop, slice};

use windows::{
    core::PCSTR,
    Win32::Graphics::{
        Direct3D::ID3DBlob,
        Direct3D12::*,
        Dxgi::Common::*,
    },
};

use crate::generic::{
    CullMode, CullOrder, PixelFormat, PolygonMode, ShaderStage, VertexFormat, MAX_COLOR_TARGETS,
};

use super::{
    desc::{
        DescriptorHeapDesc, DescriptorHeapType, DescriptorRange, DescriptorRangeType,
        GraphicsPipelineStateDesc, PrimitiveTopologyType, RootParameter, RootSignatureDesc,
        ShaderVisibility, StaticSamplerDesc, StripCutValue,
    },
    Dx12Device, NativeError,
};

/// `ID3D12Device` shared between threads.
#[derive(Clone, Debug)]
pub struct NativeDevice {
    device: ID3D12Device,
}

// D3D12 devices are free-threaded.
unsafe impl Send for NativeDevice {}
unsafe impl Sync for NativeDevice {}

impl NativeDevice {
    pub fn new(device: ID3D12Device) -> Self {
        NativeDevice { device }
    }

    #[inline]
    pub fn device(&self) -> &ID3D12Device {
        &self.device
    }
}

macro_rules! native_object {
    ($name:ident($interface:ty)) => {
        #[derive(Clone, Debug)]
        pub struct $name($interface);

        unsafe impl Send for $name {}
        unsafe impl Sync for $name {}

        impl $name {
            #[inline]
            pub fn get(&self) -> &$interface {
                &self.0
            }
        }
    };
}

native_object!(RootSignature(ID3D12RootSignature));
native_object!(DescriptorHeap(ID3D12DescriptorHeap));
native_object!(PipelineState(ID3D12PipelineState));

fn hresult_error(err: windows::core::Error) -> NativeError {
    NativeError {
        code: err.code().0,
        message: err.message().to_string(),
    }
}

fn blob_bytes(blob: &ID3DBlob) -> &[u8] {
    unsafe { slice::from_raw_parts(blob.GetBufferPointer().cast::<u8>(), blob.GetBufferSize()) }
}

fn shader_visibility(visibility: ShaderVisibility) -> D3D12_SHADER_VISIBILITY {
    match visibility {
        ShaderVisibility::All => D3D12_SHADER_VISIBILITY_ALL,
        ShaderVisibility::Vertex => D3D12_SHADER_VISIBILITY_VERTEX,
        ShaderVisibility::Hull => D3D12_SHADER_VISIBILITY_HULL,
        ShaderVisibility::Domain => D3D12_SHADER_VISIBILITY_DOMAIN,
        ShaderVisibility::Geometry => D3D12_SHADER_VISIBILITY_GEOMETRY,
        ShaderVisibility::Pixel => D3D12_SHADER_VISIBILITY_PIXEL,
    }
}

fn descriptor_range(range: &DescriptorRange) -> D3D12_DESCRIPTOR_RANGE1 {
    D3D12_DESCRIPTOR_RANGE1 {
        RangeType: match range.range_type {
            DescriptorRangeType::Srv => D3D12_DESCRIPTOR_RANGE_TYPE_SRV,
            DescriptorRangeType::Uav => D3D12_DESCRIPTOR_RANGE_TYPE_UAV,
            DescriptorRangeType::Cbv => D3D12_DESCRIPTOR_RANGE_TYPE_CBV,
            DescriptorRangeType::Sampler => D3D12_DESCRIPTOR_RANGE_TYPE_SAMPLER,
        },
        NumDescriptors: range.num_descriptors,
        BaseShaderRegister: range.base_shader_register,
        RegisterSpace: range.register_space,
        Flags: D3D12_DESCRIPTOR_RANGE_FLAGS(range.flags.bits() as i32),
        OffsetInDescriptorsFromTableStart: range.offset_in_descriptors_from_table_start,
    }
}

fn static_sampler(sampler: &StaticSamplerDesc) -> D3D12_STATIC_SAMPLER_DESC {
    D3D12_STATIC_SAMPLER_DESC {
        Filter: D3D12_FILTER_MIN_MAG_MIP_LINEAR,
        AddressU: D3D12_TEXTURE_ADDRESS_MODE_WRAP,
        AddressV: D3D12_TEXTURE_ADDRESS_MODE_WRAP,
        AddressW: D3D12_TEXTURE_ADDRESS_MODE_WRAP,
        MipLODBias: 0.0,
        MaxAnisotropy: 16,
        ComparisonFunc: D3D12_COMPARISON_FUNC_LESS_EQUAL,
        BorderColor: D3D12_STATIC_BORDER_COLOR_OPAQUE_WHITE,
        MinLOD: 0.0,
        MaxLOD: D3D12_FLOAT32_MAX,
        ShaderRegister: sampler.shader_register,
        RegisterSpace: sampler.register_space,
        ShaderVisibility: shader_visibility(sampler.visibility),
    }
}

fn vertex_format(format: VertexFormat) -> DXGI_FORMAT {
    match format {
        VertexFormat::Float16 => DXGI_FORMAT_R16_FLOAT,
        VertexFormat::Float16x2 => DXGI_FORMAT_R16G16_FLOAT,
        VertexFormat::Float16x4 => DXGI_FORMAT_R16G16B16A16_FLOAT,
        VertexFormat::Sint16 => DXGI_FORMAT_R16_SINT,
        VertexFormat::Sint16x2 => DXGI_FORMAT_R16G16_SINT,
        VertexFormat::Sint16x4 => DXGI_FORMAT_R16G16B16A16_SINT,
        VertexFormat::Uint16 => DXGI_FORMAT_R16_UINT,
        VertexFormat::Uint16x2 => DXGI_FORMAT_R16G16_UINT,
        VertexFormat::Uint16x4 => DXGI_FORMAT_R16G16B16A16_UINT,
        VertexFormat::Float16x3 | VertexFormat::Sint16x3 | VertexFormat::Uint16x3 => {
            DXGI_FORMAT_UNKNOWN
        }
        VertexFormat::Float32 => DXGI_FORMAT_R32_FLOAT,
        VertexFormat::Float32x2 => DXGI_FORMAT_R32G32_FLOAT,
        VertexFormat::Float32x3 => DXGI_FORMAT_R32G32B32_FLOAT,
        VertexFormat::Float32x4 => DXGI_FORMAT_R32G32B32A32_FLOAT,
        VertexFormat::Sint32 => DXGI_FORMAT_R32_SINT,
        VertexFormat::Sint32x2 => DXGI_FORMAT_R32G32_SINT,
        VertexFormat::Sint32x3 => DXGI_FORMAT_R32G32B32_SINT,
        VertexFormat::Sint32x4 => DXGI_FORMAT_R32G32B32A32_SINT,
        VertexFormat::Uint32 => DXGI_FORMAT_R32_UINT,
        VertexFormat::Uint32x2 => DXGI_FORMAT_R32G32_UINT,
        VertexFormat::Uint32x3 => DXGI_FORMAT_R32G32B32_UINT,
        VertexFormat::Uint32x4 => DXGI_FORMAT_R32G32B32A32_UINT,
    }
}

fn pixel_format(format: PixelFormat) -> DXGI_FORMAT {
    match format {
        PixelFormat::R8Unorm => DXGI_FORMAT_R8_UNORM,
        PixelFormat::Rg8Unorm => DXGI_FORMAT_R8G8_UNORM,
        PixelFormat::Rgba8Unorm => DXGI_FORMAT_R8G8B8A8_UNORM,
        PixelFormat::Rgba8Srgb => DXGI_FORMAT_R8G8B8A8_UNORM_SRGB,
        PixelFormat::Bgra8Unorm => DXGI_FORMAT_B8G8R8A8_UNORM,
        PixelFormat::Bgra8Srgb => DXGI_FORMAT_B8G8R8A8_UNORM_SRGB,
        PixelFormat::R16Float => DXGI_FORMAT_R16_FLOAT,
        PixelFormat::Rgba16Float => DXGI_FORMAT_R16G16B16A16_FLOAT,
        PixelFormat::R32Float => DXGI_FORMAT_R32_FLOAT,
        PixelFormat::Rgba32Float => DXGI_FORMAT_R32G32B32A32_FLOAT,
        PixelFormat::D16Unorm => DXGI_FORMAT_D16_UNORM,
        PixelFormat::D32Float => DXGI_FORMAT_D32_FLOAT,
        PixelFormat::D24UnormS8Uint => DXGI_FORMAT_D24_UNORM_S8_UINT,
        PixelFormat::D32FloatS8Uint => DXGI_FORMAT_D32_FLOAT_S8X24_UINT,
    }
}

fn bytecode(code: &[u8]) -> D3D12_SHADER_BYTECODE {
    D3D12_SHADER_BYTECODE {
        pShaderBytecode: code.as_ptr().cast(),
        BytecodeLength: code.len(),
    }
}

fn root_signature_ref(root_signature: &RootSignature) -> ManuallyDrop<Option<ID3D12RootSignature>> {
    // Borrowed without adding a reference, the descriptor must never drop it.
    unsafe { std::mem::transmute_copy(root_signature.get()) }
}

impl Dx12Device for NativeDevice {
    type RootSignature = RootSignature;
    type DescriptorHeap = DescriptorHeap;
    type PipelineState = PipelineState;

    fn create_root_signature(
        &self,
        desc: &RootSignatureDesc,
    ) -> Result<RootSignature, NativeError> {
        let ranges: Vec<Vec<D3D12_DESCRIPTOR_RANGE1>> = desc
            .parameters
            .iter()
            .map(|parameter| match parameter {
                RootParameter::DescriptorTable { ranges, .. } => {
                    ranges.iter().map(descriptor_range).collect()
                }
                RootParameter::Constants { .. } => Vec::new(),
            })
            .collect();

        let parameters: Vec<D3D12_ROOT_PARAMETER1> = desc
            .parameters
            .iter()
            .zip(&ranges)
            .map(|(parameter, ranges)| match *parameter {
                RootParameter::Constants {
                    shader_register,
                    register_space,
                    num_32bit_values,
                    visibility,
                } => D3D12_ROOT_PARAMETER1 {
                    ParameterType: D3D12_ROOT_PARAMETER_TYPE_32BIT_CONSTANTS,
                    Anonymous: D3D12_ROOT_PARAMETER1_0 {
                        Constants: D3D12_ROOT_CONSTANTS {
                            ShaderRegister: shader_register,
                            RegisterSpace: register_space,
                            Num32BitValues: num_32bit_values,
                        },
                    },
                    ShaderVisibility: shader_visibility(visibility),
                },
                RootParameter::DescriptorTable { visibility, .. } => D3D12_ROOT_PARAMETER1 {
                    ParameterType: D3D12_ROOT_PARAMETER_TYPE_DESCRIPTOR_TABLE,
                    Anonymous: D3D12_ROOT_PARAMETER1_0 {
                        DescriptorTable: D3D12_ROOT_DESCRIPTOR_TABLE1 {
                            NumDescriptorRanges: ranges.len() as u32,
                            pDescriptorRanges: ranges.as_ptr(),
                        },
                    },
                    ShaderVisibility: shader_visibility(visibility),
                },
            })
            .collect();

        let static_samplers: Vec<D3D12_STATIC_SAMPLER_DESC> =
            desc.static_samplers.iter().map(static_sampler).collect();

        let versioned = D3D12_VERSIONED_ROOT_SIGNATURE_DESC {
            Version: D3D_ROOT_SIGNATURE_VERSION_1_1,
            Anonymous: D3D12_VERSIONED_ROOT_SIGNATURE_DESC_0 {
                Desc_1_1: D3D12_ROOT_SIGNATURE_DESC1 {
                    NumParameters: parameters.len() as u32,
                    pParameters: parameters.as_ptr(),
                    NumStaticSamplers: static_samplers.len() as u32,
                    pStaticSamplers: static_samplers.as_ptr(),
                    Flags: D3D12_ROOT_SIGNATURE_FLAGS(desc.flags.bits() as i32),
                },
            },
        };

        let mut blob: Option<ID3DBlob> = None;
        let mut error: Option<ID3DBlob> = None;

        if let Err(err) =
            unsafe { D3D12SerializeVersionedRootSignature(&versioned, &mut blob, Some(&mut error)) }
        {
            let mut native = hresult_error(err);
            if let Some(error) = &error {
                let message = String::from_utf8_lossy(blob_bytes(error));
                native.message = message.trim_end_matches('\0').to_owned();
            }
            return Err(native);
        }

        let Some(blob) = blob else {
            return Err(NativeError {
                code: 0,
                message: "root signature serialization produced no blob".to_owned(),
            });
        };

        let root_signature: ID3D12RootSignature =
            unsafe { self.device.CreateRootSignature(0, blob_bytes(&blob)) }
                .map_err(hresult_error)?;

        Ok(RootSignature(root_signature))
    }

    fn create_descriptor_heap(
        &self,
        desc: &DescriptorHeapDesc,
    ) -> Result<DescriptorHeap, NativeError> {
        let native = D3D12_DESCRIPTOR_HEAP_DESC {
            Type: match desc.heap_type {
                DescriptorHeapType::CbvSrvUav => D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
                DescriptorHeapType::Sampler => D3D12_DESCRIPTOR_HEAP_TYPE_SAMPLER,
            },
            NumDescriptors: desc.num_descriptors,
            Flags: match desc.shader_visible {
                true => D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE,
                false => D3D12_DESCRIPTOR_HEAP_FLAG_NONE,
            },
            NodeMask: 0,
        };

        let heap: ID3D12DescriptorHeap =
            unsafe { self.device.CreateDescriptorHeap(&native) }.map_err(hresult_error)?;

        Ok(DescriptorHeap(heap))
    }

    fn create_compute_pipeline_state(
        &self,
        root_signature: &RootSignature,
        shader: &[u8],
    ) -> Result<PipelineState, NativeError> {
        let native = D3D12_COMPUTE_PIPELINE_STATE_DESC {
            pRootSignature: root_signature_ref(root_signature),
            CS: bytecode(shader),
            ..Default::default()
        };

        let state: ID3D12PipelineState =
            unsafe { self.device.CreateComputePipelineState(&native) }.map_err(hresult_error)?;

        Ok(PipelineState(state))
    }

    fn create_graphics_pipeline_state(
        &self,
        root_signature: &RootSignature,
        desc: &GraphicsPipelineStateDesc<'_>,
    ) -> Result<PipelineState, NativeError> {
        let input_elements: Vec<D3D12_INPUT_ELEMENT_DESC> = desc
            .input_elements
            .iter()
            .map(|element| D3D12_INPUT_ELEMENT_DESC {
                SemanticName: PCSTR(element.semantic_name().as_ptr().cast()),
                SemanticIndex: element.semantic_index,
                Format: vertex_format(element.format),
                InputSlot: element.input_slot,
                AlignedByteOffset: element.aligned_byte_offset,
                InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            })
            .collect();

        let mut native = D3D12_GRAPHICS_PIPELINE_STATE_DESC {
            pRootSignature: root_signature_ref(root_signature),
            InputLayout: D3D12_INPUT_LAYOUT_DESC {
                pInputElementDescs: input_elements.as_ptr(),
                NumElements: input_elements.len() as u32,
            },
            IBStripCutValue: match desc.strip_cut {
                StripCutValue::Disabled => D3D12_INDEX_BUFFER_STRIP_CUT_VALUE_DISABLED,
                StripCutValue::MaxUInt16 => D3D12_INDEX_BUFFER_STRIP_CUT_VALUE_0xFFFF,
                StripCutValue::MaxUInt32 => D3D12_INDEX_BUFFER_STRIP_CUT_VALUE_0xFFFFFFFF,
            },
            PrimitiveTopologyType: match desc.topology_type {
                PrimitiveTopologyType::Point => D3D12_PRIMITIVE_TOPOLOGY_TYPE_POINT,
                PrimitiveTopologyType::Line => D3D12_PRIMITIVE_TOPOLOGY_TYPE_LINE,
                PrimitiveTopologyType::Triangle => D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE,
            },
            RasterizerState: D3D12_RASTERIZER_DESC {
                FillMode: match desc.rasterizer.polygon_mode {
                    PolygonMode::Wireframe => D3D12_FILL_MODE_WIREFRAME,
                    PolygonMode::Solid | PolygonMode::Point => D3D12_FILL_MODE_SOLID,
                },
                CullMode: match desc.rasterizer.cull_mode {
                    CullMode::FrontFaces => D3D12_CULL_MODE_FRONT,
                    CullMode::BackFaces => D3D12_CULL_MODE_BACK,
                    CullMode::Both | CullMode::Disabled => D3D12_CULL_MODE_NONE,
                },
                FrontCounterClockwise: (desc.rasterizer.cull_order
                    == CullOrder::CounterClockWise)
                    .into(),
                DepthClipEnable: true.into(),
                ..Default::default()
            },
            BlendState: D3D12_BLEND_DESC {
                RenderTarget: [D3D12_RENDER_TARGET_BLEND_DESC {
                    SrcBlend: D3D12_BLEND_ONE,
                    DestBlend: D3D12_BLEND_ZERO,
                    BlendOp: D3D12_BLEND_OP_ADD,
                    SrcBlendAlpha: D3D12_BLEND_ONE,
                    DestBlendAlpha: D3D12_BLEND_ZERO,
                    BlendOpAlpha: D3D12_BLEND_OP_ADD,
                    LogicOp: D3D12_LOGIC_OP_NOOP,
                    RenderTargetWriteMask: D3D12_COLOR_WRITE_ENABLE_ALL.0 as u8,
                    ..Default::default()
                }; MAX_COLOR_TARGETS],
                ..Default::default()
            },
            DepthStencilState: match desc.depth_stencil_format {
                Some(_) => D3D12_DEPTH_STENCIL_DESC {
                    DepthEnable: true.into(),
                    DepthWriteMask: D3D12_DEPTH_WRITE_MASK_ALL,
                    DepthFunc: D3D12_COMPARISON_FUNC_LESS_EQUAL,
                    ..Default::default()
                },
                None => D3D12_DEPTH_STENCIL_DESC::default(),
            },
            DSVFormat: desc
                .depth_stencil_format
                .map_or(DXGI_FORMAT_UNKNOWN, pixel_format),
            NumRenderTargets: desc.render_target_formats.len() as u32,
            SampleMask: u32::MAX,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            ..Default::default()
        };

        for (slot, &format) in native
            .RTVFormats
            .iter_mut()
            .zip(desc.render_target_formats)
        {
            *slot = pixel_format(format);
        }

        for &(stage, code) in &desc.shaders {
            let code = bytecode(code);
            match stage {
                ShaderStage::Vertex => native.VS = code,
                ShaderStage::TessellationControl => native.HS = code,
                ShaderStage::TessellationEvaluation => native.DS = code,
                ShaderStage::Geometry => native.GS = code,
                ShaderStage::Fragment => native.PS = code,
                ShaderStage::Compute => {}
            }
        }

        let state: ID3D12PipelineState =
            unsafe { self.device.CreateGraphicsPipelineState(&native) }.map_err(hresult_error)?;

        Ok(PipelineState(state))
    }
}
