use std::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use crate::generic::{
    BufferLayout, DescriptorSetLayoutDesc, DescriptorType, Diagnostics, Error, NativeBindingTable,
    PipelineKind, PipelineLayoutDesc, ShaderStages,
};

use super::{
    desc::{
        DescriptorHeapDesc, DescriptorHeapType, DescriptorRange, DescriptorRangeFlags,
        DescriptorRangeType, RootParameter, RootSignatureDesc, RootSignatureFlags,
        ShaderVisibility, StaticSamplerDesc,
    },
    native_error, Dx12, Dx12Device, NativeError,
};

/// `E_OUTOFMEMORY`, reported when a staging heap has no room for another set.
const E_OUTOFMEMORY: i32 = 0x8007_000Eu32 as i32;

/// Descriptor table of one set together with the heap its descriptors are staged in.
pub struct DescriptorSetLayout<D: Dx12Device> {
    ranges: Vec<DescriptorRange>,
    heap_desc: Option<DescriptorHeapDesc>,
    heap: Option<D::DescriptorHeap>,
    space: u32,
    set_size: u32,
    max_sets: u32,
    allocated: AtomicU32,
}

impl<D: Dx12Device> fmt::Debug for DescriptorSetLayout<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorSetLayout")
            .field("ranges", &self.ranges)
            .field("heap", &self.heap_desc)
            .field("allocated", &self.allocated)
            .finish()
    }
}

impl<D: Dx12Device> DescriptorSetLayout<D> {
    /// Ranges of the descriptor table, in binding declaration order.
    #[inline]
    pub fn ranges(&self) -> &[DescriptorRange] {
        &self.ranges
    }

    /// Staging heap. Empty sets have no heap.
    #[inline]
    pub fn heap(&self) -> Option<&D::DescriptorHeap> {
        self.heap.as_ref()
    }

    #[inline]
    pub fn heap_desc(&self) -> Option<&DescriptorHeapDesc> {
        self.heap_desc.as_ref()
    }

    /// Number of sets carved out of the heap so far.
    pub fn allocated(&self) -> u32 {
        self.allocated.load(Ordering::Relaxed)
    }
}

/// Slice of the layout's staging heap holding descriptors of one set.
#[derive(Debug, PartialEq, Eq)]
pub struct DescriptorSet {
    offset: u32,
    len: u32,
}

impl DescriptorSet {
    /// Index of the first descriptor of the set in the heap.
    #[inline]
    pub fn heap_offset(&self) -> u32 {
        self.offset
    }

    #[inline]
    pub fn descriptor_count(&self) -> u32 {
        self.len
    }
}

fn range_flags(ty: DescriptorRangeType) -> DescriptorRangeFlags {
    match ty {
        DescriptorRangeType::Cbv | DescriptorRangeType::Srv => {
            DescriptorRangeFlags::DESCRIPTORS_VOLATILE
                | DescriptorRangeFlags::DATA_STATIC_WHILE_SET_AT_EXECUTE
        }
        DescriptorRangeType::Uav => DescriptorRangeFlags::DESCRIPTORS_VOLATILE,
        DescriptorRangeType::Sampler => DescriptorRangeFlags::empty(),
    }
}

fn descriptor_ranges(desc: &DescriptorSetLayoutDesc) -> Result<Vec<DescriptorRange>, Error> {
    let mut offset = 0u32;
    let mut ranges = Vec::with_capacity(desc.descriptors().len());

    for descriptor in desc.descriptors() {
        let range_type = DescriptorRangeType::from_descriptor_type(descriptor.descriptor_type());
        ranges.push(DescriptorRange {
            range_type,
            num_descriptors: descriptor.descriptor_count(),
            base_shader_register: descriptor.binding(),
            register_space: desc.space(),
            flags: range_flags(range_type),
            offset_in_descriptors_from_table_start: offset,
        });

        offset = offset
            .checked_add(descriptor.descriptor_count())
            .ok_or_else(|| {
                Error::invalid(
                    "descriptors",
                    format!("descriptor table of set {} overflows", desc.space()),
                )
            })?;
    }

    Ok(ranges)
}

pub(super) fn create_descriptor_set_layout<D: Dx12Device>(
    device: &D,
    desc: &DescriptorSetLayoutDesc,
) -> Result<DescriptorSetLayout<D>, Error> {
    let ranges = descriptor_ranges(desc)?;

    let set_size = desc.counts().total();

    if ranges.is_empty() {
        return Ok(DescriptorSetLayout {
            ranges,
            heap_desc: None,
            heap: None,
            space: desc.space(),
            set_size,
            max_sets: desc.pool_size(),
            allocated: AtomicU32::new(0),
        });
    }

    let num_descriptors = set_size
        .checked_mul(desc.pool_size())
        .ok_or_else(|| {
            Error::invalid(
                "pool_size",
                format!("descriptor heap of set {} overflows", desc.space()),
            )
        })?;

    let heap_desc = DescriptorHeapDesc {
        heap_type: match desc.is_sampler_only() {
            true => DescriptorHeapType::Sampler,
            false => DescriptorHeapType::CbvSrvUav,
        },
        num_descriptors,
        shader_visible: false,
    };

    let heap = device
        .create_descriptor_heap(&heap_desc)
        .map_err(|err| native_error(err, "descriptor heap"))?;

    Ok(DescriptorSetLayout {
        ranges,
        heap_desc: Some(heap_desc),
        heap: Some(heap),
        space: desc.space(),
        set_size,
        max_sets: desc.pool_size(),
        allocated: AtomicU32::new(0),
    })
}

pub(super) fn allocate_descriptor_set<D: Dx12Device>(
    layout: &DescriptorSetLayout<D>,
) -> Result<DescriptorSet, Error> {
    if layout.heap.is_none() {
        return Err(Error::invalid(
            "descriptors",
            "descriptor set layout without descriptors has no heap",
        ));
    }

    let index = layout
        .allocated
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
            (n < layout.max_sets).then_some(n + 1)
        })
        .map_err(|_| {
            native_error(
                NativeError {
                    code: E_OUTOFMEMORY,
                    message: format!(
                        "descriptor heap of set {} holds only {} sets",
                        layout.space, layout.max_sets
                    ),
                },
                "descriptor set",
            )
        })?;

    // Heap size is checked against overflow when the layout is created.
    Ok(DescriptorSet {
        offset: index * layout.set_size,
        len: layout.set_size,
    })
}

/// Root signature and the description it was created from.
pub struct PipelineLayout<D: Dx12Device> {
    root_signature: D::RootSignature,
    desc: RootSignatureDesc,
}

impl<D: Dx12Device> fmt::Debug for PipelineLayout<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineLayout")
            .field("desc", &self.desc)
            .finish_non_exhaustive()
    }
}

impl<D: Dx12Device> PipelineLayout<D> {
    #[inline]
    pub fn root_signature(&self) -> &D::RootSignature {
        &self.root_signature
    }

    #[inline]
    pub fn desc(&self) -> &RootSignatureDesc {
        &self.desc
    }
}

/// Lays out root parameters: root constants of each push constant range first,
/// then one descriptor table per non-empty set in order of spaces.
pub(super) fn root_signature_desc<D: Dx12Device>(
    desc: &PipelineLayoutDesc<'_, Dx12<D>>,
    diagnostics: &Diagnostics,
) -> (RootSignatureDesc, NativeBindingTable) {
    let mut bindings = NativeBindingTable::new();
    let mut parameters = Vec::new();

    if let Some(push_constants) = desc.push_constants {
        for range in push_constants.ranges() {
            bindings.insert_push_constants(range.stage(), parameters.len() as u32);
            parameters.push(RootParameter::Constants {
                shader_register: range.binding(),
                register_space: range.space(),
                num_32bit_values: range.size() / 4,
                visibility: ShaderVisibility::from_stage(range.stage()),
            });
        }
    }

    let mut sets: Vec<_> = desc.descriptor_sets.iter().collect();
    sets.sort_by_key(|set| set.space());

    let mut input_attachments = false;

    for set in sets {
        let ranges = set.native().ranges();
        if ranges.is_empty() {
            continue;
        }

        if set.stages() != ShaderStages::COMPUTE
            && set.space() == 0
            && set
                .descriptors()
                .iter()
                .any(|d| d.descriptor_type() == DescriptorType::Sampler && d.binding() == 0)
        {
            diagnostics.warn(
                "pipeline_layout",
                format_args!(
                    "sampler bound to register 0 of space 0 may collide with the static input attachment sampler"
                ),
            );
        }

        input_attachments |= set
            .descriptors()
            .iter()
            .any(|d| d.descriptor_type() == DescriptorType::InputAttachment);

        bindings.insert_descriptor_set(set.space(), parameters.len() as u32);
        parameters.push(RootParameter::DescriptorTable {
            ranges: ranges.to_vec(),
            visibility: ShaderVisibility::from_stages(set.stages()),
        });
    }

    let mut static_samplers = Vec::new();
    if input_attachments {
        static_samplers.push(StaticSamplerDesc {
            shader_register: 0,
            register_space: 0,
            visibility: ShaderVisibility::All,
        });
    }

    let flags = match desc.kind {
        PipelineKind::Render => RootSignatureFlags::ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT,
        PipelineKind::Compute => RootSignatureFlags::empty(),
    };

    let desc = RootSignatureDesc {
        parameters,
        static_samplers,
        flags,
    };

    (desc, bindings)
}

pub(super) fn create_pipeline_layout<D: Dx12Device>(
    device: &D,
    desc: &PipelineLayoutDesc<'_, Dx12<D>>,
    diagnostics: &Diagnostics,
) -> Result<(PipelineLayout<D>, NativeBindingTable), Error> {
    let (desc, bindings) = root_signature_desc(desc, diagnostics);

    let root_signature = device
        .create_root_signature(&desc)
        .map_err(|err| native_error(err, "root signature"))?;

    Ok((
        PipelineLayout {
            root_signature,
            desc,
        },
        bindings,
    ))
}
