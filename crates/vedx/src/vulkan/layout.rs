use std::{
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use ash::vk;
use smallvec::SmallVec;

use crate::generic::{
    BufferLayout, DescriptorSetLayoutDesc, Error, NativeBindingTable, PipelineLayoutDesc,
};

use super::{from::IntoAsh, native_error, Vulkan, VulkanDevice};

/// Highest number of descriptor sets a Vulkan pipeline layout may use here.
///
/// Gaps between set spaces are filled with empty set layouts,
/// so the highest space bounds the number of sets.
pub const MAX_BOUND_DESCRIPTOR_SETS: u32 = 32;

pub struct DescriptorSetLayout<D: VulkanDevice> {
    handle: vk::DescriptorSetLayout,
    pool: Option<vk::DescriptorPool>,
    pool_sizes: Vec<vk::DescriptorPoolSize>,
    max_sets: u32,
    allocated: AtomicU32,
    owner: Arc<D>,
}

impl<D: VulkanDevice> fmt::Debug for DescriptorSetLayout<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorSetLayout")
            .field("handle", &self.handle)
            .field("pool", &self.pool)
            .field("pool_sizes", &self.pool_sizes)
            .field("max_sets", &self.max_sets)
            .field("allocated", &self.allocated)
            .finish()
    }
}

impl<D: VulkanDevice> Drop for DescriptorSetLayout<D> {
    fn drop(&mut self) {
        unsafe {
            if let Some(pool) = self.pool {
                self.owner.destroy_descriptor_pool(pool);
            }
            self.owner.destroy_descriptor_set_layout(self.handle);
        }
    }
}

impl<D: VulkanDevice> DescriptorSetLayout<D> {
    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.handle
    }

    /// Pool backing this set layout. Empty sets have no pool.
    #[inline]
    pub fn pool(&self) -> Option<vk::DescriptorPool> {
        self.pool
    }

    #[inline]
    pub fn pool_sizes(&self) -> &[vk::DescriptorPoolSize] {
        &self.pool_sizes
    }

    /// Number of sets allocated from the pool so far.
    pub fn allocated(&self) -> u32 {
        self.allocated.load(Ordering::Relaxed)
    }
}

/// Set allocated from a layout's pool. Released together with the pool.
#[derive(Debug)]
pub struct DescriptorSet {
    handle: vk::DescriptorSet,
}

impl DescriptorSet {
    #[inline]
    pub fn handle(&self) -> vk::DescriptorSet {
        self.handle
    }
}

/// Pool sizes for `pool_size` sets of given layout, merged by native descriptor type.
fn pool_sizes(desc: &DescriptorSetLayoutDesc) -> Result<Vec<vk::DescriptorPoolSize>, Error> {
    let mut sizes: Vec<vk::DescriptorPoolSize> = Vec::new();

    for descriptor in desc.descriptors() {
        let ty: vk::DescriptorType = descriptor.descriptor_type().into_ash();
        let count = descriptor
            .descriptor_count()
            .checked_mul(desc.pool_size())
            .ok_or_else(|| {
                Error::invalid(
                    "pool_size",
                    format!(
                        "pool of descriptor set {} overflows at binding {}",
                        desc.space(),
                        descriptor.binding()
                    ),
                )
            })?;

        match sizes.iter_mut().find(|size| size.ty == ty) {
            Some(size) => {
                size.descriptor_count = size.descriptor_count.checked_add(count).ok_or_else(|| {
                    Error::invalid(
                        "pool_size",
                        format!("pool of descriptor set {} overflows", desc.space()),
                    )
                })?
            }
            None => sizes.push(vk::DescriptorPoolSize::default().ty(ty).descriptor_count(count)),
        }
    }

    Ok(sizes)
}

pub(super) fn create_descriptor_set_layout<D: VulkanDevice>(
    owner: &Arc<D>,
    desc: &DescriptorSetLayoutDesc,
) -> Result<DescriptorSetLayout<D>, Error> {
    let pool_sizes = pool_sizes(desc)?;
    let stage_flags: vk::ShaderStageFlags = desc.stages().into_ash();

    let bindings: SmallVec<[vk::DescriptorSetLayoutBinding; 8]> = desc
        .descriptors()
        .iter()
        .map(|descriptor| {
            vk::DescriptorSetLayoutBinding::default()
                .binding(descriptor.binding())
                .descriptor_type(descriptor.descriptor_type().into_ash())
                .descriptor_count(descriptor.descriptor_count())
                .stage_flags(stage_flags)
        })
        .collect();

    let info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
    let handle = unsafe { owner.create_descriptor_set_layout(&info) }
        .map_err(|err| native_error(err, "descriptor set layout"))?;

    let pool = if pool_sizes.is_empty() {
        None
    } else {
        let info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(desc.pool_size())
            .pool_sizes(&pool_sizes);

        match unsafe { owner.create_descriptor_pool(&info) } {
            Ok(pool) => Some(pool),
            Err(err) => {
                unsafe { owner.destroy_descriptor_set_layout(handle) };
                return Err(native_error(err, "descriptor pool"));
            }
        }
    };

    Ok(DescriptorSetLayout {
        handle,
        pool,
        pool_sizes,
        max_sets: desc.pool_size(),
        allocated: AtomicU32::new(0),
        owner: owner.clone(),
    })
}

pub(super) fn allocate_descriptor_set<D: VulkanDevice>(
    layout: &DescriptorSetLayout<D>,
) -> Result<DescriptorSet, Error> {
    let Some(pool) = layout.pool else {
        return Err(Error::invalid(
            "descriptors",
            "descriptor set layout without descriptors has no pool",
        ));
    };

    let reserved = layout
        .allocated
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
            (n < layout.max_sets).then_some(n + 1)
        });
    if reserved.is_err() {
        return Err(native_error(
            vk::Result::ERROR_OUT_OF_POOL_MEMORY,
            "descriptor set",
        ));
    }

    let set_layouts = [layout.handle];
    let info = vk::DescriptorSetAllocateInfo::default()
        .descriptor_pool(pool)
        .set_layouts(&set_layouts);

    match unsafe { layout.owner.allocate_descriptor_set(&info) } {
        Ok(handle) => Ok(DescriptorSet { handle }),
        Err(err) => {
            layout.allocated.fetch_sub(1, Ordering::Relaxed);
            Err(native_error(err, "descriptor set"))
        }
    }
}

pub struct PipelineLayout<D: VulkanDevice> {
    handle: vk::PipelineLayout,
    set_layouts: Vec<vk::DescriptorSetLayout>,
    placeholders: Vec<vk::DescriptorSetLayout>,
    push_constant_ranges: Vec<vk::PushConstantRange>,
    owner: Arc<D>,
}

impl<D: VulkanDevice> fmt::Debug for PipelineLayout<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineLayout")
            .field("handle", &self.handle)
            .field("set_layouts", &self.set_layouts)
            .field("push_constant_ranges", &self.push_constant_ranges)
            .finish()
    }
}

impl<D: VulkanDevice> Drop for PipelineLayout<D> {
    fn drop(&mut self) {
        unsafe {
            self.owner.destroy_pipeline_layout(self.handle);
            destroy_set_layouts(&*self.owner, &self.placeholders);
        }
    }
}

impl<D: VulkanDevice> PipelineLayout<D> {
    #[inline]
    pub fn handle(&self) -> vk::PipelineLayout {
        self.handle
    }

    /// Set layouts indexed by set number, empty placeholders included.
    #[inline]
    pub fn set_layouts(&self) -> &[vk::DescriptorSetLayout] {
        &self.set_layouts
    }

    #[inline]
    pub fn push_constant_ranges(&self) -> &[vk::PushConstantRange] {
        &self.push_constant_ranges
    }
}

unsafe fn destroy_set_layouts<D: VulkanDevice>(owner: &D, layouts: &[vk::DescriptorSetLayout]) {
    for &layout in layouts {
        unsafe { owner.destroy_descriptor_set_layout(layout) };
    }
}

pub(super) fn create_pipeline_layout<D: VulkanDevice>(
    owner: &Arc<D>,
    desc: &PipelineLayoutDesc<'_, Vulkan<D>>,
) -> Result<(PipelineLayout<D>, NativeBindingTable), Error> {
    let mut bindings = NativeBindingTable::new();

    let set_count = match desc.descriptor_sets.iter().map(|set| set.space()).max() {
        None => 0,
        Some(space) if space < MAX_BOUND_DESCRIPTOR_SETS => space + 1,
        Some(space) => {
            return Err(Error::invalid(
                "descriptor_sets",
                format!(
                    "descriptor set space {space} exceeds the limit of {MAX_BOUND_DESCRIPTOR_SETS} sets"
                ),
            ))
        }
    };

    let mut set_layouts = Vec::with_capacity(set_count as usize);
    let mut placeholders = Vec::new();

    for space in 0..set_count {
        match desc.descriptor_sets.iter().find(|set| set.space() == space) {
            Some(set) => {
                bindings.insert_descriptor_set(space, space);
                set_layouts.push(set.native().handle());
            }
            None => {
                let info = vk::DescriptorSetLayoutCreateInfo::default();
                match unsafe { owner.create_descriptor_set_layout(&info) } {
                    Ok(layout) => {
                        placeholders.push(layout);
                        set_layouts.push(layout);
                    }
                    Err(err) => {
                        unsafe { destroy_set_layouts(&**owner, &placeholders) };
                        return Err(native_error(err, "empty descriptor set layout"));
                    }
                }
            }
        }
    }

    let mut push_constant_ranges = Vec::new();
    if let Some(push_constants) = desc.push_constants {
        for (idx, range) in push_constants.ranges().iter().enumerate() {
            bindings.insert_push_constants(range.stage(), idx as u32);
            push_constant_ranges.push(
                vk::PushConstantRange::default()
                    .stage_flags(range.stage().into_ash())
                    .offset(range.offset())
                    .size(range.size()),
            );
        }
    }

    let info = vk::PipelineLayoutCreateInfo::default()
        .set_layouts(&set_layouts)
        .push_constant_ranges(&push_constant_ranges);

    let handle = match unsafe { owner.create_pipeline_layout(&info) } {
        Ok(handle) => handle,
        Err(err) => {
            unsafe { destroy_set_layouts(&**owner, &placeholders) };
            return Err(native_error(err, "pipeline layout"));
        }
    };

    let layout = PipelineLayout {
        handle,
        set_layouts,
        placeholders,
        push_constant_ranges,
        owner: owner.clone(),
    };

    Ok((layout, bindings))
}
