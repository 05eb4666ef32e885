use std::{collections::VecDeque, fmt, mem::ManuallyDrop, ptr};

use parking_lot::Mutex;

use crate::traits::Backend;

use super::{BufferLayout, BufferType, Device, Error, ShaderStages};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    Uniform,
    Storage,
    WritableStorage,
    ByteAddressBuffer,
    WritableByteAddressBuffer,
    TexelBuffer,
    WritableTexelBuffer,
    Texture,
    WritableTexture,
    Sampler,
    InputAttachment,
    AccelerationStructure,
}

impl DescriptorType {
    #[inline]
    pub fn is_sampler(&self) -> bool {
        matches!(self, DescriptorType::Sampler)
    }

    /// Whether shaders may write through this descriptor.
    pub fn is_writable(&self) -> bool {
        matches!(
            self,
            DescriptorType::WritableStorage
                | DescriptorType::WritableByteAddressBuffer
                | DescriptorType::WritableTexelBuffer
                | DescriptorType::WritableTexture
        )
    }

    pub fn buffer_type(&self) -> BufferType {
        match self {
            DescriptorType::Uniform => BufferType::Uniform,
            DescriptorType::Storage
            | DescriptorType::WritableStorage
            | DescriptorType::ByteAddressBuffer
            | DescriptorType::WritableByteAddressBuffer => BufferType::Storage,
            DescriptorType::TexelBuffer | DescriptorType::WritableTexelBuffer => BufferType::Texel,
            DescriptorType::AccelerationStructure => BufferType::AccelerationStructure,
            DescriptorType::Texture
            | DescriptorType::WritableTexture
            | DescriptorType::Sampler
            | DescriptorType::InputAttachment => BufferType::Other,
        }
    }
}

impl fmt::Display for DescriptorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorType::Uniform => write!(f, "uniform"),
            DescriptorType::Storage => write!(f, "storage"),
            DescriptorType::WritableStorage => write!(f, "writable storage"),
            DescriptorType::ByteAddressBuffer => write!(f, "byte address buffer"),
            DescriptorType::WritableByteAddressBuffer => write!(f, "writable byte address buffer"),
            DescriptorType::TexelBuffer => write!(f, "texel buffer"),
            DescriptorType::WritableTexelBuffer => write!(f, "writable texel buffer"),
            DescriptorType::Texture => write!(f, "texture"),
            DescriptorType::WritableTexture => write!(f, "writable texture"),
            DescriptorType::Sampler => write!(f, "sampler"),
            DescriptorType::InputAttachment => write!(f, "input attachment"),
            DescriptorType::AccelerationStructure => write!(f, "acceleration structure"),
        }
    }
}

/// One binding slot of a descriptor set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DescriptorLayout {
    ty: DescriptorType,
    binding: u32,
    element_size: usize,
    count: u32,
}

impl DescriptorLayout {
    pub fn new(ty: DescriptorType, binding: u32, element_size: usize) -> Self {
        DescriptorLayout {
            ty,
            binding,
            element_size,
            count: 1,
        }
    }

    /// Turns descriptor into an array of `count` descriptors.
    pub fn with_count(self, count: u32) -> Self {
        DescriptorLayout { count, ..self }
    }

    #[inline]
    pub fn descriptor_type(&self) -> DescriptorType {
        self.ty
    }

    #[inline]
    pub fn descriptor_count(&self) -> u32 {
        self.count
    }
}

impl BufferLayout for DescriptorLayout {
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
        self.ty.buffer_type()
    }
}

/// Number of descriptors of each kind in a set, array sizes included.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DescriptorCounts {
    pub uniforms: u32,
    pub storages: u32,
    pub texel_buffers: u32,
    pub textures: u32,
    pub samplers: u32,
    pub input_attachments: u32,
    pub acceleration_structures: u32,
}

impl DescriptorCounts {
    pub fn of(descriptors: &[DescriptorLayout]) -> Self {
        let mut counts = DescriptorCounts::default();
        for descriptor in descriptors {
            let n = descriptor.descriptor_count();
            let slot = match descriptor.descriptor_type() {
                DescriptorType::Uniform => &mut counts.uniforms,
                DescriptorType::Storage
                | DescriptorType::WritableStorage
                | DescriptorType::ByteAddressBuffer
                | DescriptorType::WritableByteAddressBuffer => &mut counts.storages,
                DescriptorType::TexelBuffer | DescriptorType::WritableTexelBuffer => {
                    &mut counts.texel_buffers
                }
                DescriptorType::Texture | DescriptorType::WritableTexture => &mut counts.textures,
                DescriptorType::Sampler => &mut counts.samplers,
                DescriptorType::InputAttachment => &mut counts.input_attachments,
                DescriptorType::AccelerationStructure => &mut counts.acceleration_structures,
            };
            *slot = slot.saturating_add(n);
        }
        counts
    }

    pub fn total(&self) -> u32 {
        [
            self.storages,
            self.texel_buffers,
            self.textures,
            self.samplers,
            self.input_attachments,
            self.acceleration_structures,
        ]
        .into_iter()
        .fold(self.uniforms, u32::saturating_add)
    }
}

impl fmt::Display for DescriptorCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} uniform, {} storage, {} texel, {} texture, {} sampler, {} input attachment, {} acceleration structure",
            self.uniforms,
            self.storages,
            self.texel_buffers,
            self.textures,
            self.samplers,
            self.input_attachments,
            self.acceleration_structures,
        )
    }
}

/// Validated logical description of a descriptor set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorSetLayoutDesc {
    space: u32,
    stages: ShaderStages,
    pool_size: u32,
    descriptors: Vec<DescriptorLayout>,
    counts: DescriptorCounts,
}

impl DescriptorSetLayoutDesc {
    pub fn new(
        space: u32,
        stages: ShaderStages,
        pool_size: u32,
        descriptors: Vec<DescriptorLayout>,
    ) -> Result<Self, Error> {
        if stages.is_empty() {
            return Err(Error::invalid(
                "stages",
                format!("descriptor set {space} is not visible to any shader stage"),
            ));
        }

        if pool_size == 0 {
            return Err(Error::invalid(
                "pool_size",
                format!("descriptor set {space} must allow at least one set per pool"),
            ));
        }

        for (idx, descriptor) in descriptors.iter().enumerate() {
            let binding = descriptor.binding();

            if descriptor.descriptor_count() == 0 {
                return Err(Error::invalid(
                    "descriptors",
                    format!("descriptor at binding {binding} of set {space} has zero count"),
                ));
            }

            if descriptors[..idx].iter().any(|d| d.binding() == binding) {
                return Err(Error::invalid(
                    "descriptors",
                    format!("binding {binding} is used twice in descriptor set {space}"),
                ));
            }

            if descriptor.descriptor_type() == DescriptorType::InputAttachment
                && stages != ShaderStages::FRAGMENT
            {
                return Err(Error::invalid(
                    "stages",
                    format!(
                        "input attachment at binding {binding} requires descriptor set {space} to be visible to the fragment stage only"
                    ),
                ));
            }
        }

        let has_samplers = descriptors.iter().any(|d| d.descriptor_type().is_sampler());
        let has_others = descriptors.iter().any(|d| !d.descriptor_type().is_sampler());
        if has_samplers && has_others {
            return Err(Error::invalid(
                "descriptors",
                format!(
                    "descriptor set {space} mixes samplers with other descriptors, samplers are only allowed in sampler-only descriptor sets"
                ),
            ));
        }

        let counts = DescriptorCounts::of(&descriptors);

        Ok(DescriptorSetLayoutDesc {
            space,
            stages,
            pool_size,
            descriptors,
            counts,
        })
    }

    #[inline]
    pub fn space(&self) -> u32 {
        self.space
    }

    #[inline]
    pub fn stages(&self) -> ShaderStages {
        self.stages
    }

    /// Number of sets a single pool can hold.
    #[inline]
    pub fn pool_size(&self) -> u32 {
        self.pool_size
    }

    #[inline]
    pub fn descriptors(&self) -> &[DescriptorLayout] {
        &self.descriptors
    }

    #[inline]
    pub fn counts(&self) -> &DescriptorCounts {
        &self.counts
    }

    /// Non-empty set that contains only samplers.
    pub fn is_sampler_only(&self) -> bool {
        self.counts.samplers > 0 && self.counts.samplers == self.counts.total()
    }
}

/// Descriptor set layout together with its native layout and pool.
///
/// Sets allocated from the layout go back to its free queue when dropped
/// and are handed out again before the pool is touched.
pub struct DescriptorSetLayout<B: Backend> {
    native: B::DescriptorSetLayout,
    desc: DescriptorSetLayoutDesc,
    free: Mutex<VecDeque<B::DescriptorSet>>,
}

impl<B: Backend> fmt::Debug for DescriptorSetLayout<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.desc, f)
    }
}

impl<B: Backend> DescriptorSetLayout<B> {
    pub fn new(device: &Device<B>, desc: DescriptorSetLayoutDesc) -> Result<Self, Error> {
        let native = B::create_descriptor_set_layout(device, &desc)?;

        if device.config().trace_layouts {
            let diagnostics = device.diagnostics();
            diagnostics.trace(
                "descriptor_set",
                format_args!(
                    "defined descriptor set {} with {} descriptors for stages {:?} (pool size {}): {}",
                    desc.space,
                    desc.descriptors.len(),
                    desc.stages,
                    desc.pool_size,
                    desc.counts,
                ),
            );

            for (idx, descriptor) in desc.descriptors.iter().enumerate() {
                diagnostics.trace(
                    "descriptor_set",
                    format_args!(
                        "  descriptor {idx}: {} (element size {}, binding {}, count {})",
                        descriptor.descriptor_type(),
                        descriptor.element_size(),
                        descriptor.binding(),
                        descriptor.descriptor_count(),
                    ),
                );
            }
        }

        Ok(DescriptorSetLayout {
            native,
            desc,
            free: Mutex::new(VecDeque::new()),
        })
    }

    #[inline]
    pub fn desc(&self) -> &DescriptorSetLayoutDesc {
        &self.desc
    }

    #[inline]
    pub fn space(&self) -> u32 {
        self.desc.space
    }

    #[inline]
    pub fn stages(&self) -> ShaderStages {
        self.desc.stages
    }

    #[inline]
    pub fn pool_size(&self) -> u32 {
        self.desc.pool_size
    }

    #[inline]
    pub fn descriptors(&self) -> &[DescriptorLayout] {
        &self.desc.descriptors
    }

    pub fn descriptor(&self, binding: u32) -> Result<&DescriptorLayout, Error> {
        self.desc
            .descriptors
            .iter()
            .find(|d| d.binding() == binding)
            .ok_or_else(|| {
                Error::out_of_range(
                    "binding",
                    format!(
                        "no descriptor is bound to binding {binding} of set {}",
                        self.desc.space
                    ),
                )
            })
    }

    pub fn uniforms(&self) -> u32 {
        self.desc.counts.uniforms
    }

    pub fn storages(&self) -> u32 {
        self.desc.counts.storages
    }

    pub fn textures(&self) -> u32 {
        self.desc.counts.textures
    }

    pub fn samplers(&self) -> u32 {
        self.desc.counts.samplers
    }

    pub fn input_attachments(&self) -> u32 {
        self.desc.counts.input_attachments
    }

    #[inline]
    pub fn native(&self) -> &B::DescriptorSetLayout {
        &self.native
    }

    /// Takes a recycled set or allocates a new one from the pool.
    pub fn allocate(&self) -> Result<DescriptorSet<'_, B>, Error> {
        if self.desc.descriptors.is_empty() {
            return Err(Error::invalid(
                "descriptors",
                format!(
                    "descriptor set {} has no descriptors to allocate",
                    self.desc.space
                ),
            ));
        }

        let mut free = self.free.lock();
        let native = match free.pop_front() {
            Some(native) => native,
            None => B::allocate_descriptor_set(&self.native)?,
        };

        Ok(DescriptorSet {
            layout: self,
            native: ManuallyDrop::new(native),
        })
    }

    /// Allocates `count` sets. Sets allocated before a failure are recycled.
    pub fn allocate_many(&self, count: u32) -> Result<Vec<DescriptorSet<'_, B>>, Error> {
        (0..count).map(|_| self.allocate()).collect()
    }

    /// Returns the set to the free queue.
    ///
    /// Same as dropping it, but rejects sets of other layouts.
    pub fn free(&self, set: DescriptorSet<'_, B>) -> Result<(), Error> {
        if !ptr::eq(set.layout, self) {
            return Err(Error::invalid(
                "descriptor_set",
                format!(
                    "descriptor set of space {} was not allocated from the layout of space {}",
                    set.layout.desc.space, self.desc.space
                ),
            ));
        }
        drop(set);
        Ok(())
    }

    /// Number of sets waiting in the free queue.
    pub fn recycled(&self) -> usize {
        self.free.lock().len()
    }
}

/// Descriptor set allocated from a [`DescriptorSetLayout`].
pub struct DescriptorSet<'a, B: Backend> {
    layout: &'a DescriptorSetLayout<B>,
    native: ManuallyDrop<B::DescriptorSet>,
}

impl<B: Backend> fmt::Debug for DescriptorSet<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorSet")
            .field("space", &self.layout.desc.space)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Drop for DescriptorSet<'_, B> {
    fn drop(&mut self) {
        // SAFETY: `native` is never touched again after this.
        let native = unsafe { ManuallyDrop::take(&mut self.native) };
        self.layout.free.lock().push_back(native);
    }
}

impl<'a, B: Backend> DescriptorSet<'a, B> {
    #[inline]
    pub fn layout(&self) -> &'a DescriptorSetLayout<B> {
        self.layout
    }

    #[inline]
    pub fn space(&self) -> u32 {
        self.layout.desc.space
    }

    #[inline]
    pub fn native(&self) -> &B::DescriptorSet {
        &self.native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(
        stages: ShaderStages,
        descriptors: Vec<DescriptorLayout>,
    ) -> Result<DescriptorSetLayoutDesc, Error> {
        DescriptorSetLayoutDesc::new(0, stages, 1, descriptors)
    }

    #[test]
    fn sampler_with_uniform_fails() {
        let err = set(
            ShaderStages::FRAGMENT,
            vec![
                DescriptorLayout::new(DescriptorType::Sampler, 0, 0),
                DescriptorLayout::new(DescriptorType::Uniform, 1, 64),
            ],
        )
        .unwrap_err();
        assert!(err.to_string().contains("sampler-only"));
    }

    #[test]
    fn sampler_only_set() {
        let desc = set(
            ShaderStages::FRAGMENT,
            vec![
                DescriptorLayout::new(DescriptorType::Sampler, 0, 0),
                DescriptorLayout::new(DescriptorType::Sampler, 1, 0).with_count(4),
            ],
        )
        .unwrap();
        assert!(desc.is_sampler_only());
        assert_eq!(desc.counts().samplers, 5);
    }

    #[test]
    fn counts_include_textures_and_attachments() {
        let desc = set(
            ShaderStages::FRAGMENT,
            vec![
                DescriptorLayout::new(DescriptorType::Uniform, 0, 64),
                DescriptorLayout::new(DescriptorType::Texture, 1, 0).with_count(8),
                DescriptorLayout::new(DescriptorType::InputAttachment, 2, 0),
                DescriptorLayout::new(DescriptorType::WritableByteAddressBuffer, 3, 4),
                DescriptorLayout::new(DescriptorType::Storage, 4, 16),
            ],
        )
        .unwrap();

        let counts = desc.counts();
        assert_eq!(counts.uniforms, 1);
        assert_eq!(counts.textures, 8);
        assert_eq!(counts.input_attachments, 1);
        assert_eq!(counts.storages, 2);
        assert_eq!(counts.total(), 12);
        assert!(!desc.is_sampler_only());
    }

    #[test]
    fn duplicate_binding_within_set() {
        let err = set(
            ShaderStages::VERTEX,
            vec![
                DescriptorLayout::new(DescriptorType::Uniform, 0, 64),
                DescriptorLayout::new(DescriptorType::Storage, 0, 64),
            ],
        )
        .unwrap_err();
        assert!(err.to_string().contains("binding 0"));
    }

    #[test]
    fn input_attachment_requires_fragment_only_set() {
        let err = set(
            ShaderStages::VERTEX | ShaderStages::FRAGMENT,
            vec![DescriptorLayout::new(DescriptorType::InputAttachment, 0, 0)],
        )
        .unwrap_err();
        assert_eq!(err.argument(), Some("stages"));
    }

    #[test]
    fn invalid_pool_and_stages() {
        let err = DescriptorSetLayoutDesc::new(1, ShaderStages::VERTEX, 0, Vec::new()).unwrap_err();
        assert_eq!(err.argument(), Some("pool_size"));

        let err =
            DescriptorSetLayoutDesc::new(1, ShaderStages::empty(), 1, Vec::new()).unwrap_err();
        assert_eq!(err.argument(), Some("stages"));

        let err = set(
            ShaderStages::VERTEX,
            vec![DescriptorLayout::new(DescriptorType::Uniform, 0, 64).with_count(0)],
        )
        .unwrap_err();
        assert_eq!(err.argument(), Some("descriptors"));
    }

    #[test]
    fn descriptor_queries_are_stable() {
        let descriptor = DescriptorLayout::new(DescriptorType::WritableTexelBuffer, 5, 16);
        for _ in 0..2 {
            assert_eq!(descriptor.element_size(), 16);
            assert_eq!(descriptor.binding(), 5);
            assert_eq!(descriptor.buffer_type(), BufferType::Texel);
            assert_eq!(descriptor.descriptor_type(), DescriptorType::WritableTexelBuffer);
            assert_eq!(descriptor.descriptor_count(), 1);
        }
        assert!(descriptor.descriptor_type().is_writable());
    }
}
