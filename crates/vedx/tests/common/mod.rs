#![allow(dead_code)]

use std::{
    collections::HashSet,
    slice,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
};

use ash::vk::{self, Handle};
use parking_lot::Mutex;
use vedx::{
    dx12::{
        DescriptorHeapDesc, Dx12, Dx12Device, GraphicsPipelineStateDesc, InputElementDesc,
        NativeError, PrimitiveTopologyType, RootSignatureDesc, StripCutValue,
    },
    vulkan::{Vulkan, VulkanDevice},
    Config, Device, Diagnostics, PixelFormat, RecordingSink, ShaderModule, ShaderProgram,
    ShaderStage,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Smallest SPIR-V module header `ash::util::read_spv` accepts.
pub fn spirv() -> Vec<u8> {
    [0x0723_0203u32, 0x0001_0000, 0, 1, 0]
        .iter()
        .flat_map(|word| word.to_le_bytes())
        .collect()
}

/// DXBC container with given parts.
pub fn dxbc(parts: &[&[u8; 4]]) -> Vec<u8> {
    let header = 32 + parts.len() * 4;
    let total = header + parts.len() * 8;

    let mut code = b"DXBC".to_vec();
    code.extend_from_slice(&[0; 16]);
    code.extend_from_slice(&1u32.to_le_bytes());
    code.extend_from_slice(&(total as u32).to_le_bytes());
    code.extend_from_slice(&(parts.len() as u32).to_le_bytes());
    for idx in 0..parts.len() {
        code.extend_from_slice(&((header + idx * 8) as u32).to_le_bytes());
    }
    for part in parts {
        code.extend_from_slice(*part);
        code.extend_from_slice(&0u32.to_le_bytes());
    }
    code
}

pub fn dxil() -> Vec<u8> {
    dxbc(&[b"SFI0", b"DXIL"])
}

/// Native call a fake device can be told to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    SetLayout,
    Pool,
    DescriptorSet,
    PipelineLayout,
    ShaderModule,
    Pipeline,
    RootSignature,
    Heap,
    PipelineState,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub binding: u32,
    pub ty: vk::DescriptorType,
    pub count: u32,
    pub stages: vk::ShaderStageFlags,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pool {
    pub max_sets: u32,
    pub sizes: Vec<(vk::DescriptorType, u32)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub set_layouts: Vec<u64>,
    pub push_constants: Vec<(vk::ShaderStageFlags, u32, u32)>,
}

#[derive(Debug, Default)]
pub struct VulkanState {
    pub live: HashSet<u64>,
    pub set_layouts: Vec<(u64, Vec<Binding>)>,
    pub pools: Vec<Pool>,
    /// Allocated sets as `(pool, set layout, set)`. Released with their pool.
    pub descriptor_sets: Vec<(u64, u64, u64)>,
    pub pipeline_layouts: Vec<Layout>,
    pub pipelines: Vec<u32>,
    pub fail: Option<Call>,
}

/// Records what would be created on a Vulkan device.
#[derive(Debug, Default)]
pub struct FakeVulkanDevice {
    next: AtomicU64,
    pub state: Mutex<VulkanState>,
}

impl FakeVulkanDevice {
    pub fn fail(&self, call: Call) {
        self.state.lock().fail = Some(call);
    }

    pub fn recover(&self) {
        self.state.lock().fail = None;
    }

    pub fn live(&self) -> usize {
        self.state.lock().live.len()
    }

    fn create<H: Handle>(&self, call: Call) -> Result<H, vk::Result> {
        let mut state = self.state.lock();
        if state.fail == Some(call) {
            return Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
        }
        let raw = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        state.live.insert(raw);
        Ok(H::from_raw(raw))
    }

    fn destroy<H: Handle>(&self, handle: H) {
        let raw = handle.as_raw();
        let removed = self.state.lock().live.remove(&raw);
        assert!(removed, "handle {raw:#x} destroyed twice");
    }
}

unsafe fn raw_slice<'a, T>(ptr: *const T, len: u32) -> &'a [T] {
    if len == 0 {
        &[]
    } else {
        unsafe { slice::from_raw_parts(ptr, len as usize) }
    }
}

impl VulkanDevice for FakeVulkanDevice {
    unsafe fn create_descriptor_set_layout(
        &self,
        info: &vk::DescriptorSetLayoutCreateInfo<'_>,
    ) -> Result<vk::DescriptorSetLayout, vk::Result> {
        let handle: vk::DescriptorSetLayout = self.create(Call::SetLayout)?;
        let bindings = unsafe { raw_slice(info.p_bindings, info.binding_count) }
            .iter()
            .map(|b| Binding {
                binding: b.binding,
                ty: b.descriptor_type,
                count: b.descriptor_count,
                stages: b.stage_flags,
            })
            .collect();
        self.state
            .lock()
            .set_layouts
            .push((handle.as_raw(), bindings));
        Ok(handle)
    }

    unsafe fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        self.destroy(layout)
    }

    unsafe fn create_descriptor_pool(
        &self,
        info: &vk::DescriptorPoolCreateInfo<'_>,
    ) -> Result<vk::DescriptorPool, vk::Result> {
        let handle = self.create(Call::Pool)?;
        let sizes = unsafe { raw_slice(info.p_pool_sizes, info.pool_size_count) }
            .iter()
            .map(|s| (s.ty, s.descriptor_count))
            .collect();
        self.state.lock().pools.push(Pool {
            max_sets: info.max_sets,
            sizes,
        });
        Ok(handle)
    }

    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        self.destroy(pool)
    }

    unsafe fn allocate_descriptor_set(
        &self,
        info: &vk::DescriptorSetAllocateInfo<'_>,
    ) -> Result<vk::DescriptorSet, vk::Result> {
        let mut state = self.state.lock();
        if state.fail == Some(Call::DescriptorSet) {
            return Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY);
        }
        assert!(
            state.live.contains(&info.descriptor_pool.as_raw()),
            "allocation from a destroyed pool"
        );

        let layouts = unsafe { raw_slice(info.p_set_layouts, info.descriptor_set_count) };
        assert_eq!(layouts.len(), 1);

        let raw = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        state
            .descriptor_sets
            .push((info.descriptor_pool.as_raw(), layouts[0].as_raw(), raw));
        Ok(vk::DescriptorSet::from_raw(raw))
    }

    unsafe fn create_pipeline_layout(
        &self,
        info: &vk::PipelineLayoutCreateInfo<'_>,
    ) -> Result<vk::PipelineLayout, vk::Result> {
        let handle = self.create(Call::PipelineLayout)?;
        let set_layouts = unsafe { raw_slice(info.p_set_layouts, info.set_layout_count) }
            .iter()
            .map(|l| l.as_raw())
            .collect();
        let push_constants =
            unsafe { raw_slice(info.p_push_constant_ranges, info.push_constant_range_count) }
                .iter()
                .map(|r| (r.stage_flags, r.offset, r.size))
                .collect();
        self.state.lock().pipeline_layouts.push(Layout {
            set_layouts,
            push_constants,
        });
        Ok(handle)
    }

    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        self.destroy(layout)
    }

    unsafe fn create_shader_module(
        &self,
        _info: &vk::ShaderModuleCreateInfo<'_>,
    ) -> Result<vk::ShaderModule, vk::Result> {
        self.create(Call::ShaderModule)
    }

    unsafe fn destroy_shader_module(&self, module: vk::ShaderModule) {
        self.destroy(module)
    }

    unsafe fn create_compute_pipeline(
        &self,
        _info: &vk::ComputePipelineCreateInfo<'_>,
    ) -> Result<vk::Pipeline, vk::Result> {
        let handle = self.create(Call::Pipeline)?;
        self.state.lock().pipelines.push(1);
        Ok(handle)
    }

    unsafe fn create_graphics_pipeline(
        &self,
        info: &vk::GraphicsPipelineCreateInfo<'_>,
    ) -> Result<vk::Pipeline, vk::Result> {
        let handle = self.create(Call::Pipeline)?;
        self.state.lock().pipelines.push(info.stage_count);
        Ok(handle)
    }

    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        self.destroy(pipeline)
    }
}

pub type FakeVulkan = Vulkan<FakeVulkanDevice>;

pub fn vulkan_device() -> (Device<FakeVulkan>, Arc<RecordingSink>) {
    let (diagnostics, sink) = Diagnostics::recording();
    let device = Device::from_parts(
        Arc::new(FakeVulkanDevice::default()),
        Config::default(),
        diagnostics,
    );
    (device, sink)
}

pub fn vulkan_module(device: &Device<FakeVulkan>, stage: ShaderStage) -> ShaderModule<FakeVulkan> {
    ShaderModule::from_bytes(device, stage, &format!("{stage}.spv"), "main", spirv()).unwrap()
}

pub fn vulkan_program(
    device: &Device<FakeVulkan>,
    stages: &[ShaderStage],
) -> Arc<ShaderProgram<FakeVulkan>> {
    let modules = stages.iter().map(|&s| vulkan_module(device, s)).collect();
    Arc::new(ShaderProgram::new(modules).unwrap())
}

/// Native object of the fake D3D12 device. Counts itself as live until dropped.
#[derive(Debug)]
pub struct FakeObject {
    pub id: u64,
    live: Arc<AtomicUsize>,
}

impl Drop for FakeObject {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphicsState {
    pub stages: Vec<ShaderStage>,
    pub input_elements: Vec<InputElementDesc>,
    pub topology_type: PrimitiveTopologyType,
    pub strip_cut: StripCutValue,
    pub render_targets: Vec<PixelFormat>,
    pub depth_stencil: Option<PixelFormat>,
}

#[derive(Debug, Default)]
pub struct Dx12State {
    pub root_signatures: Vec<RootSignatureDesc>,
    pub heaps: Vec<DescriptorHeapDesc>,
    pub graphics: Vec<GraphicsState>,
    pub compute: usize,
    pub fail: Option<Call>,
}

/// Records what would be created on a D3D12 device.
#[derive(Debug, Default)]
pub struct FakeDx12Device {
    next: AtomicU64,
    live: Arc<AtomicUsize>,
    pub state: Mutex<Dx12State>,
}

impl FakeDx12Device {
    pub fn fail(&self, call: Call) {
        self.state.lock().fail = Some(call);
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    fn create(&self, call: Call) -> Result<FakeObject, NativeError> {
        if self.state.lock().fail == Some(call) {
            return Err(NativeError {
                code: 0x8007_000Eu32 as i32,
                message: "out of memory".to_owned(),
            });
        }
        self.live.fetch_add(1, Ordering::Relaxed);
        Ok(FakeObject {
            id: self.next.fetch_add(1, Ordering::Relaxed) + 1,
            live: self.live.clone(),
        })
    }
}

impl Dx12Device for FakeDx12Device {
    type RootSignature = FakeObject;
    type DescriptorHeap = FakeObject;
    type PipelineState = FakeObject;

    fn create_root_signature(&self, desc: &RootSignatureDesc) -> Result<FakeObject, NativeError> {
        let object = self.create(Call::RootSignature)?;
        self.state.lock().root_signatures.push(desc.clone());
        Ok(object)
    }

    fn create_descriptor_heap(&self, desc: &DescriptorHeapDesc) -> Result<FakeObject, NativeError> {
        let object = self.create(Call::Heap)?;
        self.state.lock().heaps.push(*desc);
        Ok(object)
    }

    fn create_compute_pipeline_state(
        &self,
        _root_signature: &FakeObject,
        _shader: &[u8],
    ) -> Result<FakeObject, NativeError> {
        let object = self.create(Call::PipelineState)?;
        self.state.lock().compute += 1;
        Ok(object)
    }

    fn create_graphics_pipeline_state(
        &self,
        _root_signature: &FakeObject,
        desc: &GraphicsPipelineStateDesc<'_>,
    ) -> Result<FakeObject, NativeError> {
        let object = self.create(Call::PipelineState)?;
        self.state.lock().graphics.push(GraphicsState {
            stages: desc.shaders.iter().map(|(stage, _)| *stage).collect(),
            input_elements: desc.input_elements.clone(),
            topology_type: desc.topology_type,
            strip_cut: desc.strip_cut,
            render_targets: desc.render_target_formats.to_vec(),
            depth_stencil: desc.depth_stencil_format,
        });
        Ok(object)
    }
}

pub type FakeDx12 = Dx12<FakeDx12Device>;

pub fn dx12_device() -> (Device<FakeDx12>, Arc<RecordingSink>) {
    let (diagnostics, sink) = Diagnostics::recording();
    let device = Device::from_parts(FakeDx12Device::default(), Config::default(), diagnostics);
    (device, sink)
}

pub fn dx12_program(
    device: &Device<FakeDx12>,
    stages: &[ShaderStage],
) -> Arc<ShaderProgram<FakeDx12>> {
    let modules = stages
        .iter()
        .map(|&stage| {
            ShaderModule::from_bytes(device, stage, &format!("{stage}.dxi"), "main", dxil())
                .unwrap()
        })
        .collect();
    Arc::new(ShaderProgram::new(modules).unwrap())
}
