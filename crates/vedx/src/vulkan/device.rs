use ash::vk;

/// Native device calls used to create and destroy layout objects.
///
/// Implemented for [`ash::Device`]. All functions forward to the
/// corresponding Vulkan commands without allocation callbacks.
pub trait VulkanDevice: Send + Sync + 'static {
    /// # Safety
    ///
    /// `info` must be valid for `vkCreateDescriptorSetLayout`.
    unsafe fn create_descriptor_set_layout(
        &self,
        info: &vk::DescriptorSetLayoutCreateInfo<'_>,
    ) -> Result<vk::DescriptorSetLayout, vk::Result>;

    /// # Safety
    ///
    /// `layout` must be created by this device and not used anymore.
    unsafe fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout);

    /// # Safety
    ///
    /// `info` must be valid for `vkCreateDescriptorPool`.
    unsafe fn create_descriptor_pool(
        &self,
        info: &vk::DescriptorPoolCreateInfo<'_>,
    ) -> Result<vk::DescriptorPool, vk::Result>;

    /// # Safety
    ///
    /// `pool` must be created by this device and not used anymore.
    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool);

    /// Allocates exactly one set.
    ///
    /// # Safety
    ///
    /// `info` must be valid for `vkAllocateDescriptorSets`
    /// and reference exactly one set layout.
    unsafe fn allocate_descriptor_set(
        &self,
        info: &vk::DescriptorSetAllocateInfo<'_>,
    ) -> Result<vk::DescriptorSet, vk::Result>;

    /// # Safety
    ///
    /// `info` must be valid for `vkCreatePipelineLayout`.
    unsafe fn create_pipeline_layout(
        &self,
        info: &vk::PipelineLayoutCreateInfo<'_>,
    ) -> Result<vk::PipelineLayout, vk::Result>;

    /// # Safety
    ///
    /// `layout` must be created by this device and not used anymore.
    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout);

    /// # Safety
    ///
    /// `info` must be valid for `vkCreateShaderModule`.
    unsafe fn create_shader_module(
        &self,
        info: &vk::ShaderModuleCreateInfo<'_>,
    ) -> Result<vk::ShaderModule, vk::Result>;

    /// # Safety
    ///
    /// `module` must be created by this device and not used anymore.
    unsafe fn destroy_shader_module(&self, module: vk::ShaderModule);

    /// # Safety
    ///
    /// `info` must be valid for `vkCreateComputePipelines`.
    unsafe fn create_compute_pipeline(
        &self,
        info: &vk::ComputePipelineCreateInfo<'_>,
    ) -> Result<vk::Pipeline, vk::Result>;

    /// # Safety
    ///
    /// `info` must be valid for `vkCreateGraphicsPipelines`.
    unsafe fn create_graphics_pipeline(
        &self,
        info: &vk::GraphicsPipelineCreateInfo<'_>,
    ) -> Result<vk::Pipeline, vk::Result>;

    /// # Safety
    ///
    /// `pipeline` must be created by this device and not used anymore.
    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline);
}

fn first_pipeline(
    result: Result<Vec<vk::Pipeline>, (Vec<vk::Pipeline>, vk::Result)>,
) -> Result<vk::Pipeline, vk::Result> {
    match result {
        Ok(pipelines) => pipelines.into_iter().next().ok_or(vk::Result::ERROR_UNKNOWN),
        Err((_, err)) => Err(err),
    }
}

impl VulkanDevice for ash::Device {
    unsafe fn create_descriptor_set_layout(
        &self,
        info: &vk::DescriptorSetLayoutCreateInfo<'_>,
    ) -> Result<vk::DescriptorSetLayout, vk::Result> {
        unsafe { ash::Device::create_descriptor_set_layout(self, info, None) }
    }

    unsafe fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        unsafe { ash::Device::destroy_descriptor_set_layout(self, layout, None) }
    }

    unsafe fn create_descriptor_pool(
        &self,
        info: &vk::DescriptorPoolCreateInfo<'_>,
    ) -> Result<vk::DescriptorPool, vk::Result> {
        unsafe { ash::Device::create_descriptor_pool(self, info, None) }
    }

    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        unsafe { ash::Device::destroy_descriptor_pool(self, pool, None) }
    }

    unsafe fn allocate_descriptor_set(
        &self,
        info: &vk::DescriptorSetAllocateInfo<'_>,
    ) -> Result<vk::DescriptorSet, vk::Result> {
        let sets = unsafe { ash::Device::allocate_descriptor_sets(self, info) }?;
        sets.into_iter().next().ok_or(vk::Result::ERROR_UNKNOWN)
    }

    unsafe fn create_pipeline_layout(
        &self,
        info: &vk::PipelineLayoutCreateInfo<'_>,
    ) -> Result<vk::PipelineLayout, vk::Result> {
        unsafe { ash::Device::create_pipeline_layout(self, info, None) }
    }

    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        unsafe { ash::Device::destroy_pipeline_layout(self, layout, None) }
    }

    unsafe fn create_shader_module(
        &self,
        info: &vk::ShaderModuleCreateInfo<'_>,
    ) -> Result<vk::ShaderModule, vk::Result> {
        unsafe { ash::Device::create_shader_module(self, info, None) }
    }

    unsafe fn destroy_shader_module(&self, module: vk::ShaderModule) {
        unsafe { ash::Device::destroy_shader_module(self, module, None) }
    }

    unsafe fn create_compute_pipeline(
        &self,
        info: &vk::ComputePipelineCreateInfo<'_>,
    ) -> Result<vk::Pipeline, vk::Result> {
        let result = unsafe {
            ash::Device::create_compute_pipelines(
                self,
                vk::PipelineCache::null(),
                std::slice::from_ref(info),
                None,
            )
        };
        first_pipeline(result)
    }

    unsafe fn create_graphics_pipeline(
        &self,
        info: &vk::GraphicsPipelineCreateInfo<'_>,
    ) -> Result<vk::Pipeline, vk::Result> {
        let result = unsafe {
            ash::Device::create_graphics_pipelines(
                self,
                vk::PipelineCache::null(),
                std::slice::from_ref(info),
                None,
            )
        };
        first_pipeline(result)
    }

    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        unsafe { ash::Device::destroy_pipeline(self, pipeline, None) }
    }
}
