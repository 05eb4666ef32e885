use std::{fmt, sync::Arc};

use ash::vk;
use smallvec::SmallVec;

use crate::generic::{
    BufferLayout, ComputePipelineDesc, Error, RenderPipelineDesc, ShaderModule, MAX_COLOR_TARGETS,
};

use super::{from::IntoAsh, native_error, Vulkan, VulkanDevice};

pub struct Pipeline<D: VulkanDevice> {
    handle: vk::Pipeline,
    owner: Arc<D>,
}

impl<D: VulkanDevice> fmt::Debug for Pipeline<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pipeline").field(&self.handle).finish()
    }
}

impl<D: VulkanDevice> Drop for Pipeline<D> {
    fn drop(&mut self) {
        unsafe { self.owner.destroy_pipeline(self.handle) }
    }
}

impl<D: VulkanDevice> Pipeline<D> {
    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.handle
    }
}

fn stage_info<D: VulkanDevice>(
    module: &ShaderModule<Vulkan<D>>,
) -> vk::PipelineShaderStageCreateInfo<'_> {
    vk::PipelineShaderStageCreateInfo::default()
        .stage(module.stage().into_ash())
        .module(module.native().handle())
        .name(module.native().entry())
}

pub(super) fn create_compute_pipeline<D: VulkanDevice>(
    owner: &Arc<D>,
    desc: &ComputePipelineDesc<'_, Vulkan<D>>,
) -> Result<Pipeline<D>, Error> {
    let info = vk::ComputePipelineCreateInfo::default()
        .stage(stage_info(desc.module))
        .layout(desc.layout.native().handle());

    let handle = unsafe { owner.create_compute_pipeline(&info) }
        .map_err(|err| native_error(err, "compute pipeline"))?;

    Ok(Pipeline {
        handle,
        owner: owner.clone(),
    })
}

pub(super) fn create_render_pipeline<D: VulkanDevice>(
    owner: &Arc<D>,
    desc: &RenderPipelineDesc<'_, Vulkan<D>>,
) -> Result<Pipeline<D>, Error> {
    let stages: SmallVec<[vk::PipelineShaderStageCreateInfo; 5]> =
        desc.program.modules().iter().map(stage_info).collect();

    let mut vertex_bindings = Vec::new();
    let mut vertex_attributes = Vec::new();

    for layout in desc.input_assembler.vertex_buffer_layouts() {
        let stride = u32::try_from(layout.element_size()).map_err(|_| {
            Error::invalid(
                "input_assembler",
                format!(
                    "stride of vertex buffer {} does not fit into 32 bits",
                    layout.binding()
                ),
            )
        })?;

        vertex_bindings.push(
            vk::VertexInputBindingDescription::default()
                .binding(layout.binding())
                .stride(stride)
                .input_rate(vk::VertexInputRate::VERTEX),
        );

        for attribute in layout.attributes() {
            vertex_attributes.push(
                vk::VertexInputAttributeDescription::default()
                    .location(attribute.location())
                    .binding(attribute.binding())
                    .format(attribute.format().into_ash())
                    .offset(attribute.offset()),
            );
        }
    }

    let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
        .vertex_binding_descriptions(&vertex_bindings)
        .vertex_attribute_descriptions(&vertex_attributes);

    let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
        .topology(desc.input_assembler.topology().into_ash())
        .primitive_restart_enable(desc.input_assembler.primitive_restart());

    let viewport = vk::PipelineViewportStateCreateInfo::default()
        .viewport_count(1)
        .scissor_count(1);

    let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
        .polygon_mode(desc.rasterizer.polygon_mode.into_ash())
        .cull_mode(desc.rasterizer.cull_mode.into_ash())
        .front_face(desc.rasterizer.cull_order.into_ash())
        .line_width(desc.rasterizer.line_width);

    let multisample = vk::PipelineMultisampleStateCreateInfo::default()
        .rasterization_samples(vk::SampleCountFlags::TYPE_1);

    let depth_stencil = match desc.depth_format {
        Some(_) => vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(true)
            .depth_write_enable(true)
            .depth_compare_op(vk::CompareOp::LESS_OR_EQUAL),
        None => vk::PipelineDepthStencilStateCreateInfo::default(),
    };

    let blend_attachments: SmallVec<[vk::PipelineColorBlendAttachmentState; MAX_COLOR_TARGETS]> =
        desc.color_formats
            .iter()
            .map(|_| {
                vk::PipelineColorBlendAttachmentState::default().color_write_mask(
                    vk::ColorComponentFlags::R
                        | vk::ColorComponentFlags::G
                        | vk::ColorComponentFlags::B
                        | vk::ColorComponentFlags::A,
                )
            })
            .collect();

    let color_blend =
        vk::PipelineColorBlendStateCreateInfo::default().attachments(&blend_attachments);

    let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
    let dynamic = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

    let color_formats: SmallVec<[vk::Format; MAX_COLOR_TARGETS]> = desc
        .color_formats
        .iter()
        .map(|&format| format.into_ash())
        .collect();

    let depth_format = desc
        .depth_format
        .map_or(vk::Format::UNDEFINED, |format| format.into_ash());

    let stencil_format = match desc.depth_format {
        Some(format) if format.is_stencil() => format.into_ash(),
        _ => vk::Format::UNDEFINED,
    };

    let mut rendering = vk::PipelineRenderingCreateInfo::default()
        .color_attachment_formats(&color_formats)
        .depth_attachment_format(depth_format)
        .stencil_attachment_format(stencil_format);

    let info = vk::GraphicsPipelineCreateInfo::default()
        .push_next(&mut rendering)
        .stages(&stages)
        .vertex_input_state(&vertex_input)
        .input_assembly_state(&input_assembly)
        .viewport_state(&viewport)
        .rasterization_state(&rasterization)
        .multisample_state(&multisample)
        .depth_stencil_state(&depth_stencil)
        .color_blend_state(&color_blend)
        .dynamic_state(&dynamic)
        .layout(desc.layout.native().handle());

    let handle = unsafe { owner.create_graphics_pipeline(&info) }
        .map_err(|err| native_error(err, "render pipeline"))?;

    Ok(Pipeline {
        handle,
        owner: owner.clone(),
    })
}
