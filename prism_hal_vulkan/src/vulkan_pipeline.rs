/// Render and compute pipeline states for Vulkan
///
/// Each pipeline owns one descriptor set layout (set 0, push-descriptor
/// capable when the extension is enabled), a pipeline layout with a single
/// push constant range sized from reflection, and the `VkPipeline`.
/// Viewport, scissor, depth bias, stencil reference and blend constants are
/// dynamic.

use ash::vk;
use std::any::Any;
use std::sync::Arc;
use prism_hal::hal_error;
use prism_hal::prism::{Error, Result};
use prism_hal::prism::binder::{LayoutSources, PipelineLayout};
use prism_hal::prism::device::{
    ComputePipelineDesc, ComputePipelineState, DeviceFeatures, PolygonMode, RenderPipelineDesc,
    RenderPipelineState, ShaderModule, ShaderStage,
};
use crate::vulkan_context::VulkanContext;
use crate::vulkan_conversions::{
    blend_factor_to_vk, blend_op_to_vk, color_write_mask_to_vk, compare_op_to_vk, cull_mode_to_vk,
    descriptor_kind_to_vk, front_face_to_vk, input_rate_to_vk, native_error, polygon_mode_to_vk,
    sample_count_to_vk, shader_stage_to_vk, shader_stages_to_vk, stencil_op_state_to_vk, texture_format_to_vk, topology_to_vk,
    vertex_format_to_vk, COLOR_RESTING_LAYOUT, DEPTH_RESTING_LAYOUT,
};
use crate::vulkan_render_pass_builder::VulkanRenderPassBuilder;
use crate::vulkan_shader::VulkanShaderModule;

const DYNAMIC_STATES: [vk::DynamicState; 5] = [
    vk::DynamicState::VIEWPORT,
    vk::DynamicState::SCISSOR,
    vk::DynamicState::DEPTH_BIAS,
    vk::DynamicState::STENCIL_REFERENCE,
    vk::DynamicState::BLEND_CONSTANTS,
];

fn downcast_module<'a>(module: &'a Arc<dyn ShaderModule>, expected: ShaderStage) -> Result<&'a VulkanShaderModule> {
    let module = module.as_any().downcast_ref::<VulkanShaderModule>().ok_or_else(|| {
        hal_error!("prism::vulkan::Pipeline", "Shader module was not created by the Vulkan device");
        Error::InvalidResource("Shader module is not a Vulkan shader module".to_string())
    })?;
    if module.stage() != expected {
        hal_error!("prism::vulkan::Pipeline", "Expected a {:?} shader, got {:?}", expected, module.stage());
        return Err(Error::InvalidResource(format!("Expected a {:?} shader module", expected)));
    }
    Ok(module)
}

/// Descriptor set layout + pipeline layout shared by both pipeline kinds
struct LayoutObjects {
    set_layout: vk::DescriptorSetLayout,
    pipeline_layout: vk::PipelineLayout,
    push_constant_stages: vk::ShaderStageFlags,
}

impl LayoutObjects {
    fn new(ctx: &VulkanContext, layout: &PipelineLayout, push_constant_stages: vk::ShaderStageFlags) -> Result<Self> {
        let bindings: Vec<vk::DescriptorSetLayoutBinding> = layout
            .descriptor_bindings()
            .iter()
            .map(|d| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(d.binding)
                    .descriptor_type(descriptor_kind_to_vk(d.kind))
                    .descriptor_count(1)
                    .stage_flags(shader_stages_to_vk(d.stages))
            })
            .collect();

        let flags = if ctx.push_descriptor.is_some() {
            vk::DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR_KHR
        } else {
            vk::DescriptorSetLayoutCreateFlags::empty()
        };
        let set_layout_info = vk::DescriptorSetLayoutCreateInfo::default().flags(flags).bindings(&bindings);

        unsafe {
            let set_layout = ctx
                .device
                .create_descriptor_set_layout(&set_layout_info, None)
                .map_err(|e| native_error("descriptor set layout", e))?;

            // Push constant ranges must be a multiple of 4 bytes
            let push_constant_size = layout.push_constant_size().next_multiple_of(4);
            let ranges = [vk::PushConstantRange { stage_flags: push_constant_stages, offset: 0, size: push_constant_size }];
            let set_layouts = [set_layout];
            let mut layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
            if push_constant_size > 0 {
                layout_info = layout_info.push_constant_ranges(&ranges);
            }

            let pipeline_layout = match ctx.device.create_pipeline_layout(&layout_info, None) {
                Ok(pipeline_layout) => pipeline_layout,
                Err(e) => {
                    ctx.device.destroy_descriptor_set_layout(set_layout, None);
                    return Err(native_error("pipeline layout", e));
                }
            };

            Ok(Self { set_layout, pipeline_layout, push_constant_stages })
        }
    }

    fn destroy(&self, ctx: &VulkanContext) {
        unsafe {
            ctx.device.destroy_pipeline_layout(self.pipeline_layout, None);
            ctx.device.destroy_descriptor_set_layout(self.set_layout, None);
        }
    }
}

// ===== RENDER PIPELINE =====

/// Vulkan graphics pipeline
pub struct VulkanRenderPipelineState {
    ctx: Arc<VulkanContext>,
    desc: RenderPipelineDesc,
    layout: PipelineLayout,
    objects: LayoutObjects,
    pipeline: vk::Pipeline,
}

impl VulkanRenderPipelineState {
    pub fn new(ctx: &Arc<VulkanContext>, desc: RenderPipelineDesc) -> Result<Self> {
        let vertex_module = downcast_module(&desc.vertex_module, ShaderStage::Vertex)?;
        let fragment_module = downcast_module(&desc.fragment_module, ShaderStage::Fragment)?;

        if desc.color_attachments.iter().any(|a| a.blend.uses_dual_source())
            && !ctx.has_feature(DeviceFeatures::DUAL_SRC_BLEND)
        {
            hal_error!("prism::vulkan::Pipeline", "Pipeline '{}' uses dual-source blending", desc.debug_name);
            return Err(Error::FeatureUnavailable("dual-source blending".to_string()));
        }
        if desc.rasterization.polygon_mode == PolygonMode::Line && !ctx.has_feature(DeviceFeatures::FILL_MODE_NON_SOLID) {
            hal_error!("prism::vulkan::Pipeline", "Pipeline '{}' uses line fill mode", desc.debug_name);
            return Err(Error::FeatureUnavailable("non-solid fill mode".to_string()));
        }
        if desc.view_mask != 0 && !ctx.has_feature(DeviceFeatures::MULTIVIEW) {
            hal_error!("prism::vulkan::Pipeline", "Pipeline '{}' uses multiview", desc.debug_name);
            return Err(Error::FeatureUnavailable("multiview".to_string()));
        }

        let layout = PipelineLayout::resolve(&LayoutSources {
            vertex_layout: Some(&desc.vertex_layout),
            stages: &[
                (ShaderStage::Vertex, vertex_module.reflection()),
                (ShaderStage::Fragment, fragment_module.reflection()),
            ],
            uniform_block_bindings: &desc.uniform_block_bindings,
            remap_vertex_textures: false,
        })?;

        let objects = LayoutObjects::new(ctx, &layout, vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)?;
        let pipeline = match Self::create_pipeline(ctx, &desc, &layout, &objects, vertex_module, fragment_module) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                objects.destroy(ctx);
                return Err(e);
            }
        };
        ctx.set_debug_name(pipeline, &desc.debug_name);

        Ok(Self { ctx: Arc::clone(ctx), desc, layout, objects, pipeline })
    }

    /// Render pass the pipeline is compiled against (compatible with every
    /// pass that has the same attachment formats and sample count)
    fn compatible_render_pass(desc: &RenderPipelineDesc) -> VulkanRenderPassBuilder {
        let samples = sample_count_to_vk(desc.samples);
        let mut builder = VulkanRenderPassBuilder::new();
        for attachment in &desc.color_attachments {
            builder.add_color(
                texture_format_to_vk(attachment.format),
                vk::AttachmentLoadOp::DONT_CARE,
                vk::AttachmentStoreOp::STORE,
                vk::ImageLayout::UNDEFINED,
                COLOR_RESTING_LAYOUT,
                samples,
            );
        }
        if let Some(format) = desc.depth_format.or(desc.stencil_format) {
            builder.add_depth_stencil(
                texture_format_to_vk(format),
                vk::AttachmentLoadOp::DONT_CARE,
                vk::AttachmentStoreOp::STORE,
                vk::AttachmentLoadOp::DONT_CARE,
                vk::AttachmentStoreOp::STORE,
                vk::ImageLayout::UNDEFINED,
                DEPTH_RESTING_LAYOUT,
                samples,
            );
        }
        builder.set_view_mask(desc.view_mask);
        builder
    }

    fn create_pipeline(
        ctx: &VulkanContext,
        desc: &RenderPipelineDesc,
        layout: &PipelineLayout,
        objects: &LayoutObjects,
        vertex_module: &VulkanShaderModule,
        fragment_module: &VulkanShaderModule,
    ) -> Result<vk::Pipeline> {
        let render_pass = ctx.find_render_pass(&Self::compatible_render_pass(desc), None)?;

        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(shader_stage_to_vk(vertex_module.stage()))
                .module(vertex_module.vk_module())
                .name(vertex_module.entry_point_c()),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(shader_stage_to_vk(fragment_module.stage()))
                .module(fragment_module.vk_module())
                .name(fragment_module.entry_point_c()),
        ];

        // Vertex input: bindings as declared, attributes with resolved locations
        let vertex_bindings: Vec<vk::VertexInputBindingDescription> = desc
            .vertex_layout
            .bindings
            .iter()
            .map(|binding| vk::VertexInputBindingDescription {
                binding: binding.binding,
                stride: binding.stride,
                input_rate: input_rate_to_vk(binding.input_rate),
            })
            .collect();
        let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = desc
            .vertex_layout
            .bindings
            .iter()
            .flat_map(|binding| {
                layout.attributes_for_buffer(binding.binding).iter().map(|attribute| {
                    vk::VertexInputAttributeDescription {
                        location: attribute.location,
                        binding: binding.binding,
                        format: vertex_format_to_vk(attribute.format),
                        offset: attribute.offset,
                    }
                })
            })
            .collect();

        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(desc.topology))
            .primitive_restart_enable(false);

        let viewport_state = vk::PipelineViewportStateCreateInfo::default().viewport_count(1).scissor_count(1);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(polygon_mode_to_vk(desc.rasterization.polygon_mode))
            .cull_mode(cull_mode_to_vk(desc.rasterization.cull_mode))
            .front_face(front_face_to_vk(desc.rasterization.front_face))
            .depth_bias_enable(true)
            .line_width(1.0);

        let ds = &desc.depth_stencil;
        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(ds.depth_test_enable)
            .depth_write_enable(ds.depth_write_enable)
            .depth_compare_op(compare_op_to_vk(ds.depth_compare_op))
            .depth_bounds_test_enable(false)
            .stencil_test_enable(ds.stencil_test_enable)
            .front(stencil_op_state_to_vk(&ds.front))
            .back(stencil_op_state_to_vk(&ds.back));

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(sample_count_to_vk(desc.samples))
            .sample_shading_enable(false);

        let blend_attachments: Vec<vk::PipelineColorBlendAttachmentState> = desc
            .color_attachments
            .iter()
            .map(|attachment| {
                let blend = &attachment.blend;
                vk::PipelineColorBlendAttachmentState::default()
                    .blend_enable(blend.blend_enable)
                    .src_color_blend_factor(blend_factor_to_vk(blend.src_color_factor))
                    .dst_color_blend_factor(blend_factor_to_vk(blend.dst_color_factor))
                    .color_blend_op(blend_op_to_vk(blend.color_blend_op))
                    .src_alpha_blend_factor(blend_factor_to_vk(blend.src_alpha_factor))
                    .dst_alpha_blend_factor(blend_factor_to_vk(blend.dst_alpha_factor))
                    .alpha_blend_op(blend_op_to_vk(blend.alpha_blend_op))
                    .color_write_mask(color_write_mask_to_vk(&blend.color_write_mask))
            })
            .collect();
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&blend_attachments);

        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&DYNAMIC_STATES);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .depth_stencil_state(&depth_stencil_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(objects.pipeline_layout)
            .render_pass(render_pass)
            .subpass(0);

        let pipelines = unsafe {
            ctx.device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
                .map_err(|(_, e)| native_error("graphics pipeline", e))?
        };
        Ok(pipelines[0])
    }

    pub fn vk_pipeline(&self) -> vk::Pipeline {
        self.pipeline
    }

    pub fn vk_pipeline_layout(&self) -> vk::PipelineLayout {
        self.objects.pipeline_layout
    }

    pub(crate) fn push_constant_stages(&self) -> vk::ShaderStageFlags {
        self.objects.push_constant_stages
    }
}

impl RenderPipelineState for VulkanRenderPipelineState {
    fn desc(&self) -> &RenderPipelineDesc {
        &self.desc
    }

    fn layout(&self) -> &PipelineLayout {
        &self.layout
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanRenderPipelineState {
    fn drop(&mut self) {
        unsafe { self.ctx.device.destroy_pipeline(self.pipeline, None) };
        self.objects.destroy(&self.ctx);
    }
}

// ===== COMPUTE PIPELINE =====

/// Vulkan compute pipeline
pub struct VulkanComputePipelineState {
    ctx: Arc<VulkanContext>,
    desc: ComputePipelineDesc,
    layout: PipelineLayout,
    objects: LayoutObjects,
    pipeline: vk::Pipeline,
}

impl VulkanComputePipelineState {
    pub fn new(ctx: &Arc<VulkanContext>, desc: ComputePipelineDesc) -> Result<Self> {
        let module = downcast_module(&desc.compute_module, ShaderStage::Compute)?;

        let layout = PipelineLayout::resolve(&LayoutSources {
            vertex_layout: None,
            stages: &[(ShaderStage::Compute, module.reflection())],
            uniform_block_bindings: &[],
            remap_vertex_textures: false,
        })?;

        let objects = LayoutObjects::new(ctx, &layout, vk::ShaderStageFlags::COMPUTE)?;

        let stage = vk::PipelineShaderStageCreateInfo::default()
            .stage(shader_stage_to_vk(module.stage()))
            .module(module.vk_module())
            .name(module.entry_point_c());
        let pipeline_info = vk::ComputePipelineCreateInfo::default().stage(stage).layout(objects.pipeline_layout);

        let pipeline = match unsafe {
            ctx.device.create_compute_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
        } {
            Ok(pipelines) => pipelines[0],
            Err((_, e)) => {
                objects.destroy(ctx);
                return Err(native_error("compute pipeline", e));
            }
        };
        ctx.set_debug_name(pipeline, &desc.debug_name);

        Ok(Self { ctx: Arc::clone(ctx), desc, layout, objects, pipeline })
    }

    pub fn vk_pipeline(&self) -> vk::Pipeline {
        self.pipeline
    }

    pub fn vk_pipeline_layout(&self) -> vk::PipelineLayout {
        self.objects.pipeline_layout
    }

    pub(crate) fn push_constant_stages(&self) -> vk::ShaderStageFlags {
        self.objects.push_constant_stages
    }
}

impl ComputePipelineState for VulkanComputePipelineState {
    fn desc(&self) -> &ComputePipelineDesc {
        &self.desc
    }

    fn layout(&self) -> &PipelineLayout {
        &self.layout
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanComputePipelineState {
    fn drop(&mut self) {
        unsafe { self.ctx.device.destroy_pipeline(self.pipeline, None) };
        self.objects.destroy(&self.ctx);
    }
}

#[cfg(test)]
#[path = "vulkan_pipeline_tests.rs"]
mod tests;
