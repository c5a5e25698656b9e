/// CommandBuffer - one primary VkCommandBuffer with its own pool and fence
///
/// Recording starts with the first encoder. Each render encoder begins a
/// render pass built from the pass descriptor and the framebuffer textures;
/// the `VkFramebuffer` made for it lives until the next submit.

use ash::vk;
use std::sync::Arc;
use prism_hal::{hal_debug, hal_err, hal_error};
use prism_hal::prism::{Error, Result};
use prism_hal::prism::device::{
    CommandBuffer, ComputeCommandEncoder, DeviceFeatures, Framebuffer, LoadAction, RenderCommandEncoder,
    RenderPassDesc, Texture,
};
use crate::vulkan_compute_encoder::VulkanComputeCommandEncoder;
use crate::vulkan_context::VulkanContext;
use crate::vulkan_conversions::{
    initial_layout, load_action_to_vk, native_error, sample_count_to_vk, store_action_to_vk,
    COLOR_RESTING_LAYOUT, DEPTH_RESTING_LAYOUT,
};
use crate::vulkan_framebuffer::{downcast_texture, VulkanFramebuffer};
use crate::vulkan_render_encoder::VulkanRenderCommandEncoder;
use crate::vulkan_render_pass_builder::VulkanRenderPassBuilder;
use crate::vulkan_sampler::VulkanSamplerState;

/// Vulkan command buffer
pub struct VulkanCommandBuffer {
    ctx: Arc<VulkanContext>,
    /// Bound for textures that have no sampler of their own
    default_sampler: Arc<VulkanSamplerState>,
    pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    fence: vk::Fence,
    recording: bool,
    /// Framebuffers of the passes encoded since the last submit
    framebuffers: Vec<vk::Framebuffer>,
    draw_count: u32,
}

impl VulkanCommandBuffer {
    pub(crate) fn new(ctx: &Arc<VulkanContext>, default_sampler: Arc<VulkanSamplerState>) -> Result<Self> {
        let device = &ctx.device;
        unsafe {
            let pool_info = vk::CommandPoolCreateInfo::default()
                .flags(vk::CommandPoolCreateFlags::TRANSIENT)
                .queue_family_index(ctx.graphics_queue_family);
            let pool = device.create_command_pool(&pool_info, None).map_err(|e| native_error("command pool", e))?;

            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = match device.allocate_command_buffers(&alloc_info) {
                Ok(buffers) => buffers[0],
                Err(e) => {
                    device.destroy_command_pool(pool, None);
                    return Err(native_error("command buffer", e));
                }
            };

            let fence = match device.create_fence(&vk::FenceCreateInfo::default(), None) {
                Ok(fence) => fence,
                Err(e) => {
                    device.destroy_command_pool(pool, None);
                    return Err(native_error("fence", e));
                }
            };

            Ok(Self {
                ctx: Arc::clone(ctx),
                default_sampler,
                pool,
                command_buffer,
                fence,
                recording: false,
                framebuffers: Vec::new(),
                draw_count: 0,
            })
        }
    }

    pub fn vk_command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    pub(crate) fn ctx(&self) -> &Arc<VulkanContext> {
        &self.ctx
    }

    pub(crate) fn default_sampler(&self) -> vk::Sampler {
        self.default_sampler.vk_sampler()
    }

    pub(crate) fn record_draw(&mut self) {
        self.draw_count += 1;
    }

    fn ensure_recording(&mut self) -> Result<()> {
        if self.recording {
            return Ok(());
        }
        let begin_info = vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe { self.ctx.device.begin_command_buffer(self.command_buffer, &begin_info) }
            .map_err(|e| hal_err!("prism::vulkan::CommandBuffer", "Failed to begin command buffer: {:?}", e))?;
        self.recording = true;
        Ok(())
    }

    /// Record `vkCmdBeginRenderPass` for `render_pass` on `framebuffer`.
    /// Returns the render area.
    fn begin_render_pass(&mut self, render_pass: &RenderPassDesc, framebuffer: &Arc<dyn Framebuffer>) -> Result<vk::Extent2D> {
        let framebuffer = framebuffer.as_any().downcast_ref::<VulkanFramebuffer>().ok_or_else(|| {
            hal_error!("prism::vulkan::CommandBuffer", "Framebuffer was not created by the Vulkan device");
            Error::InvalidResource("Framebuffer is not a Vulkan framebuffer".to_string())
        })?;
        let desc = framebuffer.desc();
        if desc.view_mask != 0 && !self.ctx.has_feature(DeviceFeatures::MULTIVIEW) {
            hal_error!("prism::vulkan::CommandBuffer", "Framebuffer '{}' uses multiview", desc.debug_name);
            return Err(Error::FeatureUnavailable("multiview".to_string()));
        }

        // Attachment order: colors, color resolves, depth, depth resolve
        let mut builder = VulkanRenderPassBuilder::new();
        let mut views = Vec::new();
        let mut clear_values = Vec::new();

        for (i, attachment) in desc.color_attachments.iter().enumerate() {
            let texture = downcast_texture(&attachment.texture)?;
            let color = render_pass.color_attachments.get(i).copied().unwrap_or_default();
            builder.add_color(
                texture.vk_format(),
                load_action_to_vk(color.load_action),
                store_action_to_vk(color.store_action),
                initial_layout(color.load_action, COLOR_RESTING_LAYOUT),
                COLOR_RESTING_LAYOUT,
                sample_count_to_vk(texture.desc().samples),
            );
            views.push(texture.vk_image_view());
            clear_values.push(vk::ClearValue { color: vk::ClearColorValue { float32: color.clear_color.to_array() } });
        }

        for attachment in &desc.color_attachments {
            let Some(resolve) = &attachment.resolve else { continue };
            let resolve = downcast_texture(resolve)?;
            builder.add_color_resolve(
                resolve.vk_format(),
                vk::AttachmentLoadOp::DONT_CARE,
                vk::AttachmentStoreOp::STORE,
                vk::ImageLayout::UNDEFINED,
                COLOR_RESTING_LAYOUT,
            );
            views.push(resolve.vk_image_view());
            clear_values.push(vk::ClearValue::default());
        }

        if let Some(attachment) = &desc.depth_attachment {
            let texture = downcast_texture(&attachment.texture)?;
            let depth = render_pass.depth;
            let stencil = render_pass.stencil;
            let loads = depth.load_action == LoadAction::Load || stencil.load_action == LoadAction::Load;
            let start = if loads { LoadAction::Load } else { LoadAction::DontCare };
            builder.add_depth_stencil(
                texture.vk_format(),
                load_action_to_vk(depth.load_action),
                store_action_to_vk(depth.store_action),
                load_action_to_vk(stencil.load_action),
                store_action_to_vk(stencil.store_action),
                initial_layout(start, DEPTH_RESTING_LAYOUT),
                DEPTH_RESTING_LAYOUT,
                sample_count_to_vk(texture.desc().samples),
            );
            views.push(texture.vk_image_view());
            clear_values.push(vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth: depth.clear_depth, stencil: stencil.clear_stencil },
            });

            if let Some(resolve) = &attachment.resolve {
                let resolve = downcast_texture(resolve)?;
                builder.add_depth_stencil_resolve(
                    resolve.vk_format(),
                    vk::AttachmentLoadOp::DONT_CARE,
                    vk::AttachmentStoreOp::STORE,
                    vk::AttachmentLoadOp::DONT_CARE,
                    vk::AttachmentStoreOp::STORE,
                    vk::ImageLayout::UNDEFINED,
                    DEPTH_RESTING_LAYOUT,
                );
                views.push(resolve.vk_image_view());
                clear_values.push(vk::ClearValue::default());
            }
        }
        builder.set_view_mask(desc.view_mask);

        let name = (!desc.debug_name.is_empty()).then_some(desc.debug_name.as_str());
        let vk_render_pass = self.ctx.find_render_pass(&builder, name)?;

        let dimensions = framebuffer.dimensions();
        let extent = vk::Extent2D { width: dimensions.width, height: dimensions.height };
        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(vk_render_pass)
            .attachments(&views)
            .width(extent.width)
            .height(extent.height)
            .layers(1);
        let vk_framebuffer = unsafe { self.ctx.device.create_framebuffer(&framebuffer_info, None) }
            .map_err(|e| native_error("framebuffer", e))?;
        self.framebuffers.push(vk_framebuffer);

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk_render_pass)
            .framebuffer(vk_framebuffer)
            .render_area(vk::Rect2D { offset: vk::Offset2D::default(), extent })
            .clear_values(&clear_values);
        unsafe {
            self.ctx.device.cmd_begin_render_pass(self.command_buffer, &begin_info, vk::SubpassContents::INLINE);
        }
        Ok(extent)
    }

    fn release_framebuffers(&mut self) {
        for framebuffer in self.framebuffers.drain(..) {
            unsafe { self.ctx.device.destroy_framebuffer(framebuffer, None) };
        }
    }
}

impl CommandBuffer for VulkanCommandBuffer {
    fn create_render_command_encoder(
        &mut self,
        render_pass: &RenderPassDesc,
        framebuffer: &Arc<dyn Framebuffer>,
    ) -> Result<Box<dyn RenderCommandEncoder + '_>> {
        self.ensure_recording()?;
        let extent = self.begin_render_pass(render_pass, framebuffer)?;
        Ok(Box::new(VulkanRenderCommandEncoder::new(self, extent)))
    }

    fn create_compute_command_encoder(&mut self) -> Result<Box<dyn ComputeCommandEncoder + '_>> {
        self.ensure_recording()?;
        Ok(Box::new(VulkanComputeCommandEncoder::new(self)))
    }

    fn current_draw_count(&self) -> u32 {
        self.draw_count
    }

    fn submit(&mut self) -> Result<()> {
        if !self.recording {
            hal_debug!("prism::vulkan::CommandBuffer", "Nothing recorded, submit skipped");
            return Ok(());
        }
        self.recording = false;

        let result = unsafe {
            self.ctx
                .device
                .end_command_buffer(self.command_buffer)
                .and_then(|_| self.ctx.submit_and_wait(self.command_buffer, self.fence))
                .and_then(|_| self.ctx.device.reset_fences(&[self.fence]))
                .and_then(|_| self.ctx.device.reset_command_pool(self.pool, vk::CommandPoolResetFlags::empty()))
        };
        self.release_framebuffers();

        let draws = std::mem::take(&mut self.draw_count);
        result.map_err(|e| hal_err!("prism::vulkan::CommandBuffer", "Failed to submit command buffer: {:?}", e))?;
        hal_debug!("prism::vulkan::CommandBuffer", "Submitted {} draw calls", draws);
        Ok(())
    }
}

impl Drop for VulkanCommandBuffer {
    fn drop(&mut self) {
        unsafe {
            if self.recording {
                // Recorded but never submitted; nothing is in flight
                self.ctx.device.end_command_buffer(self.command_buffer).ok();
            }
            self.release_framebuffers();
            self.ctx.device.destroy_fence(self.fence, None);
            self.ctx.device.destroy_command_pool(self.pool, None);
        }
    }
}
