/// ResourceBinder - descriptor set 0 and push constants of the bound pipeline
///
/// Shared by the render and compute encoders. Buffer, texture and sampler
/// binds land in a `PushDescriptorTable`; `flush` pushes the set declared by
/// the current pipeline layout.

use ash::vk;
use prism_hal::{hal_error, hal_warn};
use prism_hal::prism::{Error, Result};
use prism_hal::prism::binder::{DescriptorBinding, PipelineLayout};
use prism_hal::prism::state::{BufferBinding, PushConstants, SamplerBinding, TextureBinding};
use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_context::VulkanContext;
use crate::vulkan_framebuffer::downcast_texture;
use crate::vulkan_push_descriptors::{BoundImage, PushDescriptorTable};
use crate::vulkan_sampler::VulkanSamplerState;

pub(crate) struct ResourceBinder {
    bind_point: vk::PipelineBindPoint,
    default_sampler: vk::Sampler,
    pipeline_layout: vk::PipelineLayout,
    push_constant_stages: vk::ShaderStageFlags,
    push_constant_size: u32,
    descriptor_bindings: Vec<DescriptorBinding>,
    table: PushDescriptorTable,
}

impl ResourceBinder {
    pub(crate) fn new(bind_point: vk::PipelineBindPoint, default_sampler: vk::Sampler) -> Self {
        Self {
            bind_point,
            default_sampler,
            pipeline_layout: vk::PipelineLayout::null(),
            push_constant_stages: vk::ShaderStageFlags::empty(),
            push_constant_size: 0,
            descriptor_bindings: Vec::new(),
            table: PushDescriptorTable::new(),
        }
    }

    /// Switch to a new pipeline layout; the whole set is pushed again on the next flush
    pub(crate) fn set_pipeline(
        &mut self,
        pipeline_layout: vk::PipelineLayout,
        push_constant_stages: vk::ShaderStageFlags,
        layout: &PipelineLayout,
    ) {
        self.pipeline_layout = pipeline_layout;
        self.push_constant_stages = push_constant_stages;
        self.push_constant_size = layout.push_constant_size();
        self.descriptor_bindings = layout.descriptor_bindings();
        self.table.mark_dirty();
    }

    pub(crate) fn bind_buffer(&mut self, index: u32, binding: Option<&BufferBinding>) -> Result<()> {
        let info = match binding {
            Some(binding) => {
                let buffer = binding.buffer.as_any().downcast_ref::<VulkanBuffer>().ok_or_else(|| {
                    hal_error!("prism::vulkan::Binder", "Buffer bound at {} was not created by the Vulkan device", index);
                    Error::InvalidResource("Buffer is not a Vulkan buffer".to_string())
                })?;
                let range = if binding.size == 0 { vk::WHOLE_SIZE } else { binding.size };
                Some(vk::DescriptorBufferInfo { buffer: buffer.vk_buffer(), offset: binding.offset, range })
            }
            None => None,
        };
        self.table.set_buffer(index, info);
        Ok(())
    }

    pub(crate) fn bind_texture(&mut self, index: u32, texture: Option<&TextureBinding>) -> Result<()> {
        let image = match texture {
            Some(TextureBinding(texture)) => {
                let texture = downcast_texture(texture)?;
                Some(BoundImage { view: texture.vk_image_view(), layout: texture.resting_layout() })
            }
            None => None,
        };
        self.table.set_image(index, image);
        Ok(())
    }

    pub(crate) fn bind_sampler(&mut self, index: u32, sampler: Option<&SamplerBinding>) -> Result<()> {
        let sampler = match sampler {
            Some(SamplerBinding(sampler)) => {
                let sampler = sampler.as_any().downcast_ref::<VulkanSamplerState>().ok_or_else(|| {
                    hal_error!("prism::vulkan::Binder", "Sampler bound at {} was not created by the Vulkan device", index);
                    Error::InvalidResource("Sampler is not a Vulkan sampler".to_string())
                })?;
                Some(sampler.vk_sampler())
            }
            None => None,
        };
        self.table.set_sampler(index, sampler);
        Ok(())
    }

    pub(crate) fn push_constants(
        &self,
        ctx: &VulkanContext,
        command_buffer: vk::CommandBuffer,
        constants: &PushConstants,
    ) -> Result<()> {
        if self.push_constant_size == 0 {
            hal_warn!("prism::vulkan::Binder", "Pipeline declares no push constants, {} bytes ignored", constants.data.len());
            return Ok(());
        }
        let end = constants.offset as usize + constants.data.len();
        if constants.offset % 4 != 0 || constants.data.len() % 4 != 0 || end > self.push_constant_size.next_multiple_of(4) as usize {
            hal_error!(
                "prism::vulkan::Binder",
                "Push constant range {}..{} is misaligned or exceeds the {}-byte block",
                constants.offset,
                end,
                self.push_constant_size
            );
            return Err(Error::InvalidResource("Push constant range out of bounds".to_string()));
        }
        unsafe {
            ctx.device.cmd_push_constants(
                command_buffer,
                self.pipeline_layout,
                self.push_constant_stages,
                constants.offset,
                &constants.data,
            );
        }
        Ok(())
    }

    /// Push descriptor set 0 if any binding changed since the last flush
    pub(crate) fn flush(&mut self, ctx: &VulkanContext, command_buffer: vk::CommandBuffer) -> Result<()> {
        let Some(batch) = self.table.take_batch(&self.descriptor_bindings, self.default_sampler) else {
            return Ok(());
        };
        if batch.is_empty() {
            return Ok(());
        }
        let Some(push_descriptor) = &ctx.push_descriptor else {
            hal_error!("prism::vulkan::Binder", "Binding resources requires VK_KHR_push_descriptor");
            return Err(Error::FeatureUnavailable("push descriptors".to_string()));
        };
        unsafe {
            push_descriptor.cmd_push_descriptor_set(
                command_buffer,
                self.bind_point,
                self.pipeline_layout,
                0,
                &batch.writes(),
            );
        }
        Ok(())
    }
}
