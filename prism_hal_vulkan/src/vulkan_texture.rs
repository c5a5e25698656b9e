/// Texture - Vulkan image + view implementing the Texture trait
///
/// Every texture rests in a read-only layout between passes
/// (`SHADER_READ_ONLY_OPTIMAL` for color, `DEPTH_STENCIL_READ_ONLY_OPTIMAL`
/// for depth). Render passes start from and return to that layout, so a
/// texture can be sampled right after being rendered to.

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use gpu_allocator::MemoryLocation;
use std::any::Any;
use std::sync::Arc;
use prism_hal::hal_error;
use prism_hal::prism::{Error, Result};
use prism_hal::prism::device::{Texture, TextureDesc, TextureType};
use crate::vulkan_buffer::RawBuffer;
use crate::vulkan_context::VulkanContext;
use crate::vulkan_conversions::{
    aspect_mask, native_error, sample_count_to_vk, texture_format_to_vk, texture_type_to_vk,
    texture_usage_to_vk, COLOR_RESTING_LAYOUT, DEPTH_RESTING_LAYOUT,
};

/// Vulkan texture
pub struct VulkanTexture {
    ctx: Arc<VulkanContext>,
    desc: TextureDesc,
    image: vk::Image,
    view: vk::ImageView,
    allocation: Option<Allocation>,
    format: vk::Format,
    aspect: vk::ImageAspectFlags,
    resting_layout: vk::ImageLayout,
}

impl VulkanTexture {
    pub fn new(ctx: &Arc<VulkanContext>, desc: &TextureDesc) -> Result<Self> {
        if desc.width == 0 || desc.height == 0 || desc.depth == 0 || desc.array_layers == 0 || desc.mip_levels == 0 {
            hal_error!("prism::vulkan::Texture", "Texture '{}' has a zero dimension", desc.debug_name);
            return Err(Error::InvalidResource("Texture dimensions must be non-zero".to_string()));
        }
        let format = texture_format_to_vk(desc.format);
        if format == vk::Format::UNDEFINED {
            hal_error!("prism::vulkan::Texture", "Texture '{}' has an invalid format", desc.debug_name);
            return Err(Error::InvalidResource("Texture format is invalid".to_string()));
        }

        let (image_type, view_type) = texture_type_to_vk(desc.texture_type);
        let aspect = aspect_mask(desc.format);
        let resting_layout = if desc.format.is_depth_or_stencil() { DEPTH_RESTING_LAYOUT } else { COLOR_RESTING_LAYOUT };
        let array_layers = match desc.texture_type {
            TextureType::Cube => 6 * desc.array_layers,
            _ => desc.array_layers,
        };
        let flags = match desc.texture_type {
            TextureType::Cube => vk::ImageCreateFlags::CUBE_COMPATIBLE,
            _ => vk::ImageCreateFlags::empty(),
        };

        // The resting layout is a read-only shader layout, which needs SAMPLED
        let usage = texture_usage_to_vk(desc.usage, desc.format) | vk::ImageUsageFlags::SAMPLED;

        let image_info = vk::ImageCreateInfo::default()
            .flags(flags)
            .image_type(image_type)
            .format(format)
            .extent(vk::Extent3D { width: desc.width, height: desc.height, depth: desc.depth })
            .mip_levels(desc.mip_levels)
            .array_layers(array_layers)
            .samples(sample_count_to_vk(desc.samples))
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        unsafe {
            let image = ctx.device.create_image(&image_info, None).map_err(|e| native_error("image", e))?;
            let requirements = ctx.device.get_image_memory_requirements(image);

            let allocation = match ctx.allocate(&desc.debug_name, requirements, MemoryLocation::GpuOnly, false) {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_image(image, None);
                    return Err(e);
                }
            };
            if let Err(e) = ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset()) {
                ctx.free(allocation);
                ctx.device.destroy_image(image, None);
                return Err(native_error("image memory binding", e));
            }

            let subresource = vk::ImageSubresourceRange::default()
                .aspect_mask(aspect)
                .base_mip_level(0)
                .level_count(desc.mip_levels)
                .base_array_layer(0)
                .layer_count(array_layers);

            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(view_type)
                .format(format)
                .subresource_range(subresource);
            let view = match ctx.device.create_image_view(&view_info, None) {
                Ok(view) => view,
                Err(e) => {
                    ctx.free(allocation);
                    ctx.device.destroy_image(image, None);
                    return Err(native_error("image view", e));
                }
            };

            ctx.set_debug_name(image, &desc.debug_name);
            ctx.set_debug_name(view, &desc.debug_name);

            let texture = Self {
                ctx: Arc::clone(ctx),
                desc: desc.clone(),
                image,
                view,
                allocation: Some(allocation),
                format,
                aspect,
                resting_layout,
            };
            texture.transition(vk::ImageLayout::UNDEFINED, resting_layout)?;
            Ok(texture)
        }
    }

    pub fn vk_image(&self) -> vk::Image {
        self.image
    }

    pub fn vk_image_view(&self) -> vk::ImageView {
        self.view
    }

    pub fn vk_format(&self) -> vk::Format {
        self.format
    }

    pub fn resting_layout(&self) -> vk::ImageLayout {
        self.resting_layout
    }

    fn full_range(&self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange::default()
            .aspect_mask(self.aspect)
            .base_mip_level(0)
            .level_count(vk::REMAINING_MIP_LEVELS)
            .base_array_layer(0)
            .layer_count(vk::REMAINING_ARRAY_LAYERS)
    }

    fn barrier(&self, old_layout: vk::ImageLayout, new_layout: vk::ImageLayout) -> vk::ImageMemoryBarrier<'static> {
        vk::ImageMemoryBarrier::default()
            .src_access_mask(vk::AccessFlags::MEMORY_WRITE)
            .dst_access_mask(vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE)
            .old_layout(old_layout)
            .new_layout(new_layout)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(self.image)
            .subresource_range(self.full_range())
    }

    fn transition(&self, old_layout: vk::ImageLayout, new_layout: vk::ImageLayout) -> Result<()> {
        let barrier = self.barrier(old_layout, new_layout);
        self.ctx.submit_immediate(|cmd| unsafe {
            self.ctx.device.cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        })
    }

    /// Replace the contents of one mip level of layer 0.
    ///
    /// `data` must hold exactly the tightly packed texels of that level.
    pub fn upload(&self, mip_level: u32, data: &[u8]) -> Result<()> {
        if mip_level >= self.desc.mip_levels {
            return Err(Error::InvalidResource(format!(
                "Mip level {} out of range ({} levels)",
                mip_level, self.desc.mip_levels
            )));
        }
        let Some(bytes_per_pixel) = self.desc.format.bytes_per_pixel() else {
            return Err(Error::InvalidResource(format!("Cannot upload to {:?} textures", self.desc.format)));
        };
        let width = (self.desc.width >> mip_level).max(1);
        let height = (self.desc.height >> mip_level).max(1);
        let depth = (self.desc.depth >> mip_level).max(1);
        let expected = u64::from(width) * u64::from(height) * u64::from(depth) * u64::from(bytes_per_pixel);
        if data.len() as u64 != expected {
            hal_error!(
                "prism::vulkan::Texture",
                "Upload to '{}' mip {} has {} bytes, expected {}",
                self.desc.debug_name,
                mip_level,
                data.len(),
                expected
            );
            return Err(Error::InvalidResource("Texture upload size mismatch".to_string()));
        }

        let staging = RawBuffer::new(
            &self.ctx,
            expected,
            vk::BufferUsageFlags::TRANSFER_SRC,
            MemoryLocation::CpuToGpu,
            "texture staging",
        )?;
        staging.write(0, data)?;

        let region = vk::BufferImageCopy::default()
            .image_subresource(
                vk::ImageSubresourceLayers::default()
                    .aspect_mask(self.aspect)
                    .mip_level(mip_level)
                    .base_array_layer(0)
                    .layer_count(1),
            )
            .image_extent(vk::Extent3D { width, height, depth });

        let to_transfer = self.barrier(self.resting_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
        let to_resting = self.barrier(vk::ImageLayout::TRANSFER_DST_OPTIMAL, self.resting_layout);
        self.ctx.submit_immediate(|cmd| unsafe {
            let device = &self.ctx.device;
            device.cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_transfer],
            );
            device.cmd_copy_buffer_to_image(
                cmd,
                staging.buffer,
                self.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );
            device.cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_resting],
            );
        })
    }
}

impl Texture for VulkanTexture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanTexture {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);

            if let Some(allocation) = self.allocation.take() {
                self.ctx.free(allocation);
            }

            self.ctx.device.destroy_image(self.image, None);
        }
    }
}
