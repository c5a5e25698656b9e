/// Framebuffer - attachment set for Vulkan render passes
///
/// Holds the textures only. The `VkFramebuffer` depends on the render pass
/// it is used with (load/store ops are part of the pass), so the command
/// buffer creates one per encoded pass and destroys it after submission.

use std::any::Any;
use std::sync::Arc;
use prism_hal::hal_error;
use prism_hal::prism::{Error, Result};
use prism_hal::prism::device::{Framebuffer, FramebufferDesc, SampleCount, Texture};
use crate::vulkan_texture::VulkanTexture;

/// Vulkan framebuffer
pub struct VulkanFramebuffer {
    desc: FramebufferDesc,
}

impl VulkanFramebuffer {
    pub fn new(desc: FramebufferDesc) -> Result<Self> {
        if desc.color_attachments.is_empty() && desc.depth_attachment.is_none() {
            hal_error!("prism::vulkan::Framebuffer", "Framebuffer '{}' has no attachments", desc.debug_name);
            return Err(Error::InvalidResource("Framebuffer has no attachments".to_string()));
        }

        let mut size = None;
        let attachments = desc.color_attachments.iter().chain(desc.depth_attachment.iter());
        for attachment in attachments {
            let texture = downcast_texture(&attachment.texture)?;
            let extent = (texture.desc().width, texture.desc().height);
            if *size.get_or_insert(extent) != extent {
                hal_error!(
                    "prism::vulkan::Framebuffer",
                    "Framebuffer '{}' mixes attachment sizes {:?} and {:?}",
                    desc.debug_name,
                    size,
                    extent
                );
                return Err(Error::InvalidResource("Framebuffer attachments differ in size".to_string()));
            }

            if let Some(resolve) = &attachment.resolve {
                let resolve = downcast_texture(resolve)?;
                if resolve.desc().samples != SampleCount::S1 || resolve.desc().format != texture.desc().format {
                    hal_error!(
                        "prism::vulkan::Framebuffer",
                        "Resolve target of '{}' must be single-sampled with format {:?}",
                        desc.debug_name,
                        texture.desc().format
                    );
                    return Err(Error::InvalidResource("Invalid resolve attachment".to_string()));
                }
            }
        }

        let resolves = desc.color_attachments.iter().filter(|a| a.resolve.is_some()).count();
        if resolves != 0 && resolves != desc.color_attachments.len() {
            hal_error!(
                "prism::vulkan::Framebuffer",
                "Framebuffer '{}' resolves {} of {} color attachments",
                desc.debug_name,
                resolves,
                desc.color_attachments.len()
            );
            return Err(Error::InvalidResource("Either every color attachment resolves or none does".to_string()));
        }

        Ok(Self { desc })
    }
}

impl Framebuffer for VulkanFramebuffer {
    fn desc(&self) -> &FramebufferDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn downcast_texture(texture: &Arc<dyn Texture>) -> Result<&VulkanTexture> {
    texture.as_any().downcast_ref::<VulkanTexture>().ok_or_else(|| {
        hal_error!("prism::vulkan", "Texture '{}' was not created by the Vulkan device", texture.desc().debug_name);
        Error::InvalidResource("Texture is not a Vulkan texture".to_string())
    })
}
