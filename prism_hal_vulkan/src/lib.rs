/*!
# Prism HAL - Vulkan Backend

Vulkan implementation of the Prism device, resource and command traits,
built on `ash` for the bindings and `gpu-allocator` for memory.

The device is headless: rendering goes to textures, and presentation is
left to the application. Resources are bound with push descriptors
(`VK_KHR_push_descriptor`) on descriptor set 0; render passes are created
on demand and cached by attachment layout.

With the `vulkan-validation` feature the Khronos validation layer and a
debug messenger routed through the HAL logger are compiled in.
*/

mod vulkan_conversions;
mod vulkan_extensions;
mod vulkan_features;
mod vulkan_render_pass_builder;
mod vulkan_render_pass_cache;
mod vulkan_context;
mod vulkan_buffer;
mod vulkan_texture;
mod vulkan_sampler;
mod vulkan_shader;
mod vulkan_pipeline;
mod vulkan_framebuffer;
mod vulkan_push_descriptors;
mod vulkan_resource_binder;
mod vulkan_command_buffer;
mod vulkan_render_encoder;
mod vulkan_compute_encoder;
mod vulkan_device;

#[cfg(feature = "vulkan-validation")]
mod debug;

// Main prism namespace module
pub mod prism {
    pub use crate::vulkan_device::VulkanDevice;
    pub use crate::vulkan_context::{VulkanContext, VulkanContextConfig};
    pub use crate::vulkan_extensions::{ExtensionType, VulkanExtensions};
    pub use crate::vulkan_features::{VulkanFeatureFlags, VulkanFeatures};
    pub use crate::vulkan_render_pass_builder::{
        AttachmentDescription, AttachmentReference, RenderPassFactory, VulkanRenderPassBuilder,
    };
    pub use crate::vulkan_render_pass_cache::VulkanRenderPassCache;

    // Resources
    pub use crate::vulkan_buffer::VulkanBuffer;
    pub use crate::vulkan_texture::VulkanTexture;
    pub use crate::vulkan_sampler::VulkanSamplerState;
    pub use crate::vulkan_shader::VulkanShaderModule;
    pub use crate::vulkan_pipeline::{VulkanComputePipelineState, VulkanRenderPipelineState};
    pub use crate::vulkan_framebuffer::VulkanFramebuffer;

    // Command recording
    pub use crate::vulkan_command_buffer::VulkanCommandBuffer;
    pub use crate::vulkan_render_encoder::VulkanRenderCommandEncoder;
    pub use crate::vulkan_compute_encoder::VulkanComputeCommandEncoder;

    // Validation layer statistics
    #[cfg(feature = "vulkan-validation")]
    pub use crate::debug::{
        get_validation_stats, init_validation, print_validation_stats_report, ValidationConfig,
        ValidationSeverity, ValidationStats,
    };
}
