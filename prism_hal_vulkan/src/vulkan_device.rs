/// VulkanDevice - Device implementation for Vulkan
///
/// Thin factory over a shared `VulkanContext`. Samplers are deduplicated
/// by descriptor; the default sampler (bound for textures without one) is
/// created eagerly.

use std::sync::Arc;
use prism_hal::hal_info;
use prism_hal::prism::Result;
use prism_hal::prism::device::{
    BackendType, Buffer, BufferDesc, CommandBuffer, ComputePipelineDesc, ComputePipelineState, Device,
    DeviceFeatures, FeatureQuery, Framebuffer, FramebufferDesc, RenderPipelineDesc, RenderPipelineState,
    SamplerDesc, SamplerState, ShaderModule, ShaderModuleDesc, Texture, TextureDesc,
};
use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_command_buffer::VulkanCommandBuffer;
use crate::vulkan_context::{VulkanContext, VulkanContextConfig};
use crate::vulkan_framebuffer::VulkanFramebuffer;
use crate::vulkan_pipeline::{VulkanComputePipelineState, VulkanRenderPipelineState};
use crate::vulkan_sampler::{VulkanSamplerCache, VulkanSamplerState};
use crate::vulkan_shader::VulkanShaderModule;
use crate::vulkan_texture::VulkanTexture;

/// Vulkan device
pub struct VulkanDevice {
    ctx: Arc<VulkanContext>,
    sampler_cache: VulkanSamplerCache,
    default_sampler: Arc<VulkanSamplerState>,
}

impl VulkanDevice {
    /// Create a headless device
    ///
    /// # Arguments
    ///
    /// * `config` - Application name, validation and optional feature requests
    pub fn new(config: &VulkanContextConfig) -> Result<Self> {
        let ctx = Arc::new(VulkanContext::new(config)?);
        Self::from_context(ctx)
    }

    /// Wrap an existing context
    pub fn from_context(ctx: Arc<VulkanContext>) -> Result<Self> {
        let sampler_cache = VulkanSamplerCache::new();
        let default_sampler = sampler_cache.get(&ctx, &SamplerDesc::default())?;
        hal_info!("prism::vulkan::Device", "Vulkan device ready on {}", ctx.device_name());
        Ok(Self { ctx, sampler_cache, default_sampler })
    }

    pub fn context(&self) -> &Arc<VulkanContext> {
        &self.ctx
    }
}

impl FeatureQuery for VulkanDevice {
    fn backend_type(&self) -> BackendType {
        BackendType::Vulkan
    }

    fn features(&self) -> DeviceFeatures {
        self.ctx.features()
    }
}

impl Device for VulkanDevice {
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn Buffer>> {
        Ok(Arc::new(VulkanBuffer::new(&self.ctx, desc)?))
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>> {
        Ok(Arc::new(VulkanTexture::new(&self.ctx, desc)?))
    }

    fn create_sampler_state(&self, desc: &SamplerDesc) -> Result<Arc<dyn SamplerState>> {
        Ok(self.sampler_cache.get(&self.ctx, desc)?)
    }

    fn create_shader_module(&self, desc: ShaderModuleDesc) -> Result<Arc<dyn ShaderModule>> {
        Ok(Arc::new(VulkanShaderModule::new(&self.ctx, desc)?))
    }

    fn create_render_pipeline(&self, desc: RenderPipelineDesc) -> Result<Arc<dyn RenderPipelineState>> {
        Ok(Arc::new(VulkanRenderPipelineState::new(&self.ctx, desc)?))
    }

    fn create_compute_pipeline(&self, desc: ComputePipelineDesc) -> Result<Arc<dyn ComputePipelineState>> {
        Ok(Arc::new(VulkanComputePipelineState::new(&self.ctx, desc)?))
    }

    fn create_framebuffer(&self, desc: FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        Ok(Arc::new(VulkanFramebuffer::new(desc)?))
    }

    fn create_command_buffer(&self) -> Result<Box<dyn CommandBuffer + '_>> {
        Ok(Box::new(VulkanCommandBuffer::new(&self.ctx, Arc::clone(&self.default_sampler))?))
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        self.sampler_cache.clear();
    }
}
