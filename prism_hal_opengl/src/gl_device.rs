/// GlDevice - Device implementation for OpenGL

use std::sync::Arc;
use prism_hal::prism::Result;
use prism_hal::prism::device::{
    BackendType, Buffer, BufferDesc, CommandBuffer, ComputePipelineDesc, ComputePipelineState, Device,
    DeviceFeatures, FeatureQuery, Framebuffer, FramebufferDesc, RenderPipelineDesc, RenderPipelineState,
    SamplerDesc, SamplerState, ShaderModule, ShaderModuleDesc, Texture, TextureDesc,
};
use crate::gl_buffer::GlBuffer;
use crate::gl_command_buffer::GlCommandBuffer;
use crate::gl_commands::GlCommands;
use crate::gl_context::{GlContext, GlContextConfig};
use crate::gl_framebuffer::GlFramebuffer;
use crate::gl_pipeline::{GlComputePipelineState, GlRenderPipelineState};
use crate::gl_sampler::GlSamplerState;
use crate::gl_shader::GlShaderModule;
use crate::gl_texture::GlTexture;

/// OpenGL device
pub struct GlDevice {
    ctx: Arc<GlContext>,
}

impl GlDevice {
    /// Create a device over a context made current by the platform glue
    ///
    /// # Arguments
    ///
    /// * `gl` - Function surface of the context
    /// * `config` - Feature requests and unbind policy
    /// * `supported` - Features the context reports
    pub fn new(gl: Arc<dyn GlCommands>, config: &GlContextConfig, supported: DeviceFeatures) -> Result<Self> {
        Ok(Self::from_context(Arc::new(GlContext::new(gl, config, supported)?)))
    }

    pub fn from_context(ctx: Arc<GlContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<GlContext> {
        &self.ctx
    }
}

impl FeatureQuery for GlDevice {
    fn backend_type(&self) -> BackendType {
        BackendType::OpenGl
    }

    fn features(&self) -> DeviceFeatures {
        self.ctx.features()
    }
}

impl Device for GlDevice {
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn Buffer>> {
        Ok(Arc::new(GlBuffer::new(&self.ctx, desc)?))
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>> {
        Ok(Arc::new(GlTexture::new(&self.ctx, desc)?))
    }

    fn create_sampler_state(&self, desc: &SamplerDesc) -> Result<Arc<dyn SamplerState>> {
        Ok(Arc::new(GlSamplerState::new(&self.ctx, desc)))
    }

    fn create_shader_module(&self, desc: ShaderModuleDesc) -> Result<Arc<dyn ShaderModule>> {
        Ok(Arc::new(GlShaderModule::new(desc)?))
    }

    fn create_render_pipeline(&self, desc: RenderPipelineDesc) -> Result<Arc<dyn RenderPipelineState>> {
        Ok(Arc::new(GlRenderPipelineState::new(&self.ctx, desc)?))
    }

    fn create_compute_pipeline(&self, desc: ComputePipelineDesc) -> Result<Arc<dyn ComputePipelineState>> {
        Ok(Arc::new(GlComputePipelineState::new(&self.ctx, desc)?))
    }

    fn create_framebuffer(&self, desc: FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        Ok(Arc::new(GlFramebuffer::new(&self.ctx, desc)?))
    }

    fn create_command_buffer(&self) -> Result<Box<dyn CommandBuffer + '_>> {
        Ok(Box::new(GlCommandBuffer::new(&self.ctx)))
    }
}
