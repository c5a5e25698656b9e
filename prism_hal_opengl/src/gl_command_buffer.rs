/// CommandBuffer - OpenGL command buffer
///
/// Commands run as they are encoded; the buffer only hands out encoders,
/// counts draws, and on submit waits for the context to drain.

use std::sync::Arc;
use prism_hal::{hal_debug, hal_error};
use prism_hal::prism::{Error, Result};
use prism_hal::prism::device::{
    CommandBuffer, ComputeCommandEncoder, DeviceFeatures, Framebuffer, RenderCommandEncoder, RenderPassDesc,
};
use crate::gl_compute_encoder::GlComputeCommandEncoder;
use crate::gl_context::GlContext;
use crate::gl_render_encoder::GlRenderCommandEncoder;

/// OpenGL command buffer
pub struct GlCommandBuffer {
    ctx: Arc<GlContext>,
    draw_count: u32,
}

impl GlCommandBuffer {
    pub(crate) fn new(ctx: &Arc<GlContext>) -> Self {
        Self { ctx: Arc::clone(ctx), draw_count: 0 }
    }

    pub(crate) fn ctx(&self) -> &Arc<GlContext> {
        &self.ctx
    }

    pub(crate) fn record_draw(&mut self) {
        self.draw_count += 1;
    }
}

impl CommandBuffer for GlCommandBuffer {
    fn create_render_command_encoder(
        &mut self,
        render_pass: &RenderPassDesc,
        framebuffer: &Arc<dyn Framebuffer>,
    ) -> Result<Box<dyn RenderCommandEncoder + '_>> {
        Ok(Box::new(GlRenderCommandEncoder::new(self, render_pass, framebuffer)?))
    }

    fn create_compute_command_encoder(&mut self) -> Result<Box<dyn ComputeCommandEncoder + '_>> {
        if !self.ctx.has_feature(DeviceFeatures::COMPUTE) {
            hal_error!("prism::opengl::CommandBuffer", "Compute encoder requested without compute support");
            return Err(Error::FeatureUnavailable("compute".to_string()));
        }
        Ok(Box::new(GlComputeCommandEncoder::new(self)))
    }

    fn current_draw_count(&self) -> u32 {
        self.draw_count
    }

    fn submit(&mut self) -> Result<()> {
        self.ctx.gl().finish();
        let draws = std::mem::take(&mut self.draw_count);
        hal_debug!("prism::opengl::CommandBuffer", "Submitted {} draw calls", draws);
        Ok(())
    }
}
