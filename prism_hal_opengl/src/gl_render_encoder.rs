/// RenderCommandEncoder for OpenGL
///
/// GL executes immediately, so encoding a pass is running it: binds are
/// recorded in the binding state and flushed through a pooled adapter on
/// every draw.

use std::sync::Arc;
use prism_hal::{hal_error, hal_warn};
use prism_hal::prism::{Error, Result};
use prism_hal::prism::device::{
    BindTarget, Buffer, Color, DepthBias, DeviceFeatures, Framebuffer, IndexFormat, RenderCommandEncoder,
    RenderPassDesc, RenderPipelineState, SamplerState, ScissorRect, Texture, UniformDesc, Viewport,
};
use prism_hal::prism::state::{
    BufferBinding, EncoderState, IndexBufferBinding, RenderBindingState, SamplerBinding, TextureBinding,
};
use crate::gl_command_buffer::GlCommandBuffer;
use crate::gl_render_adapter::RenderCommandAdapter;

/// OpenGL render command encoder (one render pass)
pub struct GlRenderCommandEncoder<'a> {
    command_buffer: &'a mut GlCommandBuffer,
    state: RenderBindingState,
    adapter: Option<RenderCommandAdapter>,
}

impl<'a> GlRenderCommandEncoder<'a> {
    pub(crate) fn new(
        command_buffer: &'a mut GlCommandBuffer,
        render_pass: &RenderPassDesc,
        framebuffer: &Arc<dyn Framebuffer>,
    ) -> Result<Self> {
        let ctx = Arc::clone(command_buffer.ctx());
        let mut adapter = ctx.acquire_render_adapter();
        if let Err(e) = adapter.initialize(render_pass, framebuffer) {
            ctx.release_render_adapter(adapter);
            return Err(e);
        }

        let mut state = RenderBindingState::new();
        state.begin();
        Ok(Self { command_buffer, state, adapter: Some(adapter) })
    }

    fn flush(&mut self) -> Result<&mut RenderCommandAdapter> {
        let Some(adapter) = self.adapter.as_mut() else {
            hal_error!("prism::opengl::RenderEncoder", "Draw after end_encoding");
            return Err(Error::InvalidResource("Render encoder already ended".to_string()));
        };
        self.state.flush(adapter)?;
        Ok(adapter)
    }

    fn debug_labels(&self) -> bool {
        self.command_buffer.ctx().has_feature(DeviceFeatures::DEBUG_LABELS)
    }
}

impl RenderCommandEncoder for GlRenderCommandEncoder<'_> {
    fn end_encoding(&mut self) -> Result<()> {
        self.state.end();
        if let Some(mut adapter) = self.adapter.take() {
            adapter.end_encoding();
            self.command_buffer.ctx().release_render_adapter(adapter);
        }
        Ok(())
    }

    fn bind_render_pipeline_state(&mut self, pipeline: &Arc<dyn RenderPipelineState>) {
        self.state.bind_pipeline(pipeline);
    }

    fn bind_viewport(&mut self, viewport: Viewport) {
        self.state.bind_viewport(viewport);
    }

    fn bind_scissor_rect(&mut self, rect: ScissorRect) {
        self.state.bind_scissor(rect);
    }

    fn set_depth_bias(&mut self, bias: DepthBias) {
        self.state.set_depth_bias(bias);
    }

    fn set_stencil_reference_value(&mut self, value: u32) {
        self.state.set_stencil_reference(value);
    }

    fn set_blend_color(&mut self, color: Color) {
        self.state.set_blend_color(color);
    }

    fn bind_vertex_buffer(&mut self, index: u32, buffer: &Arc<dyn Buffer>, offset: u64) {
        self.state.bind_vertex_buffer(index, Some(BufferBinding { buffer: Arc::clone(buffer), offset, size: 0 }));
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, format: IndexFormat, offset: u64) {
        self.state.bind_index_buffer(IndexBufferBinding { buffer: Arc::clone(buffer), format, offset });
    }

    fn bind_buffer(&mut self, index: u32, buffer: &Arc<dyn Buffer>, offset: u64, size: u64) {
        self.state.bind_buffer(index, Some(BufferBinding { buffer: Arc::clone(buffer), offset, size }));
    }

    fn bind_texture(&mut self, index: u32, target: BindTarget, texture: Option<&Arc<dyn Texture>>) {
        self.state.bind_texture(index, target, texture.map(|t| TextureBinding(Arc::clone(t))));
    }

    fn bind_sampler_state(&mut self, index: u32, target: BindTarget, sampler: Option<&Arc<dyn SamplerState>>) {
        self.state.bind_sampler(index, target, sampler.map(|s| SamplerBinding(Arc::clone(s))));
    }

    fn bind_uniform(&mut self, desc: &UniformDesc, data: &[u8]) {
        self.state.bind_uniform(desc, data);
    }

    fn bind_push_constants(&mut self, offset: u32, data: &[u8]) {
        self.state.bind_push_constants(offset, data);
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, base_instance: u32) -> Result<()> {
        if base_instance != 0 {
            hal_error!("prism::opengl::RenderEncoder", "Base instance {} needs GL 4.2", base_instance);
            return Err(Error::FeatureUnavailable("base_instance".to_string()));
        }
        self.flush()?.draw(vertex_count, instance_count, first_vertex)?;
        self.command_buffer.record_draw();
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        base_instance: u32,
    ) -> Result<()> {
        if vertex_offset != 0 || base_instance != 0 {
            hal_error!(
                "prism::opengl::RenderEncoder",
                "Vertex offset {} / base instance {} are not supported",
                vertex_offset,
                base_instance
            );
            return Err(Error::FeatureUnavailable("base_vertex".to_string()));
        }
        if self.state.index_buffer().is_none() {
            hal_error!("prism::opengl::RenderEncoder", "draw_indexed without an index buffer");
            return Err(Error::InvalidResource("No index buffer bound".to_string()));
        }
        self.flush()?.draw_indexed(index_count, instance_count, first_index)?;
        self.command_buffer.record_draw();
        Ok(())
    }

    fn push_debug_group_label(&mut self, label: &str, _color: Color) {
        if self.debug_labels() {
            self.command_buffer.ctx().gl().push_debug_group(label);
        }
    }

    fn insert_debug_event_label(&mut self, label: &str, _color: Color) {
        if self.debug_labels() {
            self.command_buffer.ctx().gl().debug_message_insert(label);
        }
    }

    fn pop_debug_group_label(&mut self) {
        if self.debug_labels() {
            self.command_buffer.ctx().gl().pop_debug_group();
        }
    }
}

impl Drop for GlRenderCommandEncoder<'_> {
    fn drop(&mut self) {
        if self.state.state() == EncoderState::Encoding {
            hal_warn!("prism::opengl::RenderEncoder", "Encoder dropped without end_encoding, ending the pass");
            let _ = self.end_encoding();
        }
    }
}
