/// Command recording traits: encoders, command buffers and the device factory
///
/// Bind calls only record state; nothing reaches the native API until the
/// next draw or dispatch, which flushes the dirty bindings. Binding on an
/// encoder that has ended panics.

use std::sync::Arc;
use crate::device::{
    BindGroupBufferDesc, BindGroupTextureDesc, BindTarget, Buffer, BufferDesc, Color,
    ComputePipelineDesc, ComputePipelineState, DepthBias, Dimensions, FeatureQuery, Framebuffer,
    FramebufferDesc, IndexFormat, RenderPassDesc, RenderPipelineDesc, RenderPipelineState,
    SamplerDesc, SamplerState, ScissorRect, ShaderModule, ShaderModuleDesc, Texture, TextureDesc,
    UniformDesc, Viewport,
};
use crate::error::Result;

/// Records draws into one render pass
pub trait RenderCommandEncoder {
    /// Finish the pass; the encoder must not be used afterwards
    fn end_encoding(&mut self) -> Result<()>;

    fn bind_render_pipeline_state(&mut self, pipeline: &Arc<dyn RenderPipelineState>);

    fn bind_viewport(&mut self, viewport: Viewport);

    fn bind_scissor_rect(&mut self, rect: ScissorRect);

    fn set_depth_bias(&mut self, bias: DepthBias);

    fn set_stencil_reference_value(&mut self, value: u32);

    fn set_blend_color(&mut self, color: Color);

    fn bind_vertex_buffer(&mut self, index: u32, buffer: &Arc<dyn Buffer>, offset: u64);

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, format: IndexFormat, offset: u64);

    /// Bind a uniform or storage buffer range (`size` 0 = rest of the buffer)
    fn bind_buffer(&mut self, index: u32, buffer: &Arc<dyn Buffer>, offset: u64, size: u64);

    fn bind_texture(&mut self, index: u32, target: BindTarget, texture: Option<&Arc<dyn Texture>>);

    fn bind_sampler_state(&mut self, index: u32, target: BindTarget, sampler: Option<&Arc<dyn SamplerState>>);

    /// Bind a loose uniform by location (requires `DeviceFeatures::BIND_UNIFORM`)
    fn bind_uniform(&mut self, desc: &UniformDesc, data: &[u8]);

    /// Requires `DeviceFeatures::PUSH_CONSTANTS`
    fn bind_push_constants(&mut self, offset: u32, data: &[u8]);

    /// Expand a texture bind group into per-slot texture and sampler binds
    fn bind_texture_group(&mut self, group: &BindGroupTextureDesc) {
        for (slot, texture, sampler) in group.entries() {
            self.bind_texture(slot, BindTarget::ALL_GRAPHICS, Some(texture));
            self.bind_sampler_state(slot, BindTarget::ALL_GRAPHICS, sampler);
        }
    }

    /// Expand a buffer bind group into per-slot buffer binds
    fn bind_buffer_group(&mut self, group: &BindGroupBufferDesc, dynamic_offsets: &[u32]) {
        for (slot, range) in group.resolve(dynamic_offsets) {
            self.bind_buffer(slot, &range.buffer, range.offset, range.size);
        }
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, base_instance: u32) -> Result<()>;

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        base_instance: u32,
    ) -> Result<()>;

    /// No-op unless `DeviceFeatures::DEBUG_LABELS` is enabled
    fn push_debug_group_label(&mut self, label: &str, color: Color);

    fn insert_debug_event_label(&mut self, label: &str, color: Color);

    fn pop_debug_group_label(&mut self);
}

/// Records dispatches
pub trait ComputeCommandEncoder {
    fn end_encoding(&mut self) -> Result<()>;

    fn bind_compute_pipeline_state(&mut self, pipeline: &Arc<dyn ComputePipelineState>);

    fn bind_buffer(&mut self, index: u32, buffer: &Arc<dyn Buffer>, offset: u64, size: u64);

    fn bind_texture(&mut self, index: u32, texture: Option<&Arc<dyn Texture>>);

    fn bind_uniform(&mut self, desc: &UniformDesc, data: &[u8]);

    fn bind_push_constants(&mut self, offset: u32, data: &[u8]);

    fn dispatch_thread_groups(&mut self, thread_group_count: Dimensions, thread_group_size: Dimensions) -> Result<()>;

    fn push_debug_group_label(&mut self, label: &str, color: Color);

    fn insert_debug_event_label(&mut self, label: &str, color: Color);

    fn pop_debug_group_label(&mut self);
}

/// A stream of encoded passes submitted as a unit
pub trait CommandBuffer {
    /// Begin a render pass. Only one encoder may be open at a time.
    fn create_render_command_encoder(
        &mut self,
        render_pass: &RenderPassDesc,
        framebuffer: &Arc<dyn Framebuffer>,
    ) -> Result<Box<dyn RenderCommandEncoder + '_>>;

    fn create_compute_command_encoder(&mut self) -> Result<Box<dyn ComputeCommandEncoder + '_>>;

    /// Draw calls recorded so far
    fn current_draw_count(&self) -> u32;

    /// Submit the recorded work and wait for it to complete
    fn submit(&mut self) -> Result<()>;
}

/// Factory for every GPU object
pub trait Device: FeatureQuery {
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn Buffer>>;

    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>>;

    fn create_sampler_state(&self, desc: &SamplerDesc) -> Result<Arc<dyn SamplerState>>;

    fn create_shader_module(&self, desc: ShaderModuleDesc) -> Result<Arc<dyn ShaderModule>>;

    fn create_render_pipeline(&self, desc: RenderPipelineDesc) -> Result<Arc<dyn RenderPipelineState>>;

    fn create_compute_pipeline(&self, desc: ComputePipelineDesc) -> Result<Arc<dyn ComputePipelineState>>;

    fn create_framebuffer(&self, desc: FramebufferDesc) -> Result<Arc<dyn Framebuffer>>;

    fn create_command_buffer(&self) -> Result<Box<dyn CommandBuffer + '_>>;
}
