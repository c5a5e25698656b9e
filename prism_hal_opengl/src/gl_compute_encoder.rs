/// ComputeCommandEncoder for OpenGL

use std::sync::Arc;
use prism_hal::{hal_error, hal_trace, hal_warn};
use prism_hal::prism::{Error, Result};
use prism_hal::prism::device::{
    Buffer, Color, ComputeCommandEncoder, ComputePipelineState, DeviceFeatures, Dimensions, Texture, UniformDesc,
};
use prism_hal::prism::state::{BufferBinding, ComputeBindingState, EncoderState, TextureBinding};
use crate::gl_command_buffer::GlCommandBuffer;
use crate::gl_compute_adapter::ComputeCommandAdapter;

/// OpenGL compute command encoder
pub struct GlComputeCommandEncoder<'a> {
    command_buffer: &'a mut GlCommandBuffer,
    state: ComputeBindingState,
    adapter: Option<ComputeCommandAdapter>,
}

impl<'a> GlComputeCommandEncoder<'a> {
    pub(crate) fn new(command_buffer: &'a mut GlCommandBuffer) -> Self {
        let adapter = command_buffer.ctx().acquire_compute_adapter();
        let mut state = ComputeBindingState::new();
        state.begin();
        Self { command_buffer, state, adapter: Some(adapter) }
    }

    fn debug_labels(&self) -> bool {
        self.command_buffer.ctx().has_feature(DeviceFeatures::DEBUG_LABELS)
    }
}

impl ComputeCommandEncoder for GlComputeCommandEncoder<'_> {
    fn end_encoding(&mut self) -> Result<()> {
        self.state.end();
        if let Some(mut adapter) = self.adapter.take() {
            adapter.end_encoding();
            self.command_buffer.ctx().release_compute_adapter(adapter);
        }
        Ok(())
    }

    fn bind_compute_pipeline_state(&mut self, pipeline: &Arc<dyn ComputePipelineState>) {
        self.state.bind_pipeline(pipeline);
    }

    fn bind_buffer(&mut self, index: u32, buffer: &Arc<dyn Buffer>, offset: u64, size: u64) {
        self.state.bind_buffer(index, Some(BufferBinding { buffer: Arc::clone(buffer), offset, size }));
    }

    fn bind_texture(&mut self, index: u32, texture: Option<&Arc<dyn Texture>>) {
        self.state.bind_texture(index, texture.map(|t| TextureBinding(Arc::clone(t))));
    }

    fn bind_uniform(&mut self, desc: &UniformDesc, data: &[u8]) {
        self.state.bind_uniform(desc, data);
    }

    fn bind_push_constants(&mut self, offset: u32, data: &[u8]) {
        self.state.bind_push_constants(offset, data);
    }

    /// The local size is declared in the shader; `thread_group_size` is ignored
    fn dispatch_thread_groups(&mut self, thread_group_count: Dimensions, thread_group_size: Dimensions) -> Result<()> {
        let Some(adapter) = self.adapter.as_mut() else {
            hal_error!("prism::opengl::ComputeEncoder", "Dispatch after end_encoding");
            return Err(Error::InvalidResource("Compute encoder already ended".to_string()));
        };
        self.state.flush(adapter)?;
        hal_trace!(
            "prism::opengl::ComputeEncoder",
            "Dispatch {:?} (group size {:?} comes from the shader)",
            thread_group_count,
            thread_group_size
        );
        adapter.dispatch(thread_group_count)
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

impl Drop for GlComputeCommandEncoder<'_> {
    fn drop(&mut self) {
        if self.state.state() == EncoderState::Encoding {
            hal_warn!("prism::opengl::ComputeEncoder", "Encoder dropped without end_encoding");
            let _ = self.end_encoding();
        }
    }
}
