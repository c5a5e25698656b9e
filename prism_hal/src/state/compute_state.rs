/// Compute encoder binding state
///
/// Same protocol as the render side with fewer categories: pipeline,
/// buffers, textures, then uniforms and push constants.

use std::sync::Arc;
use crate::device::{ComputePipelineState, UniformDesc};
use crate::error::{Error, Result};
use crate::state::{
    BufferBinding, DirtyFlags, EncoderState, PushConstants, SlotTable, TextureBinding, UniformTable,
    MAX_BUFFER_BINDINGS, MAX_TEXTURE_SAMPLERS,
};

/// Receiver of flushed compute bindings (one per backend)
pub trait ComputeBindingSink {
    fn bind_pipeline(&mut self, pipeline: &Arc<dyn ComputePipelineState>) -> Result<()>;

    fn bind_buffer(&mut self, index: u32, binding: Option<&BufferBinding>) -> Result<()>;

    fn bind_texture(&mut self, index: u32, texture: Option<&TextureBinding>) -> Result<()>;

    fn bind_uniform(&mut self, desc: &UniformDesc, data: &[u8]) -> Result<()>;

    fn bind_push_constants(&mut self, constants: &PushConstants) -> Result<()>;

    fn end_flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Binding state of one compute encoder
pub struct ComputeBindingState {
    state: EncoderState,
    dirty: DirtyFlags,
    pipeline: Option<Arc<dyn ComputePipelineState>>,
    buffers: SlotTable<BufferBinding, MAX_BUFFER_BINDINGS>,
    textures: SlotTable<TextureBinding, MAX_TEXTURE_SAMPLERS>,
    uniforms: UniformTable,
    push_constants: Option<PushConstants>,
}

impl Default for ComputeBindingState {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBindingState {
    pub fn new() -> Self {
        Self {
            state: EncoderState::Idle,
            dirty: DirtyFlags::empty(),
            pipeline: None,
            buffers: SlotTable::new(),
            textures: SlotTable::new(),
            uniforms: UniformTable::default(),
            push_constants: None,
        }
    }

    pub fn begin(&mut self) {
        assert_eq!(self.state, EncoderState::Idle, "begin() called on an encoder that is already encoding");
        self.reset();
        self.state = EncoderState::Encoding;
    }

    pub fn end(&mut self) {
        assert_eq!(self.state, EncoderState::Encoding, "end() called on an encoder that is not encoding");
        self.reset();
        self.state = EncoderState::Idle;
    }

    fn reset(&mut self) {
        self.dirty = DirtyFlags::empty();
        self.pipeline = None;
        self.buffers.clear();
        self.textures.clear();
        self.uniforms.clear();
        self.push_constants = None;
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    fn assert_encoding(&self) {
        assert_eq!(self.state, EncoderState::Encoding, "Binding on an encoder that is not encoding");
    }

    /// Bind a pipeline; a different program re-issues every bound resource
    pub fn bind_pipeline(&mut self, pipeline: &Arc<dyn ComputePipelineState>) {
        self.assert_encoding();

        if let Some(current) = &self.pipeline {
            if std::ptr::addr_eq(Arc::as_ptr(current), Arc::as_ptr(pipeline)) {
                return;
            }
            if !current.matches_shader_program(pipeline.as_ref()) {
                self.buffers.mark_bound_dirty();
                self.textures.mark_bound_dirty();
                self.uniforms.mark_all_dirty();
                if self.push_constants.is_some() {
                    self.dirty |= DirtyFlags::PUSH_CONSTANTS;
                }
            }
        }

        self.pipeline = Some(Arc::clone(pipeline));
        self.dirty |= DirtyFlags::PIPELINE;
    }

    pub fn pipeline(&self) -> Option<&Arc<dyn ComputePipelineState>> {
        self.pipeline.as_ref()
    }

    pub fn bind_buffer(&mut self, index: u32, binding: Option<BufferBinding>) {
        self.assert_encoding();
        self.buffers.set(index as usize, binding);
    }

    pub fn bind_texture(&mut self, index: u32, texture: Option<TextureBinding>) {
        self.assert_encoding();
        self.textures.set(index as usize, texture);
    }

    pub fn bind_uniform(&mut self, desc: &UniformDesc, data: &[u8]) {
        self.assert_encoding();
        self.uniforms.set(*desc, desc.pack(data));
    }

    pub fn bind_push_constants(&mut self, offset: u32, data: &[u8]) {
        self.assert_encoding();
        let constants = PushConstants { offset, data: data.to_vec() };
        if self.push_constants.as_ref() != Some(&constants) {
            self.push_constants = Some(constants);
            self.dirty |= DirtyFlags::PUSH_CONSTANTS;
        }
    }

    /// Hand every dirty binding to `sink`, then clear the dirty bits
    pub fn flush(&mut self, sink: &mut dyn ComputeBindingSink) -> Result<()> {
        self.assert_encoding();

        let Some(pipeline) = self.pipeline.clone() else {
            crate::hal_error!("prism::state::ComputeBindingState", "Dispatch issued without a compute pipeline bound");
            return Err(Error::InvalidResource("No compute pipeline state bound".to_string()));
        };

        if self.dirty.contains(DirtyFlags::PIPELINE) {
            sink.bind_pipeline(&pipeline)?;
            self.dirty.remove(DirtyFlags::PIPELINE);
        }
        self.buffers.flush_dirty(|index, binding| sink.bind_buffer(index as u32, binding))?;
        self.textures.flush_dirty(|index, texture| sink.bind_texture(index as u32, texture))?;
        for (desc, data) in self.uniforms.dirty_entries() {
            sink.bind_uniform(desc, data)?;
        }
        self.uniforms.clear_dirty();
        if self.dirty.contains(DirtyFlags::PUSH_CONSTANTS) {
            if let Some(constants) = &self.push_constants {
                sink.bind_push_constants(constants)?;
            }
            self.dirty.remove(DirtyFlags::PUSH_CONSTANTS);
        }

        sink.end_flush()
    }
}

#[cfg(test)]
#[path = "compute_state_tests.rs"]
mod tests;
