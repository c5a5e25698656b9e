/// Render encoder binding state
///
/// Holds everything bound on a render encoder and decides which native calls
/// a draw needs. Flush order is fixed:
///
/// 1. pipeline, then the dynamic state that rides along with it
/// 2. buffers: uniform/storage, vertex, index
/// 3. textures, then samplers
/// 4. loose uniforms, push constants

use std::sync::Arc;
use crate::device::{
    BindTarget, Color, DepthBias, RenderPipelineState, ScissorRect, ShaderStage, UniformDesc, Viewport,
};
use crate::error::{Error, Result};
use crate::state::{
    BufferBinding, DirtyFlags, EncoderState, IndexBufferBinding, PushConstants, SamplerBinding,
    SlotTable, TextureBinding, UniformTable, MAX_BUFFER_BINDINGS, MAX_TEXTURE_SAMPLERS,
    MAX_VERTEX_BUFFERS,
};

/// Receiver of flushed render bindings (one per backend)
pub trait RenderBindingSink {
    fn bind_pipeline(&mut self, pipeline: &Arc<dyn RenderPipelineState>) -> Result<()>;

    fn set_viewport(&mut self, viewport: &Viewport) -> Result<()>;

    fn set_scissor(&mut self, rect: &ScissorRect) -> Result<()>;

    fn set_depth_bias(&mut self, bias: &DepthBias) -> Result<()>;

    fn set_stencil_reference(&mut self, value: u32) -> Result<()>;

    fn set_blend_color(&mut self, color: &Color) -> Result<()>;

    /// Uniform/storage buffer slot; `None` unbinds
    fn bind_buffer(&mut self, index: u32, binding: Option<&BufferBinding>) -> Result<()>;

    fn bind_vertex_buffer(&mut self, index: u32, binding: Option<&BufferBinding>) -> Result<()>;

    fn bind_index_buffer(&mut self, binding: &IndexBufferBinding) -> Result<()>;

    fn bind_texture(&mut self, stage: ShaderStage, index: u32, texture: Option<&TextureBinding>) -> Result<()>;

    fn bind_sampler(&mut self, stage: ShaderStage, index: u32, sampler: Option<&SamplerBinding>) -> Result<()>;

    fn bind_uniform(&mut self, desc: &UniformDesc, data: &[u8]) -> Result<()>;

    fn bind_push_constants(&mut self, constants: &PushConstants) -> Result<()>;

    /// Called once after every dirty binding was handed over
    fn end_flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Binding state of one render encoder
pub struct RenderBindingState {
    state: EncoderState,
    dirty: DirtyFlags,
    pipeline: Option<Arc<dyn RenderPipelineState>>,
    viewport: Option<Viewport>,
    scissor: Option<ScissorRect>,
    depth_bias: Option<DepthBias>,
    stencil_reference: Option<u32>,
    blend_color: Option<Color>,
    buffers: SlotTable<BufferBinding, MAX_BUFFER_BINDINGS>,
    vertex_buffers: SlotTable<BufferBinding, MAX_VERTEX_BUFFERS>,
    index_buffer: Option<IndexBufferBinding>,
    fragment_textures: SlotTable<TextureBinding, MAX_TEXTURE_SAMPLERS>,
    vertex_textures: SlotTable<TextureBinding, MAX_TEXTURE_SAMPLERS>,
    fragment_samplers: SlotTable<SamplerBinding, MAX_TEXTURE_SAMPLERS>,
    vertex_samplers: SlotTable<SamplerBinding, MAX_TEXTURE_SAMPLERS>,
    uniforms: UniformTable,
    push_constants: Option<PushConstants>,
}

impl Default for RenderBindingState {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBindingState {
    pub fn new() -> Self {
        Self {
            state: EncoderState::Idle,
            dirty: DirtyFlags::empty(),
            pipeline: None,
            viewport: None,
            scissor: None,
            depth_bias: None,
            stencil_reference: None,
            blend_color: None,
            buffers: SlotTable::new(),
            vertex_buffers: SlotTable::new(),
            index_buffer: None,
            fragment_textures: SlotTable::new(),
            vertex_textures: SlotTable::new(),
            fragment_samplers: SlotTable::new(),
            vertex_samplers: SlotTable::new(),
            uniforms: UniformTable::default(),
            push_constants: None,
        }
    }

    /// Idle -> Encoding. Starts from an empty binding set.
    pub fn begin(&mut self) {
        assert_eq!(self.state, EncoderState::Idle, "begin() called on an encoder that is already encoding");
        self.reset();
        self.state = EncoderState::Encoding;
    }

    /// Encoding -> Idle. Every binding is dropped.
    pub fn end(&mut self) {
        assert_eq!(self.state, EncoderState::Encoding, "end() called on an encoder that is not encoding");
        self.reset();
        self.state = EncoderState::Idle;
    }

    fn reset(&mut self) {
        self.dirty = DirtyFlags::empty();
        self.pipeline = None;
        self.viewport = None;
        self.scissor = None;
        self.depth_bias = None;
        self.stencil_reference = None;
        self.blend_color = None;
        self.buffers.clear();
        self.vertex_buffers.clear();
        self.index_buffer = None;
        self.fragment_textures.clear();
        self.vertex_textures.clear();
        self.fragment_samplers.clear();
        self.vertex_samplers.clear();
        self.uniforms.clear();
        self.push_constants = None;
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    fn assert_encoding(&self) {
        assert_eq!(self.state, EncoderState::Encoding, "Binding on an encoder that is not encoding");
    }

    // ===== BIND CALLS =====

    /// Bind a pipeline.
    ///
    /// Rebinding the same object is a no-op. Switching to a pipeline with a
    /// different shader program re-issues every bound resource, since slot
    /// assignments are program-specific. Switching vertex input layouts
    /// re-issues the vertex buffers.
    pub fn bind_pipeline(&mut self, pipeline: &Arc<dyn RenderPipelineState>) {
        self.assert_encoding();

        if let Some(current) = &self.pipeline {
            if std::ptr::addr_eq(Arc::as_ptr(current), Arc::as_ptr(pipeline)) {
                return;
            }
            if !current.matches_shader_program(pipeline.as_ref()) {
                self.buffers.mark_bound_dirty();
                self.vertex_buffers.mark_bound_dirty();
                self.fragment_textures.mark_bound_dirty();
                self.vertex_textures.mark_bound_dirty();
                self.fragment_samplers.mark_bound_dirty();
                self.vertex_samplers.mark_bound_dirty();
                self.uniforms.mark_all_dirty();
                if self.push_constants.is_some() {
                    self.dirty |= DirtyFlags::PUSH_CONSTANTS;
                }
            } else if !current.matches_vertex_input(pipeline.as_ref()) {
                self.vertex_buffers.mark_bound_dirty();
            }
        }

        self.pipeline = Some(Arc::clone(pipeline));
        self.dirty |= DirtyFlags::PIPELINE;
    }

    pub fn pipeline(&self) -> Option<&Arc<dyn RenderPipelineState>> {
        self.pipeline.as_ref()
    }

    pub fn bind_viewport(&mut self, viewport: Viewport) {
        self.assert_encoding();
        if self.viewport != Some(viewport) {
            self.viewport = Some(viewport);
            self.dirty |= DirtyFlags::VIEWPORT;
        }
    }

    pub fn bind_scissor(&mut self, rect: ScissorRect) {
        self.assert_encoding();
        if self.scissor != Some(rect) {
            self.scissor = Some(rect);
            self.dirty |= DirtyFlags::SCISSOR;
        }
    }

    pub fn set_depth_bias(&mut self, bias: DepthBias) {
        self.assert_encoding();
        if self.depth_bias != Some(bias) {
            self.depth_bias = Some(bias);
            self.dirty |= DirtyFlags::DEPTH_BIAS;
        }
    }

    pub fn set_stencil_reference(&mut self, value: u32) {
        self.assert_encoding();
        if self.stencil_reference != Some(value) {
            self.stencil_reference = Some(value);
            self.dirty |= DirtyFlags::STENCIL_REF;
        }
    }

    pub fn set_blend_color(&mut self, color: Color) {
        self.assert_encoding();
        if self.blend_color != Some(color) {
            self.blend_color = Some(color);
            self.dirty |= DirtyFlags::BLEND_COLOR;
        }
    }

    pub fn bind_buffer(&mut self, index: u32, binding: Option<BufferBinding>) {
        self.assert_encoding();
        self.buffers.set(index as usize, binding);
    }

    pub fn bind_vertex_buffer(&mut self, index: u32, binding: Option<BufferBinding>) {
        self.assert_encoding();
        self.vertex_buffers.set(index as usize, binding);
    }

    pub fn bind_index_buffer(&mut self, binding: IndexBufferBinding) {
        self.assert_encoding();
        if self.index_buffer.as_ref() != Some(&binding) {
            self.index_buffer = Some(binding);
            self.dirty |= DirtyFlags::INDEX_BUFFER;
        }
    }

    pub fn index_buffer(&self) -> Option<&IndexBufferBinding> {
        self.index_buffer.as_ref()
    }

    pub fn bind_texture(&mut self, index: u32, target: BindTarget, texture: Option<TextureBinding>) {
        self.assert_encoding();
        if target.contains(BindTarget::VERTEX) {
            self.vertex_textures.set(index as usize, texture.clone());
        }
        if target.contains(BindTarget::FRAGMENT) {
            self.fragment_textures.set(index as usize, texture);
        }
    }

    pub fn bind_sampler(&mut self, index: u32, target: BindTarget, sampler: Option<SamplerBinding>) {
        self.assert_encoding();
        if target.contains(BindTarget::VERTEX) {
            self.vertex_samplers.set(index as usize, sampler.clone());
        }
        if target.contains(BindTarget::FRAGMENT) {
            self.fragment_samplers.set(index as usize, sampler);
        }
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

    // ===== FLUSH =====

    /// Whether a flush would issue anything
    pub fn has_pending(&self) -> bool {
        !self.dirty.is_empty()
            || self.buffers.dirty_mask() != 0
            || self.vertex_buffers.dirty_mask() != 0
            || self.fragment_textures.dirty_mask() != 0
            || self.vertex_textures.dirty_mask() != 0
            || self.fragment_samplers.dirty_mask() != 0
            || self.vertex_samplers.dirty_mask() != 0
            || self.uniforms.has_dirty()
    }

    /// Hand every dirty binding to `sink` in flush order, then clear the dirty bits.
    ///
    /// Fails when no pipeline is bound; sink errors propagate unchanged.
    pub fn flush(&mut self, sink: &mut dyn RenderBindingSink) -> Result<()> {
        self.assert_encoding();

        let Some(pipeline) = self.pipeline.clone() else {
            crate::hal_error!("prism::state::RenderBindingState", "Draw issued without a render pipeline bound");
            return Err(Error::InvalidResource("No render pipeline state bound".to_string()));
        };

        if self.dirty.contains(DirtyFlags::PIPELINE) {
            sink.bind_pipeline(&pipeline)?;
            self.dirty.remove(DirtyFlags::PIPELINE);
        }
        if self.dirty.contains(DirtyFlags::VIEWPORT) {
            if let Some(viewport) = &self.viewport {
                sink.set_viewport(viewport)?;
            }
            self.dirty.remove(DirtyFlags::VIEWPORT);
        }
        if self.dirty.contains(DirtyFlags::SCISSOR) {
            if let Some(rect) = &self.scissor {
                sink.set_scissor(rect)?;
            }
            self.dirty.remove(DirtyFlags::SCISSOR);
        }
        if self.dirty.contains(DirtyFlags::DEPTH_BIAS) {
            if let Some(bias) = &self.depth_bias {
                sink.set_depth_bias(bias)?;
            }
            self.dirty.remove(DirtyFlags::DEPTH_BIAS);
        }
        if self.dirty.contains(DirtyFlags::STENCIL_REF) {
            if let Some(value) = self.stencil_reference {
                sink.set_stencil_reference(value)?;
            }
            self.dirty.remove(DirtyFlags::STENCIL_REF);
        }
        if self.dirty.contains(DirtyFlags::BLEND_COLOR) {
            if let Some(color) = &self.blend_color {
                sink.set_blend_color(color)?;
            }
            self.dirty.remove(DirtyFlags::BLEND_COLOR);
        }

        self.buffers.flush_dirty(|index, binding| sink.bind_buffer(index as u32, binding))?;
        self.vertex_buffers.flush_dirty(|index, binding| sink.bind_vertex_buffer(index as u32, binding))?;
        if self.dirty.contains(DirtyFlags::INDEX_BUFFER) {
            if let Some(binding) = &self.index_buffer {
                sink.bind_index_buffer(binding)?;
            }
            self.dirty.remove(DirtyFlags::INDEX_BUFFER);
        }

        self.fragment_textures
            .flush_dirty(|index, texture| sink.bind_texture(ShaderStage::Fragment, index as u32, texture))?;
        self.vertex_textures
            .flush_dirty(|index, texture| sink.bind_texture(ShaderStage::Vertex, index as u32, texture))?;
        self.fragment_samplers
            .flush_dirty(|index, sampler| sink.bind_sampler(ShaderStage::Fragment, index as u32, sampler))?;
        self.vertex_samplers
            .flush_dirty(|index, sampler| sink.bind_sampler(ShaderStage::Vertex, index as u32, sampler))?;

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
#[path = "render_state_tests.rs"]
mod tests;
