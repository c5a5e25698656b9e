/// RenderCommandAdapter - turns flushed render bindings into GL calls
///
/// OpenGL state is global to the context, so the adapter remembers what it
/// touched: enabled vertex attributes, the raster and blend state last
/// applied, texture units and indexed buffer points in use. Vertex buffers
/// are bound in `end_flush` together with their attribute pointers, since
/// the pointers come from the pipeline layout and must follow any pipeline
/// change. Adapters are pooled on the context and reused across encoders.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use prism_hal::{hal_error, hal_trace, hal_warn};
use prism_hal::prism::{Error, Result};
use prism_hal::prism::binder::{RasterBinder, VertexAttributeTracker};
use prism_hal::prism::device::{
    Color, ColorBlendState, DepthBias, DeviceFeatures, Framebuffer, IndexFormat, LoadAction, RenderPassDesc,
    RenderPipelineState, ScissorRect, ShaderStage, UniformDesc, Viewport,
};
use prism_hal::prism::state::{
    BitIter, BufferBinding, IndexBufferBinding, PushConstants, RenderBindingSink, SamplerBinding, TextureBinding,
    MAX_VERTEX_BUFFERS,
};
use crate::gl_buffer::gl_buffer;
use crate::gl_commands::consts as gl;
use crate::gl_commands::{GLenum, GLint, GLsizei, GLuint, GlCommands};
use crate::gl_context::UnbindPolicy;
use crate::gl_conversions::{
    blend_factor_to_gl, blend_op_to_gl, cull_mode_to_gl, front_face_to_gl, index_format_to_gl,
    indexed_buffer_target_to_gl, polygon_mode_to_gl,
};
use crate::gl_framebuffer::{gl_framebuffer, gl_texture};
use crate::gl_pipeline::GlRenderPipelineState;
use crate::gl_sampler::GlSamplerState;

pub(crate) fn apply_blend(gl_api: &dyn GlCommands, blend: &ColorBlendState) {
    if !blend.blend_enable {
        gl_api.disable(gl::BLEND);
        return;
    }
    gl_api.enable(gl::BLEND);
    gl_api.blend_equation_separate(blend_op_to_gl(blend.color_blend_op), blend_op_to_gl(blend.alpha_blend_op));
    gl_api.blend_func_separate(
        blend_factor_to_gl(blend.src_color_factor),
        blend_factor_to_gl(blend.dst_color_factor),
        blend_factor_to_gl(blend.src_alpha_factor),
        blend_factor_to_gl(blend.dst_alpha_factor),
    );
}

/// Upload a loose uniform. `data` holds `num_elements` packed elements.
pub(crate) fn apply_uniform(gl_api: &dyn GlCommands, desc: &UniformDesc, data: &[u8]) {
    let uniform_type = desc.uniform_type;
    if let Some(dimension) = uniform_type.matrix_dimension() {
        let values: Vec<f32> = bytemuck::pod_collect_to_vec(data);
        gl_api.uniform_matrix_fv(desc.location, dimension, desc.num_elements, &values);
    } else if uniform_type.is_integer() {
        let values: Vec<i32> = bytemuck::pod_collect_to_vec(data);
        gl_api.uniform_iv(desc.location, uniform_type.component_count(), desc.num_elements, &values);
    } else {
        let values: Vec<f32> = bytemuck::pod_collect_to_vec(data);
        gl_api.uniform_fv(desc.location, uniform_type.component_count(), desc.num_elements, &values);
    }
}

/// Bind `binding` at an indexed uniform/storage point, or clear the point.
/// Returns the target now bound at `index`.
pub(crate) fn apply_indexed_buffer(
    gl_api: &dyn GlCommands,
    index: u32,
    binding: Option<&BufferBinding>,
    previous: Option<GLenum>,
) -> Result<Option<GLenum>> {
    let Some(binding) = binding else {
        if let Some(target) = previous {
            gl_api.bind_buffer_base(target, index, 0);
        }
        return Ok(None);
    };
    let buffer = gl_buffer(&binding.buffer)?;
    let target = indexed_buffer_target_to_gl(binding.buffer.usage());
    let size = if binding.size == 0 { binding.buffer.size().saturating_sub(binding.offset) } else { binding.size };
    gl_api.bind_buffer_range(target, index, buffer.gl_id(), binding.offset as usize, size as usize);
    Ok(Some(target))
}

/// Render binding sink over one GL context
pub(crate) struct RenderCommandAdapter {
    gl: Arc<dyn GlCommands>,
    features: DeviceFeatures,
    unbind_policy: UnbindPolicy,
    attributes: VertexAttributeTracker,
    raster: RasterBinder,
    pipeline: Option<Arc<dyn RenderPipelineState>>,
    framebuffer: Option<Arc<dyn Framebuffer>>,
    render_pass: RenderPassDesc,
    vertex_buffers: [Option<(GLuint, u64)>; MAX_VERTEX_BUFFERS],
    dirty_vertex_buffers: u64,
    index_buffer: Option<(IndexFormat, u64)>,
    stencil_reference: u32,
    /// Texture unit -> target of the texture bound there
    texture_units: FxHashMap<u32, GLenum>,
    sampler_units: u64,
    /// Binding point -> target of the buffer bound there
    indexed_buffers: FxHashMap<u32, GLenum>,
    scissor_was_enabled: bool,
}

impl RenderCommandAdapter {
    pub(crate) fn new(gl: Arc<dyn GlCommands>, features: DeviceFeatures, unbind_policy: UnbindPolicy) -> Self {
        Self {
            gl,
            features,
            unbind_policy,
            attributes: VertexAttributeTracker::new(),
            raster: RasterBinder::new(),
            pipeline: None,
            framebuffer: None,
            render_pass: RenderPassDesc::default(),
            vertex_buffers: [None; MAX_VERTEX_BUFFERS],
            dirty_vertex_buffers: 0,
            index_buffer: None,
            stencil_reference: 0,
            texture_units: FxHashMap::default(),
            sampler_units: 0,
            indexed_buffers: FxHashMap::default(),
            scissor_was_enabled: false,
        }
    }

    /// Bind the framebuffer, apply the load actions and reset the viewport
    /// to the whole target
    pub(crate) fn initialize(&mut self, render_pass: &RenderPassDesc, framebuffer: &Arc<dyn Framebuffer>) -> Result<()> {
        let target = gl_framebuffer(framebuffer)?;
        let (width, height) = target.size();
        let gl_api = self.gl.as_ref();

        gl_api.bind_framebuffer(gl::FRAMEBUFFER, target.gl_fbo());
        gl_api.viewport(0, 0, width as GLsizei, height as GLsizei);
        gl_api.depth_range_f(0.0, 1.0);

        // Clears are clipped by the scissor; the encoder restores it on end
        self.scissor_was_enabled = gl_api.is_enabled(gl::SCISSOR_TEST);
        gl_api.disable(gl::SCISSOR_TEST);

        let mut clear_mask = 0;
        let clear_color = render_pass.color_attachments.iter().find(|a| a.load_action == LoadAction::Clear);
        if let Some(attachment) = clear_color {
            let [r, g, b, a] = attachment.clear_color.to_array();
            gl_api.color_mask(true, true, true, true);
            gl_api.clear_color(r, g, b, a);
            clear_mask |= gl::COLOR_BUFFER_BIT;
        }
        let depth = framebuffer.desc().depth_attachment.as_ref().map(|a| a.texture.desc().format);
        if depth.is_some_and(|f| f.is_depth()) && render_pass.depth.load_action == LoadAction::Clear {
            gl_api.depth_mask(true);
            gl_api.clear_depth_f(render_pass.depth.clear_depth);
            clear_mask |= gl::DEPTH_BUFFER_BIT;
        }
        if depth.is_some_and(|f| f.has_stencil()) && render_pass.stencil.load_action == LoadAction::Clear {
            gl_api.stencil_mask_separate(gl::FRONT_AND_BACK, 0xFF);
            gl_api.clear_stencil(render_pass.stencil.clear_stencil as GLint);
            clear_mask |= gl::STENCIL_BUFFER_BIT;
        }
        if clear_mask != 0 {
            gl_api.clear(clear_mask);
        }

        // Clears touched the write masks; the first pipeline re-applies everything
        self.raster.invalidate();
        self.framebuffer = Some(Arc::clone(framebuffer));
        self.render_pass = render_pass.clone();
        Ok(())
    }

    fn current_pipeline(&self) -> Result<&GlRenderPipelineState> {
        self.pipeline
            .as_deref()
            .and_then(|p| p.as_any().downcast_ref::<GlRenderPipelineState>())
            .ok_or_else(|| Error::InvalidResource("No OpenGL render pipeline bound".to_string()))
    }

    fn texture_unit(&self, stage: ShaderStage, index: u32) -> u32 {
        match (stage, self.current_pipeline()) {
            (ShaderStage::Vertex, Ok(pipeline)) => pipeline.layout().vertex_texture_unit(index),
            _ => index,
        }
    }

    // ===== DRAWS =====

    pub(crate) fn draw(&self, vertex_count: u32, instance_count: u32, first_vertex: u32) -> Result<()> {
        let mode = self.current_pipeline()?.primitive_mode();
        if instance_count == 1 {
            self.gl.draw_arrays(mode, first_vertex as GLint, vertex_count as GLsizei);
        } else {
            self.gl.draw_arrays_instanced(mode, first_vertex as GLint, vertex_count as GLsizei, instance_count as GLsizei);
        }
        Ok(())
    }

    pub(crate) fn draw_indexed(&self, index_count: u32, instance_count: u32, first_index: u32) -> Result<()> {
        let mode = self.current_pipeline()?.primitive_mode();
        let Some((format, offset)) = self.index_buffer else {
            hal_error!("prism::opengl::RenderAdapter", "draw_indexed without an index buffer");
            return Err(Error::InvalidResource("No index buffer bound".to_string()));
        };
        let ty = index_format_to_gl(format);
        let offset = (offset + u64::from(first_index) * u64::from(format.size_bytes())) as usize;
        if instance_count == 1 {
            self.gl.draw_elements(mode, index_count as GLsizei, ty, offset);
        } else {
            self.gl.draw_elements_instanced(mode, index_count as GLsizei, ty, offset, instance_count as GLsizei);
        }
        Ok(())
    }

    // ===== END =====

    /// Undo the pass-local state, resolve MSAA attachments and return to
    /// the default framebuffer. Leaves the adapter ready for reuse.
    pub(crate) fn end_encoding(&mut self) {
        let gl_api = self.gl.as_ref();

        for location in BitIter::new(self.attributes.reset()) {
            gl_api.disable_vertex_attrib_array(location as GLuint);
        }
        if self.unbind_policy == UnbindPolicy::EndEncoding {
            gl_api.use_program(0);
            gl_api.bind_buffer(gl::ARRAY_BUFFER, 0);
            gl_api.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, 0);
            for (&index, &target) in &self.indexed_buffers {
                gl_api.bind_buffer_base(target, index, 0);
            }
            for (&unit, &target) in &self.texture_units {
                gl_api.active_texture(gl::TEXTURE0 + unit);
                gl_api.bind_texture(target, 0);
            }
            for unit in BitIter::new(self.sampler_units) {
                gl_api.bind_sampler(unit as GLuint, 0);
            }
        }

        if self.scissor_was_enabled {
            gl_api.enable(gl::SCISSOR_TEST);
        } else {
            gl_api.disable(gl::SCISSOR_TEST);
        }
        gl_api.disable(gl::POLYGON_OFFSET_FILL);

        if let Some(framebuffer) = self.framebuffer.take() {
            if let Ok(target) = gl_framebuffer(&framebuffer) {
                target.resolve(gl_api, &self.render_pass);
            }
        }
        gl_api.bind_framebuffer(gl::FRAMEBUFFER, 0);

        self.raster.invalidate();
        self.pipeline = None;
        self.render_pass = RenderPassDesc::default();
        self.vertex_buffers = [None; MAX_VERTEX_BUFFERS];
        self.dirty_vertex_buffers = 0;
        self.index_buffer = None;
        self.stencil_reference = 0;
        self.texture_units.clear();
        self.sampler_units = 0;
        self.indexed_buffers.clear();
    }
}

impl RenderBindingSink for RenderCommandAdapter {
    fn bind_pipeline(&mut self, pipeline: &Arc<dyn RenderPipelineState>) -> Result<()> {
        let Some(gl_pipeline) = pipeline.as_any().downcast_ref::<GlRenderPipelineState>() else {
            hal_error!("prism::opengl::RenderAdapter", "Pipeline was not created by the OpenGL device");
            return Err(Error::InvalidResource("Pipeline is not an OpenGL render pipeline".to_string()));
        };
        let gl_api = self.gl.as_ref();
        gl_pipeline.bind(gl_api, self.stencil_reference);

        let transition = self.attributes.transition_to(gl_pipeline.layout().required_attributes());
        for location in transition.disabled() {
            gl_api.disable_vertex_attrib_array(location as GLuint);
        }
        for location in transition.enabled() {
            gl_api.enable_vertex_attrib_array(location as GLuint);
        }

        let changes = self.raster.update_raster(gl_pipeline.desc().rasterization);
        if let Some(cull_mode) = changes.cull_mode {
            match cull_mode_to_gl(cull_mode) {
                Some(face) => {
                    gl_api.enable(gl::CULL_FACE);
                    gl_api.cull_face(face);
                }
                None => gl_api.disable(gl::CULL_FACE),
            }
        }
        if let Some(front_face) = changes.front_face {
            gl_api.front_face(front_face_to_gl(front_face));
        }
        if let Some(polygon_mode) = changes.polygon_mode {
            if self.features.contains(DeviceFeatures::FILL_MODE_NON_SOLID) {
                gl_api.polygon_mode(gl::FRONT_AND_BACK, polygon_mode_to_gl(polygon_mode));
            }
        }
        if let Some(blend) = self.raster.update_blend(gl_pipeline.blend()) {
            apply_blend(gl_api, &blend);
        }

        // Attribute pointers come from the layout: re-point every bound buffer
        for (index, slot) in self.vertex_buffers.iter().enumerate() {
            if slot.is_some() {
                self.dirty_vertex_buffers |= 1 << index;
            }
        }
        self.pipeline = Some(Arc::clone(pipeline));
        Ok(())
    }

    fn set_viewport(&mut self, viewport: &Viewport) -> Result<()> {
        self.gl.viewport(viewport.x as GLint, viewport.y as GLint, viewport.width as GLsizei, viewport.height as GLsizei);
        self.gl.depth_range_f(viewport.min_depth, viewport.max_depth);
        Ok(())
    }

    fn set_scissor(&mut self, rect: &ScissorRect) -> Result<()> {
        self.gl.enable(gl::SCISSOR_TEST);
        self.gl.scissor(rect.x as GLint, rect.y as GLint, rect.width as GLsizei, rect.height as GLsizei);
        Ok(())
    }

    fn set_depth_bias(&mut self, bias: &DepthBias) -> Result<()> {
        if bias.constant_factor == 0.0 && bias.slope_factor == 0.0 {
            self.gl.disable(gl::POLYGON_OFFSET_FILL);
        } else {
            self.gl.enable(gl::POLYGON_OFFSET_FILL);
            self.gl.polygon_offset(bias.slope_factor, bias.constant_factor);
        }
        Ok(())
    }

    fn set_stencil_reference(&mut self, value: u32) -> Result<()> {
        self.stencil_reference = value;
        if let Ok(pipeline) = self.current_pipeline() {
            pipeline.apply_stencil_reference(self.gl.as_ref(), value);
        }
        Ok(())
    }

    fn set_blend_color(&mut self, color: &Color) -> Result<()> {
        self.gl.blend_color(color.r, color.g, color.b, color.a);
        Ok(())
    }

    fn bind_buffer(&mut self, index: u32, binding: Option<&BufferBinding>) -> Result<()> {
        let previous = self.indexed_buffers.get(&index).copied();
        match apply_indexed_buffer(self.gl.as_ref(), index, binding, previous)? {
            Some(target) => self.indexed_buffers.insert(index, target),
            None => self.indexed_buffers.remove(&index),
        };
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, index: u32, binding: Option<&BufferBinding>) -> Result<()> {
        let slot = match binding {
            Some(binding) => Some((gl_buffer(&binding.buffer)?.gl_id(), binding.offset)),
            None => None,
        };
        self.vertex_buffers[index as usize] = slot;
        if slot.is_some() {
            self.dirty_vertex_buffers |= 1 << index;
        } else {
            self.dirty_vertex_buffers &= !(1 << index);
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, binding: &IndexBufferBinding) -> Result<()> {
        if binding.format == IndexFormat::UInt8 && !self.features.contains(DeviceFeatures::INDEX_UINT8) {
            hal_error!("prism::opengl::RenderAdapter", "8-bit indices are not enabled on this context");
            return Err(Error::FeatureUnavailable("index_uint8".to_string()));
        }
        let buffer = gl_buffer(&binding.buffer)?;
        self.gl.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, buffer.gl_id());
        self.index_buffer = Some((binding.format, binding.offset));
        Ok(())
    }

    fn bind_texture(&mut self, stage: ShaderStage, index: u32, texture: Option<&TextureBinding>) -> Result<()> {
        let unit = self.texture_unit(stage, index);
        self.gl.active_texture(gl::TEXTURE0 + unit);
        match texture {
            Some(TextureBinding(texture)) => {
                let texture = gl_texture(texture)?;
                self.gl.bind_texture(texture.gl_target(), texture.gl_id());
                self.texture_units.insert(unit, texture.gl_target());
            }
            None => {
                let target = self.texture_units.remove(&unit).unwrap_or(gl::TEXTURE_2D);
                self.gl.bind_texture(target, 0);
            }
        }
        hal_trace!("prism::opengl::RenderAdapter", "{:?} texture slot {} -> unit {}", stage, index, unit);
        Ok(())
    }

    fn bind_sampler(&mut self, stage: ShaderStage, index: u32, sampler: Option<&SamplerBinding>) -> Result<()> {
        let unit = self.texture_unit(stage, index);
        let id = match sampler {
            Some(SamplerBinding(sampler)) => {
                let Some(sampler) = sampler.as_any().downcast_ref::<GlSamplerState>() else {
                    hal_error!("prism::opengl::RenderAdapter", "Sampler was not created by the OpenGL device");
                    return Err(Error::InvalidResource("Sampler is not an OpenGL sampler".to_string()));
                };
                self.sampler_units |= 1 << unit;
                sampler.gl_id()
            }
            None => {
                self.sampler_units &= !(1 << unit);
                0
            }
        };
        self.gl.bind_sampler(unit, id);
        Ok(())
    }

    fn bind_uniform(&mut self, desc: &UniformDesc, data: &[u8]) -> Result<()> {
        if desc.location < 0 {
            hal_warn!("prism::opengl::RenderAdapter", "Uniform with location {} skipped", desc.location);
            return Ok(());
        }
        apply_uniform(self.gl.as_ref(), desc, data);
        Ok(())
    }

    fn bind_push_constants(&mut self, constants: &PushConstants) -> Result<()> {
        hal_warn!(
            "prism::opengl::RenderAdapter",
            "Push constants are not supported on OpenGL, {} bytes ignored",
            constants.data.len()
        );
        Ok(())
    }

    fn end_flush(&mut self) -> Result<()> {
        let dirty = std::mem::take(&mut self.dirty_vertex_buffers);
        if dirty == 0 {
            return Ok(());
        }
        let pipeline = self.current_pipeline()?;
        let gl_api = self.gl.as_ref();
        for index in BitIter::new(dirty) {
            if let Some((buffer, offset)) = self.vertex_buffers[index] {
                gl_api.bind_buffer(gl::ARRAY_BUFFER, buffer);
                pipeline.bind_vertex_attributes(gl_api, index as u32, offset);
            }
        }
        Ok(())
    }
}
