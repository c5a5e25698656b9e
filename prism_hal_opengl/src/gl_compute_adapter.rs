/// ComputeCommandAdapter - compute counterpart of the render adapter
///
/// Buffers go to indexed storage/uniform points, textures to units in slot
/// order. Every dispatch is followed by a full memory barrier so later
/// passes see what the shader wrote.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use prism_hal::{hal_error, hal_warn};
use prism_hal::prism::{Error, Result};
use prism_hal::prism::device::{ComputePipelineState, Dimensions, UniformDesc};
use prism_hal::prism::state::{BufferBinding, ComputeBindingSink, PushConstants, TextureBinding};
use crate::gl_commands::consts as gl;
use crate::gl_commands::{GLenum, GlCommands};
use crate::gl_context::UnbindPolicy;
use crate::gl_framebuffer::gl_texture;
use crate::gl_pipeline::GlComputePipelineState;
use crate::gl_render_adapter::{apply_indexed_buffer, apply_uniform};

/// Compute binding sink over one GL context
pub(crate) struct ComputeCommandAdapter {
    gl: Arc<dyn GlCommands>,
    unbind_policy: UnbindPolicy,
    pipeline_bound: bool,
    texture_units: FxHashMap<u32, GLenum>,
    indexed_buffers: FxHashMap<u32, GLenum>,
}

impl ComputeCommandAdapter {
    pub(crate) fn new(gl: Arc<dyn GlCommands>, unbind_policy: UnbindPolicy) -> Self {
        Self {
            gl,
            unbind_policy,
            pipeline_bound: false,
            texture_units: FxHashMap::default(),
            indexed_buffers: FxHashMap::default(),
        }
    }

    pub(crate) fn dispatch(&self, groups: Dimensions) -> Result<()> {
        if !self.pipeline_bound {
            return Err(Error::InvalidResource("No OpenGL compute pipeline bound".to_string()));
        }
        self.gl.dispatch_compute(groups.width, groups.height, groups.depth);
        self.gl.memory_barrier(gl::ALL_BARRIER_BITS);
        Ok(())
    }

    pub(crate) fn end_encoding(&mut self) {
        if self.unbind_policy == UnbindPolicy::EndEncoding {
            let gl_api = self.gl.as_ref();
            gl_api.use_program(0);
            for (&index, &target) in &self.indexed_buffers {
                gl_api.bind_buffer_base(target, index, 0);
            }
            for (&unit, &target) in &self.texture_units {
                gl_api.active_texture(gl::TEXTURE0 + unit);
                gl_api.bind_texture(target, 0);
            }
        }
        self.pipeline_bound = false;
        self.texture_units.clear();
        self.indexed_buffers.clear();
    }
}

impl ComputeBindingSink for ComputeCommandAdapter {
    fn bind_pipeline(&mut self, pipeline: &Arc<dyn ComputePipelineState>) -> Result<()> {
        let Some(pipeline) = pipeline.as_any().downcast_ref::<GlComputePipelineState>() else {
            hal_error!("prism::opengl::ComputeAdapter", "Pipeline was not created by the OpenGL device");
            return Err(Error::InvalidResource("Pipeline is not an OpenGL compute pipeline".to_string()));
        };
        pipeline.bind(self.gl.as_ref());
        self.pipeline_bound = true;
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

    fn bind_texture(&mut self, index: u32, texture: Option<&TextureBinding>) -> Result<()> {
        self.gl.active_texture(gl::TEXTURE0 + index);
        match texture {
            Some(TextureBinding(texture)) => {
                let texture = gl_texture(texture)?;
                self.gl.bind_texture(texture.gl_target(), texture.gl_id());
                self.texture_units.insert(index, texture.gl_target());
            }
            None => {
                let target = self.texture_units.remove(&index).unwrap_or(gl::TEXTURE_2D);
                self.gl.bind_texture(target, 0);
            }
        }
        Ok(())
    }

    fn bind_uniform(&mut self, desc: &UniformDesc, data: &[u8]) -> Result<()> {
        if desc.location >= 0 {
            apply_uniform(self.gl.as_ref(), desc, data);
        }
        Ok(())
    }

    fn bind_push_constants(&mut self, constants: &PushConstants) -> Result<()> {
        hal_warn!(
            "prism::opengl::ComputeAdapter",
            "Push constants are not supported on OpenGL, {} bytes ignored",
            constants.data.len()
        );
        Ok(())
    }
}
