/// SamplerState - OpenGL sampler object implementing the SamplerState trait

use std::any::Any;
use std::sync::Arc;
use prism_hal::prism::device::{SamplerDesc, SamplerState};
use crate::gl_commands::consts as gl;
use crate::gl_commands::{GLint, GLuint};
use crate::gl_context::GlContext;
use crate::gl_conversions::{address_mode_to_gl, compare_op_to_gl, filters_to_gl};

/// OpenGL sampler
pub struct GlSamplerState {
    ctx: Arc<GlContext>,
    id: GLuint,
    desc: SamplerDesc,
}

impl GlSamplerState {
    pub fn new(ctx: &Arc<GlContext>, desc: &SamplerDesc) -> Self {
        let gl_api = ctx.gl();
        let id = gl_api.gen_sampler();

        let (min_filter, mag_filter) = filters_to_gl(desc.min_filter, desc.mag_filter, desc.mip_filter);
        gl_api.sampler_parameter_i(id, gl::TEXTURE_MIN_FILTER, min_filter as GLint);
        gl_api.sampler_parameter_i(id, gl::TEXTURE_MAG_FILTER, mag_filter as GLint);
        gl_api.sampler_parameter_i(id, gl::TEXTURE_WRAP_S, address_mode_to_gl(desc.address_u) as GLint);
        gl_api.sampler_parameter_i(id, gl::TEXTURE_WRAP_T, address_mode_to_gl(desc.address_v) as GLint);
        gl_api.sampler_parameter_i(id, gl::TEXTURE_WRAP_R, address_mode_to_gl(desc.address_w) as GLint);
        if desc.max_anisotropy > 1 {
            gl_api.sampler_parameter_f(id, gl::TEXTURE_MAX_ANISOTROPY, f32::from(desc.max_anisotropy));
        }
        if let Some(compare) = desc.depth_compare {
            gl_api.sampler_parameter_i(id, gl::TEXTURE_COMPARE_MODE, gl::COMPARE_REF_TO_TEXTURE as GLint);
            gl_api.sampler_parameter_i(id, gl::TEXTURE_COMPARE_FUNC, compare_op_to_gl(compare) as GLint);
        }

        Self { ctx: Arc::clone(ctx), id, desc: *desc }
    }

    /// Native sampler name
    pub fn gl_id(&self) -> GLuint {
        self.id
    }
}

impl SamplerState for GlSamplerState {
    fn desc(&self) -> &SamplerDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlSamplerState {
    fn drop(&mut self) {
        self.ctx.gl().delete_sampler(self.id);
    }
}
