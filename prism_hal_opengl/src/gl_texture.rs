/// Texture - immutable-storage OpenGL texture implementing the Texture trait

use std::any::Any;
use std::sync::Arc;
use prism_hal::hal_error;
use prism_hal::prism::{Error, Result};
use prism_hal::prism::device::{SampleCount, Texture, TextureDesc, TextureType};
use crate::gl_commands::consts as gl;
use crate::gl_commands::{GLenum, GLsizei, GLuint};
use crate::gl_context::GlContext;
use crate::gl_conversions::{texture_format_to_gl, texture_target_to_gl};

/// OpenGL texture
pub struct GlTexture {
    ctx: Arc<GlContext>,
    id: GLuint,
    target: GLenum,
    desc: TextureDesc,
}

impl GlTexture {
    pub fn new(ctx: &Arc<GlContext>, desc: &TextureDesc) -> Result<Self> {
        let Some(internal_format) = texture_format_to_gl(desc.format) else {
            hal_error!("prism::opengl::Texture", "Texture '{}' has an invalid format", desc.debug_name);
            return Err(Error::InvalidResource("Texture format is Invalid".to_string()));
        };
        if desc.width == 0 || desc.height == 0 || desc.depth == 0 || desc.mip_levels == 0 {
            hal_error!(
                "prism::opengl::Texture",
                "Texture '{}' has a zero extent ({}x{}x{}, {} mips)",
                desc.debug_name,
                desc.width,
                desc.height,
                desc.depth,
                desc.mip_levels
            );
            return Err(Error::InvalidResource("Texture extent must be non-zero".to_string()));
        }
        let multisampled = desc.samples != SampleCount::S1;
        if multisampled && desc.texture_type != TextureType::TwoD {
            hal_error!("prism::opengl::Texture", "Multisampled textures must be 2D ('{}')", desc.debug_name);
            return Err(Error::InvalidResource("Multisampling requires a 2D texture".to_string()));
        }

        let gl_api = ctx.gl();
        let target = texture_target_to_gl(desc.texture_type, multisampled);
        let (width, height) = (desc.width as GLsizei, desc.height as GLsizei);
        let levels = desc.mip_levels as GLsizei;

        let id = gl_api.gen_texture();
        gl_api.bind_texture(target, id);
        match desc.texture_type {
            TextureType::TwoD if multisampled => {
                gl_api.tex_storage_2d_multisample(target, desc.samples.count() as GLsizei, internal_format, width, height);
            }
            TextureType::TwoD | TextureType::Cube => {
                gl_api.tex_storage_2d(target, levels, internal_format, width, height);
            }
            TextureType::TwoDArray => {
                gl_api.tex_storage_3d(target, levels, internal_format, width, height, desc.array_layers as GLsizei);
            }
            TextureType::ThreeD => {
                gl_api.tex_storage_3d(target, levels, internal_format, width, height, desc.depth as GLsizei);
            }
        }
        if !multisampled {
            gl_api.tex_parameter_i(target, gl::TEXTURE_BASE_LEVEL, 0);
            gl_api.tex_parameter_i(target, gl::TEXTURE_MAX_LEVEL, levels - 1);
        }
        gl_api.bind_texture(target, 0);

        Ok(Self { ctx: Arc::clone(ctx), id, target, desc: desc.clone() })
    }

    /// Native texture name
    pub fn gl_id(&self) -> GLuint {
        self.id
    }

    pub fn gl_target(&self) -> GLenum {
        self.target
    }
}

impl Texture for GlTexture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlTexture {
    fn drop(&mut self) {
        self.ctx.gl().delete_texture(self.id);
    }
}
