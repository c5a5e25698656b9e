/// Framebuffer - OpenGL framebuffer object implementing the Framebuffer trait
///
/// Color attachment `i` lands on `COLOR_ATTACHMENT0 + i`. When any attachment
/// carries a resolve target, a second FBO holds the resolve textures at the
/// same attachment points; passes whose store action is `MsaaResolve` blit
/// into it when they end.

use std::any::Any;
use std::sync::Arc;
use prism_hal::{hal_err, hal_error};
use prism_hal::prism::{Error, Result};
use prism_hal::prism::device::{
    Framebuffer, FramebufferAttachment, FramebufferDesc, RenderPassDesc, StoreAction, Texture,
};
use crate::gl_commands::consts as gl;
use crate::gl_commands::{GLenum, GLint, GLuint, GlCommands};
use crate::gl_context::GlContext;
use crate::gl_conversions::depth_attachment_point;
use crate::gl_texture::GlTexture;

/// Downcast a HAL texture to the OpenGL one
pub(crate) fn gl_texture(texture: &Arc<dyn Texture>) -> Result<&GlTexture> {
    texture.as_any().downcast_ref::<GlTexture>().ok_or_else(|| {
        hal_error!("prism::opengl::Framebuffer", "Texture was not created by the OpenGL device");
        Error::InvalidResource("Texture is not an OpenGL texture".to_string())
    })
}

/// Downcast a HAL framebuffer to the OpenGL one
pub(crate) fn gl_framebuffer(framebuffer: &Arc<dyn Framebuffer>) -> Result<&GlFramebuffer> {
    framebuffer.as_any().downcast_ref::<GlFramebuffer>().ok_or_else(|| {
        hal_error!("prism::opengl::Framebuffer", "Framebuffer was not created by the OpenGL device");
        Error::InvalidResource("Framebuffer is not an OpenGL framebuffer".to_string())
    })
}

fn color_attachment_point(index: usize) -> GLenum {
    gl::COLOR_ATTACHMENT0 + index as GLenum
}

/// OpenGL framebuffer
pub struct GlFramebuffer {
    ctx: Arc<GlContext>,
    desc: FramebufferDesc,
    fbo: GLuint,
    resolve_fbo: Option<GLuint>,
    width: u32,
    height: u32,
}

impl GlFramebuffer {
    pub fn new(ctx: &Arc<GlContext>, desc: FramebufferDesc) -> Result<Self> {
        if desc.view_mask != 0 {
            hal_error!("prism::opengl::Framebuffer", "Framebuffer '{}' uses multiview", desc.debug_name);
            return Err(Error::FeatureUnavailable("multiview".to_string()));
        }
        let Some(first) = desc.color_attachments.first().or(desc.depth_attachment.as_ref()) else {
            hal_error!("prism::opengl::Framebuffer", "Framebuffer '{}' has no attachments", desc.debug_name);
            return Err(Error::InvalidResource("Framebuffer needs at least one attachment".to_string()));
        };
        let (width, height) = (first.texture.desc().width, first.texture.desc().height);
        for attachment in desc.color_attachments.iter().chain(desc.depth_attachment.iter()) {
            let size = attachment.texture.desc();
            if size.width != width || size.height != height {
                hal_error!(
                    "prism::opengl::Framebuffer",
                    "Framebuffer '{}': attachment '{}' is {}x{}, expected {}x{}",
                    desc.debug_name,
                    size.debug_name,
                    size.width,
                    size.height,
                    width,
                    height
                );
                return Err(Error::InvalidResource("Framebuffer attachments differ in size".to_string()));
            }
        }

        let gl_api = ctx.gl().as_ref();
        let fbo = build_fbo(gl_api, &desc.color_attachments, desc.depth_attachment.as_ref(), |a| Some(&a.texture))
            .map_err(|e| {
                hal_error!("prism::opengl::Framebuffer", "Framebuffer '{}' is incomplete", desc.debug_name);
                e
            })?;

        let has_resolve = desc.color_attachments.iter().chain(desc.depth_attachment.iter()).any(|a| a.resolve.is_some());
        let resolve_fbo = if has_resolve {
            match build_fbo(gl_api, &desc.color_attachments, desc.depth_attachment.as_ref(), |a| a.resolve.as_ref()) {
                Ok(id) => Some(id),
                Err(e) => {
                    gl_api.delete_framebuffer(fbo);
                    hal_error!("prism::opengl::Framebuffer", "Resolve target of '{}' is incomplete", desc.debug_name);
                    return Err(e);
                }
            }
        } else {
            None
        };

        Ok(Self { ctx: Arc::clone(ctx), desc, fbo, resolve_fbo, width, height })
    }

    /// Native framebuffer name
    pub fn gl_fbo(&self) -> GLuint {
        self.fbo
    }

    pub fn gl_resolve_fbo(&self) -> Option<GLuint> {
        self.resolve_fbo
    }

    pub(crate) fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Blit every attachment the pass stores with `MsaaResolve` into its
    /// resolve target. Leaves the read and draw framebuffers unbound.
    pub(crate) fn resolve(&self, gl_api: &dyn GlCommands, pass: &RenderPassDesc) {
        let Some(resolve_fbo) = self.resolve_fbo else {
            return;
        };
        let rect = [0, 0, self.width as GLint, self.height as GLint];
        gl_api.bind_framebuffer(gl::READ_FRAMEBUFFER, self.fbo);
        gl_api.bind_framebuffer(gl::DRAW_FRAMEBUFFER, resolve_fbo);

        let mut resolved = false;
        for (index, attachment) in self.desc.color_attachments.iter().enumerate() {
            let wants_resolve = pass.color_attachments.get(index).is_some_and(|a| a.store_action == StoreAction::MsaaResolve);
            if attachment.resolve.is_none() || !wants_resolve {
                continue;
            }
            let mut targets = vec![gl::NONE; index + 1];
            targets[index] = color_attachment_point(index);
            gl_api.read_buffer(color_attachment_point(index));
            gl_api.draw_buffers(&targets);
            gl_api.blit_framebuffer(rect, rect, gl::COLOR_BUFFER_BIT, gl::NEAREST);
            resolved = true;
        }

        let depth_resolve = self.desc.depth_attachment.as_ref().is_some_and(|a| a.resolve.is_some());
        if depth_resolve && pass.depth.store_action == StoreAction::MsaaResolve {
            // Depth blits ignore the read/draw buffer selection
            gl_api.blit_framebuffer(rect, rect, gl::DEPTH_BUFFER_BIT, gl::NEAREST);
            resolved = true;
        }

        if resolved {
            // Restore the full draw buffer list of the resolve FBO
            let targets: Vec<GLenum> = (0..self.desc.color_attachments.len()).map(color_attachment_point).collect();
            gl_api.draw_buffers(&targets);
        }
        gl_api.bind_framebuffer(gl::READ_FRAMEBUFFER, 0);
        gl_api.bind_framebuffer(gl::DRAW_FRAMEBUFFER, 0);
    }
}

/// Create a complete FBO from the textures `pick` selects out of each attachment
fn build_fbo<'a>(
    gl_api: &dyn GlCommands,
    colors: &'a [FramebufferAttachment],
    depth: Option<&'a FramebufferAttachment>,
    pick: impl Fn(&'a FramebufferAttachment) -> Option<&'a Arc<dyn Texture>>,
) -> Result<GLuint> {
    let fbo = gl_api.gen_framebuffer();
    gl_api.bind_framebuffer(gl::FRAMEBUFFER, fbo);

    let attached = attach_all(gl_api, colors, depth, pick);
    let status = gl_api.check_framebuffer_status(gl::FRAMEBUFFER);
    gl_api.bind_framebuffer(gl::FRAMEBUFFER, 0);

    match attached {
        Err(e) => {
            gl_api.delete_framebuffer(fbo);
            Err(e)
        }
        Ok(()) if status != gl::FRAMEBUFFER_COMPLETE => {
            gl_api.delete_framebuffer(fbo);
            Err(hal_err!("prism::opengl::Framebuffer", "Framebuffer status 0x{:04X}", status))
        }
        Ok(()) => Ok(fbo),
    }
}

fn attach_all<'a>(
    gl_api: &dyn GlCommands,
    colors: &'a [FramebufferAttachment],
    depth: Option<&'a FramebufferAttachment>,
    pick: impl Fn(&'a FramebufferAttachment) -> Option<&'a Arc<dyn Texture>>,
) -> Result<()> {
    let mut draw_buffers = Vec::with_capacity(colors.len());
    for (index, attachment) in colors.iter().enumerate() {
        match pick(attachment) {
            Some(texture) => {
                let texture = gl_texture(texture)?;
                let point = color_attachment_point(index);
                gl_api.framebuffer_texture_2d(gl::FRAMEBUFFER, point, texture.gl_target(), texture.gl_id(), 0);
                draw_buffers.push(point);
            }
            None => draw_buffers.push(gl::NONE),
        }
    }
    if let Some(texture) = depth.and_then(&pick) {
        let point = depth_attachment_point(texture.desc().format);
        let texture = gl_texture(texture)?;
        gl_api.framebuffer_texture_2d(gl::FRAMEBUFFER, point, texture.gl_target(), texture.gl_id(), 0);
    }
    gl_api.draw_buffers(&draw_buffers);
    Ok(())
}

impl Framebuffer for GlFramebuffer {
    fn desc(&self) -> &FramebufferDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlFramebuffer {
    fn drop(&mut self) {
        let gl_api = self.ctx.gl();
        gl_api.delete_framebuffer(self.fbo);
        if let Some(resolve_fbo) = self.resolve_fbo {
            gl_api.delete_framebuffer(resolve_fbo);
        }
    }
}
