/// Buffer - OpenGL buffer object implementing the Buffer trait
///
/// The storage mode only picks the usage hint: shared buffers are expected
/// to be rewritten often (`DYNAMIC_DRAW`), private ones mostly once
/// (`STATIC_DRAW`). Uploads go through `glBufferSubData`.

use std::any::Any;
use std::sync::Arc;
use prism_hal::hal_error;
use prism_hal::prism::{Error, Result};
use prism_hal::prism::device::{Buffer, BufferDesc, BufferUsage, StorageMode};
use crate::gl_commands::consts as gl;
use crate::gl_commands::{GLenum, GLuint};
use crate::gl_context::GlContext;
use crate::gl_conversions::buffer_target_to_gl;

/// Downcast a HAL buffer to the OpenGL one
pub(crate) fn gl_buffer(buffer: &Arc<dyn Buffer>) -> Result<&GlBuffer> {
    buffer.as_any().downcast_ref::<GlBuffer>().ok_or_else(|| {
        hal_error!("prism::opengl::Buffer", "Buffer was not created by the OpenGL device");
        Error::InvalidResource("Buffer is not an OpenGL buffer".to_string())
    })
}

/// OpenGL buffer
pub struct GlBuffer {
    ctx: Arc<GlContext>,
    id: GLuint,
    target: GLenum,
    size: u64,
    usage: BufferUsage,
    storage: StorageMode,
}

impl GlBuffer {
    pub fn new(ctx: &Arc<GlContext>, desc: &BufferDesc) -> Result<Self> {
        if desc.size == 0 {
            hal_error!("prism::opengl::Buffer", "Buffer '{}' has size 0", desc.debug_name);
            return Err(Error::InvalidResource("Buffer size must be non-zero".to_string()));
        }
        if desc.data.len() as u64 > desc.size {
            hal_error!(
                "prism::opengl::Buffer",
                "Buffer '{}': {} bytes of initial data for a {} byte buffer",
                desc.debug_name,
                desc.data.len(),
                desc.size
            );
            return Err(Error::InvalidResource("Initial data larger than the buffer".to_string()));
        }

        let gl_api = ctx.gl();
        let target = buffer_target_to_gl(desc.usage);
        let hint = match desc.storage {
            StorageMode::Shared => gl::DYNAMIC_DRAW,
            StorageMode::Private => gl::STATIC_DRAW,
        };

        let id = gl_api.gen_buffer();
        gl_api.bind_buffer(target, id);
        gl_api.buffer_data(target, desc.size as usize, None, hint);
        if !desc.data.is_empty() {
            gl_api.buffer_sub_data(target, 0, &desc.data);
        }
        gl_api.bind_buffer(target, 0);

        Ok(Self {
            ctx: Arc::clone(ctx),
            id,
            target,
            size: desc.size,
            usage: desc.usage,
            storage: desc.storage,
        })
    }

    /// Native buffer name
    pub fn gl_id(&self) -> GLuint {
        self.id
    }

    /// Target the buffer binds to outside indexed binding points
    pub fn gl_target(&self) -> GLenum {
        self.target
    }

    pub fn storage(&self) -> StorageMode {
        self.storage
    }
}

impl Buffer for GlBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn upload(&self, offset: u64, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        if offset + data.len() as u64 > self.size {
            hal_error!(
                "prism::opengl::Buffer",
                "Upload of {} bytes at offset {} exceeds buffer size {}",
                data.len(),
                offset,
                self.size
            );
            return Err(Error::InvalidResource("Buffer upload out of range".to_string()));
        }
        let gl_api = self.ctx.gl();
        gl_api.bind_buffer(self.target, self.id);
        gl_api.buffer_sub_data(self.target, offset as usize, data);
        gl_api.bind_buffer(self.target, 0);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlBuffer {
    fn drop(&mut self) {
        self.ctx.gl().delete_buffer(self.id);
    }
}
