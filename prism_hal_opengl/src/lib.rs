/*!
# Prism HAL - OpenGL Backend

OpenGL 3.3+ / OpenGL ES 3.0+ implementation of the Prism device, resource
and command traits.

The backend does not load GL itself. The platform glue creates the context,
makes it current and passes an implementation of [`prism::GlCommands`]
together with the features it detected. Shaders arrive as linked programs
with their reflection; pipelines read attribute locations, uniform blocks
and sampler units from it once at creation.

GL runs commands as they are encoded, so a command buffer is mostly a draw
counter; `submit` waits for the context with `glFinish`. Core profiles need
a vertex array object bound by the glue before the first draw.
*/

mod gl_commands;
mod gl_conversions;
mod gl_context;
mod gl_buffer;
mod gl_texture;
mod gl_sampler;
mod gl_shader;
mod gl_pipeline;
mod gl_framebuffer;
mod gl_render_adapter;
mod gl_compute_adapter;
mod gl_command_buffer;
mod gl_render_encoder;
mod gl_compute_encoder;
mod gl_device;

// Main prism namespace module
pub mod prism {
    pub use crate::gl_device::GlDevice;
    pub use crate::gl_context::{GlContext, GlContextConfig, UnbindPolicy};
    pub use crate::gl_commands::{consts as gl, GLbitfield, GLenum, GLint, GLsizei, GLuint, GlCommands};

    // Resources
    pub use crate::gl_buffer::GlBuffer;
    pub use crate::gl_texture::GlTexture;
    pub use crate::gl_sampler::GlSamplerState;
    pub use crate::gl_shader::GlShaderModule;
    pub use crate::gl_pipeline::{GlComputePipelineState, GlRenderPipelineState};
    pub use crate::gl_framebuffer::GlFramebuffer;

    // Command recording
    pub use crate::gl_command_buffer::GlCommandBuffer;
    pub use crate::gl_render_encoder::GlRenderCommandEncoder;
    pub use crate::gl_compute_encoder::GlComputeCommandEncoder;
}
