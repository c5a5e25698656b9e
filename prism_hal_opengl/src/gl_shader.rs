/// ShaderModule - one stage of a program linked by the platform glue
///
/// Compiling and linking GLSL happens outside the HAL. The glue passes the
/// program name together with the reflection it got from program
/// introspection (`glGetActiveAttrib`, `glGetUniformBlockIndex`, ...). The
/// vertex and fragment modules of one pipeline share the same program.
/// The program stays owned by the glue and is not deleted here.

use std::any::Any;
use prism_hal::{hal_bail, hal_warn};
use prism_hal::prism::Result;
use prism_hal::prism::binder::ShaderReflection;
use prism_hal::prism::device::{ShaderModule, ShaderModuleDesc, ShaderSource, ShaderStage};
use crate::gl_commands::GLuint;

/// OpenGL shader module
pub struct GlShaderModule {
    program: GLuint,
    stage: ShaderStage,
    entry_point: String,
    reflection: ShaderReflection,
}

impl GlShaderModule {
    pub fn new(desc: ShaderModuleDesc) -> Result<Self> {
        let ShaderSource::LinkedGlProgram(program) = desc.source else {
            hal_bail!("prism::opengl::Shader", "Shader '{}' is not a linked GL program", desc.debug_name);
        };
        if program == 0 {
            hal_bail!("prism::opengl::Shader", "Shader '{}' uses program 0", desc.debug_name);
        }
        let reflection = desc.reflection.unwrap_or_else(|| {
            hal_warn!(
                "prism::opengl::Shader",
                "Shader '{}' has no reflection; named inputs will not resolve",
                desc.debug_name
            );
            ShaderReflection::default()
        });

        Ok(Self { program, stage: desc.stage, entry_point: desc.entry_point, reflection })
    }

    /// Native program name
    pub fn gl_program(&self) -> GLuint {
        self.program
    }
}

impl ShaderModule for GlShaderModule {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn entry_point(&self) -> &str {
        &self.entry_point
    }

    fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
