/// Shader reflection data
///
/// Filled once per shader module, either by the caller (OpenGL program
/// introspection) or by the backend (SPIR-V reflection). Pipelines resolve
/// it into a [`crate::binder::PipelineLayout`] at creation.

use crate::device::UniformType;

/// Returned by every lookup of a name the shader does not declare
pub const INDEX_NOT_FOUND: i32 = -1;

/// A vertex shader input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedAttribute {
    pub name: String,
    pub location: i32,
}

/// A loose uniform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedUniform {
    pub name: String,
    pub location: i32,
    pub uniform_type: UniformType,
    pub array_length: u32,
}

/// Kind of a reflected buffer block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Uniform,
    Storage,
}

/// A uniform or storage block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedBuffer {
    pub name: String,
    /// Native index: the binding for SPIR-V, the block index for OpenGL
    pub index: i32,
    pub kind: BufferKind,
    /// Declared size in bytes (0 when unknown)
    pub size: u32,
}

/// A sampled texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedTexture {
    pub name: String,
    /// Declared texture slot
    pub unit: u32,
    /// Location of the sampler uniform (OpenGL), `INDEX_NOT_FOUND` otherwise
    pub sampler_location: i32,
}

/// Everything a pipeline needs to know about one shader module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderReflection {
    pub attributes: Vec<ReflectedAttribute>,
    pub uniforms: Vec<ReflectedUniform>,
    pub buffers: Vec<ReflectedBuffer>,
    pub textures: Vec<ReflectedTexture>,
    /// Size of the push constant block in bytes (0 = none)
    pub push_constant_size: u32,
}

impl ShaderReflection {
    pub fn attribute_location(&self, name: &str) -> i32 {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map_or(INDEX_NOT_FOUND, |a| a.location)
    }

    pub fn uniform_location(&self, name: &str) -> i32 {
        self.uniforms
            .iter()
            .find(|u| u.name == name)
            .map_or(INDEX_NOT_FOUND, |u| u.location)
    }

    pub fn buffer_index(&self, name: &str) -> i32 {
        self.buffers
            .iter()
            .find(|b| b.name == name)
            .map_or(INDEX_NOT_FOUND, |b| b.index)
    }

    pub fn texture_unit(&self, name: &str) -> i32 {
        self.textures
            .iter()
            .find(|t| t.name == name)
            .map_or(INDEX_NOT_FOUND, |t| t.unit as i32)
    }
}
