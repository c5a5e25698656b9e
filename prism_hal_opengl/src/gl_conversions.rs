/// Conversions from HAL descriptor types to OpenGL enums
///
/// Pure functions, no context needed.

use prism_hal::prism::device::{
    BlendFactor, BlendOp, BufferUsage, CompareOp, CullMode, FrontFace, IndexFormat, PolygonMode,
    PrimitiveTopology, SamplerAddressMode, SamplerFilter, SamplerMipFilter, StencilOp, TextureFormat,
    TextureType, VertexComponentType, VertexFormat,
};
use crate::gl_commands::consts as gl;
use crate::gl_commands::{GLenum, GLint};

// ===== FORMATS =====

/// Sized internal format; `None` for `TextureFormat::Invalid`
pub(crate) fn texture_format_to_gl(format: TextureFormat) -> Option<GLenum> {
    let internal = match format {
        TextureFormat::Invalid => return None,
        TextureFormat::R8_UNORM => gl::R8,
        TextureFormat::RG8_UNORM => gl::RG8,
        // BGRA ordering only matters when uploading; storage is RGBA
        TextureFormat::RGBA8_UNORM | TextureFormat::BGRA8_UNORM => gl::RGBA8,
        TextureFormat::RGBA8_SRGB | TextureFormat::BGRA8_SRGB => gl::SRGB8_ALPHA8,
        TextureFormat::R16_FLOAT => gl::R16F,
        TextureFormat::RGBA16_FLOAT => gl::RGBA16F,
        TextureFormat::R32_FLOAT => gl::R32F,
        TextureFormat::RGBA32_FLOAT => gl::RGBA32F,
        TextureFormat::R32_UINT => gl::R32UI,
        TextureFormat::D16_UNORM => gl::DEPTH_COMPONENT16,
        TextureFormat::D32_FLOAT => gl::DEPTH_COMPONENT32F,
        TextureFormat::S8_UINT => gl::STENCIL_INDEX8,
        TextureFormat::D24_UNORM_S8_UINT => gl::DEPTH24_STENCIL8,
        TextureFormat::D32_FLOAT_S8_UINT => gl::DEPTH32F_STENCIL8,
    };
    Some(internal)
}

pub(crate) fn texture_target_to_gl(texture_type: TextureType, multisampled: bool) -> GLenum {
    match texture_type {
        TextureType::TwoD if multisampled => gl::TEXTURE_2D_MULTISAMPLE,
        TextureType::TwoD => gl::TEXTURE_2D,
        TextureType::TwoDArray => gl::TEXTURE_2D_ARRAY,
        TextureType::ThreeD => gl::TEXTURE_3D,
        TextureType::Cube => gl::TEXTURE_CUBE_MAP,
    }
}

/// Framebuffer attachment point for a depth/stencil format
pub(crate) fn depth_attachment_point(format: TextureFormat) -> GLenum {
    match (format.is_depth(), format.has_stencil()) {
        (true, true) => gl::DEPTH_STENCIL_ATTACHMENT,
        (false, true) => gl::STENCIL_ATTACHMENT,
        _ => gl::DEPTH_ATTACHMENT,
    }
}

/// Attribute pointer parameters of a vertex format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GlVertexFormat {
    pub size: GLint,
    pub ty: GLenum,
    pub normalized: bool,
    /// Read with `glVertexAttribIPointer`
    pub integer: bool,
}

pub(crate) fn vertex_format_to_gl(format: VertexFormat) -> GlVertexFormat {
    let (ty, integer) = match format.component_type() {
        VertexComponentType::Float => (gl::FLOAT, false),
        VertexComponentType::HalfFloat => (gl::HALF_FLOAT, false),
        VertexComponentType::Int => (gl::INT, true),
        VertexComponentType::UInt => (gl::UNSIGNED_INT, true),
        VertexComponentType::Byte => (gl::BYTE, false),
        VertexComponentType::UByte => (gl::UNSIGNED_BYTE, false),
    };
    GlVertexFormat {
        size: format.component_count() as GLint,
        ty,
        normalized: format.is_normalized(),
        integer,
    }
}

// ===== BUFFERS AND DRAWS =====

/// Bind target of a buffer, by the most specific usage
pub(crate) fn buffer_target_to_gl(usage: BufferUsage) -> GLenum {
    if usage.contains(BufferUsage::INDEX) {
        gl::ELEMENT_ARRAY_BUFFER
    } else if usage.contains(BufferUsage::VERTEX) {
        gl::ARRAY_BUFFER
    } else if usage.contains(BufferUsage::STORAGE) {
        gl::SHADER_STORAGE_BUFFER
    } else if usage.contains(BufferUsage::UNIFORM) {
        gl::UNIFORM_BUFFER
    } else {
        gl::DRAW_INDIRECT_BUFFER
    }
}

/// Indexed binding point a buffer attaches to in `bind_buffer_range`
pub(crate) fn indexed_buffer_target_to_gl(usage: BufferUsage) -> GLenum {
    if usage.contains(BufferUsage::STORAGE) {
        gl::SHADER_STORAGE_BUFFER
    } else {
        gl::UNIFORM_BUFFER
    }
}

pub(crate) fn topology_to_gl(topology: PrimitiveTopology) -> GLenum {
    match topology {
        PrimitiveTopology::TriangleList => gl::TRIANGLES,
        PrimitiveTopology::TriangleStrip => gl::TRIANGLE_STRIP,
        PrimitiveTopology::LineList => gl::LINES,
        PrimitiveTopology::LineStrip => gl::LINE_STRIP,
        PrimitiveTopology::PointList => gl::POINTS,
    }
}

pub(crate) fn index_format_to_gl(format: IndexFormat) -> GLenum {
    match format {
        IndexFormat::UInt8 => gl::UNSIGNED_BYTE,
        IndexFormat::UInt16 => gl::UNSIGNED_SHORT,
        IndexFormat::UInt32 => gl::UNSIGNED_INT,
    }
}

// ===== SAMPLERS =====

/// `(min, mag)` filters
pub(crate) fn filters_to_gl(min: SamplerFilter, mag: SamplerFilter, mip: SamplerMipFilter) -> (GLenum, GLenum) {
    let min_filter = match (min, mip) {
        (SamplerFilter::Nearest, SamplerMipFilter::Disabled) => gl::NEAREST,
        (SamplerFilter::Linear, SamplerMipFilter::Disabled) => gl::LINEAR,
        (SamplerFilter::Nearest, SamplerMipFilter::Nearest) => gl::NEAREST_MIPMAP_NEAREST,
        (SamplerFilter::Linear, SamplerMipFilter::Nearest) => gl::LINEAR_MIPMAP_NEAREST,
        (SamplerFilter::Nearest, SamplerMipFilter::Linear) => gl::NEAREST_MIPMAP_LINEAR,
        (SamplerFilter::Linear, SamplerMipFilter::Linear) => gl::LINEAR_MIPMAP_LINEAR,
    };
    let mag_filter = match mag {
        SamplerFilter::Nearest => gl::NEAREST,
        SamplerFilter::Linear => gl::LINEAR,
    };
    (min_filter, mag_filter)
}

pub(crate) fn address_mode_to_gl(mode: SamplerAddressMode) -> GLenum {
    match mode {
        SamplerAddressMode::Repeat => gl::REPEAT,
        SamplerAddressMode::MirrorRepeat => gl::MIRRORED_REPEAT,
        SamplerAddressMode::ClampToEdge => gl::CLAMP_TO_EDGE,
    }
}

// ===== FIXED FUNCTION =====

pub(crate) fn compare_op_to_gl(op: CompareOp) -> GLenum {
    match op {
        CompareOp::Never => gl::NEVER,
        CompareOp::Less => gl::LESS,
        CompareOp::Equal => gl::EQUAL,
        CompareOp::LessOrEqual => gl::LEQUAL,
        CompareOp::Greater => gl::GREATER,
        CompareOp::NotEqual => gl::NOTEQUAL,
        CompareOp::GreaterOrEqual => gl::GEQUAL,
        CompareOp::Always => gl::ALWAYS,
    }
}

pub(crate) fn stencil_op_to_gl(op: StencilOp) -> GLenum {
    match op {
        StencilOp::Keep => gl::KEEP,
        StencilOp::Zero => gl::ZERO,
        StencilOp::Replace => gl::REPLACE,
        StencilOp::IncrementAndClamp => gl::INCR,
        StencilOp::DecrementAndClamp => gl::DECR,
        StencilOp::Invert => gl::INVERT,
        StencilOp::IncrementAndWrap => gl::INCR_WRAP,
        StencilOp::DecrementAndWrap => gl::DECR_WRAP,
    }
}

pub(crate) fn blend_factor_to_gl(factor: BlendFactor) -> GLenum {
    match factor {
        BlendFactor::Zero => gl::ZERO,
        BlendFactor::One => gl::ONE,
        BlendFactor::SrcColor => gl::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => gl::ONE_MINUS_SRC_COLOR,
        BlendFactor::DstColor => gl::DST_COLOR,
        BlendFactor::OneMinusDstColor => gl::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => gl::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => gl::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => gl::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => gl::ONE_MINUS_DST_ALPHA,
        BlendFactor::ConstantColor => gl::CONSTANT_COLOR,
        BlendFactor::OneMinusConstantColor => gl::ONE_MINUS_CONSTANT_COLOR,
        BlendFactor::SrcAlphaSaturate => gl::SRC_ALPHA_SATURATE,
        BlendFactor::Src1Color => gl::SRC1_COLOR,
        BlendFactor::OneMinusSrc1Color => gl::ONE_MINUS_SRC1_COLOR,
    }
}

pub(crate) fn blend_op_to_gl(op: BlendOp) -> GLenum {
    match op {
        BlendOp::Add => gl::FUNC_ADD,
        BlendOp::Subtract => gl::FUNC_SUBTRACT,
        BlendOp::ReverseSubtract => gl::FUNC_REVERSE_SUBTRACT,
        BlendOp::Min => gl::MIN,
        BlendOp::Max => gl::MAX,
    }
}

/// Face to cull, `None` when culling is off
pub(crate) fn cull_mode_to_gl(mode: CullMode) -> Option<GLenum> {
    match mode {
        CullMode::None => None,
        CullMode::Front => Some(gl::FRONT),
        CullMode::Back => Some(gl::BACK),
    }
}

pub(crate) fn front_face_to_gl(face: FrontFace) -> GLenum {
    match face {
        FrontFace::CounterClockwise => gl::CCW,
        FrontFace::Clockwise => gl::CW,
    }
}

pub(crate) fn polygon_mode_to_gl(mode: PolygonMode) -> GLenum {
    match mode {
        PolygonMode::Fill => gl::FILL,
        PolygonMode::Line => gl::LINE,
    }
}

#[cfg(test)]
#[path = "gl_conversions_tests.rs"]
mod tests;
