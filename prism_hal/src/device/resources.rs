/// GPU resource traits and their descriptors
///
/// Backends implement these traits on their own types; encoders downcast
/// through `as_any` to reach the native handles.

use std::any::Any;
use bitflags::bitflags;
use crate::binder::ShaderReflection;
use crate::device::{SampleCount, ShaderStage, TextureFormat};
use crate::error::Result;

// ===== BUFFERS =====

bitflags! {
    /// How a buffer may be bound
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u8 {
        const VERTEX   = 1 << 0;
        const INDEX    = 1 << 1;
        const UNIFORM  = 1 << 2;
        const STORAGE  = 1 << 3;
        const INDIRECT = 1 << 4;
    }
}

/// Where buffer memory lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageMode {
    /// Host-visible, written directly by `Buffer::upload`
    #[default]
    Shared,
    /// Device-local
    Private,
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    pub usage: BufferUsage,
    pub size: u64,
    pub storage: StorageMode,
    /// Initial contents (uploaded at creation when non-empty)
    pub data: Vec<u8>,
    pub debug_name: String,
}

impl BufferDesc {
    pub fn new(usage: BufferUsage, size: u64) -> Self {
        Self { usage, size, storage: StorageMode::Shared, data: Vec::new(), debug_name: String::new() }
    }
}

/// Buffer resource trait
pub trait Buffer: Send + Sync {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Usage flags the buffer was created with
    fn usage(&self) -> BufferUsage;

    /// Write `data` at `offset`
    fn upload(&self, offset: u64, data: &[u8]) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}

// ===== TEXTURES =====

bitflags! {
    /// How a texture may be used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u8 {
        const SAMPLED    = 1 << 0;
        const STORAGE    = 1 << 1;
        const ATTACHMENT = 1 << 2;
    }
}

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    TwoD,
    TwoDArray,
    ThreeD,
    Cube,
}

/// Descriptor for creating a texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub texture_type: TextureType,
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub array_layers: u32,
    pub mip_levels: u32,
    pub samples: SampleCount,
    pub usage: TextureUsage,
    pub debug_name: String,
}

impl TextureDesc {
    /// Single-mip, single-sample 2D texture
    pub fn new_2d(format: TextureFormat, width: u32, height: u32, usage: TextureUsage) -> Self {
        Self {
            texture_type: TextureType::TwoD,
            format,
            width,
            height,
            depth: 1,
            array_layers: 1,
            mip_levels: 1,
            samples: SampleCount::S1,
            usage,
            debug_name: String::new(),
        }
    }
}

/// Texture resource trait
pub trait Texture: Send + Sync {
    fn desc(&self) -> &TextureDesc;

    fn as_any(&self) -> &dyn Any;
}

// ===== SAMPLERS =====

/// Min/mag filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerFilter {
    Nearest,
    Linear,
}

/// Mipmap filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerMipFilter {
    Disabled,
    Nearest,
    Linear,
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerAddressMode {
    Repeat,
    MirrorRepeat,
    ClampToEdge,
}

/// Descriptor for creating a sampler (hashable so backends can cache samplers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerDesc {
    pub min_filter: SamplerFilter,
    pub mag_filter: SamplerFilter,
    pub mip_filter: SamplerMipFilter,
    pub address_u: SamplerAddressMode,
    pub address_v: SamplerAddressMode,
    pub address_w: SamplerAddressMode,
    /// Max anisotropy (1 = disabled)
    pub max_anisotropy: u8,
    /// Depth compare function for shadow samplers
    pub depth_compare: Option<crate::device::CompareOp>,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            min_filter: SamplerFilter::Linear,
            mag_filter: SamplerFilter::Linear,
            mip_filter: SamplerMipFilter::Disabled,
            address_u: SamplerAddressMode::Repeat,
            address_v: SamplerAddressMode::Repeat,
            address_w: SamplerAddressMode::Repeat,
            max_anisotropy: 1,
            depth_compare: None,
        }
    }
}

/// Sampler resource trait
pub trait SamplerState: Send + Sync {
    fn desc(&self) -> &SamplerDesc;

    fn as_any(&self) -> &dyn Any;
}

// ===== SHADERS =====

/// Shader code in the form the backend consumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    /// SPIR-V words (Vulkan)
    SpirV(Vec<u32>),
    /// Name of a program already compiled and linked by the platform glue (OpenGL)
    LinkedGlProgram(u32),
}

/// Descriptor for creating a shader module
#[derive(Debug, Clone)]
pub struct ShaderModuleDesc {
    pub stage: ShaderStage,
    pub entry_point: String,
    pub source: ShaderSource,
    /// Reflection supplied by the caller; backends that can reflect the source
    /// themselves (SPIR-V) fill it in when `None`
    pub reflection: Option<ShaderReflection>,
    pub debug_name: String,
}

/// Shader module trait
pub trait ShaderModule: Send + Sync {
    fn stage(&self) -> ShaderStage;

    fn entry_point(&self) -> &str;

    /// Names and locations used by the module, resolved at creation
    fn reflection(&self) -> &ShaderReflection;

    fn as_any(&self) -> &dyn Any;
}
