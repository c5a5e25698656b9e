/// Texture, vertex and multisample formats

/// Texture pixel formats
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// No format; never valid for an attachment
    Invalid,
    R8_UNORM,
    RG8_UNORM,
    RGBA8_UNORM,
    RGBA8_SRGB,
    BGRA8_UNORM,
    BGRA8_SRGB,
    R16_FLOAT,
    RGBA16_FLOAT,
    R32_FLOAT,
    RGBA32_FLOAT,
    R32_UINT,
    D16_UNORM,
    D32_FLOAT,
    S8_UINT,
    D24_UNORM_S8_UINT,
    D32_FLOAT_S8_UINT,
}

impl TextureFormat {
    /// Whether the format has a depth component
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            TextureFormat::D16_UNORM
                | TextureFormat::D32_FLOAT
                | TextureFormat::D24_UNORM_S8_UINT
                | TextureFormat::D32_FLOAT_S8_UINT
        )
    }

    /// Whether the format has a stencil component
    pub fn has_stencil(self) -> bool {
        matches!(
            self,
            TextureFormat::S8_UINT
                | TextureFormat::D24_UNORM_S8_UINT
                | TextureFormat::D32_FLOAT_S8_UINT
        )
    }

    /// Whether the format can only back a depth/stencil attachment
    pub fn is_depth_or_stencil(self) -> bool {
        self.is_depth() || self.has_stencil()
    }

    /// Bytes per pixel for color formats, `None` for packed depth/stencil
    pub fn bytes_per_pixel(self) -> Option<u32> {
        match self {
            TextureFormat::Invalid => None,
            TextureFormat::R8_UNORM | TextureFormat::S8_UINT => Some(1),
            TextureFormat::RG8_UNORM | TextureFormat::R16_FLOAT | TextureFormat::D16_UNORM => Some(2),
            TextureFormat::RGBA8_UNORM
            | TextureFormat::RGBA8_SRGB
            | TextureFormat::BGRA8_UNORM
            | TextureFormat::BGRA8_SRGB
            | TextureFormat::R32_FLOAT
            | TextureFormat::R32_UINT
            | TextureFormat::D32_FLOAT => Some(4),
            TextureFormat::RGBA16_FLOAT => Some(8),
            TextureFormat::RGBA32_FLOAT => Some(16),
            TextureFormat::D24_UNORM_S8_UINT | TextureFormat::D32_FLOAT_S8_UINT => None,
        }
    }
}

/// Vertex attribute formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float1,
    Float2,
    Float3,
    Float4,
    Int1,
    Int2,
    Int3,
    Int4,
    UInt1,
    UInt2,
    UInt3,
    UInt4,
    UByte4Norm,
    Byte4Norm,
    HalfFloat2,
    HalfFloat4,
}

/// Scalar type of a vertex attribute component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexComponentType {
    Float,
    HalfFloat,
    Int,
    UInt,
    Byte,
    UByte,
}

impl VertexFormat {
    /// Number of components (1..=4)
    pub fn component_count(self) -> u32 {
        match self {
            VertexFormat::Float1 | VertexFormat::Int1 | VertexFormat::UInt1 => 1,
            VertexFormat::Float2 | VertexFormat::Int2 | VertexFormat::UInt2 | VertexFormat::HalfFloat2 => 2,
            VertexFormat::Float3 | VertexFormat::Int3 | VertexFormat::UInt3 => 3,
            VertexFormat::Float4
            | VertexFormat::Int4
            | VertexFormat::UInt4
            | VertexFormat::UByte4Norm
            | VertexFormat::Byte4Norm
            | VertexFormat::HalfFloat4 => 4,
        }
    }

    /// Component scalar type
    pub fn component_type(self) -> VertexComponentType {
        match self {
            VertexFormat::Float1 | VertexFormat::Float2 | VertexFormat::Float3 | VertexFormat::Float4 => {
                VertexComponentType::Float
            }
            VertexFormat::Int1 | VertexFormat::Int2 | VertexFormat::Int3 | VertexFormat::Int4 => {
                VertexComponentType::Int
            }
            VertexFormat::UInt1 | VertexFormat::UInt2 | VertexFormat::UInt3 | VertexFormat::UInt4 => {
                VertexComponentType::UInt
            }
            VertexFormat::UByte4Norm => VertexComponentType::UByte,
            VertexFormat::Byte4Norm => VertexComponentType::Byte,
            VertexFormat::HalfFloat2 | VertexFormat::HalfFloat4 => VertexComponentType::HalfFloat,
        }
    }

    /// Whether integer components are normalized to [0, 1] / [-1, 1]
    pub fn is_normalized(self) -> bool {
        matches!(self, VertexFormat::UByte4Norm | VertexFormat::Byte4Norm)
    }

    /// Size in bytes of one attribute value
    pub fn size_bytes(self) -> u32 {
        let component = match self.component_type() {
            VertexComponentType::Float | VertexComponentType::Int | VertexComponentType::UInt => 4,
            VertexComponentType::HalfFloat => 2,
            VertexComponentType::Byte | VertexComponentType::UByte => 1,
        };
        component * self.component_count()
    }
}

/// Multisample count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleCount {
    /// 1 sample (no multisampling)
    #[default]
    S1,
    /// 2 samples
    S2,
    /// 4 samples
    S4,
    /// 8 samples
    S8,
}

impl SampleCount {
    /// Number of samples as an integer
    pub fn count(self) -> u32 {
        match self {
            SampleCount::S1 => 1,
            SampleCount::S2 => 2,
            SampleCount::S4 => 4,
            SampleCount::S8 => 8,
        }
    }
}
