/// Small value types shared by encoders and descriptors

use bitflags::bitflags;

/// RGBA color with float components
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Build a color from its four components
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Components as an array (the layout native APIs expect)
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<glam::Vec4> for Color {
    fn from(v: glam::Vec4) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }
}

impl From<Color> for glam::Vec4 {
    fn from(c: Color) -> Self {
        glam::Vec4::new(c.r, c.g, c.b, c.a)
    }
}

/// Viewport rectangle with depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-depth viewport covering `width` x `height` at the origin
    pub fn new(width: f32, height: f32) -> Self {
        Self { x: 0.0, y: 0.0, width, height, min_depth: 0.0, max_depth: 1.0 }
    }
}

/// Scissor rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScissorRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Width/height/depth triple (texture sizes, dispatch grids)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self { width, height, depth }
    }
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 8-bit indices (requires `DeviceFeatures::INDEX_UINT8`)
    UInt8,
    /// 16-bit indices
    UInt16,
    /// 32-bit indices
    UInt32,
}

impl IndexFormat {
    /// Size in bytes of one index element
    pub fn size_bytes(self) -> u32 {
        match self {
            IndexFormat::UInt8 => 1,
            IndexFormat::UInt16 => 2,
            IndexFormat::UInt32 => 4,
        }
    }
}

/// Depth bias parameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DepthBias {
    /// Constant depth offset
    pub constant_factor: f32,
    /// Slope-based depth offset
    pub slope_factor: f32,
    /// Maximum depth bias clamp
    pub clamp: f32,
}

bitflags! {
    /// Shader stages a texture or sampler bind applies to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BindTarget: u8 {
        const VERTEX   = 1 << 0;
        const FRAGMENT = 1 << 1;
        const ALL_GRAPHICS = Self::VERTEX.bits() | Self::FRAGMENT.bits();
    }
}

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

/// Type of a loose uniform bound by location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    Float2,
    Float3,
    Float4,
    Int,
    Int2,
    Int3,
    Int4,
    Mat2,
    Mat3,
    Mat4,
}

impl UniformType {
    /// Number of scalar components in one element
    pub fn component_count(self) -> usize {
        match self {
            UniformType::Float | UniformType::Int => 1,
            UniformType::Float2 | UniformType::Int2 => 2,
            UniformType::Float3 | UniformType::Int3 => 3,
            UniformType::Float4 | UniformType::Int4 | UniformType::Mat2 => 4,
            UniformType::Mat3 => 9,
            UniformType::Mat4 => 16,
        }
    }

    /// Size in bytes of one element
    pub fn size_bytes(self) -> usize {
        self.component_count() * 4
    }

    /// Whether the components are integers
    pub fn is_integer(self) -> bool {
        matches!(self, UniformType::Int | UniformType::Int2 | UniformType::Int3 | UniformType::Int4)
    }

    /// Column count for matrix types, `None` otherwise
    pub fn matrix_dimension(self) -> Option<usize> {
        match self {
            UniformType::Mat2 => Some(2),
            UniformType::Mat3 => Some(3),
            UniformType::Mat4 => Some(4),
            _ => None,
        }
    }
}

/// Where a loose uniform lives and how to read it out of the bound bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformDesc {
    /// Native location (see `RenderPipelineState::index_by_name`)
    pub location: i32,
    /// Element type
    pub uniform_type: UniformType,
    /// Array length (1 for scalars)
    pub num_elements: usize,
    /// Byte offset of the first element in the data passed to `bind_uniform`
    pub offset: usize,
    /// Byte distance between elements (0 = tightly packed)
    pub element_stride: usize,
}

impl UniformDesc {
    pub fn new(location: i32, uniform_type: UniformType) -> Self {
        Self { location, uniform_type, num_elements: 1, offset: 0, element_stride: 0 }
    }

    /// Gather the elements of this uniform from `data` into one packed byte vector
    pub fn pack(&self, data: &[u8]) -> Vec<u8> {
        let element_size = self.uniform_type.size_bytes();
        let stride = if self.element_stride == 0 { element_size } else { self.element_stride };
        let mut packed = Vec::with_capacity(element_size * self.num_elements);
        for i in 0..self.num_elements {
            let start = self.offset + i * stride;
            let end = start + element_size;
            assert!(end <= data.len(), "Uniform data too small: need {} bytes, got {}", end, data.len());
            packed.extend_from_slice(&data[start..end]);
        }
        packed
    }
}

/// View plain-old-data values (floats, `glam` vectors and matrices) as uniform bytes
pub fn as_uniform_bytes<T: bytemuck::Pod>(values: &[T]) -> &[u8] {
    bytemuck::cast_slice(values)
}
