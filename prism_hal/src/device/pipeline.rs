/// Pipeline descriptors and pipeline state traits

use std::any::Any;
use std::sync::Arc;
use crate::binder::PipelineLayout;
use crate::device::{SampleCount, ShaderModule, ShaderStage, TextureFormat, VertexFormat};

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    /// Triangle list
    TriangleList,
    /// Triangle strip
    TriangleStrip,
    /// Line list
    LineList,
    /// Line strip
    LineStrip,
    /// Point list
    PointList,
}

/// Vertex input rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexInputRate {
    /// Data is per-vertex
    Vertex,
    /// Data is per-instance
    Instance,
}

/// Vertex attribute description
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader input name; when non-empty the location is resolved by name
    pub name: String,
    /// Explicit shader location (used when `name` is empty)
    pub location: u32,
    /// Vertex buffer index the attribute reads from
    pub binding: u32,
    /// Format of the attribute (data type and component count)
    pub format: VertexFormat,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
}

/// Vertex binding description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBinding {
    /// Vertex buffer index
    pub binding: u32,
    /// Stride in bytes between consecutive elements
    pub stride: u32,
    /// Input rate (per-vertex or per-instance)
    pub input_rate: VertexInputRate,
}

/// Vertex input layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    /// Vertex bindings
    pub bindings: Vec<VertexBinding>,
    /// Vertex attributes
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Binding description for a buffer index
    pub fn binding(&self, index: u32) -> Option<&VertexBinding> {
        self.bindings.iter().find(|b| b.binding == index)
    }
}

// ===== RASTERIZATION ENUMS =====

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    /// No culling
    None,
    /// Cull front faces
    Front,
    /// Cull back faces
    Back,
}

/// Front face winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    /// Counter-clockwise vertices define front face
    CounterClockwise,
    /// Clockwise vertices define front face
    Clockwise,
}

/// Polygon rendering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    /// Fill polygons
    Fill,
    /// Draw edges only (wireframe)
    Line,
}

// ===== DEPTH/STENCIL ENUMS =====

/// Comparison operator for depth and stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Stencil operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementAndClamp,
    DecrementAndClamp,
    Invert,
    IncrementAndWrap,
    DecrementAndWrap,
}

// ===== COLOR BLEND ENUMS =====

/// Blend factor for color blending equations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    SrcAlphaSaturate,
    /// Dual-source factors require `DeviceFeatures::DUAL_SRC_BLEND`
    Src1Color,
    OneMinusSrc1Color,
}

/// Blend operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOp {
    /// result = src * srcFactor + dst * dstFactor
    Add,
    /// result = src * srcFactor - dst * dstFactor
    Subtract,
    /// result = dst * dstFactor - src * srcFactor
    ReverseSubtract,
    /// result = min(src, dst)
    Min,
    /// result = max(src, dst)
    Max,
}

// ===== FIXED-FUNCTION STATE =====

/// Rasterization fixed-function state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterizationState {
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub polygon_mode: PolygonMode,
}

impl Default for RasterizationState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::None,
            front_face: FrontFace::CounterClockwise,
            polygon_mode: PolygonMode::Fill,
        }
    }
}

/// Stencil operation state (per-face)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilOpState {
    pub fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub compare_op: CompareOp,
    pub compare_mask: u32,
    pub write_mask: u32,
}

impl Default for StencilOpState {
    fn default() -> Self {
        Self {
            fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            compare_op: CompareOp::Always,
            compare_mask: 0xFF,
            write_mask: 0xFF,
        }
    }
}

/// Depth and stencil testing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: CompareOp,
    pub stencil_test_enable: bool,
    pub front: StencilOpState,
    pub back: StencilOpState,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_test_enable: false,
            depth_write_enable: false,
            depth_compare_op: CompareOp::Always,
            stencil_test_enable: false,
            front: StencilOpState::default(),
            back: StencilOpState::default(),
        }
    }
}

/// Color write mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorWriteMask {
    pub r: bool,
    pub g: bool,
    pub b: bool,
    pub a: bool,
}

impl ColorWriteMask {
    /// All channels enabled
    pub const ALL: Self = Self { r: true, g: true, b: true, a: true };
    /// No channels enabled
    pub const NONE: Self = Self { r: false, g: false, b: false, a: false };
}

impl Default for ColorWriteMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Blend mode of one color attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorBlendState {
    pub blend_enable: bool,
    pub src_color_factor: BlendFactor,
    pub dst_color_factor: BlendFactor,
    pub color_blend_op: BlendOp,
    pub src_alpha_factor: BlendFactor,
    pub dst_alpha_factor: BlendFactor,
    pub alpha_blend_op: BlendOp,
    pub color_write_mask: ColorWriteMask,
}

impl ColorBlendState {
    /// Whether any factor needs dual-source blending
    pub fn uses_dual_source(&self) -> bool {
        [self.src_color_factor, self.dst_color_factor, self.src_alpha_factor, self.dst_alpha_factor]
            .iter()
            .any(|f| matches!(f, BlendFactor::Src1Color | BlendFactor::OneMinusSrc1Color))
    }
}

impl Default for ColorBlendState {
    fn default() -> Self {
        Self {
            blend_enable: false,
            src_color_factor: BlendFactor::One,
            dst_color_factor: BlendFactor::Zero,
            color_blend_op: BlendOp::Add,
            src_alpha_factor: BlendFactor::One,
            dst_alpha_factor: BlendFactor::Zero,
            alpha_blend_op: BlendOp::Add,
            color_write_mask: ColorWriteMask::ALL,
        }
    }
}

/// Format and blend mode of one pipeline color attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorAttachmentState {
    pub format: TextureFormat,
    pub blend: ColorBlendState,
}

// ===== PIPELINE DESCRIPTORS =====

/// Descriptor for creating a graphics pipeline
#[derive(Clone)]
pub struct RenderPipelineDesc {
    pub vertex_module: Arc<dyn ShaderModule>,
    pub fragment_module: Arc<dyn ShaderModule>,
    pub vertex_layout: VertexLayout,
    pub topology: PrimitiveTopology,
    pub color_attachments: Vec<ColorAttachmentState>,
    pub depth_format: Option<TextureFormat>,
    pub stencil_format: Option<TextureFormat>,
    pub samples: SampleCount,
    pub rasterization: RasterizationState,
    pub depth_stencil: DepthStencilState,
    /// Uniform block name -> binding point (OpenGL); Vulkan uses declared bindings
    pub uniform_block_bindings: Vec<(String, u32)>,
    /// Multiview mask of the passes this pipeline draws in (0 = no multiview)
    pub view_mask: u32,
    pub debug_name: String,
}

impl RenderPipelineDesc {
    /// Pipeline with default fixed-function state rendering into `color_format`
    pub fn new(
        vertex_module: Arc<dyn ShaderModule>,
        fragment_module: Arc<dyn ShaderModule>,
        vertex_layout: VertexLayout,
        color_format: TextureFormat,
    ) -> Self {
        Self {
            vertex_module,
            fragment_module,
            vertex_layout,
            topology: PrimitiveTopology::TriangleList,
            color_attachments: vec![ColorAttachmentState { format: color_format, blend: ColorBlendState::default() }],
            depth_format: None,
            stencil_format: None,
            samples: SampleCount::S1,
            rasterization: RasterizationState::default(),
            depth_stencil: DepthStencilState::default(),
            uniform_block_bindings: Vec::new(),
            view_mask: 0,
            debug_name: String::new(),
        }
    }
}

/// Descriptor for creating a compute pipeline
#[derive(Clone)]
pub struct ComputePipelineDesc {
    pub compute_module: Arc<dyn ShaderModule>,
    pub debug_name: String,
}

fn same_module(a: &Arc<dyn ShaderModule>, b: &Arc<dyn ShaderModule>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Graphics pipeline trait
///
/// Pipelines are immutable once created. Reflection is resolved into a
/// [`PipelineLayout`] at creation and never queried from the driver again.
pub trait RenderPipelineState: Send + Sync {
    fn desc(&self) -> &RenderPipelineDesc;

    /// Reflection-resolved binding layout
    fn layout(&self) -> &PipelineLayout;

    /// Slot or location of a named shader input, or `INDEX_NOT_FOUND`
    fn index_by_name(&self, name: &str, stage: ShaderStage) -> i32 {
        self.layout().index_by_name(name, stage)
    }

    /// Same shader modules
    fn matches_shader_program(&self, other: &dyn RenderPipelineState) -> bool {
        same_module(&self.desc().vertex_module, &other.desc().vertex_module)
            && same_module(&self.desc().fragment_module, &other.desc().fragment_module)
    }

    /// Same vertex input layout
    fn matches_vertex_input(&self, other: &dyn RenderPipelineState) -> bool {
        self.desc().vertex_layout == other.desc().vertex_layout
    }

    fn as_any(&self) -> &dyn Any;
}

/// Compute pipeline trait
pub trait ComputePipelineState: Send + Sync {
    fn desc(&self) -> &ComputePipelineDesc;

    fn layout(&self) -> &PipelineLayout;

    fn index_by_name(&self, name: &str) -> i32 {
        self.layout().index_by_name(name, ShaderStage::Compute)
    }

    fn matches_shader_program(&self, other: &dyn ComputePipelineState) -> bool {
        same_module(&self.desc().compute_module, &other.desc().compute_module)
    }

    fn as_any(&self) -> &dyn Any;
}
