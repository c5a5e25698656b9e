/// Conversions from HAL descriptor types to Vulkan enums and flags
///
/// Pure functions, no device needed.

use ash::vk;
use prism_hal::hal_error;
use prism_hal::prism::Error;
use prism_hal::prism::binder::{DescriptorKind, ShaderStages};
use prism_hal::prism::device::{
    BlendFactor, BlendOp, BufferUsage, ColorWriteMask, CompareOp, CullMode, FrontFace, IndexFormat,
    LoadAction, PolygonMode, PrimitiveTopology, SampleCount, SamplerAddressMode, SamplerFilter,
    SamplerMipFilter, ShaderStage, StencilOp, StencilOpState, StoreAction, TextureFormat, TextureType,
    TextureUsage, VertexFormat, VertexInputRate,
};

/// Turn a failed `VkResult` into the HAL error, keeping the raw result code.
///
/// Out-of-memory results map to `Error::OutOfMemory`.
pub(crate) fn native_error(object: &'static str, result: vk::Result) -> Error {
    hal_error!("prism::vulkan", "Failed to create {}: {:?}", object, result);
    match result {
        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY | vk::Result::ERROR_OUT_OF_HOST_MEMORY => Error::OutOfMemory,
        _ => Error::NativeCreationFailed { object, code: result.as_raw() },
    }
}

// ===== FORMATS =====

pub(crate) fn texture_format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::Invalid => vk::Format::UNDEFINED,
        TextureFormat::R8_UNORM => vk::Format::R8_UNORM,
        TextureFormat::RG8_UNORM => vk::Format::R8G8_UNORM,
        TextureFormat::RGBA8_UNORM => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::RGBA8_SRGB => vk::Format::R8G8B8A8_SRGB,
        TextureFormat::BGRA8_UNORM => vk::Format::B8G8R8A8_UNORM,
        TextureFormat::BGRA8_SRGB => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::R16_FLOAT => vk::Format::R16_SFLOAT,
        TextureFormat::RGBA16_FLOAT => vk::Format::R16G16B16A16_SFLOAT,
        TextureFormat::R32_FLOAT => vk::Format::R32_SFLOAT,
        TextureFormat::RGBA32_FLOAT => vk::Format::R32G32B32A32_SFLOAT,
        TextureFormat::R32_UINT => vk::Format::R32_UINT,
        TextureFormat::D16_UNORM => vk::Format::D16_UNORM,
        TextureFormat::D32_FLOAT => vk::Format::D32_SFLOAT,
        TextureFormat::S8_UINT => vk::Format::S8_UINT,
        TextureFormat::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
        TextureFormat::D32_FLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
    }
}

pub(crate) fn vertex_format_to_vk(format: VertexFormat) -> vk::Format {
    match format {
        VertexFormat::Float1 => vk::Format::R32_SFLOAT,
        VertexFormat::Float2 => vk::Format::R32G32_SFLOAT,
        VertexFormat::Float3 => vk::Format::R32G32B32_SFLOAT,
        VertexFormat::Float4 => vk::Format::R32G32B32A32_SFLOAT,
        VertexFormat::Int1 => vk::Format::R32_SINT,
        VertexFormat::Int2 => vk::Format::R32G32_SINT,
        VertexFormat::Int3 => vk::Format::R32G32B32_SINT,
        VertexFormat::Int4 => vk::Format::R32G32B32A32_SINT,
        VertexFormat::UInt1 => vk::Format::R32_UINT,
        VertexFormat::UInt2 => vk::Format::R32G32_UINT,
        VertexFormat::UInt3 => vk::Format::R32G32B32_UINT,
        VertexFormat::UInt4 => vk::Format::R32G32B32A32_UINT,
        VertexFormat::UByte4Norm => vk::Format::R8G8B8A8_UNORM,
        VertexFormat::Byte4Norm => vk::Format::R8G8B8A8_SNORM,
        VertexFormat::HalfFloat2 => vk::Format::R16G16_SFLOAT,
        VertexFormat::HalfFloat4 => vk::Format::R16G16B16A16_SFLOAT,
    }
}

pub(crate) fn sample_count_to_vk(count: SampleCount) -> vk::SampleCountFlags {
    match count {
        SampleCount::S1 => vk::SampleCountFlags::TYPE_1,
        SampleCount::S2 => vk::SampleCountFlags::TYPE_2,
        SampleCount::S4 => vk::SampleCountFlags::TYPE_4,
        SampleCount::S8 => vk::SampleCountFlags::TYPE_8,
    }
}

/// Image aspects a view of `format` covers
pub(crate) fn aspect_mask(format: TextureFormat) -> vk::ImageAspectFlags {
    match (format.is_depth(), format.has_stencil()) {
        (true, true) => vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
        (true, false) => vk::ImageAspectFlags::DEPTH,
        (false, true) => vk::ImageAspectFlags::STENCIL,
        (false, false) => vk::ImageAspectFlags::COLOR,
    }
}

// ===== RESOURCES =====

pub(crate) fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    // Every buffer can be the target of a staging copy
    let mut flags = vk::BufferUsageFlags::TRANSFER_DST;
    if usage.contains(BufferUsage::VERTEX) {
        flags |= vk::BufferUsageFlags::VERTEX_BUFFER;
    }
    if usage.contains(BufferUsage::INDEX) {
        flags |= vk::BufferUsageFlags::INDEX_BUFFER;
    }
    if usage.contains(BufferUsage::UNIFORM) {
        flags |= vk::BufferUsageFlags::UNIFORM_BUFFER;
    }
    if usage.contains(BufferUsage::STORAGE) {
        flags |= vk::BufferUsageFlags::STORAGE_BUFFER;
    }
    if usage.contains(BufferUsage::INDIRECT) {
        flags |= vk::BufferUsageFlags::INDIRECT_BUFFER;
    }
    flags
}

pub(crate) fn texture_usage_to_vk(usage: TextureUsage, format: TextureFormat) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::TRANSFER_DST;
    if usage.contains(TextureUsage::SAMPLED) {
        flags |= vk::ImageUsageFlags::SAMPLED;
    }
    if usage.contains(TextureUsage::STORAGE) {
        flags |= vk::ImageUsageFlags::STORAGE;
    }
    if usage.contains(TextureUsage::ATTACHMENT) {
        flags |= if format.is_depth_or_stencil() {
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
        } else {
            vk::ImageUsageFlags::COLOR_ATTACHMENT
        };
    }
    flags
}

/// Image type and view type for a texture type
pub(crate) fn texture_type_to_vk(texture_type: TextureType) -> (vk::ImageType, vk::ImageViewType) {
    match texture_type {
        TextureType::TwoD => (vk::ImageType::TYPE_2D, vk::ImageViewType::TYPE_2D),
        TextureType::TwoDArray => (vk::ImageType::TYPE_2D, vk::ImageViewType::TYPE_2D_ARRAY),
        TextureType::ThreeD => (vk::ImageType::TYPE_3D, vk::ImageViewType::TYPE_3D),
        TextureType::Cube => (vk::ImageType::TYPE_2D, vk::ImageViewType::CUBE),
    }
}

pub(crate) fn filter_to_vk(filter: SamplerFilter) -> vk::Filter {
    match filter {
        SamplerFilter::Nearest => vk::Filter::NEAREST,
        SamplerFilter::Linear => vk::Filter::LINEAR,
    }
}

/// Mipmap mode plus the max LOD that disables mipmapping
pub(crate) fn mip_filter_to_vk(filter: SamplerMipFilter) -> (vk::SamplerMipmapMode, f32) {
    match filter {
        SamplerMipFilter::Disabled => (vk::SamplerMipmapMode::NEAREST, 0.0),
        SamplerMipFilter::Nearest => (vk::SamplerMipmapMode::NEAREST, vk::LOD_CLAMP_NONE),
        SamplerMipFilter::Linear => (vk::SamplerMipmapMode::LINEAR, vk::LOD_CLAMP_NONE),
    }
}

pub(crate) fn address_mode_to_vk(mode: SamplerAddressMode) -> vk::SamplerAddressMode {
    match mode {
        SamplerAddressMode::Repeat => vk::SamplerAddressMode::REPEAT,
        SamplerAddressMode::MirrorRepeat => vk::SamplerAddressMode::MIRRORED_REPEAT,
        SamplerAddressMode::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
    }
}

pub(crate) fn index_type_to_vk(format: IndexFormat) -> vk::IndexType {
    match format {
        IndexFormat::UInt8 => vk::IndexType::UINT8_EXT,
        IndexFormat::UInt16 => vk::IndexType::UINT16,
        IndexFormat::UInt32 => vk::IndexType::UINT32,
    }
}

// ===== SHADERS AND DESCRIPTORS =====

pub(crate) fn shader_stage_to_vk(stage: ShaderStage) -> vk::ShaderStageFlags {
    match stage {
        ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
        ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        ShaderStage::Compute => vk::ShaderStageFlags::COMPUTE,
    }
}

pub(crate) fn shader_stages_to_vk(stages: ShaderStages) -> vk::ShaderStageFlags {
    let mut flags = vk::ShaderStageFlags::empty();
    if stages.contains(ShaderStages::VERTEX) {
        flags |= vk::ShaderStageFlags::VERTEX;
    }
    if stages.contains(ShaderStages::FRAGMENT) {
        flags |= vk::ShaderStageFlags::FRAGMENT;
    }
    if stages.contains(ShaderStages::COMPUTE) {
        flags |= vk::ShaderStageFlags::COMPUTE;
    }
    flags
}

pub(crate) fn descriptor_kind_to_vk(kind: DescriptorKind) -> vk::DescriptorType {
    match kind {
        DescriptorKind::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        DescriptorKind::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        DescriptorKind::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
    }
}

// ===== FIXED FUNCTION =====

pub(crate) fn input_rate_to_vk(rate: VertexInputRate) -> vk::VertexInputRate {
    match rate {
        VertexInputRate::Vertex => vk::VertexInputRate::VERTEX,
        VertexInputRate::Instance => vk::VertexInputRate::INSTANCE,
    }
}

pub(crate) fn topology_to_vk(topology: PrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
        PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
        PrimitiveTopology::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
        PrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
    }
}

pub(crate) fn cull_mode_to_vk(mode: CullMode) -> vk::CullModeFlags {
    match mode {
        CullMode::None => vk::CullModeFlags::NONE,
        CullMode::Front => vk::CullModeFlags::FRONT,
        CullMode::Back => vk::CullModeFlags::BACK,
    }
}

pub(crate) fn front_face_to_vk(face: FrontFace) -> vk::FrontFace {
    match face {
        FrontFace::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
        FrontFace::Clockwise => vk::FrontFace::CLOCKWISE,
    }
}

pub(crate) fn polygon_mode_to_vk(mode: PolygonMode) -> vk::PolygonMode {
    match mode {
        PolygonMode::Fill => vk::PolygonMode::FILL,
        PolygonMode::Line => vk::PolygonMode::LINE,
    }
}

pub(crate) fn compare_op_to_vk(op: CompareOp) -> vk::CompareOp {
    match op {
        CompareOp::Never => vk::CompareOp::NEVER,
        CompareOp::Less => vk::CompareOp::LESS,
        CompareOp::Equal => vk::CompareOp::EQUAL,
        CompareOp::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareOp::Greater => vk::CompareOp::GREATER,
        CompareOp::NotEqual => vk::CompareOp::NOT_EQUAL,
        CompareOp::GreaterOrEqual => vk::CompareOp::GREATER_OR_EQUAL,
        CompareOp::Always => vk::CompareOp::ALWAYS,
    }
}

pub(crate) fn stencil_op_to_vk(op: StencilOp) -> vk::StencilOp {
    match op {
        StencilOp::Keep => vk::StencilOp::KEEP,
        StencilOp::Zero => vk::StencilOp::ZERO,
        StencilOp::Replace => vk::StencilOp::REPLACE,
        StencilOp::IncrementAndClamp => vk::StencilOp::INCREMENT_AND_CLAMP,
        StencilOp::DecrementAndClamp => vk::StencilOp::DECREMENT_AND_CLAMP,
        StencilOp::Invert => vk::StencilOp::INVERT,
        StencilOp::IncrementAndWrap => vk::StencilOp::INCREMENT_AND_WRAP,
        StencilOp::DecrementAndWrap => vk::StencilOp::DECREMENT_AND_WRAP,
    }
}

/// Reference is dynamic state, set by the encoder
pub(crate) fn stencil_op_state_to_vk(state: &StencilOpState) -> vk::StencilOpState {
    vk::StencilOpState {
        fail_op: stencil_op_to_vk(state.fail_op),
        pass_op: stencil_op_to_vk(state.pass_op),
        depth_fail_op: stencil_op_to_vk(state.depth_fail_op),
        compare_op: compare_op_to_vk(state.compare_op),
        compare_mask: state.compare_mask,
        write_mask: state.write_mask,
        reference: 0,
    }
}

pub(crate) fn blend_factor_to_vk(factor: BlendFactor) -> vk::BlendFactor {
    match factor {
        BlendFactor::Zero => vk::BlendFactor::ZERO,
        BlendFactor::One => vk::BlendFactor::ONE,
        BlendFactor::SrcColor => vk::BlendFactor::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => vk::BlendFactor::ONE_MINUS_SRC_COLOR,
        BlendFactor::DstColor => vk::BlendFactor::DST_COLOR,
        BlendFactor::OneMinusDstColor => vk::BlendFactor::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => vk::BlendFactor::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => vk::BlendFactor::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => vk::BlendFactor::ONE_MINUS_DST_ALPHA,
        BlendFactor::ConstantColor => vk::BlendFactor::CONSTANT_COLOR,
        BlendFactor::OneMinusConstantColor => vk::BlendFactor::ONE_MINUS_CONSTANT_COLOR,
        BlendFactor::SrcAlphaSaturate => vk::BlendFactor::SRC_ALPHA_SATURATE,
        BlendFactor::Src1Color => vk::BlendFactor::SRC1_COLOR,
        BlendFactor::OneMinusSrc1Color => vk::BlendFactor::ONE_MINUS_SRC1_COLOR,
    }
}

pub(crate) fn blend_op_to_vk(op: BlendOp) -> vk::BlendOp {
    match op {
        BlendOp::Add => vk::BlendOp::ADD,
        BlendOp::Subtract => vk::BlendOp::SUBTRACT,
        BlendOp::ReverseSubtract => vk::BlendOp::REVERSE_SUBTRACT,
        BlendOp::Min => vk::BlendOp::MIN,
        BlendOp::Max => vk::BlendOp::MAX,
    }
}

pub(crate) fn color_write_mask_to_vk(mask: &ColorWriteMask) -> vk::ColorComponentFlags {
    let mut flags = vk::ColorComponentFlags::empty();
    if mask.r { flags |= vk::ColorComponentFlags::R; }
    if mask.g { flags |= vk::ColorComponentFlags::G; }
    if mask.b { flags |= vk::ColorComponentFlags::B; }
    if mask.a { flags |= vk::ColorComponentFlags::A; }
    flags
}

// ===== ATTACHMENTS =====

pub(crate) fn load_action_to_vk(action: LoadAction) -> vk::AttachmentLoadOp {
    match action {
        LoadAction::DontCare => vk::AttachmentLoadOp::DONT_CARE,
        LoadAction::Load => vk::AttachmentLoadOp::LOAD,
        LoadAction::Clear => vk::AttachmentLoadOp::CLEAR,
    }
}

/// The multisampled side of an MSAA resolve is discarded; its resolve target stores
pub(crate) fn store_action_to_vk(action: StoreAction) -> vk::AttachmentStoreOp {
    match action {
        StoreAction::DontCare | StoreAction::MsaaResolve => vk::AttachmentStoreOp::DONT_CARE,
        StoreAction::Store => vk::AttachmentStoreOp::STORE,
    }
}

/// Layout every color texture rests in between passes
pub(crate) const COLOR_RESTING_LAYOUT: vk::ImageLayout = vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL;

/// Layout every depth/stencil texture rests in between passes
pub(crate) const DEPTH_RESTING_LAYOUT: vk::ImageLayout = vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL;

/// Layout a pass starts from: undefined when the old contents are not loaded
pub(crate) fn initial_layout(action: LoadAction, resting: vk::ImageLayout) -> vk::ImageLayout {
    match action {
        LoadAction::Load => resting,
        LoadAction::Clear | LoadAction::DontCare => vk::ImageLayout::UNDEFINED,
    }
}

#[cfg(test)]
#[path = "vulkan_conversions_tests.rs"]
mod tests;
