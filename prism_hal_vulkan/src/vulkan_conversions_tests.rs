//! Unit tests for the HAL -> Vulkan conversion functions
//!
//! Tests pure mappings without requiring a GPU.

use super::*;
use serial_test::serial;

// ============================================================================
// FORMATS
// ============================================================================

#[test]
fn test_texture_format_to_vk_color_formats() {
    assert_eq!(texture_format_to_vk(TextureFormat::RGBA8_UNORM), vk::Format::R8G8B8A8_UNORM);
    assert_eq!(texture_format_to_vk(TextureFormat::RGBA8_SRGB), vk::Format::R8G8B8A8_SRGB);
    assert_eq!(texture_format_to_vk(TextureFormat::BGRA8_SRGB), vk::Format::B8G8R8A8_SRGB);
    assert_eq!(texture_format_to_vk(TextureFormat::RGBA16_FLOAT), vk::Format::R16G16B16A16_SFLOAT);
    assert_eq!(texture_format_to_vk(TextureFormat::Invalid), vk::Format::UNDEFINED);
}

#[test]
fn test_texture_format_to_vk_depth_formats() {
    assert_eq!(texture_format_to_vk(TextureFormat::D16_UNORM), vk::Format::D16_UNORM);
    assert_eq!(texture_format_to_vk(TextureFormat::D32_FLOAT), vk::Format::D32_SFLOAT);
    assert_eq!(texture_format_to_vk(TextureFormat::D24_UNORM_S8_UINT), vk::Format::D24_UNORM_S8_UINT);
}

#[test]
fn test_vertex_format_to_vk() {
    assert_eq!(vertex_format_to_vk(VertexFormat::Float3), vk::Format::R32G32B32_SFLOAT);
    assert_eq!(vertex_format_to_vk(VertexFormat::UInt1), vk::Format::R32_UINT);
    assert_eq!(vertex_format_to_vk(VertexFormat::UByte4Norm), vk::Format::R8G8B8A8_UNORM);
    assert_eq!(vertex_format_to_vk(VertexFormat::HalfFloat2), vk::Format::R16G16_SFLOAT);
}

#[test]
fn test_aspect_mask() {
    assert_eq!(aspect_mask(TextureFormat::RGBA8_UNORM), vk::ImageAspectFlags::COLOR);
    assert_eq!(aspect_mask(TextureFormat::D32_FLOAT), vk::ImageAspectFlags::DEPTH);
    assert_eq!(
        aspect_mask(TextureFormat::D24_UNORM_S8_UINT),
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    );
    assert_eq!(aspect_mask(TextureFormat::S8_UINT), vk::ImageAspectFlags::STENCIL);
}

// ============================================================================
// RESOURCES
// ============================================================================

#[test]
fn test_buffer_usage_always_allows_transfer() {
    let flags = buffer_usage_to_vk(BufferUsage::VERTEX | BufferUsage::UNIFORM);
    assert!(flags.contains(vk::BufferUsageFlags::TRANSFER_DST));
    assert!(flags.contains(vk::BufferUsageFlags::VERTEX_BUFFER));
    assert!(flags.contains(vk::BufferUsageFlags::UNIFORM_BUFFER));
    assert!(!flags.contains(vk::BufferUsageFlags::INDEX_BUFFER));
}

#[test]
fn test_attachment_usage_depends_on_format() {
    let color = texture_usage_to_vk(TextureUsage::ATTACHMENT, TextureFormat::RGBA8_UNORM);
    let depth = texture_usage_to_vk(TextureUsage::ATTACHMENT, TextureFormat::D32_FLOAT);
    assert!(color.contains(vk::ImageUsageFlags::COLOR_ATTACHMENT));
    assert!(depth.contains(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT));
    assert!(!depth.contains(vk::ImageUsageFlags::COLOR_ATTACHMENT));
}

#[test]
fn test_mip_filter_disabled_clamps_lod() {
    assert_eq!(mip_filter_to_vk(SamplerMipFilter::Disabled).1, 0.0);
    assert_eq!(mip_filter_to_vk(SamplerMipFilter::Linear).0, vk::SamplerMipmapMode::LINEAR);
}

#[test]
fn test_index_type_to_vk() {
    assert_eq!(index_type_to_vk(IndexFormat::UInt16), vk::IndexType::UINT16);
    assert_eq!(index_type_to_vk(IndexFormat::UInt32), vk::IndexType::UINT32);
    assert_eq!(index_type_to_vk(IndexFormat::UInt8), vk::IndexType::UINT8_EXT);
}

// ============================================================================
// SHADERS
// ============================================================================

#[test]
fn test_shader_stages_to_vk() {
    assert_eq!(
        shader_stages_to_vk(ShaderStages::VERTEX | ShaderStages::FRAGMENT),
        vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT
    );
    assert_eq!(shader_stage_to_vk(ShaderStage::Compute), vk::ShaderStageFlags::COMPUTE);
}

#[test]
fn test_descriptor_kind_to_vk() {
    assert_eq!(descriptor_kind_to_vk(DescriptorKind::UniformBuffer), vk::DescriptorType::UNIFORM_BUFFER);
    assert_eq!(descriptor_kind_to_vk(DescriptorKind::StorageBuffer), vk::DescriptorType::STORAGE_BUFFER);
    assert_eq!(
        descriptor_kind_to_vk(DescriptorKind::CombinedImageSampler),
        vk::DescriptorType::COMBINED_IMAGE_SAMPLER
    );
}

// ============================================================================
// FIXED FUNCTION
// ============================================================================

#[test]
fn test_dual_source_blend_factors() {
    assert_eq!(blend_factor_to_vk(BlendFactor::Src1Color), vk::BlendFactor::SRC1_COLOR);
    assert_eq!(blend_factor_to_vk(BlendFactor::OneMinusSrc1Color), vk::BlendFactor::ONE_MINUS_SRC1_COLOR);
}

#[test]
fn test_color_write_mask_to_vk() {
    assert_eq!(
        color_write_mask_to_vk(&ColorWriteMask::ALL),
        vk::ColorComponentFlags::R | vk::ColorComponentFlags::G | vk::ColorComponentFlags::B | vk::ColorComponentFlags::A
    );
    assert_eq!(color_write_mask_to_vk(&ColorWriteMask::NONE), vk::ColorComponentFlags::empty());
    let rg = ColorWriteMask { r: true, g: true, b: false, a: false };
    assert_eq!(color_write_mask_to_vk(&rg), vk::ColorComponentFlags::R | vk::ColorComponentFlags::G);
}

#[test]
fn test_stencil_state_leaves_reference_dynamic() {
    let state = StencilOpState { pass_op: StencilOp::Replace, ..Default::default() };
    let vk_state = stencil_op_state_to_vk(&state);
    assert_eq!(vk_state.pass_op, vk::StencilOp::REPLACE);
    assert_eq!(vk_state.compare_op, vk::CompareOp::ALWAYS);
    assert_eq!(vk_state.reference, 0);
}

// ============================================================================
// ATTACHMENTS
// ============================================================================

#[test]
fn test_msaa_resolve_discards_multisampled_contents() {
    assert_eq!(store_action_to_vk(StoreAction::MsaaResolve), vk::AttachmentStoreOp::DONT_CARE);
    assert_eq!(store_action_to_vk(StoreAction::Store), vk::AttachmentStoreOp::STORE);
    assert_eq!(load_action_to_vk(LoadAction::Clear), vk::AttachmentLoadOp::CLEAR);
}

#[test]
fn test_initial_layout_only_kept_when_loading() {
    assert_eq!(initial_layout(LoadAction::Load, COLOR_RESTING_LAYOUT), COLOR_RESTING_LAYOUT);
    assert_eq!(initial_layout(LoadAction::Clear, COLOR_RESTING_LAYOUT), vk::ImageLayout::UNDEFINED);
    assert_eq!(initial_layout(LoadAction::DontCare, DEPTH_RESTING_LAYOUT), vk::ImageLayout::UNDEFINED);
}

// ============================================================================
// ERRORS
// ============================================================================

#[test]
#[serial]
fn test_native_error_keeps_raw_code() {
    let error = native_error("render pass", vk::Result::ERROR_INITIALIZATION_FAILED);
    assert_eq!(
        error,
        Error::NativeCreationFailed { object: "render pass", code: vk::Result::ERROR_INITIALIZATION_FAILED.as_raw() }
    );
}

#[test]
#[serial]
fn test_native_error_maps_out_of_memory() {
    assert_eq!(native_error("buffer", vk::Result::ERROR_OUT_OF_DEVICE_MEMORY), Error::OutOfMemory);
}
