//! Integration tests for VulkanDevice
//!
//! These tests verify that VulkanDevice correctly implements the Device trait
//! on a real GPU. All tests require a Vulkan 1.2 driver and are marked with #[ignore].
//!
//! Run with: cargo test --test vulkan_device_tests -- --ignored

use std::sync::Arc;
use prism_hal::prism::Error;
use prism_hal::prism::device::{
    BackendType, Buffer, BufferDesc, BufferUsage, Color, ColorAttachmentDesc, Device, FeatureQuery,
    FramebufferAttachment, FramebufferDesc, LoadAction, RenderPassDesc, SamplerDesc, SamplerFilter,
    ShaderModuleDesc, ShaderSource, ShaderStage, StorageMode, StoreAction, TextureDesc, TextureFormat,
    TextureUsage,
};
use prism_hal_vulkan::prism::{VulkanBuffer, VulkanContextConfig, VulkanDevice};
use serial_test::serial;

fn create_device() -> VulkanDevice {
    let config = VulkanContextConfig { app_name: "prism vulkan tests".to_string(), ..Default::default() };
    VulkanDevice::new(&config).unwrap()
}

fn render_target(device: &VulkanDevice, width: u32, height: u32) -> FramebufferDesc {
    let texture = device
        .create_texture(&TextureDesc::new_2d(TextureFormat::RGBA8_UNORM, width, height, TextureUsage::ATTACHMENT))
        .unwrap();
    FramebufferDesc {
        color_attachments: vec![FramebufferAttachment::new(texture)],
        debug_name: "test target".to_string(),
        ..Default::default()
    }
}

// ============================================================================
// DEVICE
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_device_reports_backend_and_features() {
    let device = create_device();

    assert_eq!(device.backend_type(), BackendType::Vulkan);
    assert!(!device.context().device_name().is_empty());
    assert_eq!(
        device.has_feature(prism_hal::prism::device::DeviceFeatures::PUSH_DESCRIPTORS),
        device.context().has_feature(prism_hal::prism::device::DeviceFeatures::PUSH_DESCRIPTORS)
    );
}

// ============================================================================
// BUFFER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_shared_buffer_with_data() {
    let device = create_device();
    let mut desc = BufferDesc::new(BufferUsage::VERTEX, 64);
    desc.data = (0..64).collect();

    let buffer = device.create_buffer(&desc).unwrap();
    assert_eq!(buffer.size(), 64);
    assert_eq!(buffer.usage(), BufferUsage::VERTEX);
    let vk_buffer = buffer.as_any().downcast_ref::<VulkanBuffer>().unwrap();
    assert_eq!(vk_buffer.storage(), StorageMode::Shared);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_private_buffer_upload_goes_through_staging() {
    let device = create_device();
    let mut desc = BufferDesc::new(BufferUsage::UNIFORM, 256);
    desc.storage = StorageMode::Private;

    let buffer = device.create_buffer(&desc).unwrap();
    buffer.upload(128, &[1u8; 128]).unwrap();
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_buffer_upload_out_of_bounds_fails() {
    let device = create_device();
    let buffer = device.create_buffer(&BufferDesc::new(BufferUsage::UNIFORM, 16)).unwrap();

    let result = buffer.upload(8, &[0u8; 16]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_zero_sized_buffer_is_rejected() {
    let device = create_device();
    let result = device.create_buffer(&BufferDesc::new(BufferUsage::VERTEX, 0));
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// TEXTURE / SAMPLER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_texture_and_sampler() {
    let device = create_device();
    let texture = device
        .create_texture(&TextureDesc::new_2d(TextureFormat::RGBA8_UNORM, 256, 256, TextureUsage::SAMPLED))
        .unwrap();
    assert_eq!(texture.desc().width, 256);
    assert_eq!(texture.desc().format, TextureFormat::RGBA8_UNORM);

    let desc = SamplerDesc { min_filter: SamplerFilter::Nearest, ..Default::default() };
    let a = device.create_sampler_state(&desc).unwrap();
    let b = device.create_sampler_state(&desc).unwrap();
    // Identical descriptors share one native sampler
    assert!(std::ptr::addr_eq(Arc::as_ptr(&a), Arc::as_ptr(&b)));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_non_spirv_source_is_rejected() {
    let device = create_device();
    let result = device.create_shader_module(ShaderModuleDesc {
        stage: ShaderStage::Vertex,
        source: ShaderSource::LinkedGlProgram(1),
        entry_point: "main".to_string(),
        reflection: None,
        debug_name: "gl program".to_string(),
    });
    assert!(matches!(result, Err(Error::BackendError(_))));
}

// ============================================================================
// COMMAND BUFFER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_clear_pass_submits() {
    let device = create_device();
    let framebuffer = device.create_framebuffer(render_target(&device, 64, 64)).unwrap();
    let pass = RenderPassDesc {
        color_attachments: vec![ColorAttachmentDesc {
            load_action: LoadAction::Clear,
            store_action: StoreAction::Store,
            clear_color: Color::new(0.2, 0.4, 0.6, 1.0),
        }],
        ..Default::default()
    };

    let mut command_buffer = device.create_command_buffer().unwrap();
    {
        let mut encoder = command_buffer.create_render_command_encoder(&pass, &framebuffer).unwrap();
        encoder.push_debug_group_label("clear", Color::new(1.0, 0.0, 0.0, 1.0));
        encoder.pop_debug_group_label();
        encoder.end_encoding().unwrap();
    }
    assert_eq!(command_buffer.current_draw_count(), 0);
    command_buffer.submit().unwrap();

    // Same attachment layout: the cached render pass is reused
    let passes = device.context().render_pass_cache().len();
    {
        let mut encoder = command_buffer.create_render_command_encoder(&pass, &framebuffer).unwrap();
        encoder.end_encoding().unwrap();
    }
    command_buffer.submit().unwrap();
    assert_eq!(device.context().render_pass_cache().len(), passes);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_draw_without_pipeline_fails() {
    let device = create_device();
    let framebuffer = device.create_framebuffer(render_target(&device, 16, 16)).unwrap();

    let mut command_buffer = device.create_command_buffer().unwrap();
    {
        let mut encoder = command_buffer
            .create_render_command_encoder(&RenderPassDesc::default(), &framebuffer)
            .unwrap();
        let result = encoder.draw(3, 1, 0, 0);
        assert!(matches!(result, Err(Error::InvalidResource(_))));
        encoder.end_encoding().unwrap();
    }
    command_buffer.submit().unwrap();
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_empty_submit_is_a_no_op() {
    let device = create_device();
    let mut command_buffer = device.create_command_buffer().unwrap();
    command_buffer.submit().unwrap();
    assert_eq!(command_buffer.current_draw_count(), 0);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_framebuffer_without_attachments_is_rejected() {
    let device = create_device();
    let result = device.create_framebuffer(FramebufferDesc::default());
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_buffer_is_shared_across_threads() {
    let device = create_device();
    let buffer: Arc<dyn Buffer> = device.create_buffer(&BufferDesc::new(BufferUsage::STORAGE, 1024)).unwrap();

    std::thread::scope(|scope| {
        for i in 0..4u64 {
            let buffer = Arc::clone(&buffer);
            scope.spawn(move || buffer.upload(i * 256, &[i as u8; 256]).unwrap());
        }
    });
}
