//! Unit tests for VulkanExtensions (fixed availability lists, no driver)

use super::*;
use prism_hal::prism::FeatureRequest;
use serial_test::serial;
use std::ffi::CStr;

fn registry(instance: &[&CStr], device: &[&CStr]) -> VulkanExtensions {
    let mut extensions = VulkanExtensions::new();
    extensions.set_available(ExtensionType::Instance, instance.iter().copied());
    extensions.set_available(ExtensionType::Device, device.iter().copied());
    extensions
}

#[test]
fn test_available_is_scoped_by_type() {
    let extensions = registry(&[ash::ext::debug_utils::NAME], &[ash::khr::push_descriptor::NAME]);

    assert!(extensions.available(ash::ext::debug_utils::NAME, ExtensionType::Instance));
    assert!(!extensions.available(ash::ext::debug_utils::NAME, ExtensionType::Device));
    assert!(extensions.available(ash::khr::push_descriptor::NAME, ExtensionType::Device));
}

#[test]
#[serial]
fn test_enable_refuses_missing_extension() {
    let mut extensions = registry(&[], &[]);

    assert!(!extensions.enable(ash::khr::push_descriptor::NAME, ExtensionType::Device));
    assert!(extensions.enabled(ExtensionType::Device).is_empty());
}

#[test]
fn test_enable_twice_lists_once() {
    let mut extensions = registry(&[], &[ash::khr::push_descriptor::NAME]);

    assert!(extensions.enable(ash::khr::push_descriptor::NAME, ExtensionType::Device));
    assert!(extensions.enable(ash::khr::push_descriptor::NAME, ExtensionType::Device));

    assert_eq!(extensions.enabled_names(ExtensionType::Device), &[ash::khr::push_descriptor::NAME]);
    assert_eq!(extensions.enabled(ExtensionType::Device).len(), 1);
}

#[test]
#[serial]
fn test_common_instance_extensions_skip_validation_features_when_not_validating() {
    let mut extensions = registry(
        &[
            ash::ext::debug_utils::NAME,
            ash::khr::get_physical_device_properties2::NAME,
            ash::ext::validation_features::NAME,
        ],
        &[],
    );
    let config = VulkanContextConfig { enable_validation: false, headless: true, ..Default::default() };
    extensions.enable_common_instance_extensions(&config);

    assert!(extensions.is_enabled(ash::ext::debug_utils::NAME, ExtensionType::Instance));
    assert!(extensions.is_enabled(ash::khr::get_physical_device_properties2::NAME, ExtensionType::Instance));
    assert!(!extensions.is_enabled(ash::ext::validation_features::NAME, ExtensionType::Instance));
    // Headless surface requested but not available
    assert!(!extensions.is_enabled(ash::ext::headless_surface::NAME, ExtensionType::Instance));
}

#[test]
#[serial]
fn test_common_device_extensions_follow_requests() {
    let mut extensions = registry(
        &[],
        &[
            ash::khr::push_descriptor::NAME,
            ash::ext::descriptor_indexing::NAME,
            ash::khr::driver_properties::NAME,
        ],
    );
    let config = VulkanContextConfig {
        push_descriptors: FeatureRequest::IfAvailable,
        descriptor_indexing: FeatureRequest::Disabled,
        ..Default::default()
    };
    extensions.enable_common_device_extensions(&config);

    assert!(extensions.is_enabled(ash::khr::push_descriptor::NAME, ExtensionType::Device));
    assert!(!extensions.is_enabled(ash::ext::descriptor_indexing::NAME, ExtensionType::Device));
    assert!(extensions.is_enabled(ash::khr::driver_properties::NAME, ExtensionType::Device));
}

#[test]
fn test_set_available_resets_enabled() {
    let mut extensions = registry(&[], &[ash::khr::push_descriptor::NAME]);
    extensions.enable(ash::khr::push_descriptor::NAME, ExtensionType::Device);

    extensions.set_available(ExtensionType::Device, [ash::khr::push_descriptor::NAME]);
    assert!(!extensions.is_enabled(ash::khr::push_descriptor::NAME, ExtensionType::Device));
}
