/// VulkanExtensions - which instance and device extensions exist and which are enabled
///
/// Enumerate first, then enable by name. Enabling an extension the driver
/// does not expose is refused (returns `false`), so callers can treat every
/// optional extension the same way.

use ash::vk;
use rustc_hash::FxHashSet;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use prism_hal::{hal_debug, hal_err};
use prism_hal::prism::Result;
use crate::vulkan_context::VulkanContextConfig;

/// Extension scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionType {
    Instance,
    Device,
}

#[derive(Debug, Default)]
struct ExtensionSet {
    available: FxHashSet<CString>,
    enabled: Vec<&'static CStr>,
}

/// Extension registry for one context
#[derive(Debug, Default)]
pub struct VulkanExtensions {
    instance: ExtensionSet,
    device: ExtensionSet,
}

impl VulkanExtensions {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, extension_type: ExtensionType) -> &ExtensionSet {
        match extension_type {
            ExtensionType::Instance => &self.instance,
            ExtensionType::Device => &self.device,
        }
    }

    fn set_mut(&mut self, extension_type: ExtensionType) -> &mut ExtensionSet {
        match extension_type {
            ExtensionType::Instance => &mut self.instance,
            ExtensionType::Device => &mut self.device,
        }
    }

    /// Record the instance extensions the loader exposes
    pub fn enumerate_instance_extensions(&mut self, entry: &ash::Entry) -> Result<()> {
        let properties = unsafe { entry.enumerate_instance_extension_properties(None) }.map_err(|e| {
            hal_err!("prism::vulkan::Extensions", "Failed to enumerate instance extensions: {:?}", e)
        })?;
        self.record_properties(ExtensionType::Instance, &properties);
        Ok(())
    }

    /// Record the device extensions `physical_device` exposes
    pub fn enumerate_device_extensions(
        &mut self,
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> Result<()> {
        let properties = unsafe { instance.enumerate_device_extension_properties(physical_device) }.map_err(|e| {
            hal_err!("prism::vulkan::Extensions", "Failed to enumerate device extensions: {:?}", e)
        })?;
        self.record_properties(ExtensionType::Device, &properties);
        Ok(())
    }

    fn record_properties(&mut self, extension_type: ExtensionType, properties: &[vk::ExtensionProperties]) {
        let names = properties.iter().filter_map(|p| p.extension_name_as_c_str().ok());
        self.set_available(extension_type, names);
    }

    /// Replace the available set (enumeration results, or fixed lists in tests)
    pub fn set_available<'a>(&mut self, extension_type: ExtensionType, names: impl IntoIterator<Item = &'a CStr>) {
        let set = self.set_mut(extension_type);
        set.available = names.into_iter().map(CStr::to_owned).collect();
        set.enabled.clear();
    }

    pub fn available(&self, name: &CStr, extension_type: ExtensionType) -> bool {
        self.set(extension_type).available.contains(name)
    }

    /// Enable an extension; returns whether it is available (and now enabled)
    pub fn enable(&mut self, name: &'static CStr, extension_type: ExtensionType) -> bool {
        if !self.available(name, extension_type) {
            hal_debug!("prism::vulkan::Extensions", "{:?} extension {:?} not available", extension_type, name);
            return false;
        }
        let set = self.set_mut(extension_type);
        if !set.enabled.contains(&name) {
            set.enabled.push(name);
        }
        true
    }

    pub fn is_enabled(&self, name: &CStr, extension_type: ExtensionType) -> bool {
        self.set(extension_type).enabled.iter().any(|e| *e == name)
    }

    /// Enabled extension names, in enable order, for `pp_enabled_extension_names`
    pub fn enabled(&self, extension_type: ExtensionType) -> Vec<*const c_char> {
        self.set(extension_type).enabled.iter().map(|name| name.as_ptr()).collect()
    }

    pub fn enabled_names(&self, extension_type: ExtensionType) -> &[&'static CStr] {
        &self.set(extension_type).enabled
    }

    /// Instance extensions every context wants when present (no surface extensions)
    pub fn enable_common_instance_extensions(&mut self, config: &VulkanContextConfig) {
        self.enable(ash::ext::debug_utils::NAME, ExtensionType::Instance);
        self.enable(ash::khr::get_physical_device_properties2::NAME, ExtensionType::Instance);
        if config.enable_validation {
            self.enable(ash::ext::validation_features::NAME, ExtensionType::Instance);
        }
        if config.headless {
            self.enable(ash::ext::headless_surface::NAME, ExtensionType::Instance);
        }
    }

    /// Device extensions for the features the configuration asks for.
    ///
    /// Multiview, 16-bit storage and descriptor indexing are core in the
    /// targeted API version and need no extension.
    pub fn enable_common_device_extensions(&mut self, config: &VulkanContextConfig) {
        if config.push_descriptors.is_requested() {
            self.enable(ash::khr::push_descriptor::NAME, ExtensionType::Device);
        }
        if config.shader_int16.is_requested() {
            self.enable(ash::khr::shader_float16_int8::NAME, ExtensionType::Device);
        }
        if config.descriptor_indexing.is_requested() {
            self.enable(ash::ext::descriptor_indexing::NAME, ExtensionType::Device);
        }
        self.enable(ash::ext::index_type_uint8::NAME, ExtensionType::Device);
        self.enable(ash::khr::driver_properties::NAME, ExtensionType::Device);
    }
}

#[cfg(test)]
#[path = "vulkan_extensions_tests.rs"]
mod tests;
