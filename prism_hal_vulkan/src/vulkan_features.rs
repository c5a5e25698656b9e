/// VulkanFeatures - physical device feature negotiation
///
/// The configuration turns into a required set and an optional set. After
/// querying the device, `check_selected_features` fails on every missing
/// required feature at once and silently drops missing optional ones. The
/// result is the feature set the logical device is created with.

use ash::vk;
use bitflags::bitflags;
use prism_hal::hal_error;
use prism_hal::prism::{Error, FeatureRequest, Result};
use prism_hal::prism::device::DeviceFeatures;
use crate::vulkan_context::VulkanContextConfig;

bitflags! {
    /// Physical device features the context knows how to enable
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VulkanFeatureFlags: u32 {
        const DUAL_SRC_BLEND               = 1 << 0;
        const MULTI_DRAW_INDIRECT          = 1 << 1;
        const DRAW_INDIRECT_FIRST_INSTANCE = 1 << 2;
        const DEPTH_BIAS_CLAMP             = 1 << 3;
        const FILL_MODE_NON_SOLID          = 1 << 4;
        const SAMPLER_ANISOTROPY           = 1 << 5;
        const SHADER_INT16                 = 1 << 6;
        const MULTIVIEW                    = 1 << 7;
        const SAMPLER_YCBCR_CONVERSION     = 1 << 8;
        const SHADER_DRAW_PARAMETERS       = 1 << 9;
        const STORAGE_BUFFER_16BIT_ACCESS  = 1 << 10;
        /// Runtime arrays, partially bound and non-uniform sampled image indexing
        const DESCRIPTOR_INDEXING          = 1 << 11;
        const BUFFER_DEVICE_ADDRESS        = 1 << 12;
        const INDEX_TYPE_UINT8             = 1 << 13;
    }
}

/// Requested, available and enabled feature sets of one context
#[derive(Debug, Clone, Copy, Default)]
pub struct VulkanFeatures {
    required: VulkanFeatureFlags,
    optional: VulkanFeatureFlags,
    enabled: VulkanFeatureFlags,
}

impl VulkanFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested feature set built from the configuration
    pub fn from_config(config: &VulkanContextConfig) -> Self {
        let mut features = Self::new();
        features.request(VulkanFeatureFlags::DUAL_SRC_BLEND, config.dual_src_blend);
        features.request(VulkanFeatureFlags::SHADER_INT16, config.shader_int16);
        features.request(VulkanFeatureFlags::MULTIVIEW, config.multiview);
        features.request(VulkanFeatureFlags::DESCRIPTOR_INDEXING, config.descriptor_indexing);
        features.request(VulkanFeatureFlags::STORAGE_BUFFER_16BIT_ACCESS, config.storage_buffer_16bit_access);
        features.request(VulkanFeatureFlags::BUFFER_DEVICE_ADDRESS, config.buffer_device_address);
        features.enable_default_features();
        features
    }

    /// Request `flags` with the given strength (replaces any earlier request)
    pub fn request(&mut self, flags: VulkanFeatureFlags, request: FeatureRequest) {
        self.required.remove(flags);
        self.optional.remove(flags);
        match request {
            FeatureRequest::Disabled => {}
            FeatureRequest::IfAvailable => self.optional.insert(flags),
            FeatureRequest::Required => self.required.insert(flags),
        }
    }

    /// Features every context takes when the device has them
    pub fn enable_default_features(&mut self) {
        self.optional |= (VulkanFeatureFlags::MULTI_DRAW_INDIRECT
            | VulkanFeatureFlags::DRAW_INDIRECT_FIRST_INSTANCE
            | VulkanFeatureFlags::DEPTH_BIAS_CLAMP
            | VulkanFeatureFlags::FILL_MODE_NON_SOLID
            | VulkanFeatureFlags::SAMPLER_ANISOTROPY
            | VulkanFeatureFlags::SAMPLER_YCBCR_CONVERSION
            | VulkanFeatureFlags::SHADER_DRAW_PARAMETERS
            | VulkanFeatureFlags::INDEX_TYPE_UINT8)
            - self.required;
    }

    pub fn required(&self) -> VulkanFeatureFlags {
        self.required
    }

    pub fn optional(&self) -> VulkanFeatureFlags {
        self.optional
    }

    pub fn enabled(&self) -> VulkanFeatureFlags {
        self.enabled
    }

    /// Query what `physical_device` supports through `vkGetPhysicalDeviceFeatures2`.
    ///
    /// The 8-bit index struct is only chained when its extension exists.
    pub fn populate_with_available(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        has_index_type_uint8: bool,
    ) -> VulkanFeatureFlags {
        let mut multiview = vk::PhysicalDeviceMultiviewFeatures::default();
        let mut storage_16bit = vk::PhysicalDevice16BitStorageFeatures::default();
        let mut ycbcr = vk::PhysicalDeviceSamplerYcbcrConversionFeatures::default();
        let mut draw_parameters = vk::PhysicalDeviceShaderDrawParametersFeatures::default();
        let mut indexing = vk::PhysicalDeviceDescriptorIndexingFeatures::default();
        let mut device_address = vk::PhysicalDeviceBufferDeviceAddressFeatures::default();
        let mut index_uint8 = vk::PhysicalDeviceIndexTypeUint8FeaturesEXT::default();

        let mut features2 = vk::PhysicalDeviceFeatures2::default()
            .push_next(&mut multiview)
            .push_next(&mut storage_16bit)
            .push_next(&mut ycbcr)
            .push_next(&mut draw_parameters)
            .push_next(&mut indexing)
            .push_next(&mut device_address);
        if has_index_type_uint8 {
            features2 = features2.push_next(&mut index_uint8);
        }
        unsafe { instance.get_physical_device_features2(physical_device, &mut features2) };
        let core = features2.features;

        let mut available = VulkanFeatureFlags::empty();
        let mut set = |flag: VulkanFeatureFlags, value: vk::Bool32| available.set(flag, value == vk::TRUE);
        set(VulkanFeatureFlags::DUAL_SRC_BLEND, core.dual_src_blend);
        set(VulkanFeatureFlags::MULTI_DRAW_INDIRECT, core.multi_draw_indirect);
        set(VulkanFeatureFlags::DRAW_INDIRECT_FIRST_INSTANCE, core.draw_indirect_first_instance);
        set(VulkanFeatureFlags::DEPTH_BIAS_CLAMP, core.depth_bias_clamp);
        set(VulkanFeatureFlags::FILL_MODE_NON_SOLID, core.fill_mode_non_solid);
        set(VulkanFeatureFlags::SAMPLER_ANISOTROPY, core.sampler_anisotropy);
        set(VulkanFeatureFlags::SHADER_INT16, core.shader_int16);
        set(VulkanFeatureFlags::MULTIVIEW, multiview.multiview);
        set(VulkanFeatureFlags::SAMPLER_YCBCR_CONVERSION, ycbcr.sampler_ycbcr_conversion);
        set(VulkanFeatureFlags::SHADER_DRAW_PARAMETERS, draw_parameters.shader_draw_parameters);
        set(VulkanFeatureFlags::STORAGE_BUFFER_16BIT_ACCESS, storage_16bit.storage_buffer16_bit_access);
        set(
            VulkanFeatureFlags::DESCRIPTOR_INDEXING,
            indexing.runtime_descriptor_array
                & indexing.descriptor_binding_partially_bound
                & indexing.shader_sampled_image_array_non_uniform_indexing,
        );
        set(VulkanFeatureFlags::BUFFER_DEVICE_ADDRESS, device_address.buffer_device_address);
        set(VulkanFeatureFlags::INDEX_TYPE_UINT8, index_uint8.index_type_uint8);
        available
    }

    /// Settle the enabled set against `available`.
    ///
    /// Every missing required feature is listed in one `FeatureUnavailable`.
    pub fn check_selected_features(&mut self, available: VulkanFeatureFlags) -> Result<VulkanFeatureFlags> {
        let missing = self.required - available;
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter_names().map(|(name, _)| name).collect();
            hal_error!("prism::vulkan::Features", "Required device features missing: {}", names.join(", "));
            return Err(Error::FeatureUnavailable(names.join(", ")));
        }
        self.enabled = (self.required | self.optional) & available;
        Ok(self.enabled)
    }

    /// HAL feature flags backed by enabled device features
    pub fn device_features(&self) -> DeviceFeatures {
        let mut features = DeviceFeatures::PUSH_CONSTANTS | DeviceFeatures::COMPUTE;
        let pairs = [
            (VulkanFeatureFlags::MULTIVIEW, DeviceFeatures::MULTIVIEW),
            (VulkanFeatureFlags::INDEX_TYPE_UINT8, DeviceFeatures::INDEX_UINT8),
            (VulkanFeatureFlags::DUAL_SRC_BLEND, DeviceFeatures::DUAL_SRC_BLEND),
            (VulkanFeatureFlags::FILL_MODE_NON_SOLID, DeviceFeatures::FILL_MODE_NON_SOLID),
            (VulkanFeatureFlags::SHADER_INT16, DeviceFeatures::SHADER_INT16),
            (VulkanFeatureFlags::DESCRIPTOR_INDEXING, DeviceFeatures::DESCRIPTOR_INDEXING),
            (VulkanFeatureFlags::STORAGE_BUFFER_16BIT_ACCESS, DeviceFeatures::STORAGE_BUFFER_16BIT),
            (VulkanFeatureFlags::BUFFER_DEVICE_ADDRESS, DeviceFeatures::BUFFER_DEVICE_ADDRESS),
            (VulkanFeatureFlags::MULTI_DRAW_INDIRECT, DeviceFeatures::MULTI_DRAW_INDIRECT),
            (VulkanFeatureFlags::DEPTH_BIAS_CLAMP, DeviceFeatures::DEPTH_BIAS_CLAMP),
            (VulkanFeatureFlags::SAMPLER_YCBCR_CONVERSION, DeviceFeatures::SAMPLER_YCBCR),
        ];
        for (flag, feature) in pairs {
            features.set(feature, self.enabled.contains(flag));
        }
        features
    }
}

/// Feature structs chained into `VkDeviceCreateInfo`
pub(crate) struct FeatureChain {
    core: vk::PhysicalDeviceFeatures,
    multiview: vk::PhysicalDeviceMultiviewFeatures<'static>,
    storage_16bit: vk::PhysicalDevice16BitStorageFeatures<'static>,
    ycbcr: vk::PhysicalDeviceSamplerYcbcrConversionFeatures<'static>,
    draw_parameters: vk::PhysicalDeviceShaderDrawParametersFeatures<'static>,
    indexing: vk::PhysicalDeviceDescriptorIndexingFeatures<'static>,
    device_address: vk::PhysicalDeviceBufferDeviceAddressFeatures<'static>,
    index_uint8: vk::PhysicalDeviceIndexTypeUint8FeaturesEXT<'static>,
    enabled: VulkanFeatureFlags,
}

impl FeatureChain {
    pub(crate) fn new(enabled: VulkanFeatureFlags) -> Self {
        let on = |flag| enabled.contains(flag);
        let indexing = on(VulkanFeatureFlags::DESCRIPTOR_INDEXING);
        Self {
            core: vk::PhysicalDeviceFeatures::default()
                .dual_src_blend(on(VulkanFeatureFlags::DUAL_SRC_BLEND))
                .multi_draw_indirect(on(VulkanFeatureFlags::MULTI_DRAW_INDIRECT))
                .draw_indirect_first_instance(on(VulkanFeatureFlags::DRAW_INDIRECT_FIRST_INSTANCE))
                .depth_bias_clamp(on(VulkanFeatureFlags::DEPTH_BIAS_CLAMP))
                .fill_mode_non_solid(on(VulkanFeatureFlags::FILL_MODE_NON_SOLID))
                .sampler_anisotropy(on(VulkanFeatureFlags::SAMPLER_ANISOTROPY))
                .shader_int16(on(VulkanFeatureFlags::SHADER_INT16)),
            multiview: vk::PhysicalDeviceMultiviewFeatures::default().multiview(on(VulkanFeatureFlags::MULTIVIEW)),
            storage_16bit: vk::PhysicalDevice16BitStorageFeatures::default()
                .storage_buffer16_bit_access(on(VulkanFeatureFlags::STORAGE_BUFFER_16BIT_ACCESS)),
            ycbcr: vk::PhysicalDeviceSamplerYcbcrConversionFeatures::default()
                .sampler_ycbcr_conversion(on(VulkanFeatureFlags::SAMPLER_YCBCR_CONVERSION)),
            draw_parameters: vk::PhysicalDeviceShaderDrawParametersFeatures::default()
                .shader_draw_parameters(on(VulkanFeatureFlags::SHADER_DRAW_PARAMETERS)),
            indexing: vk::PhysicalDeviceDescriptorIndexingFeatures::default()
                .runtime_descriptor_array(indexing)
                .descriptor_binding_partially_bound(indexing)
                .shader_sampled_image_array_non_uniform_indexing(indexing),
            device_address: vk::PhysicalDeviceBufferDeviceAddressFeatures::default()
                .buffer_device_address(on(VulkanFeatureFlags::BUFFER_DEVICE_ADDRESS)),
            index_uint8: vk::PhysicalDeviceIndexTypeUint8FeaturesEXT::default()
                .index_type_uint8(on(VulkanFeatureFlags::INDEX_TYPE_UINT8)),
            enabled,
        }
    }

    /// Link every struct into a `VkPhysicalDeviceFeatures2` head
    pub(crate) fn link(&mut self) -> vk::PhysicalDeviceFeatures2<'_> {
        let mut features2 = vk::PhysicalDeviceFeatures2::default()
            .features(self.core)
            .push_next(&mut self.multiview)
            .push_next(&mut self.storage_16bit)
            .push_next(&mut self.ycbcr)
            .push_next(&mut self.draw_parameters)
            .push_next(&mut self.indexing)
            .push_next(&mut self.device_address);
        if self.enabled.contains(VulkanFeatureFlags::INDEX_TYPE_UINT8) {
            features2 = features2.push_next(&mut self.index_uint8);
        }
        features2
    }
}

#[cfg(test)]
#[path = "vulkan_features_tests.rs"]
mod tests;
