/// VulkanContext - instance, device, queue and allocator shared by every Vulkan object
///
/// The context is created headless: no surface or swapchain. Every resource
/// holds an `Arc<VulkanContext>`, so the device outlives everything created
/// from it and is destroyed last.

use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc};
use gpu_allocator::MemoryLocation;
use std::ffi::{CStr, CString};
use std::mem::ManuallyDrop;
use std::sync::{Mutex, MutexGuard, PoisonError};
use prism_hal::{hal_debug, hal_err, hal_error, hal_info};
use prism_hal::prism::{negotiate_features, Error, FeatureRequest, Result};
use prism_hal::prism::device::DeviceFeatures;
use crate::vulkan_conversions::native_error;
use crate::vulkan_extensions::{ExtensionType, VulkanExtensions};
use crate::vulkan_features::{FeatureChain, VulkanFeatureFlags, VulkanFeatures};
use crate::vulkan_render_pass_builder::{RenderPassFactory, VulkanRenderPassBuilder};
use crate::vulkan_render_pass_cache::VulkanRenderPassCache;

#[cfg(feature = "vulkan-validation")]
use crate::debug::{ValidationConfig, ValidationSeverity};

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Vulkan context configuration
#[derive(Debug, Clone)]
pub struct VulkanContextConfig {
    /// Application name reported to the driver
    pub app_name: String,
    /// Enable the Khronos validation layer (only honored with the
    /// `vulkan-validation` feature)
    pub enable_validation: bool,
    /// Validation message filtering
    #[cfg(feature = "vulkan-validation")]
    pub validation: ValidationConfig,
    pub multiview: FeatureRequest,
    pub push_descriptors: FeatureRequest,
    pub shader_int16: FeatureRequest,
    pub dual_src_blend: FeatureRequest,
    pub descriptor_indexing: FeatureRequest,
    pub storage_buffer_16bit_access: FeatureRequest,
    pub buffer_device_address: FeatureRequest,
    /// Enable `VK_EXT_headless_surface` when present
    pub headless: bool,
}

impl Default for VulkanContextConfig {
    fn default() -> Self {
        Self {
            app_name: "Prism Application".to_string(),
            enable_validation: cfg!(debug_assertions),
            #[cfg(feature = "vulkan-validation")]
            validation: ValidationConfig::default(),
            multiview: FeatureRequest::IfAvailable,
            push_descriptors: FeatureRequest::IfAvailable,
            shader_int16: FeatureRequest::IfAvailable,
            dual_src_blend: FeatureRequest::IfAvailable,
            descriptor_indexing: FeatureRequest::Disabled,
            storage_buffer_16bit_access: FeatureRequest::Disabled,
            buffer_device_address: FeatureRequest::Disabled,
            headless: true,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared Vulkan state
pub struct VulkanContext {
    _entry: ash::Entry,
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,
    device_name: String,
    limits: vk::PhysicalDeviceLimits,
    pub(crate) device: ash::Device,
    allocator: ManuallyDrop<Mutex<Allocator>>,
    graphics_queue: Mutex<vk::Queue>,
    pub(crate) graphics_queue_family: u32,
    /// Pool for one-shot uploads and layout transitions
    upload_command_pool: Mutex<vk::CommandPool>,
    extensions: VulkanExtensions,
    vulkan_features: VulkanFeatures,
    features: DeviceFeatures,
    render_pass_cache: VulkanRenderPassCache,
    debug_utils_instance: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    pub(crate) debug_utils: Option<ash::ext::debug_utils::Device>,
    pub(crate) push_descriptor: Option<ash::khr::push_descriptor::Device>,
}

impl VulkanContext {
    /// Create instance, device and allocator.
    ///
    /// Fails with `FeatureUnavailable` when a feature requested as required
    /// is missing, `InitializationFailed` when no usable device exists.
    pub fn new(config: &VulkanContextConfig) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| {
                hal_error!("prism::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            let mut extensions = VulkanExtensions::new();
            extensions.enumerate_instance_extensions(&entry)?;
            extensions.enable_common_instance_extensions(config);

            let validate = Self::validation_layer_available(&entry, config);
            let layer_names = if validate { vec![VALIDATION_LAYER.as_ptr()] } else { vec![] };

            let app_name = CString::new(config.app_name.as_str())
                .map_err(|_| Error::InitializationFailed("Application name contains a NUL byte".to_string()))?;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Prism")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_2);

            let instance_extension_names = extensions.enabled(ExtensionType::Instance);
            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&instance_extension_names);

            let instance = entry.create_instance(&create_info, None).map_err(|e| {
                hal_error!("prism::vulkan", "Failed to create Vulkan instance: {:?}", e);
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

            let debug_utils_enabled = extensions.is_enabled(ash::ext::debug_utils::NAME, ExtensionType::Instance);
            let (debug_utils_instance, debug_messenger) = if debug_utils_enabled {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
                let messenger = if validate { Self::create_debug_messenger(&debug_utils, config)? } else { None };
                (Some(debug_utils), messenger)
            } else {
                (None, None)
            };

            let (physical_device, graphics_queue_family, properties) = Self::select_physical_device(&instance)?;
            let device_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "Unknown device".to_string());

            extensions.enumerate_device_extensions(&instance, physical_device)?;
            extensions.enable_common_device_extensions(config);

            // Feature negotiation
            let mut vulkan_features = VulkanFeatures::from_config(config);
            let available = VulkanFeatures::populate_with_available(
                &instance,
                physical_device,
                extensions.is_enabled(ash::ext::index_type_uint8::NAME, ExtensionType::Device),
            );
            let enabled = vulkan_features.check_selected_features(available)?;

            let push_descriptors_available =
                extensions.is_enabled(ash::khr::push_descriptor::NAME, ExtensionType::Device);
            let push_descriptors = negotiate_features(&[(
                "VK_KHR_push_descriptor",
                config.push_descriptors,
                push_descriptors_available,
            )])?[0];

            // Logical device
            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_queue_family)
                .queue_priorities(&queue_priorities)];

            let device_extension_names = extensions.enabled(ExtensionType::Device);
            let mut chain = FeatureChain::new(enabled);
            let mut features2 = chain.link();
            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .push_next(&mut features2);

            let device = instance.create_device(physical_device, &device_create_info, None).map_err(|e| {
                hal_error!("prism::vulkan", "Failed to create logical device: {:?}", e);
                Error::InitializationFailed(format!("Failed to create device: {:?}", e))
            })?;

            let graphics_queue = device.get_device_queue(graphics_queue_family, 0);

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: enabled.contains(VulkanFeatureFlags::BUFFER_DEVICE_ADDRESS),
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                hal_error!("prism::vulkan", "Failed to create GPU allocator: {:?}", e);
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;

            let upload_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let upload_command_pool = device.create_command_pool(&upload_pool_create_info, None).map_err(|e| {
                hal_error!("prism::vulkan", "Failed to create upload command pool: {:?}", e);
                Error::InitializationFailed(format!("Failed to create upload command pool: {:?}", e))
            })?;

            let debug_utils = debug_utils_enabled.then(|| ash::ext::debug_utils::Device::new(&instance, &device));
            let push_descriptor =
                push_descriptors.then(|| ash::khr::push_descriptor::Device::new(&instance, &device));

            let mut features = vulkan_features.device_features();
            features.set(DeviceFeatures::PUSH_DESCRIPTORS, push_descriptor.is_some());
            features.set(DeviceFeatures::DEBUG_LABELS, debug_utils.is_some());

            hal_info!(
                "prism::vulkan",
                "Vulkan device '{}' ready (queue family {}, features {:?})",
                device_name,
                graphics_queue_family,
                features
            );

            Ok(Self {
                _entry: entry,
                instance,
                physical_device,
                device_name,
                limits: properties.limits,
                device,
                allocator: ManuallyDrop::new(Mutex::new(allocator)),
                graphics_queue: Mutex::new(graphics_queue),
                graphics_queue_family,
                upload_command_pool: Mutex::new(upload_command_pool),
                extensions,
                vulkan_features,
                features,
                render_pass_cache: VulkanRenderPassCache::new(),
                debug_utils_instance,
                debug_messenger,
                debug_utils,
                push_descriptor,
            })
        }
    }

    #[cfg(feature = "vulkan-validation")]
    fn validation_layer_available(entry: &ash::Entry, config: &VulkanContextConfig) -> bool {
        if !config.enable_validation {
            return false;
        }
        let layers = unsafe { entry.enumerate_instance_layer_properties() }.unwrap_or_default();
        let found = layers
            .iter()
            .any(|layer| layer.layer_name_as_c_str().is_ok_and(|name| name == VALIDATION_LAYER));
        if !found {
            prism_hal::hal_warn!("prism::vulkan", "Validation requested but {:?} is not installed", VALIDATION_LAYER);
        }
        found
    }

    #[cfg(not(feature = "vulkan-validation"))]
    fn validation_layer_available(_entry: &ash::Entry, _config: &VulkanContextConfig) -> bool {
        false
    }

    #[cfg(feature = "vulkan-validation")]
    unsafe fn create_debug_messenger(
        debug_utils: &ash::ext::debug_utils::Instance,
        config: &VulkanContextConfig,
    ) -> Result<Option<vk::DebugUtilsMessengerEXT>> {
        crate::debug::init_validation(config.validation);

        let severity_flags = match config.validation.severity {
            ValidationSeverity::ErrorsOnly => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            ValidationSeverity::ErrorsAndWarnings => {
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
            }
            ValidationSeverity::All => {
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                    | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
            }
        };

        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(severity_flags)
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

        let messenger = debug_utils.create_debug_utils_messenger(&debug_info, None).map_err(|e| {
            hal_error!("prism::vulkan", "Failed to create debug messenger: {:?}", e);
            Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
        })?;
        Ok(Some(messenger))
    }

    #[cfg(not(feature = "vulkan-validation"))]
    unsafe fn create_debug_messenger(
        _debug_utils: &ash::ext::debug_utils::Instance,
        _config: &VulkanContextConfig,
    ) -> Result<Option<vk::DebugUtilsMessengerEXT>> {
        Ok(None)
    }

    /// First device with a graphics queue and API 1.2, discrete GPUs first
    unsafe fn select_physical_device(
        instance: &ash::Instance,
    ) -> Result<(vk::PhysicalDevice, u32, vk::PhysicalDeviceProperties)> {
        let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
            hal_error!("prism::vulkan", "Failed to enumerate physical devices: {:?}", e);
            Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
        })?;

        let mut candidates: Vec<_> = physical_devices
            .into_iter()
            .filter_map(|physical_device| {
                let properties = instance.get_physical_device_properties(physical_device);
                if properties.api_version < vk::API_VERSION_1_2 {
                    hal_debug!("prism::vulkan", "Skipping device with API version {:#x}", properties.api_version);
                    return None;
                }
                let family = instance
                    .get_physical_device_queue_family_properties(physical_device)
                    .iter()
                    .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE))?;
                Some((physical_device, family as u32, properties))
            })
            .collect();

        candidates.sort_by_key(|(_, _, properties)| properties.device_type != vk::PhysicalDeviceType::DISCRETE_GPU);
        candidates.into_iter().next().ok_or_else(|| {
            hal_error!("prism::vulkan", "No Vulkan 1.2 GPU with a graphics queue found");
            Error::InitializationFailed("No Vulkan 1.2 GPU with a graphics queue found".to_string())
        })
    }

    // ===== ACCESSORS =====

    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn limits(&self) -> &vk::PhysicalDeviceLimits {
        &self.limits
    }

    pub fn extensions(&self) -> &VulkanExtensions {
        &self.extensions
    }

    pub fn vulkan_features(&self) -> &VulkanFeatures {
        &self.vulkan_features
    }

    /// HAL features negotiated at creation
    pub fn features(&self) -> DeviceFeatures {
        self.features
    }

    pub fn has_feature(&self, feature: DeviceFeatures) -> bool {
        self.features.contains(feature)
    }

    pub fn render_pass_cache(&self) -> &VulkanRenderPassCache {
        &self.render_pass_cache
    }

    // ===== HELPERS =====

    /// Cached render pass for `builder`, created on first use
    pub fn find_render_pass(&self, builder: &VulkanRenderPassBuilder, debug_name: Option<&str>) -> Result<vk::RenderPass> {
        self.render_pass_cache
            .find_or_create(builder, self, debug_name)
            .map_err(|e| native_error("render pass", e))
    }

    /// Attach a debug name to a Vulkan object (no-op without `VK_EXT_debug_utils`)
    pub fn set_debug_name<T: Handle>(&self, handle: T, name: &str) {
        let Some(debug_utils) = &self.debug_utils else { return };
        if name.is_empty() {
            return;
        }
        let Ok(cname) = CString::new(name) else { return };
        let info = vk::DebugUtilsObjectNameInfoEXT::default().object_handle(handle).object_name(&cname);
        if let Err(e) = unsafe { debug_utils.set_debug_utils_object_name(&info) } {
            hal_debug!("prism::vulkan", "Failed to name object '{}': {:?}", name, e);
        }
    }

    /// Allocate device memory for a buffer or image
    pub(crate) fn allocate(
        &self,
        name: &str,
        requirements: vk::MemoryRequirements,
        location: MemoryLocation,
        linear: bool,
    ) -> Result<Allocation> {
        lock(&*self.allocator)
            .allocate(&AllocationCreateDesc {
                name,
                requirements,
                location,
                linear,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                hal_error!("prism::vulkan", "Failed to allocate memory for '{}': {:?}", name, e);
                match e {
                    gpu_allocator::AllocationError::OutOfMemory => Error::OutOfMemory,
                    other => Error::BackendError(format!("Failed to allocate memory: {:?}", other)),
                }
            })
    }

    pub(crate) fn free(&self, allocation: Allocation) {
        if let Err(e) = lock(&*self.allocator).free(allocation) {
            hal_error!("prism::vulkan", "Failed to free allocation: {:?}", e);
        }
    }

    /// Record commands into a one-shot command buffer, submit and wait
    pub(crate) fn submit_immediate<F: FnOnce(vk::CommandBuffer)>(&self, record: F) -> Result<()> {
        let pool = lock(&self.upload_command_pool);
        unsafe {
            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(*pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = self
                .device
                .allocate_command_buffers(&alloc_info)
                .map_err(|e| hal_err!("prism::vulkan", "Failed to allocate upload command buffer: {:?}", e))?[0];

            let result = self.record_and_wait(command_buffer, record);
            self.device.free_command_buffers(*pool, &[command_buffer]);
            result
        }
    }

    unsafe fn record_and_wait<F: FnOnce(vk::CommandBuffer)>(&self, command_buffer: vk::CommandBuffer, record: F) -> Result<()> {
        let begin_info = vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        self.device
            .begin_command_buffer(command_buffer, &begin_info)
            .map_err(|e| hal_err!("prism::vulkan", "Failed to begin upload command buffer: {:?}", e))?;

        record(command_buffer);

        self.device
            .end_command_buffer(command_buffer)
            .map_err(|e| hal_err!("prism::vulkan", "Failed to end upload command buffer: {:?}", e))?;

        let fence = self
            .device
            .create_fence(&vk::FenceCreateInfo::default(), None)
            .map_err(|e| native_error("fence", e))?;

        let result = self
            .submit_and_wait(command_buffer, fence)
            .map_err(|e| hal_err!("prism::vulkan", "Failed to submit upload commands: {:?}", e));
        self.device.destroy_fence(fence, None);
        result
    }

    /// Submit one recorded command buffer on the graphics queue and block
    /// until `fence` signals. Queue access is serialized across threads.
    pub(crate) unsafe fn submit_and_wait(
        &self,
        command_buffer: vk::CommandBuffer,
        fence: vk::Fence,
    ) -> ash::prelude::VkResult<()> {
        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
        {
            let queue = lock(&self.graphics_queue);
            self.device.queue_submit(*queue, &[submit_info], fence)?;
        }
        self.device.wait_for_fences(&[fence], true, u64::MAX)
    }
}

impl RenderPassFactory for VulkanContext {
    fn create_render_pass(&self, create_info: &vk::RenderPassCreateInfo<'_>) -> ash::prelude::VkResult<vk::RenderPass> {
        unsafe { self.device.create_render_pass(create_info, None) }
    }

    fn set_render_pass_name(&self, render_pass: vk::RenderPass, name: &str) {
        self.set_debug_name(render_pass, name);
    }

    fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        unsafe { self.device.destroy_render_pass(render_pass, None) };
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            self.render_pass_cache.destroy_all(&*self);

            let pool = *lock(&self.upload_command_pool);
            self.device.destroy_command_pool(pool, None);

            // The allocator frees its memory blocks through the device
            ManuallyDrop::drop(&mut self.allocator);

            #[cfg(feature = "vulkan-validation")]
            crate::debug::shutdown_validation();

            if let (Some(debug_utils), Some(messenger)) = (&self.debug_utils_instance, self.debug_messenger) {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}
