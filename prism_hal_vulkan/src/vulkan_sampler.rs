/// SamplerState - VkSampler implementing the SamplerState trait
///
/// Samplers are immutable and deduplicated per device: equal descriptors
/// share one `VkSampler` (see `VulkanSamplerCache`).

use ash::vk;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::sync::{Arc, Mutex, PoisonError};
use prism_hal::hal_debug;
use prism_hal::prism::Result;
use prism_hal::prism::device::{SamplerDesc, SamplerState};
use crate::vulkan_context::VulkanContext;
use crate::vulkan_conversions::{address_mode_to_vk, compare_op_to_vk, filter_to_vk, mip_filter_to_vk, native_error};
use crate::vulkan_features::VulkanFeatureFlags;

/// Vulkan sampler
pub struct VulkanSamplerState {
    ctx: Arc<VulkanContext>,
    desc: SamplerDesc,
    sampler: vk::Sampler,
}

impl VulkanSamplerState {
    pub fn new(ctx: &Arc<VulkanContext>, desc: &SamplerDesc) -> Result<Self> {
        let (mipmap_mode, max_lod) = mip_filter_to_vk(desc.mip_filter);

        let anisotropy_supported = ctx.vulkan_features().enabled().contains(VulkanFeatureFlags::SAMPLER_ANISOTROPY);
        let anisotropy = if desc.max_anisotropy > 1 && anisotropy_supported {
            Some(f32::from(desc.max_anisotropy).min(ctx.limits().max_sampler_anisotropy))
        } else {
            None
        };

        let mut info = vk::SamplerCreateInfo::default()
            .mag_filter(filter_to_vk(desc.mag_filter))
            .min_filter(filter_to_vk(desc.min_filter))
            .mipmap_mode(mipmap_mode)
            .address_mode_u(address_mode_to_vk(desc.address_u))
            .address_mode_v(address_mode_to_vk(desc.address_v))
            .address_mode_w(address_mode_to_vk(desc.address_w))
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(max_lod)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_BLACK)
            .unnormalized_coordinates(false);

        if let Some(max) = anisotropy {
            info = info.anisotropy_enable(true).max_anisotropy(max);
        }
        if let Some(compare) = desc.depth_compare {
            info = info.compare_enable(true).compare_op(compare_op_to_vk(compare));
        }

        let sampler = unsafe { ctx.device.create_sampler(&info, None) }.map_err(|e| native_error("sampler", e))?;
        Ok(Self { ctx: Arc::clone(ctx), desc: *desc, sampler })
    }

    pub fn vk_sampler(&self) -> vk::Sampler {
        self.sampler
    }
}

impl SamplerState for VulkanSamplerState {
    fn desc(&self) -> &SamplerDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanSamplerState {
    fn drop(&mut self) {
        unsafe { self.ctx.device.destroy_sampler(self.sampler, None) };
    }
}

/// Creates samplers on first use and hands out shared instances afterwards
pub(crate) struct VulkanSamplerCache {
    samplers: Mutex<FxHashMap<SamplerDesc, Arc<VulkanSamplerState>>>,
}

impl VulkanSamplerCache {
    pub(crate) fn new() -> Self {
        Self { samplers: Mutex::new(FxHashMap::default()) }
    }

    pub(crate) fn get(&self, ctx: &Arc<VulkanContext>, desc: &SamplerDesc) -> Result<Arc<VulkanSamplerState>> {
        let mut samplers = self.samplers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sampler) = samplers.get(desc) {
            return Ok(Arc::clone(sampler));
        }
        let sampler = Arc::new(VulkanSamplerState::new(ctx, desc)?);
        hal_debug!("prism::vulkan::SamplerCache", "Created sampler {:?} ({} cached)", desc, samplers.len() + 1);
        samplers.insert(*desc, Arc::clone(&sampler));
        Ok(sampler)
    }

    /// Drop every cached sampler (called before the device goes away)
    pub(crate) fn clear(&self) {
        self.samplers.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
