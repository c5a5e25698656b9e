/// Shadow of the resources bound to descriptor set 0
///
/// Encoders record buffer, image and sampler binds here during a flush and
/// turn the table into one `vkCmdPushDescriptorSetKHR` batch at the end of
/// the flush. The whole set the pipeline declares is pushed every time, so
/// nothing depends on what an earlier push left behind.

use ash::vk;
use prism_hal::hal_debug;
use prism_hal::prism::binder::{DescriptorBinding, DescriptorKind};
use prism_hal::prism::state::{MAX_BUFFER_BINDINGS, MAX_TEXTURE_SAMPLERS};
use crate::vulkan_conversions::descriptor_kind_to_vk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BoundImage {
    pub(crate) view: vk::ImageView,
    pub(crate) layout: vk::ImageLayout,
}

pub(crate) struct PushDescriptorTable {
    buffers: [Option<vk::DescriptorBufferInfo>; MAX_BUFFER_BINDINGS],
    images: [Option<BoundImage>; MAX_TEXTURE_SAMPLERS],
    samplers: [Option<vk::Sampler>; MAX_TEXTURE_SAMPLERS],
    dirty: bool,
}

impl PushDescriptorTable {
    pub(crate) fn new() -> Self {
        Self {
            buffers: [None; MAX_BUFFER_BINDINGS],
            images: [None; MAX_TEXTURE_SAMPLERS],
            samplers: [None; MAX_TEXTURE_SAMPLERS],
            dirty: false,
        }
    }

    pub(crate) fn set_buffer(&mut self, binding: u32, info: Option<vk::DescriptorBufferInfo>) {
        self.buffers[binding as usize] = info;
        self.dirty = true;
    }

    pub(crate) fn set_image(&mut self, binding: u32, image: Option<BoundImage>) {
        self.images[binding as usize] = image;
        self.dirty = true;
    }

    pub(crate) fn set_sampler(&mut self, binding: u32, sampler: Option<vk::Sampler>) {
        self.samplers[binding as usize] = sampler;
        self.dirty = true;
    }

    /// Force the next batch (after a pipeline switch)
    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Everything `bindings` declares that has a resource bound.
    ///
    /// Returns `None` when nothing changed since the last batch. Images
    /// without a sampler use `default_sampler`.
    pub(crate) fn take_batch(
        &mut self,
        bindings: &[DescriptorBinding],
        default_sampler: vk::Sampler,
    ) -> Option<PushDescriptorBatch> {
        if !self.is_dirty() {
            return None;
        }
        self.dirty = false;

        let mut batch = PushDescriptorBatch::default();
        for binding in bindings {
            let slot = binding.binding as usize;
            match binding.kind {
                DescriptorKind::UniformBuffer | DescriptorKind::StorageBuffer => {
                    match self.buffers.get(slot).copied().flatten() {
                        Some(info) => batch.buffers.push((binding.binding, descriptor_kind_to_vk(binding.kind), info)),
                        None => hal_debug!("prism::vulkan::PushDescriptors", "Binding {} has no buffer bound", slot),
                    }
                }
                DescriptorKind::CombinedImageSampler => match self.images.get(slot).copied().flatten() {
                    Some(image) => {
                        let sampler = self.samplers[slot].unwrap_or(default_sampler);
                        let info = vk::DescriptorImageInfo { sampler, image_view: image.view, image_layout: image.layout };
                        batch.images.push((binding.binding, info));
                    }
                    None => hal_debug!("prism::vulkan::PushDescriptors", "Binding {} has no texture bound", slot),
                },
            }
        }
        Some(batch)
    }
}

/// Descriptor infos of one push, in binding order per kind
#[derive(Default)]
pub(crate) struct PushDescriptorBatch {
    buffers: Vec<(u32, vk::DescriptorType, vk::DescriptorBufferInfo)>,
    images: Vec<(u32, vk::DescriptorImageInfo)>,
}

impl PushDescriptorBatch {
    pub(crate) fn is_empty(&self) -> bool {
        self.buffers.is_empty() && self.images.is_empty()
    }

    /// Writes borrowing this batch's infos
    pub(crate) fn writes(&self) -> Vec<vk::WriteDescriptorSet<'_>> {
        let buffer_writes = self.buffers.iter().map(|(binding, descriptor_type, info)| {
            vk::WriteDescriptorSet::default()
                .dst_binding(*binding)
                .descriptor_type(*descriptor_type)
                .buffer_info(std::slice::from_ref(info))
        });
        let image_writes = self.images.iter().map(|(binding, info)| {
            vk::WriteDescriptorSet::default()
                .dst_binding(*binding)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .image_info(std::slice::from_ref(info))
        });
        buffer_writes.chain(image_writes).collect()
    }
}

#[cfg(test)]
#[path = "vulkan_push_descriptors_tests.rs"]
mod tests;
