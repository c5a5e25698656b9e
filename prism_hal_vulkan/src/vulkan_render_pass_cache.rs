/// VulkanRenderPassCache - one native render pass per distinct attachment layout
///
/// Lookups and insertions are serialized by a mutex. Entries are created
/// lazily on first use and live until the owning context is torn down.

use ash::prelude::VkResult;
use ash::vk;
use rustc_hash::FxHashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use prism_hal::hal_debug;
use crate::vulkan_render_pass_builder::{RenderPassFactory, VulkanRenderPassBuilder};

#[derive(Default)]
pub struct VulkanRenderPassCache {
    render_passes: Mutex<FxHashMap<VulkanRenderPassBuilder, vk::RenderPass>>,
}

impl VulkanRenderPassCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<VulkanRenderPassBuilder, vk::RenderPass>> {
        // The map is never left half-updated, so a poisoned lock is still usable
        self.render_passes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the render pass for `builder`, building it on a miss.
    ///
    /// The lock is held across creation so two threads asking for the same
    /// layout never create it twice. Failures are not cached.
    pub fn find_or_create<F: RenderPassFactory + ?Sized>(
        &self,
        builder: &VulkanRenderPassBuilder,
        factory: &F,
        debug_name: Option<&str>,
    ) -> VkResult<vk::RenderPass> {
        let mut render_passes = self.lock();
        if let Some(render_pass) = render_passes.get(builder) {
            return Ok(*render_pass);
        }

        let render_pass = builder.build(factory, debug_name)?;
        hal_debug!(
            "prism::vulkan::RenderPassCache",
            "Created render pass #{} ({} attachments, view mask {:#b})",
            render_passes.len() + 1,
            builder.attachments().len(),
            builder.view_mask()
        );
        render_passes.insert(builder.clone(), render_pass);
        Ok(render_pass)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Destroy every cached render pass (device teardown)
    pub fn destroy_all<F: RenderPassFactory + ?Sized>(&self, factory: &F) {
        for (_, render_pass) in self.lock().drain() {
            factory.destroy_render_pass(render_pass);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_render_pass_cache_tests.rs"]
mod tests;
