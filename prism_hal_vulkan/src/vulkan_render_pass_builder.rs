/// VulkanRenderPassBuilder - attachment descriptions and subpass references for one render pass
///
/// Two-phase protocol: add attachments, then hand the builder to the render
/// pass cache, which calls `build()` on a miss. Builders compare and hash by
/// value so identical attachment layouts share one native render pass.
///
/// Attachment indices follow the order of the add calls. The whole pass is a
/// single graphics subpass.

use ash::prelude::VkResult;
use ash::vk;

/// Native render pass creation, implemented by the device context
pub trait RenderPassFactory {
    fn create_render_pass(&self, create_info: &vk::RenderPassCreateInfo<'_>) -> VkResult<vk::RenderPass>;

    /// Tag a render pass for debuggers and validation messages
    fn set_render_pass_name(&self, render_pass: vk::RenderPass, name: &str);

    fn destroy_render_pass(&self, render_pass: vk::RenderPass);
}

/// One attachment of the render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentDescription {
    pub format: vk::Format,
    pub samples: vk::SampleCountFlags,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub stencil_load_op: vk::AttachmentLoadOp,
    pub stencil_store_op: vk::AttachmentStoreOp,
    pub initial_layout: vk::ImageLayout,
    pub final_layout: vk::ImageLayout,
}

impl AttachmentDescription {
    fn to_vk(self) -> vk::AttachmentDescription {
        vk::AttachmentDescription::default()
            .format(self.format)
            .samples(self.samples)
            .load_op(self.load_op)
            .store_op(self.store_op)
            .stencil_load_op(self.stencil_load_op)
            .stencil_store_op(self.stencil_store_op)
            .initial_layout(self.initial_layout)
            .final_layout(self.final_layout)
    }
}

/// Attachment index and the layout it has during the subpass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentReference {
    pub attachment: u32,
    pub layout: vk::ImageLayout,
}

impl AttachmentReference {
    fn to_vk(self) -> vk::AttachmentReference {
        vk::AttachmentReference { attachment: self.attachment, layout: self.layout }
    }
}

/// Accumulates attachments for one render pass
///
/// Equality and hashing cover every attachment, every reference and both
/// multiview masks, in insertion order: two builders that list the same
/// attachments in a different order are different render passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VulkanRenderPassBuilder {
    attachments: Vec<AttachmentDescription>,
    refs_color: Vec<AttachmentReference>,
    refs_color_resolve: Vec<AttachmentReference>,
    ref_depth: Option<AttachmentReference>,
    ref_depth_resolve: Option<AttachmentReference>,
    view_mask: u32,
    correlation_mask: u32,
}

impl VulkanRenderPassBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a color attachment
    ///
    /// # Panics
    ///
    /// If `format` is `UNDEFINED` or `samples` differs from the attachments
    /// already added.
    pub fn add_color(
        &mut self,
        format: vk::Format,
        load_op: vk::AttachmentLoadOp,
        store_op: vk::AttachmentStoreOp,
        initial_layout: vk::ImageLayout,
        final_layout: vk::ImageLayout,
        samples: vk::SampleCountFlags,
    ) -> &mut Self {
        assert!(format != vk::Format::UNDEFINED, "Color attachment format is UNDEFINED");
        self.check_sample_count(samples);

        let index = self.push_attachment(AttachmentDescription {
            format,
            samples,
            load_op,
            store_op,
            stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
            stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
            initial_layout,
            final_layout,
        });
        self.refs_color.push(AttachmentReference {
            attachment: index,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        });
        self
    }

    /// Add the single-sample resolve target of the next unresolved color attachment
    ///
    /// # Panics
    ///
    /// If `format` is `UNDEFINED`.
    pub fn add_color_resolve(
        &mut self,
        format: vk::Format,
        load_op: vk::AttachmentLoadOp,
        store_op: vk::AttachmentStoreOp,
        initial_layout: vk::ImageLayout,
        final_layout: vk::ImageLayout,
    ) -> &mut Self {
        assert!(format != vk::Format::UNDEFINED, "Color resolve attachment format is UNDEFINED");

        let index = self.push_attachment(AttachmentDescription {
            format,
            samples: vk::SampleCountFlags::TYPE_1,
            load_op,
            store_op,
            stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
            stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
            initial_layout,
            final_layout,
        });
        self.refs_color_resolve.push(AttachmentReference {
            attachment: index,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        });
        self
    }

    /// Add the depth-stencil attachment
    ///
    /// # Panics
    ///
    /// If `format` is `UNDEFINED`, a depth attachment was already added, or
    /// `samples` differs from the color attachments.
    #[allow(clippy::too_many_arguments)]
    pub fn add_depth_stencil(
        &mut self,
        format: vk::Format,
        load_op: vk::AttachmentLoadOp,
        store_op: vk::AttachmentStoreOp,
        stencil_load_op: vk::AttachmentLoadOp,
        stencil_store_op: vk::AttachmentStoreOp,
        initial_layout: vk::ImageLayout,
        final_layout: vk::ImageLayout,
        samples: vk::SampleCountFlags,
    ) -> &mut Self {
        assert!(format != vk::Format::UNDEFINED, "Depth-stencil attachment format is UNDEFINED");
        assert!(self.ref_depth.is_none(), "Render pass already has a depth-stencil attachment");
        self.check_sample_count(samples);

        let index = self.push_attachment(AttachmentDescription {
            format,
            samples,
            load_op,
            store_op,
            stencil_load_op,
            stencil_store_op,
            initial_layout,
            final_layout,
        });
        self.ref_depth = Some(AttachmentReference {
            attachment: index,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        });
        self
    }

    /// Add the single-sample resolve target of the depth-stencil attachment
    ///
    /// The attachment is part of the render pass (and of its identity) but a
    /// `VkSubpassDescription` has no slot for it; resolving depth needs
    /// `VK_KHR_depth_stencil_resolve` on the render pass 2 path.
    ///
    /// # Panics
    ///
    /// If `format` is `UNDEFINED` or a depth resolve attachment was already added.
    #[allow(clippy::too_many_arguments)]
    pub fn add_depth_stencil_resolve(
        &mut self,
        format: vk::Format,
        load_op: vk::AttachmentLoadOp,
        store_op: vk::AttachmentStoreOp,
        stencil_load_op: vk::AttachmentLoadOp,
        stencil_store_op: vk::AttachmentStoreOp,
        initial_layout: vk::ImageLayout,
        final_layout: vk::ImageLayout,
    ) -> &mut Self {
        assert!(format != vk::Format::UNDEFINED, "Depth-stencil resolve attachment format is UNDEFINED");
        assert!(
            self.ref_depth_resolve.is_none(),
            "Render pass already has a depth-stencil resolve attachment"
        );

        let index = self.push_attachment(AttachmentDescription {
            format,
            samples: vk::SampleCountFlags::TYPE_1,
            load_op,
            store_op,
            stencil_load_op,
            stencil_store_op,
            initial_layout,
            final_layout,
        });
        self.ref_depth_resolve = Some(AttachmentReference {
            attachment: index,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        });
        self
    }

    /// Render to every view in `view_mask` at once (0 disables multiview)
    pub fn set_multiview_masks(&mut self, view_mask: u32, correlation_mask: u32) -> &mut Self {
        self.view_mask = view_mask;
        self.correlation_mask = correlation_mask;
        self
    }

    /// Multiview with every rendered view also correlated
    pub fn set_view_mask(&mut self, view_mask: u32) -> &mut Self {
        self.set_multiview_masks(view_mask, view_mask)
    }

    // ===== ACCESSORS =====

    pub fn attachments(&self) -> &[AttachmentDescription] {
        &self.attachments
    }

    pub fn color_count(&self) -> usize {
        self.refs_color.len()
    }

    pub fn has_depth_stencil(&self) -> bool {
        self.ref_depth.is_some()
    }

    pub fn view_mask(&self) -> u32 {
        self.view_mask
    }

    pub fn correlation_mask(&self) -> u32 {
        self.correlation_mask
    }

    fn push_attachment(&mut self, description: AttachmentDescription) -> u32 {
        self.attachments.push(description);
        (self.attachments.len() - 1) as u32
    }

    /// Sample count shared by the non-resolve attachments added so far
    fn sample_count(&self) -> Option<vk::SampleCountFlags> {
        self.refs_color
            .first()
            .or(self.ref_depth.as_ref())
            .map(|r| self.attachments[r.attachment as usize].samples)
    }

    fn check_sample_count(&self, samples: vk::SampleCountFlags) {
        if let Some(existing) = self.sample_count() {
            assert_eq!(
                existing, samples,
                "Attachment sample count {:?} differs from the render pass sample count {:?}",
                samples, existing
            );
        }
    }

    // ===== BUILD =====

    /// Create the native render pass
    ///
    /// One graphics subpass over every attachment, one dependency making
    /// color writes visible to later fragment shader reads, and a multiview
    /// chain entry when the view mask is non-zero. Creation errors are
    /// returned unchanged.
    ///
    /// # Panics
    ///
    /// If resolve attachments were added but not one per color attachment.
    pub fn build<F: RenderPassFactory + ?Sized>(
        &self,
        factory: &F,
        debug_name: Option<&str>,
    ) -> VkResult<vk::RenderPass> {
        assert!(
            self.refs_color_resolve.is_empty() || self.refs_color_resolve.len() == self.refs_color.len(),
            "Render pass has {} color attachments but {} resolve attachments",
            self.refs_color.len(),
            self.refs_color_resolve.len()
        );

        let attachments: Vec<vk::AttachmentDescription> =
            self.attachments.iter().map(|a| a.to_vk()).collect();
        let refs_color: Vec<vk::AttachmentReference> = self.refs_color.iter().map(|r| r.to_vk()).collect();
        let refs_resolve: Vec<vk::AttachmentReference> =
            self.refs_color_resolve.iter().map(|r| r.to_vk()).collect();
        let ref_depth = self.ref_depth.map(AttachmentReference::to_vk);

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&refs_color);
        if !refs_resolve.is_empty() {
            subpass = subpass.resolve_attachments(&refs_resolve);
        }
        if let Some(depth) = ref_depth.as_ref() {
            subpass = subpass.depth_stencil_attachment(depth);
        }
        let subpasses = [subpass];

        let dependencies = [vk::SubpassDependency::default()
            .src_subpass(0)
            .dst_subpass(vk::SUBPASS_EXTERNAL)
            .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
            .dst_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
            .dst_access_mask(vk::AccessFlags::SHADER_READ)];

        let view_masks = [self.view_mask];
        let correlation_masks = [self.correlation_mask];
        let mut multiview = vk::RenderPassMultiviewCreateInfo::default()
            .view_masks(&view_masks)
            .correlation_masks(&correlation_masks);

        let mut create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);
        if self.view_mask != 0 {
            create_info = create_info.push_next(&mut multiview);
        }

        let render_pass = factory.create_render_pass(&create_info)?;
        if let Some(name) = debug_name {
            factory.set_render_pass_name(render_pass, name);
        }
        Ok(render_pass)
    }
}

#[cfg(test)]
#[path = "vulkan_render_pass_builder_tests.rs"]
mod tests;
