/// Render pass and framebuffer descriptors

use std::any::Any;
use std::sync::Arc;
use crate::device::{Color, Dimensions, Texture};

/// What happens to an attachment's contents when a pass begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadAction {
    DontCare,
    Load,
    Clear,
}

/// What happens to an attachment's contents when a pass ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreAction {
    DontCare,
    Store,
    /// Resolve the multisampled attachment into its resolve target
    MsaaResolve,
}

/// Load/store behavior of one color attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorAttachmentDesc {
    pub load_action: LoadAction,
    pub store_action: StoreAction,
    pub clear_color: Color,
}

impl Default for ColorAttachmentDesc {
    fn default() -> Self {
        Self {
            load_action: LoadAction::Clear,
            store_action: StoreAction::Store,
            clear_color: Color::new(0.0, 0.0, 0.0, 1.0),
        }
    }
}

/// Load/store behavior of the depth aspect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthAttachmentDesc {
    pub load_action: LoadAction,
    pub store_action: StoreAction,
    pub clear_depth: f32,
}

impl Default for DepthAttachmentDesc {
    fn default() -> Self {
        Self { load_action: LoadAction::Clear, store_action: StoreAction::DontCare, clear_depth: 1.0 }
    }
}

/// Load/store behavior of the stencil aspect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilAttachmentDesc {
    pub load_action: LoadAction,
    pub store_action: StoreAction,
    pub clear_stencil: u32,
}

impl Default for StencilAttachmentDesc {
    fn default() -> Self {
        Self { load_action: LoadAction::DontCare, store_action: StoreAction::DontCare, clear_stencil: 0 }
    }
}

/// Desired state of every attachment for one pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPassDesc {
    pub color_attachments: Vec<ColorAttachmentDesc>,
    pub depth: DepthAttachmentDesc,
    pub stencil: StencilAttachmentDesc,
}

/// One framebuffer attachment with its optional MSAA resolve target
#[derive(Clone)]
pub struct FramebufferAttachment {
    pub texture: Arc<dyn Texture>,
    pub resolve: Option<Arc<dyn Texture>>,
}

impl FramebufferAttachment {
    pub fn new(texture: Arc<dyn Texture>) -> Self {
        Self { texture, resolve: None }
    }
}

/// Descriptor for creating a framebuffer
#[derive(Clone, Default)]
pub struct FramebufferDesc {
    pub color_attachments: Vec<FramebufferAttachment>,
    /// Depth (or combined depth-stencil) attachment
    pub depth_attachment: Option<FramebufferAttachment>,
    /// Multiview view mask; non-zero renders every set view in one pass
    pub view_mask: u32,
    pub debug_name: String,
}

/// Framebuffer trait
pub trait Framebuffer: Send + Sync {
    fn desc(&self) -> &FramebufferDesc;

    /// Size of the first attachment
    fn dimensions(&self) -> Dimensions {
        let desc = self.desc();
        desc.color_attachments
            .first()
            .or(desc.depth_attachment.as_ref())
            .map(|a| {
                let t = a.texture.desc();
                Dimensions::new(t.width, t.height, t.depth)
            })
            .unwrap_or(Dimensions::new(0, 0, 0))
    }

    fn as_any(&self) -> &dyn Any;
}
