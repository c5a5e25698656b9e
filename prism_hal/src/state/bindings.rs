/// Values stored in the binding tables
///
/// Resources compare by identity: two bindings are equal when they point at
/// the same object with the same range, never by content.

use std::sync::Arc;
use bitflags::bitflags;
use crate::device::{Buffer, IndexFormat, SamplerState, Texture, UniformDesc};

fn same_object<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Buffer range bound to a slot
#[derive(Clone)]
pub struct BufferBinding {
    pub buffer: Arc<dyn Buffer>,
    pub offset: u64,
    /// 0 = rest of the buffer
    pub size: u64,
}

impl PartialEq for BufferBinding {
    fn eq(&self, other: &Self) -> bool {
        same_object(&self.buffer, &other.buffer) && self.offset == other.offset && self.size == other.size
    }
}

impl std::fmt::Debug for BufferBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferBinding")
            .field("buffer", &Arc::as_ptr(&self.buffer))
            .field("offset", &self.offset)
            .field("size", &self.size)
            .finish()
    }
}

/// Index buffer binding
#[derive(Clone)]
pub struct IndexBufferBinding {
    pub buffer: Arc<dyn Buffer>,
    pub format: IndexFormat,
    pub offset: u64,
}

impl PartialEq for IndexBufferBinding {
    fn eq(&self, other: &Self) -> bool {
        same_object(&self.buffer, &other.buffer) && self.format == other.format && self.offset == other.offset
    }
}

/// Texture bound to a slot
#[derive(Clone)]
pub struct TextureBinding(pub Arc<dyn Texture>);

impl PartialEq for TextureBinding {
    fn eq(&self, other: &Self) -> bool {
        same_object(&self.0, &other.0)
    }
}

/// Sampler bound to a slot
#[derive(Clone)]
pub struct SamplerBinding(pub Arc<dyn SamplerState>);

impl PartialEq for SamplerBinding {
    fn eq(&self, other: &Self) -> bool {
        same_object(&self.0, &other.0)
    }
}

/// Encoder lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    /// Not recording; binds panic
    Idle,
    /// Between begin and end
    Encoding,
}

bitflags! {
    /// Per-category dirty bits for state that is not slot-indexed
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DirtyFlags: u16 {
        const PIPELINE       = 1 << 0;
        const VIEWPORT       = 1 << 1;
        const SCISSOR        = 1 << 2;
        const DEPTH_BIAS     = 1 << 3;
        const STENCIL_REF    = 1 << 4;
        const BLEND_COLOR    = 1 << 5;
        const INDEX_BUFFER   = 1 << 6;
        const PUSH_CONSTANTS = 1 << 7;
    }
}

#[derive(Debug, Clone)]
struct UniformEntry {
    desc: UniformDesc,
    data: Vec<u8>,
    dirty: bool,
}

/// Loose uniforms keyed by location
#[derive(Debug, Clone, Default)]
pub struct UniformTable {
    entries: Vec<UniformEntry>,
}

impl UniformTable {
    /// Record a uniform; returns whether anything changed
    pub fn set(&mut self, desc: UniformDesc, data: Vec<u8>) -> bool {
        match self.entries.iter_mut().find(|e| e.desc.location == desc.location) {
            Some(entry) if entry.desc == desc && entry.data == data => false,
            Some(entry) => {
                entry.desc = desc;
                entry.data = data;
                entry.dirty = true;
                true
            }
            None => {
                self.entries.push(UniformEntry { desc, data, dirty: true });
                true
            }
        }
    }

    pub fn has_dirty(&self) -> bool {
        self.entries.iter().any(|e| e.dirty)
    }

    pub fn mark_all_dirty(&mut self) {
        for entry in &mut self.entries {
            entry.dirty = true;
        }
    }

    /// Dirty uniforms in bind order
    pub fn dirty_entries(&self) -> impl Iterator<Item = (&UniformDesc, &[u8])> {
        self.entries.iter().filter(|e| e.dirty).map(|e| (&e.desc, e.data.as_slice()))
    }

    pub fn clear_dirty(&mut self) {
        for entry in &mut self.entries {
            entry.dirty = false;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Push constant bytes waiting to be issued
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PushConstants {
    pub offset: u32,
    pub data: Vec<u8>,
}
