/// Bind groups: sets of resources bound together and expanded into per-slot binds

use std::sync::Arc;
use crate::device::{Buffer, SamplerState, Texture};
use crate::state::{MAX_TEXTURE_SAMPLERS, MAX_UNIFORM_BLOCK_BINDINGS};

/// Texture/sampler pairs, one per texture slot
#[derive(Clone, Default)]
pub struct BindGroupTextureDesc {
    pub textures: Vec<Option<Arc<dyn Texture>>>,
    pub samplers: Vec<Option<Arc<dyn SamplerState>>>,
    pub debug_name: String,
}

impl BindGroupTextureDesc {
    /// Slots that carry a texture, with their sampler
    pub fn entries(&self) -> impl Iterator<Item = (u32, &Arc<dyn Texture>, Option<&Arc<dyn SamplerState>>)> {
        assert!(
            self.textures.len() <= MAX_TEXTURE_SAMPLERS,
            "Bind group has {} textures, max is {}",
            self.textures.len(),
            MAX_TEXTURE_SAMPLERS
        );
        self.textures.iter().enumerate().filter_map(move |(i, t)| {
            t.as_ref().map(|t| (i as u32, t, self.samplers.get(i).and_then(|s| s.as_ref())))
        })
    }
}

/// A buffer range bound to one slot
#[derive(Clone)]
pub struct BufferRange {
    pub buffer: Arc<dyn Buffer>,
    pub offset: u64,
    /// 0 = whole buffer from `offset`
    pub size: u64,
}

/// Buffers, one per uniform/storage slot
#[derive(Clone, Default)]
pub struct BindGroupBufferDesc {
    pub buffers: Vec<Option<BufferRange>>,
    /// Bit `i` set: slot `i` takes the next dynamic offset at bind time
    pub dynamic_buffer_mask: u32,
    pub debug_name: String,
}

impl BindGroupBufferDesc {
    /// Expand into `(slot, range)` pairs applying dynamic offsets in slot order.
    ///
    /// Panics when the number of dynamic offsets does not match the mask.
    pub fn resolve(&self, dynamic_offsets: &[u32]) -> Vec<(u32, BufferRange)> {
        assert!(
            self.buffers.len() <= MAX_UNIFORM_BLOCK_BINDINGS,
            "Bind group has {} buffers, max is {}",
            self.buffers.len(),
            MAX_UNIFORM_BLOCK_BINDINGS
        );
        let mut next_dynamic = 0;
        let mut resolved = Vec::new();
        for (i, range) in self.buffers.iter().enumerate() {
            let Some(range) = range else { continue };
            let mut range = range.clone();
            if self.dynamic_buffer_mask & (1 << i) != 0 {
                assert!(next_dynamic < dynamic_offsets.len(), "Not enough dynamic offsets provided");
                range.offset += u64::from(dynamic_offsets[next_dynamic]);
                next_dynamic += 1;
            }
            resolved.push((i as u32, range));
        }
        assert_eq!(next_dynamic, dynamic_offsets.len(), "Not all dynamic offsets were consumed");
        resolved
    }
}
