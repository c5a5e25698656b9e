/// Per-encoder binding state tracking
///
/// Binds record values and mark slots dirty without touching the native
/// API; draws and dispatches flush the dirty slots through a backend sink.

mod slot_table;
mod bindings;
mod render_state;
mod compute_state;

pub use slot_table::{BitIter, SlotTable};
pub use bindings::{
    BufferBinding, DirtyFlags, EncoderState, IndexBufferBinding, PushConstants, SamplerBinding,
    TextureBinding, UniformTable,
};
pub use render_state::{RenderBindingSink, RenderBindingState};
pub use compute_state::{ComputeBindingSink, ComputeBindingState};

/// Texture/sampler slots per stage
pub const MAX_TEXTURE_SAMPLERS: usize = 16;
/// Uniform/storage buffer slots
pub const MAX_BUFFER_BINDINGS: usize = 32;
/// Uniform block binding points
pub const MAX_UNIFORM_BLOCK_BINDINGS: usize = 16;
/// Vertex attribute locations
pub const MAX_VERTEX_ATTRIBUTES: usize = 24;
/// Vertex buffer slots
pub const MAX_VERTEX_BUFFERS: usize = MAX_BUFFER_BINDINGS;
