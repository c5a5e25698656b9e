/*!
# Prism HAL

Core traits and types of the Prism graphics hardware abstraction layer.

One device/command/resource API over Vulkan and OpenGL backends. Client code
binds pipelines, buffers and textures on command encoders and never talks to
the native API directly.

## Architecture

- **device**: backend identification, resource traits, pipeline descriptors and
  the encoder / command buffer / device traits every backend implements
- **state**: per-encoder binding state with dirty tracking; binds are recorded
  and flushed in a fixed order right before each draw or dispatch
- **binder**: shader reflection resolved once per pipeline, vertex attribute
  set-difference tracking and fixed-function change detection
- **config**: optional feature negotiation (`FeatureRequest`)

Backends live in their own crates (`prism_hal_vulkan`, `prism_hal_opengl`).
*/

// Internal modules
mod error;
mod hal;
pub mod log;
pub mod config;
pub mod device;
pub mod state;
pub mod binder;

#[cfg(test)]
pub(crate) mod mock_device;

// Main prism namespace module
pub mod prism {
    // Error types
    pub use crate::error::{Error, Result};

    // Logger sink
    pub use crate::hal::Hal;

    // Feature negotiation
    pub use crate::config::{negotiate_features, FeatureRequest, FeatureState};

    // Logging sub-module (types only; hal_* macros are exported at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Device sub-module with every API type
    pub mod device {
        pub use crate::device::*;
    }

    // Binding state tracking
    pub mod state {
        pub use crate::state::*;
    }

    // Pipeline binder
    pub mod binder {
        pub use crate::binder::*;
    }
}

// Re-export math library at crate root
pub use glam;
