//! Error types for the Prism HAL
//!
//! This module defines the error type shared by every backend. Configuration
//! mistakes (wrong attachment order, out-of-range slots) are not errors: they
//! panic at the violating call. Everything that can legitimately fail at
//! runtime (native object creation, missing features) is reported here.

use std::fmt;

/// Result type for Prism HAL operations
pub type Result<T> = std::result::Result<T, Error>;

/// Prism HAL errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (Vulkan, OpenGL, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, buffer, shader, pipeline, etc.)
    InvalidResource(String),

    /// Initialization failed (instance, device, context)
    InitializationFailed(String),

    /// A feature requested as required is not supported by the device
    FeatureUnavailable(String),

    /// A native object could not be created; `code` is the raw native result
    NativeCreationFailed {
        /// Kind of object that failed (e.g. "render pass")
        object: &'static str,
        /// Raw native result code (e.g. `VkResult`)
        code: i32,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::FeatureUnavailable(msg) => write!(f, "Feature unavailable: {}", msg),
            Error::NativeCreationFailed { object, code } => {
                write!(f, "Failed to create native {} (result code {})", object, code)
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
