/// Backend identification and device capability flags

use bitflags::bitflags;

/// The closed set of native APIs the HAL can sit on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendType {
    /// OpenGL / OpenGL ES
    OpenGl,
    /// Vulkan 1.1+
    Vulkan,
    /// Metal (declared for API parity, no native implementation in this workspace)
    Metal,
}

impl BackendType {
    /// Human-readable backend name
    pub fn name(self) -> &'static str {
        match self {
            BackendType::OpenGl => "OpenGL",
            BackendType::Vulkan => "Vulkan",
            BackendType::Metal => "Metal",
        }
    }
}

bitflags! {
    /// Optional capabilities negotiated at device creation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DeviceFeatures: u32 {
        /// Multiview rendering (view mask on render passes)
        const MULTIVIEW              = 1 << 0;
        /// Push descriptors (Vulkan resource binding without descriptor pools)
        const PUSH_DESCRIPTORS       = 1 << 1;
        /// Debug group / event labels in command streams
        const DEBUG_LABELS           = 1 << 2;
        /// 8-bit index buffers
        const INDEX_UINT8            = 1 << 3;
        /// Dual-source blending
        const DUAL_SRC_BLEND         = 1 << 4;
        /// Line and point polygon fill modes
        const FILL_MODE_NON_SOLID    = 1 << 5;
        /// 16-bit integers in shaders
        const SHADER_INT16           = 1 << 6;
        /// Descriptor indexing (bindless)
        const DESCRIPTOR_INDEXING    = 1 << 7;
        /// 16-bit storage buffer access
        const STORAGE_BUFFER_16BIT   = 1 << 8;
        /// Buffer device addresses
        const BUFFER_DEVICE_ADDRESS  = 1 << 9;
        /// Compute shaders and dispatch
        const COMPUTE                = 1 << 10;
        /// Multi-draw indirect
        const MULTI_DRAW_INDIRECT    = 1 << 11;
        /// Depth bias clamp
        const DEPTH_BIAS_CLAMP       = 1 << 12;
        /// YCbCr sampler conversion
        const SAMPLER_YCBCR          = 1 << 13;
        /// Loose (non-block) uniforms bound by location
        const BIND_UNIFORM           = 1 << 14;
        /// Push constants
        const PUSH_CONSTANTS         = 1 << 15;
    }
}

/// Capability queries every device exposes
pub trait FeatureQuery {
    /// Which native API this device drives
    fn backend_type(&self) -> BackendType;

    /// Features negotiated at creation
    fn features(&self) -> DeviceFeatures;

    /// Whether every flag in `feature` is enabled
    fn has_feature(&self, feature: DeviceFeatures) -> bool {
        self.features().contains(feature)
    }
}
