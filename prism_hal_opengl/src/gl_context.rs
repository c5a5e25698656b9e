/// GlContext - shared OpenGL state for one native context
///
/// Wraps the function surface supplied by the platform glue, records the
/// negotiated features and keeps the pools of render and compute adapters
/// that encoders borrow and give back.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use prism_hal::{hal_debug, hal_info};
use prism_hal::prism::{negotiate_features, FeatureRequest, Result};
use prism_hal::prism::device::DeviceFeatures;
use crate::gl_commands::GlCommands;
use crate::gl_compute_adapter::ComputeCommandAdapter;
use crate::gl_render_adapter::RenderCommandAdapter;

/// What an encoder leaves bound on the context when it ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnbindPolicy {
    /// Only disable the vertex attributes the encoder enabled
    #[default]
    Default,
    /// Also unbind the program, buffers, textures and samplers, for hosts
    /// that share the context with other GL code
    EndEncoding,
}

/// OpenGL context configuration
#[derive(Debug, Clone)]
pub struct GlContextConfig {
    pub unbind_policy: UnbindPolicy,
    /// Allow wireframe fill mode (`glPolygonMode`, desktop GL only)
    pub enable_fill_mode: bool,
    pub compute: FeatureRequest,
    pub debug_labels: FeatureRequest,
    pub dual_src_blend: FeatureRequest,
}

impl Default for GlContextConfig {
    fn default() -> Self {
        Self {
            unbind_policy: UnbindPolicy::Default,
            enable_fill_mode: false,
            compute: FeatureRequest::IfAvailable,
            debug_labels: FeatureRequest::IfAvailable,
            dual_src_blend: FeatureRequest::IfAvailable,
        }
    }
}

/// Features every GL 3.3+/ES 3.0+ context has
const BASELINE_FEATURES: DeviceFeatures = DeviceFeatures::INDEX_UINT8.union(DeviceFeatures::BIND_UNIFORM);

/// Features taken as reported, with no request attached
const PASSTHROUGH_FEATURES: DeviceFeatures = DeviceFeatures::DEPTH_BIAS_CLAMP.union(DeviceFeatures::MULTI_DRAW_INDIRECT);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared OpenGL state
pub struct GlContext {
    gl: Arc<dyn GlCommands>,
    config: GlContextConfig,
    features: DeviceFeatures,
    render_adapters: Mutex<Vec<RenderCommandAdapter>>,
    compute_adapters: Mutex<Vec<ComputeCommandAdapter>>,
}

impl GlContext {
    /// Wrap a native context
    ///
    /// # Arguments
    ///
    /// * `gl` - Function surface bound to the context
    /// * `config` - Feature requests and unbind policy
    /// * `supported` - What the context supports, as detected by the glue
    ///   from its version and extension strings
    ///
    /// Fails with `Error::FeatureUnavailable` listing every required feature
    /// the context lacks.
    pub fn new(gl: Arc<dyn GlCommands>, config: &GlContextConfig, supported: DeviceFeatures) -> Result<Self> {
        let fill_mode = if config.enable_fill_mode { FeatureRequest::IfAvailable } else { FeatureRequest::Disabled };
        let requests = [
            ("compute", config.compute, DeviceFeatures::COMPUTE),
            ("debug_labels", config.debug_labels, DeviceFeatures::DEBUG_LABELS),
            ("dual_src_blend", config.dual_src_blend, DeviceFeatures::DUAL_SRC_BLEND),
            ("fill_mode_non_solid", fill_mode, DeviceFeatures::FILL_MODE_NON_SOLID),
        ];
        let negotiated = negotiate_features(
            &requests
                .iter()
                .map(|(name, request, flag)| (*name, *request, supported.contains(*flag)))
                .collect::<Vec<_>>(),
        )?;

        let mut features = BASELINE_FEATURES | (supported & PASSTHROUGH_FEATURES);
        for ((_, _, flag), enabled) in requests.iter().zip(negotiated) {
            if enabled {
                features |= *flag;
            }
        }

        let ignored = supported - features - PASSTHROUGH_FEATURES;
        if !ignored.is_empty() {
            hal_debug!("prism::opengl::Context", "Features not used by the OpenGL backend: {:?}", ignored);
        }
        hal_info!("prism::opengl::Context", "OpenGL context ready, features: {:?}", features);

        Ok(Self {
            gl,
            config: config.clone(),
            features,
            render_adapters: Mutex::new(Vec::new()),
            compute_adapters: Mutex::new(Vec::new()),
        })
    }

    pub fn gl(&self) -> &Arc<dyn GlCommands> {
        &self.gl
    }

    pub fn config(&self) -> &GlContextConfig {
        &self.config
    }

    pub fn features(&self) -> DeviceFeatures {
        self.features
    }

    pub fn has_feature(&self, feature: DeviceFeatures) -> bool {
        self.features.contains(feature)
    }

    // ===== ADAPTER POOLS =====

    pub(crate) fn acquire_render_adapter(&self) -> RenderCommandAdapter {
        lock(&self.render_adapters).pop().unwrap_or_else(|| {
            hal_debug!("prism::opengl::Context", "Creating render command adapter");
            RenderCommandAdapter::new(Arc::clone(&self.gl), self.features, self.config.unbind_policy)
        })
    }

    pub(crate) fn release_render_adapter(&self, adapter: RenderCommandAdapter) {
        lock(&self.render_adapters).push(adapter);
    }

    pub(crate) fn acquire_compute_adapter(&self) -> ComputeCommandAdapter {
        lock(&self.compute_adapters).pop().unwrap_or_else(|| {
            hal_debug!("prism::opengl::Context", "Creating compute command adapter");
            ComputeCommandAdapter::new(Arc::clone(&self.gl), self.config.unbind_policy)
        })
    }

    pub(crate) fn release_compute_adapter(&self, adapter: ComputeCommandAdapter) {
        lock(&self.compute_adapters).push(adapter);
    }

    /// Adapters waiting in the pools `(render, compute)`
    pub fn pooled_adapters(&self) -> (usize, usize) {
        (lock(&self.render_adapters).len(), lock(&self.compute_adapters).len())
    }
}
