/// Change detection for fixed-function state applied per pipeline
///
/// Backends that set cull/winding/fill/blend with individual native calls
/// keep one of these per encoder and only issue what differs from the last
/// applied pipeline.

use crate::device::{ColorBlendState, CullMode, FrontFace, PolygonMode, RasterizationState};

/// Fields of the rasterization state that changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RasterChanges {
    pub cull_mode: Option<CullMode>,
    pub front_face: Option<FrontFace>,
    pub polygon_mode: Option<PolygonMode>,
}

impl RasterChanges {
    pub fn is_empty(&self) -> bool {
        self.cull_mode.is_none() && self.front_face.is_none() && self.polygon_mode.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RasterBinder {
    raster: Option<RasterizationState>,
    blend: Option<ColorBlendState>,
}

impl RasterBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `next` as applied; returns the fields the backend must set
    pub fn update_raster(&mut self, next: RasterizationState) -> RasterChanges {
        let changes = match self.raster {
            None => RasterChanges {
                cull_mode: Some(next.cull_mode),
                front_face: Some(next.front_face),
                polygon_mode: Some(next.polygon_mode),
            },
            Some(prev) => RasterChanges {
                cull_mode: (prev.cull_mode != next.cull_mode).then_some(next.cull_mode),
                front_face: (prev.front_face != next.front_face).then_some(next.front_face),
                polygon_mode: (prev.polygon_mode != next.polygon_mode).then_some(next.polygon_mode),
            },
        };
        self.raster = Some(next);
        changes
    }

    /// Record `next` as applied; returns it when it differs from the previous blend mode
    pub fn update_blend(&mut self, next: ColorBlendState) -> Option<ColorBlendState> {
        if self.blend == Some(next) {
            return None;
        }
        self.blend = Some(next);
        Some(next)
    }

    /// Forget what was applied (the native state may have been changed externally)
    pub fn invalidate(&mut self) {
        self.raster = None;
        self.blend = None;
    }
}

#[cfg(test)]
#[path = "raster_binder_tests.rs"]
mod tests;
