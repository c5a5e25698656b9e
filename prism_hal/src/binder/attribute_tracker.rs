/// Vertex attribute enable/disable tracking
///
/// Switching pipelines only touches the locations whose state actually
/// changes: locations the old pipeline used and the new one does not are
/// disabled, locations the new one needs that were not enabled are enabled.

use crate::state::BitIter;

/// Locations to disable and enable when moving to a new pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttributeTransition {
    pub disable: u64,
    pub enable: u64,
}

impl AttributeTransition {
    pub fn is_empty(&self) -> bool {
        self.disable == 0 && self.enable == 0
    }

    pub fn disabled(&self) -> BitIter {
        BitIter::new(self.disable)
    }

    pub fn enabled(&self) -> BitIter {
        BitIter::new(self.enable)
    }
}

/// Attribute locations currently enabled on the native context.
///
/// One tracker per encoder adapter; pipelines hold no enabled set.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexAttributeTracker {
    active: u64,
}

impl VertexAttributeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> u64 {
        self.active
    }

    /// Make `required` the active set; returns the minimal change
    pub fn transition_to(&mut self, required: u64) -> AttributeTransition {
        let transition = AttributeTransition {
            disable: self.active & !required,
            enable: required & !self.active,
        };
        self.active = required;
        transition
    }

    /// Forget the active set; returns the locations that were enabled
    pub fn reset(&mut self) -> u64 {
        std::mem::take(&mut self.active)
    }
}

#[cfg(test)]
#[path = "attribute_tracker_tests.rs"]
mod tests;
