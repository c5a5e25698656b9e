//! Feature request configuration shared by all backends
//!
//! Optional device capabilities are requested with a [`FeatureRequest`]. The
//! negotiation rule is the same everywhere: a feature requested "if available"
//! is silently dropped when the device lacks it, a "required" one turns into
//! `Error::FeatureUnavailable`.

use crate::error::{Error, Result};

/// How badly a caller wants an optional feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeatureRequest {
    /// Never enable the feature
    Disabled,
    /// Enable the feature when the device supports it
    #[default]
    IfAvailable,
    /// Fail device creation when the feature is missing
    Required,
}

/// Outcome of negotiating one feature against device support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureState {
    /// Requested and supported
    Enabled,
    /// Not requested, or optional and unsupported
    Disabled,
    /// Required but unsupported
    Missing,
}

impl FeatureRequest {
    /// Whether the caller asked for the feature at all
    pub fn is_requested(self) -> bool {
        self != FeatureRequest::Disabled
    }

    /// Negotiate this request against device support
    pub fn negotiate(self, available: bool) -> FeatureState {
        match (self, available) {
            (FeatureRequest::Disabled, _) => FeatureState::Disabled,
            (_, true) => FeatureState::Enabled,
            (FeatureRequest::IfAvailable, false) => FeatureState::Disabled,
            (FeatureRequest::Required, false) => FeatureState::Missing,
        }
    }
}

impl From<bool> for FeatureRequest {
    fn from(required: bool) -> Self {
        if required {
            FeatureRequest::Required
        } else {
            FeatureRequest::Disabled
        }
    }
}

/// Negotiate a list of named features in one go.
///
/// Returns the enabled flag for each entry in order, or one
/// `Error::FeatureUnavailable` naming every missing required feature.
pub fn negotiate_features(requests: &[(&str, FeatureRequest, bool)]) -> Result<Vec<bool>> {
    let mut enabled = Vec::with_capacity(requests.len());
    let mut missing = Vec::new();

    for &(name, request, available) in requests {
        match request.negotiate(available) {
            FeatureState::Enabled => enabled.push(true),
            FeatureState::Disabled => enabled.push(false),
            FeatureState::Missing => {
                missing.push(name);
                enabled.push(false);
            }
        }
    }

    if missing.is_empty() {
        Ok(enabled)
    } else {
        Err(Error::FeatureUnavailable(missing.join(", ")))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
