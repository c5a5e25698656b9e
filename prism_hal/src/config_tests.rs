//! Unit tests for config.rs

use crate::config::{negotiate_features, FeatureRequest, FeatureState};
use crate::error::Error;

#[test]
fn test_default_request_is_if_available() {
    assert_eq!(FeatureRequest::default(), FeatureRequest::IfAvailable);
}

#[test]
fn test_negotiate_matrix() {
    assert_eq!(FeatureRequest::Disabled.negotiate(true), FeatureState::Disabled);
    assert_eq!(FeatureRequest::Disabled.negotiate(false), FeatureState::Disabled);
    assert_eq!(FeatureRequest::IfAvailable.negotiate(true), FeatureState::Enabled);
    assert_eq!(FeatureRequest::IfAvailable.negotiate(false), FeatureState::Disabled);
    assert_eq!(FeatureRequest::Required.negotiate(true), FeatureState::Enabled);
    assert_eq!(FeatureRequest::Required.negotiate(false), FeatureState::Missing);
}

#[test]
fn test_from_bool() {
    assert_eq!(FeatureRequest::from(true), FeatureRequest::Required);
    assert_eq!(FeatureRequest::from(false), FeatureRequest::Disabled);
    assert!(!FeatureRequest::from(false).is_requested());
}

#[test]
fn test_negotiate_features_downgrades_optional() {
    let enabled = negotiate_features(&[
        ("multiview", FeatureRequest::IfAvailable, false),
        ("shaderInt16", FeatureRequest::Required, true),
        ("dualSrcBlend", FeatureRequest::Disabled, true),
    ])
    .unwrap();
    assert_eq!(enabled, vec![false, true, false]);
}

#[test]
fn test_negotiate_features_lists_every_missing_required() {
    let err = negotiate_features(&[
        ("multiview", FeatureRequest::Required, false),
        ("shaderInt16", FeatureRequest::Required, true),
        ("fillModeNonSolid", FeatureRequest::Required, false),
    ])
    .unwrap_err();
    assert_eq!(err, Error::FeatureUnavailable("multiview, fillModeNonSolid".to_string()));
}
