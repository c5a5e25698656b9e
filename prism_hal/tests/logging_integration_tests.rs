//! Integration tests for the HAL logging sink
//!
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use prism_hal::prism::log::{LogEntry, LogSeverity, Logger};
use prism_hal::prism::device::*;
use prism_hal::prism::state::*;
use prism_hal::prism::{negotiate_features, Error, FeatureRequest, Hal, Result};
use serial_test::serial;
use std::sync::{Arc, Mutex};

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

struct NullSink;

impl RenderBindingSink for NullSink {
    fn bind_pipeline(&mut self, _: &Arc<dyn RenderPipelineState>) -> Result<()> {
        Ok(())
    }
    fn set_viewport(&mut self, _: &Viewport) -> Result<()> {
        Ok(())
    }
    fn set_scissor(&mut self, _: &ScissorRect) -> Result<()> {
        Ok(())
    }
    fn set_depth_bias(&mut self, _: &DepthBias) -> Result<()> {
        Ok(())
    }
    fn set_stencil_reference(&mut self, _: u32) -> Result<()> {
        Ok(())
    }
    fn set_blend_color(&mut self, _: &Color) -> Result<()> {
        Ok(())
    }
    fn bind_buffer(&mut self, _: u32, _: Option<&BufferBinding>) -> Result<()> {
        Ok(())
    }
    fn bind_vertex_buffer(&mut self, _: u32, _: Option<&BufferBinding>) -> Result<()> {
        Ok(())
    }
    fn bind_index_buffer(&mut self, _: &IndexBufferBinding) -> Result<()> {
        Ok(())
    }
    fn bind_texture(
        &mut self,
        _: ShaderStage,
        _: u32,
        _: Option<&TextureBinding>,
    ) -> Result<()> {
        Ok(())
    }
    fn bind_sampler(
        &mut self,
        _: ShaderStage,
        _: u32,
        _: Option<&SamplerBinding>,
    ) -> Result<()> {
        Ok(())
    }
    fn bind_uniform(&mut self, _: &UniformDesc, _: &[u8]) -> Result<()> {
        Ok(())
    }
    fn bind_push_constants(&mut self, _: &PushConstants) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger_sees_draw_without_pipeline() {
    let (logger, entries) = TestLogger::new();
    Hal::set_logger(logger);

    let mut state = RenderBindingState::new();
    state.begin();
    let result = state.flush(&mut NullSink);

    assert!(matches!(result, Err(Error::InvalidResource(_))));
    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert_eq!(entries[0].source, "prism::state::RenderBindingState");
    assert!(entries[0].line.is_some());
    drop(entries);

    Hal::reset_logger();
}

#[test]
#[serial]
fn test_integration_required_features_reported_together() {
    let result = negotiate_features(&[
        ("multiview", FeatureRequest::Required, false),
        ("push_descriptors", FeatureRequest::IfAvailable, false),
        ("debug_labels", FeatureRequest::Required, false),
    ]);
    assert_eq!(result, Err(Error::FeatureUnavailable("multiview, debug_labels".to_string())));

    let enabled = negotiate_features(&[
        ("multiview", FeatureRequest::IfAvailable, true),
        ("push_descriptors", FeatureRequest::IfAvailable, false),
        ("debug_labels", FeatureRequest::Disabled, true),
    ])
    .unwrap();
    assert_eq!(enabled, vec![true, false, false]);
}
