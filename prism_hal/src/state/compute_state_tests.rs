//! Unit tests for compute_state.rs

use std::sync::Arc;
use serial_test::serial;
use crate::device::*;
use crate::mock_device::{self, RecordingSink};
use crate::state::{BufferBinding, ComputeBindingState, TextureBinding};

fn encoding_with(pipeline: &Arc<dyn ComputePipelineState>) -> ComputeBindingState {
    let mut state = ComputeBindingState::new();
    state.begin();
    state.bind_pipeline(pipeline);
    state
}

fn flushed(state: &mut ComputeBindingState) -> RecordingSink {
    let mut sink = RecordingSink::default();
    state.flush(&mut sink).unwrap();
    sink
}

#[test]
fn test_flush_order() {
    let module = mock_device::module(ShaderStage::Compute);
    let pipeline = mock_device::compute_pipeline(&module);
    let mut state = encoding_with(&pipeline);

    state.bind_push_constants(0, &[0; 4]);
    state.bind_uniform(&UniformDesc::new(1, UniformType::Int), &[0; 4]);
    state.bind_texture(0, Some(TextureBinding(mock_device::texture())));
    state.bind_buffer(3, Some(BufferBinding { buffer: mock_device::buffer(64), offset: 0, size: 64 }));

    assert_eq!(
        flushed(&mut state).commands,
        vec![
            "bind_pipeline",
            "bind_buffer 3 true",
            "bind_texture 0 true",
            "bind_uniform 1 4",
            "bind_push_constants 0 4",
            "end_flush",
        ]
    );
}

#[test]
fn test_rebinding_same_buffer_is_noop() {
    let module = mock_device::module(ShaderStage::Compute);
    let pipeline = mock_device::compute_pipeline(&module);
    let mut state = encoding_with(&pipeline);
    let buffer = mock_device::buffer(32);

    state.bind_buffer(0, Some(BufferBinding { buffer: Arc::clone(&buffer), offset: 0, size: 0 }));
    flushed(&mut state);
    state.bind_buffer(0, Some(BufferBinding { buffer: Arc::clone(&buffer), offset: 0, size: 0 }));
    assert_eq!(flushed(&mut state).commands, vec!["end_flush"]);

    state.bind_buffer(0, Some(BufferBinding { buffer, offset: 16, size: 0 }));
    assert_eq!(flushed(&mut state).count("bind_buffer 0 true"), 1);
}

#[test]
fn test_program_switch_reissues_everything() {
    let first = mock_device::compute_pipeline(&mock_device::module(ShaderStage::Compute));
    let second = mock_device::compute_pipeline(&mock_device::module(ShaderStage::Compute));
    let mut state = encoding_with(&first);
    state.bind_buffer(0, Some(BufferBinding { buffer: mock_device::buffer(8), offset: 0, size: 0 }));
    state.bind_texture(1, Some(TextureBinding(mock_device::texture())));
    flushed(&mut state);

    state.bind_pipeline(&second);
    let sink = flushed(&mut state);
    assert_eq!(sink.count("bind_pipeline"), 1);
    assert_eq!(sink.count("bind_buffer 0 true"), 1);
    assert_eq!(sink.count("bind_texture 1 true"), 1);
}

#[test]
fn test_pipelines_sharing_a_module_keep_bindings() {
    let module = mock_device::module(ShaderStage::Compute);
    let first = mock_device::compute_pipeline(&module);
    let second = mock_device::compute_pipeline(&module);
    let mut state = encoding_with(&first);
    state.bind_buffer(0, Some(BufferBinding { buffer: mock_device::buffer(8), offset: 0, size: 0 }));
    flushed(&mut state);

    state.bind_pipeline(&second);
    assert_eq!(flushed(&mut state).commands, vec!["bind_pipeline", "end_flush"]);
}

#[test]
#[should_panic(expected = "not encoding")]
fn test_dispatch_state_after_end_panics() {
    let pipeline = mock_device::compute_pipeline(&mock_device::module(ShaderStage::Compute));
    let mut state = encoding_with(&pipeline);
    state.end();
    state.bind_texture(0, None);
}

#[test]
#[serial]
fn test_flush_without_pipeline_fails() {
    let mut state = ComputeBindingState::new();
    state.begin();
    let mut sink = RecordingSink::default();
    assert!(state.flush(&mut sink).is_err());
}
