//! Integration tests for binding state tracking through the public API
//!
//! A recording backend stands in for the native API, so no GPU is required.
//!
//! Run with: cargo test --test binding_integration_tests

mod mock_backend;

use mock_backend::{NativeCall, NativeRecorder};
use prism_hal::prism::binder::{ReflectedTexture, ShaderReflection, INDEX_NOT_FOUND};
use prism_hal::prism::device::*;
use prism_hal::prism::state::*;
use std::sync::Arc;

fn shaders() -> (Arc<dyn ShaderModule>, Arc<dyn ShaderModule>) {
    (
        mock_backend::shader(ShaderStage::Vertex, ShaderReflection::default()),
        mock_backend::shader(ShaderStage::Fragment, ShaderReflection::default()),
    )
}

// ============================================================================
// REDUNDANT BIND ELIMINATION
// ============================================================================

#[test]
fn test_integration_same_texture_twice_issues_one_native_bind() {
    let (vs, fs) = shaders();
    let pipeline = mock_backend::pipeline(&vs, &fs, &[0]);
    let texture = mock_backend::texture();
    let mut state = RenderBindingState::new();
    let mut recorder = NativeRecorder::default();

    state.begin();
    state.bind_pipeline(&pipeline);
    state.bind_texture(0, BindTarget::FRAGMENT, Some(TextureBinding(Arc::clone(&texture))));
    state.bind_texture(0, BindTarget::FRAGMENT, Some(TextureBinding(Arc::clone(&texture))));
    state.flush(&mut recorder).unwrap();

    let texture_binds = recorder.calls.iter().filter(|c| matches!(c, NativeCall::BindTexture(_))).count();
    assert_eq!(texture_binds, 1);
}

#[test]
fn test_integration_second_draw_with_identical_state_issues_nothing() {
    let (vs, fs) = shaders();
    let pipeline = mock_backend::pipeline(&vs, &fs, &[0, 1]);
    let vertices = mock_backend::buffer(1024);
    let mut state = RenderBindingState::new();
    let mut recorder = NativeRecorder::default();

    state.begin();
    for _ in 0..2 {
        state.bind_pipeline(&pipeline);
        state.bind_viewport(Viewport::new(640.0, 480.0));
        state.bind_vertex_buffer(0, Some(BufferBinding { buffer: Arc::clone(&vertices), offset: 0, size: 0 }));
        state.flush(&mut recorder).unwrap();
    }

    let calls = recorder.take();
    assert_eq!(calls.iter().filter(|c| **c == NativeCall::UseProgram).count(), 1);
    assert_eq!(calls.iter().filter(|c| matches!(c, NativeCall::BindVertexBuffer(_))).count(), 1);
}

// ============================================================================
// VERTEX ATTRIBUTE TRANSITIONS
// ============================================================================

#[test]
fn test_integration_attribute_switch_a_b_a_is_minimal() {
    let vs_a = mock_backend::shader(ShaderStage::Vertex, ShaderReflection::default());
    let vs_b = mock_backend::shader(ShaderStage::Vertex, ShaderReflection::default());
    let fs = mock_backend::shader(ShaderStage::Fragment, ShaderReflection::default());
    let a = mock_backend::pipeline(&vs_a, &fs, &[0, 1, 2]);
    let b = mock_backend::pipeline(&vs_b, &fs, &[0, 1, 3]);
    let mut state = RenderBindingState::new();
    let mut recorder = NativeRecorder::default();
    state.begin();

    state.bind_pipeline(&a);
    state.flush(&mut recorder).unwrap();
    assert_eq!(
        recorder.take(),
        vec![NativeCall::UseProgram, NativeCall::EnableAttribute(0), NativeCall::EnableAttribute(1), NativeCall::EnableAttribute(2)]
    );

    state.bind_pipeline(&b);
    state.flush(&mut recorder).unwrap();
    assert_eq!(recorder.take(), vec![NativeCall::UseProgram, NativeCall::DisableAttribute(2), NativeCall::EnableAttribute(3)]);

    state.bind_pipeline(&a);
    state.flush(&mut recorder).unwrap();
    assert_eq!(recorder.take(), vec![NativeCall::UseProgram, NativeCall::DisableAttribute(3), NativeCall::EnableAttribute(2)]);
}

// ============================================================================
// TEXTURE UNIT REMAPPING
// ============================================================================

#[test]
fn test_integration_vertex_texture_lands_after_fragment_units() {
    let vs = mock_backend::shader(
        ShaderStage::Vertex,
        ShaderReflection {
            textures: vec![ReflectedTexture { name: "displacement".into(), unit: 0, sampler_location: 3 }],
            ..Default::default()
        },
    );
    let fs = mock_backend::shader(
        ShaderStage::Fragment,
        ShaderReflection {
            textures: vec![
                ReflectedTexture { name: "albedo".into(), unit: 0, sampler_location: 1 },
                ReflectedTexture { name: "roughness".into(), unit: 1, sampler_location: 2 },
            ],
            ..Default::default()
        },
    );
    let pipeline = mock_backend::pipeline(&vs, &fs, &[0]);
    assert_eq!(pipeline.index_by_name("displacement", ShaderStage::Vertex), 2);
    assert_eq!(pipeline.index_by_name("displacement", ShaderStage::Fragment), INDEX_NOT_FOUND);
    assert_eq!(pipeline.index_by_name("no_such_input", ShaderStage::Vertex), INDEX_NOT_FOUND);

    let mut state = RenderBindingState::new();
    let mut recorder = NativeRecorder::default();
    state.begin();
    state.bind_pipeline(&pipeline);
    state.bind_texture(0, BindTarget::VERTEX, Some(TextureBinding(mock_backend::texture())));
    state.flush(&mut recorder).unwrap();

    assert!(recorder.calls.contains(&NativeCall::BindTexture(2)));
}

// ============================================================================
// ENCODER LIFECYCLE
// ============================================================================

#[test]
#[should_panic(expected = "not encoding")]
fn test_integration_bind_after_end_panics() {
    let mut state = RenderBindingState::new();
    state.begin();
    state.end();
    state.bind_scissor(ScissorRect { x: 0, y: 0, width: 1, height: 1 });
}

#[test]
fn test_integration_flush_without_pipeline_is_an_error() {
    let mut state = RenderBindingState::new();
    let mut recorder = NativeRecorder::default();
    state.begin();
    assert!(state.flush(&mut recorder).is_err());
    assert!(recorder.calls.is_empty());
}
