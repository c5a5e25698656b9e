//! Unit tests for render_state.rs

use std::sync::Arc;
use serial_test::serial;
use crate::device::*;
use crate::mock_device::{self, RecordingSink};
use crate::state::{BufferBinding, EncoderState, IndexBufferBinding, RenderBindingState, SamplerBinding, TextureBinding};

// ============================================================================
// TEST HELPERS
// ============================================================================

struct Fixture {
    vertex: Arc<dyn ShaderModule>,
    fragment: Arc<dyn ShaderModule>,
    pipeline: Arc<dyn RenderPipelineState>,
}

fn fixture() -> Fixture {
    let vertex = mock_device::module(ShaderStage::Vertex);
    let fragment = mock_device::module(ShaderStage::Fragment);
    let pipeline = mock_device::render_pipeline(&vertex, &fragment, mock_device::vertex_layout(&[0, 1]));
    Fixture { vertex, fragment, pipeline }
}

fn encoding_with(pipeline: &Arc<dyn RenderPipelineState>) -> RenderBindingState {
    let mut state = RenderBindingState::new();
    state.begin();
    state.bind_pipeline(pipeline);
    state
}

fn flushed(state: &mut RenderBindingState) -> RecordingSink {
    let mut sink = RecordingSink::default();
    state.flush(&mut sink).unwrap();
    sink
}

fn buffer_binding(buffer: &Arc<dyn Buffer>) -> BufferBinding {
    BufferBinding { buffer: Arc::clone(buffer), offset: 0, size: 0 }
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
fn test_begin_end_transitions() {
    let mut state = RenderBindingState::new();
    assert_eq!(state.state(), EncoderState::Idle);
    state.begin();
    assert_eq!(state.state(), EncoderState::Encoding);
    state.end();
    assert_eq!(state.state(), EncoderState::Idle);
}

#[test]
#[should_panic(expected = "not encoding")]
fn test_bind_while_idle_panics() {
    let f = fixture();
    let mut state = RenderBindingState::new();
    state.bind_pipeline(&f.pipeline);
}

#[test]
#[should_panic(expected = "not encoding")]
fn test_bind_after_end_panics() {
    let mut state = RenderBindingState::new();
    state.begin();
    state.end();
    state.bind_viewport(Viewport::new(8.0, 8.0));
}

#[test]
#[should_panic(expected = "already encoding")]
fn test_double_begin_panics() {
    let mut state = RenderBindingState::new();
    state.begin();
    state.begin();
}

#[test]
fn test_end_drops_bindings() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    state.bind_texture(0, BindTarget::FRAGMENT, Some(TextureBinding(mock_device::texture())));
    state.end();
    state.begin();
    assert!(state.pipeline().is_none());
    assert!(!state.has_pending());
}

#[test]
#[serial]
fn test_flush_without_pipeline_fails() {
    let mut state = RenderBindingState::new();
    state.begin();
    let mut sink = RecordingSink::default();
    let err = state.flush(&mut sink).unwrap_err();
    assert!(matches!(err, crate::prism::Error::InvalidResource(_)));
    assert!(sink.commands.is_empty());
}

// ============================================================================
// REDUNDANT BIND ELIMINATION
// ============================================================================

#[test]
fn test_texture_bound_twice_flushes_once() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    let texture = mock_device::texture();

    state.bind_texture(0, BindTarget::FRAGMENT, Some(TextureBinding(Arc::clone(&texture))));
    state.bind_texture(0, BindTarget::FRAGMENT, Some(TextureBinding(Arc::clone(&texture))));
    let sink = flushed(&mut state);

    assert_eq!(sink.count("bind_texture Fragment 0 true"), 1);
    assert_eq!(sink.count("bind_texture"), 1);
}

#[test]
fn test_failed_flush_keeps_unissued_slots_dirty() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    let texture = mock_device::texture();

    state.bind_texture(0, BindTarget::FRAGMENT, Some(TextureBinding(Arc::clone(&texture))));
    state.bind_texture(1, BindTarget::FRAGMENT, Some(TextureBinding(Arc::clone(&texture))));
    let mut failing = RecordingSink::rejecting_texture(0);
    assert!(state.flush(&mut failing).is_err());
    assert_eq!(failing.count("bind_texture"), 0);

    let sink = flushed(&mut state);
    assert_eq!(sink.count("bind_texture Fragment 0 true"), 1);
    assert_eq!(sink.count("bind_texture Fragment 1 true"), 1);
    assert_eq!(sink.count("bind_pipeline"), 0);
}

#[test]
fn test_failure_midway_reissues_only_the_remainder() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    let texture = mock_device::texture();

    state.bind_texture(0, BindTarget::FRAGMENT, Some(TextureBinding(Arc::clone(&texture))));
    state.bind_texture(1, BindTarget::FRAGMENT, Some(TextureBinding(Arc::clone(&texture))));
    let mut failing = RecordingSink::rejecting_texture(1);
    assert!(state.flush(&mut failing).is_err());
    assert_eq!(failing.count("bind_texture Fragment 0 true"), 1);

    let sink = flushed(&mut state);
    assert_eq!(sink.count("bind_texture"), 1);
    assert_eq!(sink.count("bind_texture Fragment 1 true"), 1);
}

#[test]
fn test_identical_rebinds_after_flush_stay_clean() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    let texture = mock_device::texture();
    let buffer = mock_device::buffer(64);

    state.bind_texture(1, BindTarget::FRAGMENT, Some(TextureBinding(Arc::clone(&texture))));
    state.bind_buffer(2, Some(buffer_binding(&buffer)));
    state.bind_viewport(Viewport::new(64.0, 64.0));
    flushed(&mut state);

    state.bind_pipeline(&f.pipeline);
    state.bind_texture(1, BindTarget::FRAGMENT, Some(TextureBinding(Arc::clone(&texture))));
    state.bind_buffer(2, Some(buffer_binding(&buffer)));
    state.bind_viewport(Viewport::new(64.0, 64.0));
    assert!(!state.has_pending());

    let sink = flushed(&mut state);
    assert_eq!(sink.commands, vec!["end_flush"]);
}

#[test]
fn test_different_texture_is_a_change() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    state.bind_texture(0, BindTarget::FRAGMENT, Some(TextureBinding(mock_device::texture())));
    flushed(&mut state);

    state.bind_texture(0, BindTarget::FRAGMENT, Some(TextureBinding(mock_device::texture())));
    assert_eq!(flushed(&mut state).count("bind_texture"), 1);
}

#[test]
fn test_unbind_is_flushed_as_none() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    state.bind_sampler(3, BindTarget::FRAGMENT, Some(SamplerBinding(mock_device::sampler())));
    flushed(&mut state);

    state.bind_sampler(3, BindTarget::FRAGMENT, None);
    let sink = flushed(&mut state);
    assert_eq!(sink.count("bind_sampler Fragment 3 false"), 1);
}

#[test]
fn test_all_graphics_target_binds_both_stages() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    state.bind_texture(2, BindTarget::ALL_GRAPHICS, Some(TextureBinding(mock_device::texture())));
    let sink = flushed(&mut state);
    assert_eq!(sink.count("bind_texture Fragment 2"), 1);
    assert_eq!(sink.count("bind_texture Vertex 2"), 1);
}

// ============================================================================
// PIPELINE SWITCHES
// ============================================================================

#[test]
fn test_same_pipeline_rebind_is_noop() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    flushed(&mut state);
    state.bind_pipeline(&f.pipeline);
    assert!(!state.has_pending());
}

#[test]
fn test_program_switch_reissues_bound_resources() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    let buffer = mock_device::buffer(256);
    state.bind_buffer(0, Some(buffer_binding(&buffer)));
    state.bind_vertex_buffer(0, Some(buffer_binding(&buffer)));
    state.bind_texture(4, BindTarget::FRAGMENT, Some(TextureBinding(mock_device::texture())));
    state.bind_push_constants(0, &[1, 2, 3, 4]);
    flushed(&mut state);

    let other_fragment = mock_device::module(ShaderStage::Fragment);
    let other = mock_device::render_pipeline(&f.vertex, &other_fragment, mock_device::vertex_layout(&[0, 1]));
    state.bind_pipeline(&other);
    let sink = flushed(&mut state);

    assert_eq!(sink.commands[0], "bind_pipeline");
    assert_eq!(sink.count("bind_buffer 0 true"), 1);
    assert_eq!(sink.count("bind_vertex_buffer 0 true"), 1);
    assert_eq!(sink.count("bind_texture Fragment 4 true"), 1);
    assert_eq!(sink.count("bind_push_constants 0 4"), 1);
}

#[test]
fn test_vertex_layout_switch_reissues_vertex_buffers_only() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    let buffer = mock_device::buffer(256);
    state.bind_buffer(1, Some(buffer_binding(&buffer)));
    state.bind_vertex_buffer(0, Some(buffer_binding(&buffer)));
    flushed(&mut state);

    let other = mock_device::render_pipeline(&f.vertex, &f.fragment, mock_device::vertex_layout(&[0, 2]));
    state.bind_pipeline(&other);
    let sink = flushed(&mut state);

    assert_eq!(sink.count("bind_pipeline"), 1);
    assert_eq!(sink.count("bind_vertex_buffer 0 true"), 1);
    assert_eq!(sink.count("bind_buffer"), 0);
}

#[test]
fn test_same_program_same_layout_reissues_nothing_but_pipeline() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    state.bind_vertex_buffer(0, Some(buffer_binding(&mock_device::buffer(16))));
    flushed(&mut state);

    let twin = mock_device::render_pipeline(&f.vertex, &f.fragment, mock_device::vertex_layout(&[0, 1]));
    state.bind_pipeline(&twin);
    assert_eq!(flushed(&mut state).commands, vec!["bind_pipeline", "end_flush"]);
}

// ============================================================================
// FLUSH ORDER
// ============================================================================

#[test]
fn test_flush_order() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    let buffer = mock_device::buffer(64);

    state.bind_push_constants(0, &[0; 8]);
    state.bind_uniform(&UniformDesc::new(3, UniformType::Float4), &[0; 16]);
    state.bind_sampler(0, BindTarget::VERTEX, Some(SamplerBinding(mock_device::sampler())));
    state.bind_sampler(0, BindTarget::FRAGMENT, Some(SamplerBinding(mock_device::sampler())));
    state.bind_texture(0, BindTarget::VERTEX, Some(TextureBinding(mock_device::texture())));
    state.bind_texture(0, BindTarget::FRAGMENT, Some(TextureBinding(mock_device::texture())));
    state.bind_index_buffer(IndexBufferBinding { buffer: Arc::clone(&buffer), format: IndexFormat::UInt16, offset: 0 });
    state.bind_vertex_buffer(0, Some(buffer_binding(&buffer)));
    state.bind_buffer(0, Some(buffer_binding(&buffer)));
    state.set_blend_color(Color::new(1.0, 0.0, 0.0, 1.0));
    state.set_stencil_reference(7);
    state.set_depth_bias(DepthBias { constant_factor: 1.0, slope_factor: 2.0, clamp: 0.0 });
    state.bind_scissor(ScissorRect { x: 0, y: 0, width: 4, height: 4 });
    state.bind_viewport(Viewport::new(4.0, 4.0));

    let sink = flushed(&mut state);
    assert_eq!(
        sink.commands,
        vec![
            "bind_pipeline",
            "set_viewport",
            "set_scissor",
            "set_depth_bias",
            "set_stencil_reference 7",
            "set_blend_color",
            "bind_buffer 0 true",
            "bind_vertex_buffer 0 true",
            "bind_index_buffer UInt16",
            "bind_texture Fragment 0 true",
            "bind_texture Vertex 0 true",
            "bind_sampler Fragment 0 true",
            "bind_sampler Vertex 0 true",
            "bind_uniform 3 16",
            "bind_push_constants 0 8",
            "end_flush",
        ]
    );
}

#[test]
fn test_dirty_slots_flush_in_ascending_order() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    for slot in [9, 2, 5] {
        state.bind_texture(slot, BindTarget::FRAGMENT, Some(TextureBinding(mock_device::texture())));
    }
    let sink = flushed(&mut state);
    let textures: Vec<&String> = sink.commands.iter().filter(|c| c.starts_with("bind_texture")).collect();
    assert_eq!(textures, vec!["bind_texture Fragment 2 true", "bind_texture Fragment 5 true", "bind_texture Fragment 9 true"]);
}

// ============================================================================
// UNIFORMS AND PUSH CONSTANTS
// ============================================================================

#[test]
fn test_uniform_is_packed_and_deduplicated() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    let matrix = glam::Mat4::IDENTITY;
    let desc = UniformDesc::new(0, UniformType::Mat4);

    state.bind_uniform(&desc, as_uniform_bytes(&[matrix]));
    assert_eq!(flushed(&mut state).count("bind_uniform 0 64"), 1);

    state.bind_uniform(&desc, as_uniform_bytes(&[matrix]));
    assert_eq!(flushed(&mut state).count("bind_uniform"), 0);

    state.bind_uniform(&desc, as_uniform_bytes(&[matrix * 2.0]));
    assert_eq!(flushed(&mut state).count("bind_uniform"), 1);
}

#[test]
fn test_strided_uniform_array_is_gathered() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    let desc = UniformDesc { location: 5, uniform_type: UniformType::Float, num_elements: 3, offset: 4, element_stride: 8 };
    let data: Vec<f32> = vec![0.0, 1.0, 0.0, 2.0, 0.0, 3.0];

    state.bind_uniform(&desc, as_uniform_bytes(&data));
    assert_eq!(flushed(&mut state).count("bind_uniform 5 12"), 1);
}

#[test]
fn test_push_constants_change_only_when_bytes_differ() {
    let f = fixture();
    let mut state = encoding_with(&f.pipeline);
    state.bind_push_constants(16, &[1, 2]);
    flushed(&mut state);
    state.bind_push_constants(16, &[1, 2]);
    assert!(!state.has_pending());
    state.bind_push_constants(16, &[1, 3]);
    assert_eq!(flushed(&mut state).count("bind_push_constants 16 2"), 1);
}
