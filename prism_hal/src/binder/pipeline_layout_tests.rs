//! Unit tests for pipeline_layout.rs

use serial_test::serial;
use crate::binder::*;
use crate::device::*;

// ============================================================================
// TEST HELPERS
// ============================================================================

fn texture(name: &str, unit: u32, sampler_location: i32) -> ReflectedTexture {
    ReflectedTexture { name: name.to_string(), unit, sampler_location }
}

fn uniform_block(name: &str, index: i32) -> ReflectedBuffer {
    ReflectedBuffer { name: name.to_string(), index, kind: BufferKind::Uniform, size: 64 }
}

fn attribute(name: &str, location: u32, binding: u32, offset: u32) -> VertexAttribute {
    VertexAttribute { name: name.to_string(), location, binding, format: VertexFormat::Float3, offset }
}

fn two_buffer_layout() -> VertexLayout {
    VertexLayout {
        bindings: vec![
            VertexBinding { binding: 0, stride: 24, input_rate: VertexInputRate::Vertex },
            VertexBinding { binding: 1, stride: 12, input_rate: VertexInputRate::Instance },
        ],
        attributes: vec![
            attribute("", 0, 0, 0),
            attribute("", 1, 0, 12),
            attribute("", 4, 1, 0),
        ],
    }
}

fn resolve(
    vertex_layout: Option<&VertexLayout>,
    stages: &[(ShaderStage, &ShaderReflection)],
    remap: bool,
) -> crate::prism::Result<PipelineLayout> {
    PipelineLayout::resolve(&LayoutSources {
        vertex_layout,
        stages,
        uniform_block_bindings: &[],
        remap_vertex_textures: remap,
    })
}

// ============================================================================
// VERTEX ATTRIBUTES
// ============================================================================

#[test]
fn test_attributes_grouped_per_buffer() {
    let layout_desc = two_buffer_layout();
    let layout = resolve(Some(&layout_desc), &[], false).unwrap();

    let buffer0 = layout.attributes_for_buffer(0);
    assert_eq!(buffer0.len(), 2);
    assert_eq!(buffer0[1].location, 1);
    assert_eq!(buffer0[1].offset, 12);
    assert_eq!(buffer0[1].stride, 24);

    let buffer1 = layout.attributes_for_buffer(1);
    assert_eq!(buffer1.len(), 1);
    assert_eq!(buffer1[0].input_rate, VertexInputRate::Instance);

    assert!(layout.attributes_for_buffer(2).is_empty());
    assert!(layout.attributes_for_buffer(999).is_empty());
    assert_eq!(layout.required_attributes(), 0b1_0011);
}

#[test]
fn test_named_attributes_resolved_through_reflection() {
    let mut layout_desc = two_buffer_layout();
    layout_desc.attributes = vec![attribute("position", 0, 0, 0), attribute("normal", 0, 0, 12)];
    let reflection = ShaderReflection {
        attributes: vec![
            ReflectedAttribute { name: "position".into(), location: 3 },
            ReflectedAttribute { name: "normal".into(), location: 7 },
        ],
        ..Default::default()
    };

    let layout = resolve(Some(&layout_desc), &[(ShaderStage::Vertex, &reflection)], false).unwrap();
    assert_eq!(layout.required_attributes(), (1 << 3) | (1 << 7));
    assert_eq!(layout.index_by_name("normal", ShaderStage::Vertex), 7);
}

#[test]
#[serial]
fn test_unknown_attribute_name_is_skipped() {
    let mut layout_desc = two_buffer_layout();
    layout_desc.attributes = vec![attribute("tangent", 0, 0, 0)];
    let layout = resolve(Some(&layout_desc), &[(ShaderStage::Vertex, &ShaderReflection::default())], false).unwrap();
    assert_eq!(layout.required_attributes(), 0);
    assert!(layout.attributes_for_buffer(0).is_empty());
}

#[test]
fn test_attribute_with_undeclared_buffer_fails() {
    let mut layout_desc = two_buffer_layout();
    layout_desc.attributes.push(attribute("", 2, 5, 0));
    assert!(matches!(resolve(Some(&layout_desc), &[], false), Err(crate::prism::Error::InvalidResource(_))));
}

#[test]
fn test_attribute_location_out_of_range_fails() {
    let mut layout_desc = two_buffer_layout();
    layout_desc.attributes.push(attribute("", 40, 0, 0));
    assert!(resolve(Some(&layout_desc), &[], false).is_err());
}

// ============================================================================
// TEXTURES
// ============================================================================

#[test]
fn test_vertex_textures_remapped_after_fragment_units() {
    let fragment = ShaderReflection {
        textures: vec![texture("albedo", 0, 10), texture("normal_map", 2, 11)],
        ..Default::default()
    };
    let vertex = ShaderReflection { textures: vec![texture("height_map", 0, 12)], ..Default::default() };

    let layout = resolve(None, &[(ShaderStage::Vertex, &vertex), (ShaderStage::Fragment, &fragment)], true).unwrap();

    assert_eq!(layout.vertex_texture_unit(0), 3);
    assert_eq!(layout.vertex_texture_unit(5), 5);
    assert_eq!(layout.sampler_location(3), 12);
    assert_eq!(layout.sampler_location(1), INDEX_NOT_FOUND);
    assert_eq!(layout.sampler_units().collect::<Vec<_>>(), vec![(0, 10), (2, 11), (3, 12)]);
    assert_eq!(layout.index_by_name("height_map", ShaderStage::Vertex), 3);
    assert_eq!(layout.index_by_name("albedo", ShaderStage::Fragment), 0);
}

#[test]
fn test_without_remap_units_are_used_as_declared() {
    let vertex = ShaderReflection { textures: vec![texture("height_map", 1, INDEX_NOT_FOUND)], ..Default::default() };
    let fragment = ShaderReflection { textures: vec![texture("albedo", 0, INDEX_NOT_FOUND)], ..Default::default() };
    let layout = resolve(None, &[(ShaderStage::Vertex, &vertex), (ShaderStage::Fragment, &fragment)], false).unwrap();

    assert_eq!(layout.vertex_texture_unit(1), 1);
    assert_eq!(layout.sampler_units().count(), 0);
    let bindings = layout.descriptor_bindings();
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].binding, 0);
    assert_eq!(bindings[0].stages, ShaderStages::FRAGMENT);
    assert_eq!(bindings[1].stages, ShaderStages::VERTEX);
}

#[test]
fn test_remapped_unit_past_limit_fails() {
    let fragment = ShaderReflection { textures: vec![texture("lut", 12, 0)], ..Default::default() };
    let vertex = ShaderReflection { textures: vec![texture("height_map", 4, 1)], ..Default::default() };
    let result = resolve(None, &[(ShaderStage::Vertex, &vertex), (ShaderStage::Fragment, &fragment)], true);
    assert!(matches!(result, Err(crate::prism::Error::InvalidResource(_))));
}

// ============================================================================
// BUFFERS AND DESCRIPTORS
// ============================================================================

#[test]
fn test_shared_binding_merges_stages() {
    let vertex = ShaderReflection { buffers: vec![uniform_block("Camera", 0)], ..Default::default() };
    let fragment = ShaderReflection { buffers: vec![uniform_block("Camera", 0)], ..Default::default() };
    let layout = resolve(None, &[(ShaderStage::Vertex, &vertex), (ShaderStage::Fragment, &fragment)], false).unwrap();

    let bindings = layout.descriptor_bindings();
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].kind, DescriptorKind::UniformBuffer);
    assert_eq!(bindings[0].stages, ShaderStages::VERTEX | ShaderStages::FRAGMENT);
    assert_eq!(layout.uniform_block_bindings().len(), 1);
}

#[test]
fn test_conflicting_descriptor_kinds_fail() {
    let vertex = ShaderReflection { buffers: vec![uniform_block("Camera", 1)], ..Default::default() };
    let fragment = ShaderReflection { textures: vec![texture("albedo", 1, INDEX_NOT_FOUND)], ..Default::default() };
    assert!(resolve(None, &[(ShaderStage::Vertex, &vertex), (ShaderStage::Fragment, &fragment)], false).is_err());
}

#[test]
fn test_uniform_block_binding_override_by_name() {
    let fragment = ShaderReflection {
        buffers: vec![uniform_block("Material", 0), uniform_block("Lights", 1)],
        ..Default::default()
    };
    let overrides = vec![("Lights".to_string(), 6)];
    let layout = PipelineLayout::resolve(&LayoutSources {
        vertex_layout: None,
        stages: &[(ShaderStage::Fragment, &fragment)],
        uniform_block_bindings: &overrides,
        remap_vertex_textures: false,
    })
    .unwrap();

    assert_eq!(
        layout.uniform_block_bindings(),
        &[UniformBlockBinding { block_index: 0, binding: 0 }, UniformBlockBinding { block_index: 1, binding: 6 }]
    );
    assert_eq!(layout.descriptor_kind(6), Some(DescriptorKind::UniformBuffer));
    assert_eq!(layout.descriptor_kind(1), None);
    assert_eq!(layout.index_by_name("Lights", ShaderStage::Fragment), 6);
}

#[test]
fn test_push_constant_size_is_largest_stage() {
    let vertex = ShaderReflection { push_constant_size: 64, ..Default::default() };
    let fragment = ShaderReflection { push_constant_size: 16, ..Default::default() };
    let layout = resolve(None, &[(ShaderStage::Vertex, &vertex), (ShaderStage::Fragment, &fragment)], false).unwrap();
    assert_eq!(layout.push_constant_size(), 64);
}

// ============================================================================
// NAME LOOKUP
// ============================================================================

#[test]
fn test_unknown_name_returns_not_found() {
    let fragment = ShaderReflection {
        uniforms: vec![ReflectedUniform { name: "u_time".into(), location: 4, uniform_type: UniformType::Float, array_length: 1 }],
        ..Default::default()
    };
    let layout = resolve(None, &[(ShaderStage::Fragment, &fragment)], false).unwrap();
    assert_eq!(layout.index_by_name("u_time", ShaderStage::Fragment), 4);
    assert_eq!(layout.index_by_name("u_time", ShaderStage::Vertex), INDEX_NOT_FOUND);
    assert_eq!(layout.index_by_name("u_missing", ShaderStage::Fragment), INDEX_NOT_FOUND);
}
