#![allow(dead_code)]
//! Mock backend shared by the integration tests
//!
//! Implements the resource traits with plain structs and a binding sink that
//! records the native calls a real backend would issue, including vertex
//! attribute enables driven by `VertexAttributeTracker`.

use prism_hal::prism::binder::{LayoutSources, PipelineLayout, ShaderReflection, VertexAttributeTracker};
use prism_hal::prism::device::*;
use prism_hal::prism::state::*;
use prism_hal::prism::Result;
use std::any::Any;
use std::sync::Arc;

pub struct FakeBuffer(pub u64);

impl Buffer for FakeBuffer {
    fn size(&self) -> u64 {
        self.0
    }
    fn usage(&self) -> BufferUsage {
        BufferUsage::all()
    }
    fn upload(&self, _offset: u64, _data: &[u8]) -> Result<()> {
        Ok(())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct FakeTexture(pub TextureDesc);

impl Texture for FakeTexture {
    fn desc(&self) -> &TextureDesc {
        &self.0
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct FakeShader {
    pub stage: ShaderStage,
    pub reflection: ShaderReflection,
}

impl ShaderModule for FakeShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }
    fn entry_point(&self) -> &str {
        "main"
    }
    fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct FakePipeline {
    desc: RenderPipelineDesc,
    layout: PipelineLayout,
}

impl RenderPipelineState for FakePipeline {
    fn desc(&self) -> &RenderPipelineDesc {
        &self.desc
    }
    fn layout(&self) -> &PipelineLayout {
        &self.layout
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn texture() -> Arc<dyn Texture> {
    Arc::new(FakeTexture(TextureDesc::new_2d(TextureFormat::RGBA8_UNORM, 16, 16, TextureUsage::SAMPLED)))
}

pub fn buffer(size: u64) -> Arc<dyn Buffer> {
    Arc::new(FakeBuffer(size))
}

pub fn shader(stage: ShaderStage, reflection: ShaderReflection) -> Arc<dyn ShaderModule> {
    Arc::new(FakeShader { stage, reflection })
}

/// Pipeline reading float4 attributes at `locations` from vertex buffer 0
pub fn pipeline(vertex: &Arc<dyn ShaderModule>, fragment: &Arc<dyn ShaderModule>, locations: &[u32]) -> Arc<dyn RenderPipelineState> {
    let layout = VertexLayout {
        bindings: vec![VertexBinding { binding: 0, stride: 64, input_rate: VertexInputRate::Vertex }],
        attributes: locations
            .iter()
            .map(|&location| VertexAttribute {
                name: String::new(),
                location,
                binding: 0,
                format: VertexFormat::Float4,
                offset: 16 * location,
            })
            .collect(),
    };
    let desc = RenderPipelineDesc::new(Arc::clone(vertex), Arc::clone(fragment), layout, TextureFormat::RGBA8_UNORM);
    let resolved = PipelineLayout::resolve(&LayoutSources {
        vertex_layout: Some(&desc.vertex_layout),
        stages: &[(ShaderStage::Vertex, vertex.reflection()), (ShaderStage::Fragment, fragment.reflection())],
        uniform_block_bindings: &[],
        remap_vertex_textures: true,
    })
    .expect("layout resolves");
    Arc::new(FakePipeline { desc, layout: resolved })
}

/// Native call as a real backend would issue it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    UseProgram,
    EnableAttribute(usize),
    DisableAttribute(usize),
    BindVertexBuffer(u32),
    BindTexture(u32),
    Other(&'static str),
}

/// Sink that translates flushed bindings into native calls
#[derive(Default)]
pub struct NativeRecorder {
    pub calls: Vec<NativeCall>,
    attributes: VertexAttributeTracker,
    pipeline: Option<Arc<dyn RenderPipelineState>>,
}

impl NativeRecorder {
    pub fn take(&mut self) -> Vec<NativeCall> {
        std::mem::take(&mut self.calls)
    }
}

impl RenderBindingSink for NativeRecorder {
    fn bind_pipeline(&mut self, pipeline: &Arc<dyn RenderPipelineState>) -> Result<()> {
        self.calls.push(NativeCall::UseProgram);
        let transition = self.attributes.transition_to(pipeline.layout().required_attributes());
        self.calls.extend(transition.disabled().map(NativeCall::DisableAttribute));
        self.calls.extend(transition.enabled().map(NativeCall::EnableAttribute));
        self.pipeline = Some(Arc::clone(pipeline));
        Ok(())
    }
    fn set_viewport(&mut self, _viewport: &Viewport) -> Result<()> {
        self.calls.push(NativeCall::Other("viewport"));
        Ok(())
    }
    fn set_scissor(&mut self, _rect: &ScissorRect) -> Result<()> {
        self.calls.push(NativeCall::Other("scissor"));
        Ok(())
    }
    fn set_depth_bias(&mut self, _bias: &DepthBias) -> Result<()> {
        self.calls.push(NativeCall::Other("depth_bias"));
        Ok(())
    }
    fn set_stencil_reference(&mut self, _value: u32) -> Result<()> {
        self.calls.push(NativeCall::Other("stencil_reference"));
        Ok(())
    }
    fn set_blend_color(&mut self, _color: &Color) -> Result<()> {
        self.calls.push(NativeCall::Other("blend_color"));
        Ok(())
    }
    fn bind_buffer(&mut self, _index: u32, _binding: Option<&BufferBinding>) -> Result<()> {
        self.calls.push(NativeCall::Other("buffer"));
        Ok(())
    }
    fn bind_vertex_buffer(&mut self, index: u32, _binding: Option<&BufferBinding>) -> Result<()> {
        self.calls.push(NativeCall::BindVertexBuffer(index));
        Ok(())
    }
    fn bind_index_buffer(&mut self, _binding: &IndexBufferBinding) -> Result<()> {
        self.calls.push(NativeCall::Other("index_buffer"));
        Ok(())
    }
    fn bind_texture(&mut self, stage: ShaderStage, index: u32, _texture: Option<&TextureBinding>) -> Result<()> {
        let unit = match (&self.pipeline, stage) {
            (Some(pipeline), ShaderStage::Vertex) => pipeline.layout().vertex_texture_unit(index),
            _ => index,
        };
        self.calls.push(NativeCall::BindTexture(unit));
        Ok(())
    }
    fn bind_sampler(&mut self, _stage: ShaderStage, _index: u32, _sampler: Option<&SamplerBinding>) -> Result<()> {
        self.calls.push(NativeCall::Other("sampler"));
        Ok(())
    }
    fn bind_uniform(&mut self, _desc: &UniformDesc, _data: &[u8]) -> Result<()> {
        self.calls.push(NativeCall::Other("uniform"));
        Ok(())
    }
    fn bind_push_constants(&mut self, _constants: &PushConstants) -> Result<()> {
        self.calls.push(NativeCall::Other("push_constants"));
        Ok(())
    }
}
