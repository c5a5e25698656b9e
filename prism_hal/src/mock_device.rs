/// Mock resources and a recording binding sink for unit tests
///
/// The sink pushes one string per native call it would have made, so tests
/// can count and order them.

use std::any::Any;
use std::sync::Arc;
use crate::binder::{LayoutSources, PipelineLayout, ShaderReflection};
use crate::device::*;
use crate::error::{Error, Result};
use crate::state::*;

// ===== RESOURCES =====

pub struct MockBuffer {
    pub size: u64,
}

impl Buffer for MockBuffer {
    fn size(&self) -> u64 {
        self.size
    }
    fn usage(&self) -> BufferUsage {
        BufferUsage::VERTEX | BufferUsage::UNIFORM
    }
    fn upload(&self, _offset: u64, _data: &[u8]) -> Result<()> {
        Ok(())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn buffer(size: u64) -> Arc<dyn Buffer> {
    Arc::new(MockBuffer { size })
}

pub struct MockTexture {
    pub desc: TextureDesc,
}

impl Texture for MockTexture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn texture() -> Arc<dyn Texture> {
    Arc::new(MockTexture {
        desc: TextureDesc::new_2d(TextureFormat::RGBA8_UNORM, 4, 4, TextureUsage::SAMPLED),
    })
}

pub struct MockSampler {
    pub desc: SamplerDesc,
}

impl SamplerState for MockSampler {
    fn desc(&self) -> &SamplerDesc {
        &self.desc
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn sampler() -> Arc<dyn SamplerState> {
    Arc::new(MockSampler { desc: SamplerDesc::default() })
}

pub struct MockShaderModule {
    pub stage: ShaderStage,
    pub reflection: ShaderReflection,
}

impl ShaderModule for MockShaderModule {
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

pub fn module(stage: ShaderStage) -> Arc<dyn ShaderModule> {
    Arc::new(MockShaderModule { stage, reflection: ShaderReflection::default() })
}

// ===== PIPELINES =====

pub struct MockRenderPipeline {
    pub desc: RenderPipelineDesc,
    pub layout: PipelineLayout,
}

impl RenderPipelineState for MockRenderPipeline {
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

/// Vertex layout with one float4 attribute per listed location, all in buffer 0
pub fn vertex_layout(locations: &[u32]) -> VertexLayout {
    VertexLayout {
        bindings: vec![VertexBinding { binding: 0, stride: 16 * locations.len() as u32, input_rate: VertexInputRate::Vertex }],
        attributes: locations
            .iter()
            .enumerate()
            .map(|(i, &location)| VertexAttribute {
                name: String::new(),
                location,
                binding: 0,
                format: VertexFormat::Float4,
                offset: 16 * i as u32,
            })
            .collect(),
    }
}

pub fn render_pipeline(
    vertex: &Arc<dyn ShaderModule>,
    fragment: &Arc<dyn ShaderModule>,
    layout: VertexLayout,
) -> Arc<dyn RenderPipelineState> {
    let desc = RenderPipelineDesc::new(Arc::clone(vertex), Arc::clone(fragment), layout, TextureFormat::RGBA8_UNORM);
    let resolved = PipelineLayout::resolve(&LayoutSources {
        vertex_layout: Some(&desc.vertex_layout),
        stages: &[(ShaderStage::Vertex, vertex.reflection()), (ShaderStage::Fragment, fragment.reflection())],
        uniform_block_bindings: &[],
        remap_vertex_textures: false,
    })
    .unwrap();
    Arc::new(MockRenderPipeline { desc, layout: resolved })
}

pub struct MockComputePipeline {
    pub desc: ComputePipelineDesc,
    pub layout: PipelineLayout,
}

impl ComputePipelineState for MockComputePipeline {
    fn desc(&self) -> &ComputePipelineDesc {
        &self.desc
    }
    fn layout(&self) -> &PipelineLayout {
        &self.layout
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn compute_pipeline(module: &Arc<dyn ShaderModule>) -> Arc<dyn ComputePipelineState> {
    let layout = PipelineLayout::resolve(&LayoutSources {
        vertex_layout: None,
        stages: &[(ShaderStage::Compute, module.reflection())],
        uniform_block_bindings: &[],
        remap_vertex_textures: false,
    })
    .unwrap();
    Arc::new(MockComputePipeline {
        desc: ComputePipelineDesc { compute_module: Arc::clone(module), debug_name: String::new() },
        layout,
    })
}

// ===== RECORDING SINK =====

#[derive(Default)]
pub struct RecordingSink {
    pub commands: Vec<String>,
    /// Texture slot whose bind fails, as a foreign resource would
    pub reject_texture: Option<u32>,
}

impl RecordingSink {
    pub fn rejecting_texture(index: u32) -> Self {
        Self { commands: Vec::new(), reject_texture: Some(index) }
    }

    fn check_texture(&self, index: u32) -> Result<()> {
        if self.reject_texture == Some(index) {
            return Err(Error::InvalidResource(format!("Texture at {} rejected", index)));
        }
        Ok(())
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(prefix)).count()
    }
}

impl RenderBindingSink for RecordingSink {
    fn bind_pipeline(&mut self, _pipeline: &Arc<dyn RenderPipelineState>) -> Result<()> {
        self.commands.push("bind_pipeline".to_string());
        Ok(())
    }
    fn set_viewport(&mut self, _viewport: &Viewport) -> Result<()> {
        self.commands.push("set_viewport".to_string());
        Ok(())
    }
    fn set_scissor(&mut self, _rect: &ScissorRect) -> Result<()> {
        self.commands.push("set_scissor".to_string());
        Ok(())
    }
    fn set_depth_bias(&mut self, _bias: &DepthBias) -> Result<()> {
        self.commands.push("set_depth_bias".to_string());
        Ok(())
    }
    fn set_stencil_reference(&mut self, value: u32) -> Result<()> {
        self.commands.push(format!("set_stencil_reference {}", value));
        Ok(())
    }
    fn set_blend_color(&mut self, _color: &Color) -> Result<()> {
        self.commands.push("set_blend_color".to_string());
        Ok(())
    }
    fn bind_buffer(&mut self, index: u32, binding: Option<&BufferBinding>) -> Result<()> {
        self.commands.push(format!("bind_buffer {} {}", index, binding.is_some()));
        Ok(())
    }
    fn bind_vertex_buffer(&mut self, index: u32, binding: Option<&BufferBinding>) -> Result<()> {
        self.commands.push(format!("bind_vertex_buffer {} {}", index, binding.is_some()));
        Ok(())
    }
    fn bind_index_buffer(&mut self, binding: &IndexBufferBinding) -> Result<()> {
        self.commands.push(format!("bind_index_buffer {:?}", binding.format));
        Ok(())
    }
    fn bind_texture(&mut self, stage: ShaderStage, index: u32, texture: Option<&TextureBinding>) -> Result<()> {
        self.check_texture(index)?;
        self.commands.push(format!("bind_texture {:?} {} {}", stage, index, texture.is_some()));
        Ok(())
    }
    fn bind_sampler(&mut self, stage: ShaderStage, index: u32, sampler: Option<&SamplerBinding>) -> Result<()> {
        self.commands.push(format!("bind_sampler {:?} {} {}", stage, index, sampler.is_some()));
        Ok(())
    }
    fn bind_uniform(&mut self, desc: &UniformDesc, data: &[u8]) -> Result<()> {
        self.commands.push(format!("bind_uniform {} {}", desc.location, data.len()));
        Ok(())
    }
    fn bind_push_constants(&mut self, constants: &PushConstants) -> Result<()> {
        self.commands.push(format!("bind_push_constants {} {}", constants.offset, constants.data.len()));
        Ok(())
    }
    fn end_flush(&mut self) -> Result<()> {
        self.commands.push("end_flush".to_string());
        Ok(())
    }
}

impl ComputeBindingSink for RecordingSink {
    fn bind_pipeline(&mut self, _pipeline: &Arc<dyn ComputePipelineState>) -> Result<()> {
        self.commands.push("bind_pipeline".to_string());
        Ok(())
    }
    fn bind_buffer(&mut self, index: u32, binding: Option<&BufferBinding>) -> Result<()> {
        self.commands.push(format!("bind_buffer {} {}", index, binding.is_some()));
        Ok(())
    }
    fn bind_texture(&mut self, index: u32, texture: Option<&TextureBinding>) -> Result<()> {
        self.check_texture(index)?;
        self.commands.push(format!("bind_texture {} {}", index, texture.is_some()));
        Ok(())
    }
    fn bind_uniform(&mut self, desc: &UniformDesc, data: &[u8]) -> Result<()> {
        self.commands.push(format!("bind_uniform {} {}", desc.location, data.len()));
        Ok(())
    }
    fn bind_push_constants(&mut self, constants: &PushConstants) -> Result<()> {
        self.commands.push(format!("bind_push_constants {} {}", constants.offset, constants.data.len()));
        Ok(())
    }
    fn end_flush(&mut self) -> Result<()> {
        self.commands.push("end_flush".to_string());
        Ok(())
    }
}
