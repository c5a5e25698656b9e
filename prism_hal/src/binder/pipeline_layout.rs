/// Reflection resolved into the tables encoders consult on every bind
///
/// Built once per pipeline. Holds the per-buffer attribute lists, the mask
/// of attribute locations the pipeline reads, texture unit assignments,
/// uniform block binding points and a name index.

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use crate::binder::{BufferKind, ShaderReflection, INDEX_NOT_FOUND};
use crate::device::{ShaderStage, VertexFormat, VertexInputRate, VertexLayout};
use crate::error::{Error, Result};
use crate::state::{MAX_TEXTURE_SAMPLERS, MAX_VERTEX_ATTRIBUTES, MAX_VERTEX_BUFFERS};

bitflags! {
    /// Stages that access a descriptor
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStages: u8 {
        const VERTEX   = 1 << 0;
        const FRAGMENT = 1 << 1;
        const COMPUTE  = 1 << 2;
    }
}

impl From<ShaderStage> for ShaderStages {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => ShaderStages::VERTEX,
            ShaderStage::Fragment => ShaderStages::FRAGMENT,
            ShaderStage::Compute => ShaderStages::COMPUTE,
        }
    }
}

/// One attribute read from a vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding {
    pub location: u32,
    pub format: VertexFormat,
    pub offset: u32,
    pub stride: u32,
    pub input_rate: VertexInputRate,
}

/// Kind of a descriptor slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    UniformBuffer,
    StorageBuffer,
    CombinedImageSampler,
}

/// A descriptor slot and the stages that use it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorBinding {
    pub binding: u32,
    pub kind: DescriptorKind,
    pub stages: ShaderStages,
}

/// Native uniform block index -> binding point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformBlockBinding {
    pub block_index: i32,
    pub binding: u32,
}

/// Pipeline inputs the layout is resolved from
pub struct LayoutSources<'a> {
    pub vertex_layout: Option<&'a VertexLayout>,
    pub stages: &'a [(ShaderStage, &'a ShaderReflection)],
    /// Uniform block name -> binding point overrides
    pub uniform_block_bindings: &'a [(String, u32)],
    /// Place vertex-stage texture units after the fragment units
    pub remap_vertex_textures: bool,
}

/// Reflection-resolved binding layout of one pipeline
#[derive(Debug, Clone)]
pub struct PipelineLayout {
    buffer_attributes: Vec<Vec<AttributeBinding>>,
    required_attributes: u64,
    vertex_texture_unit_remap: FxHashMap<u32, u32>,
    texture_unit_locations: [i32; MAX_TEXTURE_SAMPLERS],
    uniform_block_bindings: Vec<UniformBlockBinding>,
    descriptor_bindings: Vec<DescriptorBinding>,
    push_constant_size: u32,
    names: FxHashMap<ShaderStage, FxHashMap<String, i32>>,
}

impl PipelineLayout {
    /// Resolve reflection for a pipeline.
    ///
    /// Vertex attributes with a name are located through the vertex stage
    /// reflection; unknown names are skipped with a warning. Fails when an
    /// attribute references a missing vertex binding, a location or slot is
    /// out of range, or two stages declare the same slot with different kinds.
    pub fn resolve(sources: &LayoutSources<'_>) -> Result<Self> {
        let mut layout = Self {
            buffer_attributes: vec![Vec::new(); MAX_VERTEX_BUFFERS],
            required_attributes: 0,
            vertex_texture_unit_remap: FxHashMap::default(),
            texture_unit_locations: [INDEX_NOT_FOUND; MAX_TEXTURE_SAMPLERS],
            uniform_block_bindings: Vec::new(),
            descriptor_bindings: Vec::new(),
            push_constant_size: 0,
            names: FxHashMap::default(),
        };

        if let Some(vertex_layout) = sources.vertex_layout {
            let vertex_reflection = sources
                .stages
                .iter()
                .find(|(stage, _)| *stage == ShaderStage::Vertex)
                .map(|(_, r)| *r);
            layout.resolve_attributes(vertex_layout, vertex_reflection)?;
        }

        layout.resolve_textures(sources)?;
        layout.resolve_buffers(sources)?;

        for (stage, reflection) in sources.stages {
            for uniform in &reflection.uniforms {
                layout.insert_name(*stage, &uniform.name, uniform.location);
            }
            for attribute in &reflection.attributes {
                if *stage == ShaderStage::Vertex {
                    layout.insert_name(*stage, &attribute.name, attribute.location);
                }
            }
            layout.push_constant_size = layout.push_constant_size.max(reflection.push_constant_size);
        }

        Ok(layout)
    }

    fn insert_name(&mut self, stage: ShaderStage, name: &str, index: i32) {
        if name.is_empty() {
            return;
        }
        self.names.entry(stage).or_default().entry(name.to_string()).or_insert(index);
    }

    fn resolve_attributes(&mut self, vertex_layout: &VertexLayout, reflection: Option<&ShaderReflection>) -> Result<()> {
        for attribute in &vertex_layout.attributes {
            let location = if attribute.name.is_empty() {
                attribute.location as i32
            } else {
                let location = reflection.map_or(INDEX_NOT_FOUND, |r| r.attribute_location(&attribute.name));
                if location == INDEX_NOT_FOUND {
                    crate::hal_warn!(
                        "prism::binder::PipelineLayout",
                        "Vertex attribute '{}' not found in shader, skipping",
                        attribute.name
                    );
                    continue;
                }
                location
            };

            if location < 0 || location as usize >= MAX_VERTEX_ATTRIBUTES {
                return Err(Error::InvalidResource(format!(
                    "Vertex attribute location {} out of range (max {})",
                    location, MAX_VERTEX_ATTRIBUTES
                )));
            }
            if attribute.binding as usize >= MAX_VERTEX_BUFFERS {
                return Err(Error::InvalidResource(format!(
                    "Vertex buffer index {} out of range (max {})",
                    attribute.binding, MAX_VERTEX_BUFFERS
                )));
            }
            let binding = vertex_layout.binding(attribute.binding).ok_or_else(|| {
                Error::InvalidResource(format!(
                    "Vertex attribute at location {} references undeclared vertex buffer {}",
                    location, attribute.binding
                ))
            })?;

            self.buffer_attributes[attribute.binding as usize].push(AttributeBinding {
                location: location as u32,
                format: attribute.format,
                offset: attribute.offset,
                stride: binding.stride,
                input_rate: binding.input_rate,
            });
            self.required_attributes |= 1 << location;
        }
        Ok(())
    }

    fn resolve_textures(&mut self, sources: &LayoutSources<'_>) -> Result<()> {
        let fragment_units = sources
            .stages
            .iter()
            .filter(|(stage, _)| *stage == ShaderStage::Fragment)
            .flat_map(|(_, r)| r.textures.iter())
            .map(|t| t.unit + 1)
            .max()
            .unwrap_or(0);

        for (stage, reflection) in sources.stages {
            for texture in &reflection.textures {
                let unit = if *stage == ShaderStage::Vertex && sources.remap_vertex_textures {
                    let remapped = fragment_units + texture.unit;
                    self.vertex_texture_unit_remap.insert(texture.unit, remapped);
                    remapped
                } else {
                    texture.unit
                };
                if unit as usize >= MAX_TEXTURE_SAMPLERS {
                    return Err(Error::InvalidResource(format!(
                        "Texture '{}' needs unit {} but only {} units exist",
                        texture.name, unit, MAX_TEXTURE_SAMPLERS
                    )));
                }
                self.texture_unit_locations[unit as usize] = texture.sampler_location;
                self.insert_name(*stage, &texture.name, unit as i32);
                self.add_descriptor(unit, DescriptorKind::CombinedImageSampler, *stage, &texture.name)?;
            }
        }
        Ok(())
    }

    fn resolve_buffers(&mut self, sources: &LayoutSources<'_>) -> Result<()> {
        for (stage, reflection) in sources.stages {
            for buffer in &reflection.buffers {
                if buffer.index < 0 {
                    continue;
                }
                let binding = sources
                    .uniform_block_bindings
                    .iter()
                    .find(|(name, _)| *name == buffer.name)
                    .map_or(buffer.index as u32, |(_, binding)| *binding);

                if !self.uniform_block_bindings.iter().any(|b| b.block_index == buffer.index) {
                    self.uniform_block_bindings.push(UniformBlockBinding { block_index: buffer.index, binding });
                }
                self.insert_name(*stage, &buffer.name, binding as i32);
                let kind = match buffer.kind {
                    BufferKind::Uniform => DescriptorKind::UniformBuffer,
                    BufferKind::Storage => DescriptorKind::StorageBuffer,
                };
                self.add_descriptor(binding, kind, *stage, &buffer.name)?;
            }
        }
        Ok(())
    }

    fn add_descriptor(&mut self, binding: u32, kind: DescriptorKind, stage: ShaderStage, name: &str) -> Result<()> {
        if let Some(existing) = self.descriptor_bindings.iter_mut().find(|d| d.binding == binding) {
            if existing.kind != kind {
                return Err(Error::InvalidResource(format!(
                    "Binding {} ('{}') declared as {:?} and {:?} in different stages",
                    binding, name, existing.kind, kind
                )));
            }
            existing.stages |= ShaderStages::from(stage);
        } else {
            self.descriptor_bindings.push(DescriptorBinding { binding, kind, stages: stage.into() });
        }
        Ok(())
    }

    // ===== QUERIES =====

    /// Attributes read from vertex buffer `index`
    pub fn attributes_for_buffer(&self, index: u32) -> &[AttributeBinding] {
        self.buffer_attributes.get(index as usize).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Bit `n` set when the pipeline reads attribute location `n`
    pub fn required_attributes(&self) -> u64 {
        self.required_attributes
    }

    /// Texture unit for a vertex-stage texture slot
    pub fn vertex_texture_unit(&self, slot: u32) -> u32 {
        self.vertex_texture_unit_remap.get(&slot).copied().unwrap_or(slot)
    }

    /// Sampler uniform location for a texture unit, or `INDEX_NOT_FOUND`
    pub fn sampler_location(&self, unit: u32) -> i32 {
        self.texture_unit_locations.get(unit as usize).copied().unwrap_or(INDEX_NOT_FOUND)
    }

    /// `(unit, location)` of every sampler uniform that needs its unit assigned
    pub fn sampler_units(&self) -> impl Iterator<Item = (u32, i32)> + '_ {
        self.texture_unit_locations
            .iter()
            .enumerate()
            .filter(|(_, location)| **location >= 0)
            .map(|(unit, location)| (unit as u32, *location))
    }

    pub fn uniform_block_bindings(&self) -> &[UniformBlockBinding] {
        &self.uniform_block_bindings
    }

    /// Descriptor slots sorted by binding
    pub fn descriptor_bindings(&self) -> Vec<DescriptorBinding> {
        let mut bindings = self.descriptor_bindings.clone();
        bindings.sort_by_key(|d| d.binding);
        bindings
    }

    pub fn descriptor_kind(&self, binding: u32) -> Option<DescriptorKind> {
        self.descriptor_bindings.iter().find(|d| d.binding == binding).map(|d| d.kind)
    }

    pub fn push_constant_size(&self) -> u32 {
        self.push_constant_size
    }

    /// Slot or location of a named input, or `INDEX_NOT_FOUND`
    pub fn index_by_name(&self, name: &str, stage: ShaderStage) -> i32 {
        self.names
            .get(&stage)
            .and_then(|names| names.get(name))
            .copied()
            .unwrap_or(INDEX_NOT_FOUND)
    }
}

#[cfg(test)]
#[path = "pipeline_layout_tests.rs"]
mod tests;
