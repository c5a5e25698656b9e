/// ShaderModule - VkShaderModule plus SPIR-V reflection
///
/// Reflection runs once at creation with spirq. Only descriptor set 0 is
/// used: resources are pushed with one push-descriptor set per pipeline.

use ash::vk;
use std::any::Any;
use std::ffi::CString;
use std::sync::Arc;
use prism_hal::{hal_bail, hal_err, hal_warn};
use prism_hal::prism::{Error, Result};
use prism_hal::prism::binder::{
    BufferKind, ReflectedAttribute, ReflectedBuffer, ReflectedTexture, ShaderReflection, INDEX_NOT_FOUND,
};
use prism_hal::prism::device::{ShaderModule, ShaderModuleDesc, ShaderSource, ShaderStage};
use crate::vulkan_context::VulkanContext;
use crate::vulkan_conversions::native_error;

/// Vulkan shader module
pub struct VulkanShaderModule {
    ctx: Arc<VulkanContext>,
    module: vk::ShaderModule,
    stage: ShaderStage,
    entry_point: String,
    entry_point_c: CString,
    reflection: ShaderReflection,
}

impl VulkanShaderModule {
    pub fn new(ctx: &Arc<VulkanContext>, desc: ShaderModuleDesc) -> Result<Self> {
        let ShaderSource::SpirV(code) = &desc.source else {
            hal_bail!("prism::vulkan::Shader", "Shader '{}' is not SPIR-V", desc.debug_name);
        };
        let entry_point_c = CString::new(desc.entry_point.as_str())
            .map_err(|_| Error::InvalidResource("Entry point name contains a NUL byte".to_string()))?;

        check_spirv_layout(code)?;
        let reflection = match desc.reflection {
            Some(reflection) => reflection,
            None => reflect_spirv(code, &desc.entry_point, desc.stage)?,
        };

        let create_info = vk::ShaderModuleCreateInfo::default().code(code);
        let module =
            unsafe { ctx.device.create_shader_module(&create_info, None) }.map_err(|e| native_error("shader module", e))?;
        ctx.set_debug_name(module, &desc.debug_name);

        Ok(Self {
            ctx: Arc::clone(ctx),
            module,
            stage: desc.stage,
            entry_point: desc.entry_point,
            entry_point_c,
            reflection,
        })
    }

    pub fn vk_module(&self) -> vk::ShaderModule {
        self.module
    }

    pub(crate) fn entry_point_c(&self) -> &CString {
        &self.entry_point_c
    }
}

impl ShaderModule for VulkanShaderModule {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn entry_point(&self) -> &str {
        &self.entry_point
    }

    fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanShaderModule {
    fn drop(&mut self) {
        unsafe { self.ctx.device.destroy_shader_module(self.module, None) };
    }
}

const SPIRV_MAGIC: u32 = 0x0723_0203;
const SPIRV_HEADER_WORDS: usize = 5;

/// Header and instruction word counts must be sound before spirq sees the module
fn check_spirv_layout(code: &[u32]) -> Result<()> {
    if code.len() < SPIRV_HEADER_WORDS || code[0] != SPIRV_MAGIC {
        hal_bail!("prism::vulkan::Shader", "Not a SPIR-V module ({} words)", code.len());
    }
    let mut offset = SPIRV_HEADER_WORDS;
    while offset < code.len() {
        let word_count = (code[offset] >> 16) as usize;
        if word_count == 0 || offset + word_count > code.len() {
            hal_bail!("prism::vulkan::Shader", "Malformed SPIR-V instruction at word {}", offset);
        }
        offset += word_count;
    }
    Ok(())
}

/// Reflect the inputs, set-0 descriptors and push constants of one entry point
pub(crate) fn reflect_spirv(code: &[u32], entry_point: &str, stage: ShaderStage) -> Result<ShaderReflection> {
    use spirq::ty::DescriptorType;
    use spirq::var::Variable;

    check_spirv_layout(code)?;

    let entry_points = spirq::ReflectConfig::new()
        .spv(code)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| hal_err!("prism::vulkan::Shader", "SPIR-V reflection failed: {:?}", e))?;

    let Some(entry) = entry_points.iter().find(|e| e.name == entry_point) else {
        hal_bail!("prism::vulkan::Shader", "Entry point '{}' not found in SPIR-V module", entry_point);
    };

    let mut reflection = ShaderReflection::default();
    for var in &entry.vars {
        match var {
            Variable::Input { name, location, .. } if stage == ShaderStage::Vertex => {
                reflection.attributes.push(ReflectedAttribute {
                    name: name.clone().unwrap_or_default(),
                    location: location.loc() as i32,
                });
            }
            Variable::Descriptor { name, desc_bind, desc_ty, ty, .. } => {
                if desc_bind.set() != 0 {
                    hal_warn!(
                        "prism::vulkan::Shader",
                        "Descriptor '{}' in set {} ignored (only set 0 is bound)",
                        name.as_deref().unwrap_or("?"),
                        desc_bind.set()
                    );
                    continue;
                }
                let name = name.clone().unwrap_or_default();
                let binding = desc_bind.bind();
                match desc_ty {
                    DescriptorType::UniformBuffer() | DescriptorType::StorageBuffer(..) => {
                        let kind = if matches!(desc_ty, DescriptorType::UniformBuffer()) {
                            BufferKind::Uniform
                        } else {
                            BufferKind::Storage
                        };
                        reflection.buffers.push(ReflectedBuffer {
                            name,
                            index: binding as i32,
                            kind,
                            size: ty.nbyte().unwrap_or(0) as u32,
                        });
                    }
                    DescriptorType::CombinedImageSampler() => {
                        reflection.textures.push(ReflectedTexture {
                            name,
                            unit: binding,
                            sampler_location: INDEX_NOT_FOUND,
                        });
                    }
                    other => {
                        hal_warn!(
                            "prism::vulkan::Shader",
                            "Descriptor '{}' at binding {} has unsupported type {:?}",
                            name,
                            binding,
                            other
                        );
                    }
                }
            }
            Variable::PushConstant { ty, .. } => {
                let size = ty.nbyte().unwrap_or(0) as u32;
                reflection.push_constant_size = reflection.push_constant_size.max(size);
            }
            _ => {}
        }
    }

    reflection.attributes.sort_by_key(|a| a.location);
    reflection.buffers.sort_by_key(|b| b.index);
    reflection.textures.sort_by_key(|t| t.unit);
    Ok(reflection)
}

#[cfg(test)]
#[path = "vulkan_shader_tests.rs"]
mod tests;
