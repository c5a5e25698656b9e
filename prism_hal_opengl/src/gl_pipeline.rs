/// Render and compute pipeline states for OpenGL
///
/// A pipeline is a linked program plus the fixed-function state applied
/// when it is bound. Reflection is resolved once at creation: attribute
/// locations per vertex buffer, the uniform block binding map (written to
/// the program right away) and the texture unit table, with vertex-stage
/// textures placed after the fragment units.

use std::any::Any;
use std::sync::Arc;
use prism_hal::{hal_error, hal_warn};
use prism_hal::prism::{Error, Result};
use prism_hal::prism::binder::{LayoutSources, PipelineLayout};
use prism_hal::prism::device::{
    ColorBlendState, ColorWriteMask, ComputePipelineDesc, ComputePipelineState, DeviceFeatures, PolygonMode,
    RenderPipelineDesc, RenderPipelineState, ShaderModule, ShaderStage, StencilOpState, VertexInputRate,
};
use crate::gl_commands::consts as gl;
use crate::gl_commands::{GLenum, GLint, GLsizei, GLuint, GlCommands};
use crate::gl_context::GlContext;
use crate::gl_conversions::{compare_op_to_gl, stencil_op_to_gl, topology_to_gl, vertex_format_to_gl};
use crate::gl_shader::GlShaderModule;

fn downcast_module(module: &Arc<dyn ShaderModule>, expected: ShaderStage) -> Result<&GlShaderModule> {
    let module = module.as_any().downcast_ref::<GlShaderModule>().ok_or_else(|| {
        hal_error!("prism::opengl::Pipeline", "Shader module was not created by the OpenGL device");
        Error::InvalidResource("Shader module is not an OpenGL shader module".to_string())
    })?;
    if module.stage() != expected {
        hal_error!("prism::opengl::Pipeline", "Expected a {:?} shader, got {:?}", expected, module.stage());
        return Err(Error::InvalidResource(format!("Expected a {:?} shader module", expected)));
    }
    Ok(module)
}

fn assign_uniform_blocks(gl_api: &dyn GlCommands, program: GLuint, layout: &PipelineLayout) {
    for block in layout.uniform_block_bindings() {
        gl_api.uniform_block_binding(program, block.block_index as GLuint, block.binding);
    }
}

/// Point every sampler uniform at its texture unit; needs the program in use
fn assign_sampler_units(gl_api: &dyn GlCommands, layout: &PipelineLayout) {
    for (unit, location) in layout.sampler_units() {
        gl_api.uniform_1i(location, unit as GLint);
    }
}

// ============================================================================
// RENDER PIPELINE
// ============================================================================

/// OpenGL render pipeline
pub struct GlRenderPipelineState {
    desc: RenderPipelineDesc,
    layout: PipelineLayout,
    program: GLuint,
    primitive_mode: GLenum,
    blend: ColorBlendState,
}

impl GlRenderPipelineState {
    pub fn new(ctx: &Arc<GlContext>, desc: RenderPipelineDesc) -> Result<Self> {
        let vertex = downcast_module(&desc.vertex_module, ShaderStage::Vertex)?;
        let fragment = downcast_module(&desc.fragment_module, ShaderStage::Fragment)?;
        if vertex.gl_program() != fragment.gl_program() {
            hal_error!(
                "prism::opengl::Pipeline",
                "Pipeline '{}': vertex program {} and fragment program {} differ",
                desc.debug_name,
                vertex.gl_program(),
                fragment.gl_program()
            );
            return Err(Error::InvalidResource("Vertex and fragment modules must share one program".to_string()));
        }

        let dual_source = desc.color_attachments.iter().any(|a| a.blend.uses_dual_source());
        if dual_source && !ctx.has_feature(DeviceFeatures::DUAL_SRC_BLEND) {
            hal_error!("prism::opengl::Pipeline", "Pipeline '{}' needs dual-source blending", desc.debug_name);
            return Err(Error::FeatureUnavailable("dual_src_blend".to_string()));
        }
        if desc.view_mask != 0 {
            hal_error!("prism::opengl::Pipeline", "Pipeline '{}' targets multiview passes", desc.debug_name);
            return Err(Error::FeatureUnavailable("multiview".to_string()));
        }
        if desc.rasterization.polygon_mode == PolygonMode::Line && !ctx.has_feature(DeviceFeatures::FILL_MODE_NON_SOLID) {
            hal_warn!(
                "prism::opengl::Pipeline",
                "Pipeline '{}' asks for line fill mode, which is not enabled; polygons will be filled",
                desc.debug_name
            );
        }
        if desc.color_attachments.len() > 1 {
            hal_warn!(
                "prism::opengl::Pipeline",
                "Pipeline '{}': blend state of attachment 0 applies to all {} attachments",
                desc.debug_name,
                desc.color_attachments.len()
            );
        }

        let program = vertex.gl_program();
        let layout = PipelineLayout::resolve(&LayoutSources {
            vertex_layout: Some(&desc.vertex_layout),
            stages: &[(ShaderStage::Vertex, vertex.reflection()), (ShaderStage::Fragment, fragment.reflection())],
            uniform_block_bindings: &desc.uniform_block_bindings,
            remap_vertex_textures: true,
        })?;
        assign_uniform_blocks(ctx.gl().as_ref(), program, &layout);

        let blend = desc.color_attachments.first().map(|a| a.blend).unwrap_or_default();
        let primitive_mode = topology_to_gl(desc.topology);
        Ok(Self { desc, layout, program, primitive_mode, blend })
    }

    /// Native program name
    pub fn gl_program(&self) -> GLuint {
        self.program
    }

    pub fn primitive_mode(&self) -> GLenum {
        self.primitive_mode
    }

    /// Blend mode applied to the color attachments
    pub fn blend(&self) -> ColorBlendState {
        self.blend
    }

    /// Program, sampler units and depth/stencil state
    pub(crate) fn bind(&self, gl_api: &dyn GlCommands, stencil_reference: u32) {
        gl_api.use_program(self.program);
        assign_sampler_units(gl_api, &self.layout);

        let depth_stencil = &self.desc.depth_stencil;
        if depth_stencil.depth_test_enable {
            gl_api.enable(gl::DEPTH_TEST);
            gl_api.depth_func(compare_op_to_gl(depth_stencil.depth_compare_op));
        } else {
            gl_api.disable(gl::DEPTH_TEST);
        }
        gl_api.depth_mask(depth_stencil.depth_write_enable);

        if depth_stencil.stencil_test_enable {
            gl_api.enable(gl::STENCIL_TEST);
            for (face, state) in [(gl::FRONT, &depth_stencil.front), (gl::BACK, &depth_stencil.back)] {
                gl_api.stencil_op_separate(
                    face,
                    stencil_op_to_gl(state.fail_op),
                    stencil_op_to_gl(state.depth_fail_op),
                    stencil_op_to_gl(state.pass_op),
                );
                gl_api.stencil_mask_separate(face, state.write_mask);
            }
            self.apply_stencil_reference(gl_api, stencil_reference);
        } else {
            gl_api.disable(gl::STENCIL_TEST);
        }

        let mask = self.desc.color_attachments.first().map_or(ColorWriteMask::ALL, |a| a.blend.color_write_mask);
        gl_api.color_mask(mask.r, mask.g, mask.b, mask.a);
    }

    /// The reference value lives in the stencil function, so both faces are re-issued
    pub(crate) fn apply_stencil_reference(&self, gl_api: &dyn GlCommands, reference: u32) {
        let depth_stencil = &self.desc.depth_stencil;
        if !depth_stencil.stencil_test_enable {
            return;
        }
        let faces: [(GLenum, &StencilOpState); 2] = [(gl::FRONT, &depth_stencil.front), (gl::BACK, &depth_stencil.back)];
        for (face, state) in faces {
            gl_api.stencil_func_separate(face, compare_op_to_gl(state.compare_op), reference as GLint, state.compare_mask);
        }
    }

    /// Point the attributes read from vertex buffer `index` at the bound array buffer
    pub(crate) fn bind_vertex_attributes(&self, gl_api: &dyn GlCommands, index: u32, offset: u64) {
        for attribute in self.layout.attributes_for_buffer(index) {
            let format = vertex_format_to_gl(attribute.format);
            let pointer = offset as usize + attribute.offset as usize;
            let stride = attribute.stride as GLsizei;
            if format.integer {
                gl_api.vertex_attrib_i_pointer(attribute.location, format.size, format.ty, stride, pointer);
            } else {
                gl_api.vertex_attrib_pointer(attribute.location, format.size, format.ty, format.normalized, stride, pointer);
            }
            let divisor = match attribute.input_rate {
                VertexInputRate::Vertex => 0,
                VertexInputRate::Instance => 1,
            };
            gl_api.vertex_attrib_divisor(attribute.location, divisor);
        }
    }
}

impl RenderPipelineState for GlRenderPipelineState {
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

// ============================================================================
// COMPUTE PIPELINE
// ============================================================================

/// OpenGL compute pipeline
pub struct GlComputePipelineState {
    desc: ComputePipelineDesc,
    layout: PipelineLayout,
    program: GLuint,
}

impl GlComputePipelineState {
    pub fn new(ctx: &Arc<GlContext>, desc: ComputePipelineDesc) -> Result<Self> {
        if !ctx.has_feature(DeviceFeatures::COMPUTE) {
            hal_error!("prism::opengl::Pipeline", "Compute pipeline '{}' without compute support", desc.debug_name);
            return Err(Error::FeatureUnavailable("compute".to_string()));
        }
        let module = downcast_module(&desc.compute_module, ShaderStage::Compute)?;
        let program = module.gl_program();
        let layout = PipelineLayout::resolve(&LayoutSources {
            vertex_layout: None,
            stages: &[(ShaderStage::Compute, module.reflection())],
            uniform_block_bindings: &[],
            remap_vertex_textures: false,
        })?;
        assign_uniform_blocks(ctx.gl().as_ref(), program, &layout);
        Ok(Self { desc, layout, program })
    }

    pub fn gl_program(&self) -> GLuint {
        self.program
    }

    pub(crate) fn bind(&self, gl_api: &dyn GlCommands) {
        gl_api.use_program(self.program);
        assign_sampler_units(gl_api, &self.layout);
    }
}

impl ComputePipelineState for GlComputePipelineState {
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
