/// RenderCommandEncoder for Vulkan
///
/// Binds are recorded in a `RenderBindingState` and flushed into the
/// command buffer right before each draw. Vertex buffers are coalesced into
/// one `vkCmdBindVertexBuffers` per contiguous run of dirty slots, and
/// descriptor set 0 is pushed once per flush.

use ash::vk;
use std::ffi::CString;
use std::sync::Arc;
use prism_hal::{hal_error, hal_warn};
use prism_hal::prism::{Error, Result};
use prism_hal::prism::device::{
    BindTarget, Buffer, Color, DepthBias, DeviceFeatures, IndexFormat, RenderCommandEncoder,
    RenderPipelineState, SamplerState, ScissorRect, ShaderStage, Texture, UniformDesc, Viewport,
};
use prism_hal::prism::state::{
    BufferBinding, EncoderState, IndexBufferBinding, PushConstants, RenderBindingSink, RenderBindingState,
    SamplerBinding, TextureBinding, MAX_VERTEX_BUFFERS,
};
use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_command_buffer::VulkanCommandBuffer;
use crate::vulkan_context::VulkanContext;
use crate::vulkan_conversions::index_type_to_vk;
use crate::vulkan_pipeline::VulkanRenderPipelineState;
use crate::vulkan_resource_binder::ResourceBinder;

/// A run of consecutive vertex buffer slots bound with one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VertexBufferRun {
    pub(crate) first_binding: u32,
    pub(crate) buffers: Vec<vk::Buffer>,
    pub(crate) offsets: Vec<vk::DeviceSize>,
}

/// Split the dirty slots of `bound` into contiguous runs; unbound slots end a run
pub(crate) fn vertex_buffer_runs(mut dirty: u64, bound: &[Option<(vk::Buffer, vk::DeviceSize)>]) -> Vec<VertexBufferRun> {
    if bound.len() < 64 {
        dirty &= (1u64 << bound.len()) - 1;
    }
    let mut runs = Vec::new();
    while dirty != 0 {
        let mut slot = dirty.trailing_zeros();
        let mut run = VertexBufferRun { first_binding: slot, buffers: Vec::new(), offsets: Vec::new() };
        while slot < 64 && dirty & (1u64 << slot) != 0 {
            dirty &= !(1u64 << slot);
            let Some((buffer, offset)) = bound[slot as usize] else { break };
            run.buffers.push(buffer);
            run.offsets.push(offset);
            slot += 1;
        }
        if !run.buffers.is_empty() {
            runs.push(run);
        }
    }
    runs
}

/// Native side of the flush
struct VulkanRenderSink {
    ctx: Arc<VulkanContext>,
    command_buffer: vk::CommandBuffer,
    resources: ResourceBinder,
    dynamic_defaults_set: bool,
    vertex_buffers: [Option<(vk::Buffer, vk::DeviceSize)>; MAX_VERTEX_BUFFERS],
    dirty_vertex_buffers: u64,
}

impl VulkanRenderSink {
    /// Dynamic state the pipelines declare but the user may never set
    fn set_dynamic_defaults(&mut self) {
        let device = &self.ctx.device;
        unsafe {
            device.cmd_set_depth_bias(self.command_buffer, 0.0, 0.0, 0.0);
            device.cmd_set_stencil_reference(self.command_buffer, vk::StencilFaceFlags::FRONT_AND_BACK, 0);
            device.cmd_set_blend_constants(self.command_buffer, &[0.0; 4]);
        }
        self.dynamic_defaults_set = true;
    }

    fn flush_vertex_buffers(&mut self) {
        let dirty = std::mem::take(&mut self.dirty_vertex_buffers);
        for run in vertex_buffer_runs(dirty, &self.vertex_buffers) {
            unsafe {
                self.ctx
                    .device
                    .cmd_bind_vertex_buffers(self.command_buffer, run.first_binding, &run.buffers, &run.offsets);
            }
        }
    }
}

fn downcast_buffer(buffer: &Arc<dyn Buffer>) -> Result<&VulkanBuffer> {
    buffer.as_any().downcast_ref::<VulkanBuffer>().ok_or_else(|| {
        hal_error!("prism::vulkan::RenderEncoder", "Buffer was not created by the Vulkan device");
        Error::InvalidResource("Buffer is not a Vulkan buffer".to_string())
    })
}

impl RenderBindingSink for VulkanRenderSink {
    fn bind_pipeline(&mut self, pipeline: &Arc<dyn RenderPipelineState>) -> Result<()> {
        let vk_pipeline = pipeline.as_any().downcast_ref::<VulkanRenderPipelineState>().ok_or_else(|| {
            hal_error!("prism::vulkan::RenderEncoder", "Pipeline was not created by the Vulkan device");
            Error::InvalidResource("Pipeline is not a Vulkan render pipeline".to_string())
        })?;
        unsafe {
            self.ctx
                .device
                .cmd_bind_pipeline(self.command_buffer, vk::PipelineBindPoint::GRAPHICS, vk_pipeline.vk_pipeline());
        }
        self.resources.set_pipeline(
            vk_pipeline.vk_pipeline_layout(),
            vk_pipeline.push_constant_stages(),
            pipeline.layout(),
        );
        if !self.dynamic_defaults_set {
            self.set_dynamic_defaults();
        }
        Ok(())
    }

    fn set_viewport(&mut self, viewport: &Viewport) -> Result<()> {
        let vk_viewport = vk::Viewport::default()
            .x(viewport.x)
            .y(viewport.y)
            .width(viewport.width)
            .height(viewport.height)
            .min_depth(viewport.min_depth)
            .max_depth(viewport.max_depth);
        unsafe { self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]) };
        Ok(())
    }

    fn set_scissor(&mut self, rect: &ScissorRect) -> Result<()> {
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: rect.x as i32, y: rect.y as i32 },
            extent: vk::Extent2D { width: rect.width, height: rect.height },
        };
        unsafe { self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &[scissor]) };
        Ok(())
    }

    fn set_depth_bias(&mut self, bias: &DepthBias) -> Result<()> {
        let clamp = if bias.clamp != 0.0 && !self.ctx.has_feature(DeviceFeatures::DEPTH_BIAS_CLAMP) {
            hal_warn!("prism::vulkan::RenderEncoder", "Depth bias clamp {} ignored (depthBiasClamp not enabled)", bias.clamp);
            0.0
        } else {
            bias.clamp
        };
        unsafe {
            self.ctx
                .device
                .cmd_set_depth_bias(self.command_buffer, bias.constant_factor, clamp, bias.slope_factor);
        }
        Ok(())
    }

    fn set_stencil_reference(&mut self, value: u32) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .cmd_set_stencil_reference(self.command_buffer, vk::StencilFaceFlags::FRONT_AND_BACK, value);
        }
        Ok(())
    }

    fn set_blend_color(&mut self, color: &Color) -> Result<()> {
        unsafe { self.ctx.device.cmd_set_blend_constants(self.command_buffer, &color.to_array()) };
        Ok(())
    }

    fn bind_buffer(&mut self, index: u32, binding: Option<&BufferBinding>) -> Result<()> {
        self.resources.bind_buffer(index, binding)
    }

    fn bind_vertex_buffer(&mut self, index: u32, binding: Option<&BufferBinding>) -> Result<()> {
        // Vulkan has no unbind; a cleared slot is simply not rebound
        self.vertex_buffers[index as usize] = match binding {
            Some(binding) => Some((downcast_buffer(&binding.buffer)?.vk_buffer(), binding.offset)),
            None => None,
        };
        self.dirty_vertex_buffers |= 1u64 << index;
        Ok(())
    }

    fn bind_index_buffer(&mut self, binding: &IndexBufferBinding) -> Result<()> {
        if binding.format == IndexFormat::UInt8 && !self.ctx.has_feature(DeviceFeatures::INDEX_UINT8) {
            hal_error!("prism::vulkan::RenderEncoder", "8-bit indices need VK_EXT_index_type_uint8");
            return Err(Error::FeatureUnavailable("8-bit index buffers".to_string()));
        }
        let buffer = downcast_buffer(&binding.buffer)?;
        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                self.command_buffer,
                buffer.vk_buffer(),
                binding.offset,
                index_type_to_vk(binding.format),
            );
        }
        Ok(())
    }

    // Vertex and fragment textures share the binding namespace of set 0
    fn bind_texture(&mut self, _stage: ShaderStage, index: u32, texture: Option<&TextureBinding>) -> Result<()> {
        self.resources.bind_texture(index, texture)
    }

    fn bind_sampler(&mut self, _stage: ShaderStage, index: u32, sampler: Option<&SamplerBinding>) -> Result<()> {
        self.resources.bind_sampler(index, sampler)
    }

    fn bind_uniform(&mut self, desc: &UniformDesc, _data: &[u8]) -> Result<()> {
        hal_warn!(
            "prism::vulkan::RenderEncoder",
            "Loose uniform at location {} ignored; use a uniform buffer or push constants",
            desc.location
        );
        Ok(())
    }

    fn bind_push_constants(&mut self, constants: &PushConstants) -> Result<()> {
        self.resources.push_constants(&self.ctx, self.command_buffer, constants)
    }

    fn end_flush(&mut self) -> Result<()> {
        self.flush_vertex_buffers();
        self.resources.flush(&self.ctx, self.command_buffer)
    }
}

/// Vulkan render command encoder (one render pass)
pub struct VulkanRenderCommandEncoder<'a> {
    command_buffer: &'a mut VulkanCommandBuffer,
    state: RenderBindingState,
    sink: VulkanRenderSink,
}

impl<'a> VulkanRenderCommandEncoder<'a> {
    /// Wrap a command buffer whose render pass has just begun
    pub(crate) fn new(command_buffer: &'a mut VulkanCommandBuffer, extent: vk::Extent2D) -> Self {
        let sink = VulkanRenderSink {
            ctx: Arc::clone(command_buffer.ctx()),
            command_buffer: command_buffer.vk_command_buffer(),
            resources: ResourceBinder::new(vk::PipelineBindPoint::GRAPHICS, command_buffer.default_sampler()),
            dynamic_defaults_set: false,
            vertex_buffers: [None; MAX_VERTEX_BUFFERS],
            dirty_vertex_buffers: 0,
        };

        let mut state = RenderBindingState::new();
        state.begin();
        // Viewport and scissor are dynamic: default to the whole render area
        state.bind_viewport(Viewport::new(extent.width as f32, extent.height as f32));
        state.bind_scissor(ScissorRect { x: 0, y: 0, width: extent.width, height: extent.height });

        Self { command_buffer, state, sink }
    }

    fn debug_label(label: &str, color: Color) -> Option<(CString, [f32; 4])> {
        CString::new(label).ok().map(|name| (name, color.to_array()))
    }
}

impl RenderCommandEncoder for VulkanRenderCommandEncoder<'_> {
    fn end_encoding(&mut self) -> Result<()> {
        self.state.end();
        unsafe { self.sink.ctx.device.cmd_end_render_pass(self.sink.command_buffer) };
        Ok(())
    }

    fn bind_render_pipeline_state(&mut self, pipeline: &Arc<dyn RenderPipelineState>) {
        self.state.bind_pipeline(pipeline);
    }

    fn bind_viewport(&mut self, viewport: Viewport) {
        self.state.bind_viewport(viewport);
    }

    fn bind_scissor_rect(&mut self, rect: ScissorRect) {
        self.state.bind_scissor(rect);
    }

    fn set_depth_bias(&mut self, bias: DepthBias) {
        self.state.set_depth_bias(bias);
    }

    fn set_stencil_reference_value(&mut self, value: u32) {
        self.state.set_stencil_reference(value);
    }

    fn set_blend_color(&mut self, color: Color) {
        self.state.set_blend_color(color);
    }

    fn bind_vertex_buffer(&mut self, index: u32, buffer: &Arc<dyn Buffer>, offset: u64) {
        self.state.bind_vertex_buffer(index, Some(BufferBinding { buffer: Arc::clone(buffer), offset, size: 0 }));
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, format: IndexFormat, offset: u64) {
        self.state.bind_index_buffer(IndexBufferBinding { buffer: Arc::clone(buffer), format, offset });
    }

    fn bind_buffer(&mut self, index: u32, buffer: &Arc<dyn Buffer>, offset: u64, size: u64) {
        self.state.bind_buffer(index, Some(BufferBinding { buffer: Arc::clone(buffer), offset, size }));
    }

    fn bind_texture(&mut self, index: u32, target: BindTarget, texture: Option<&Arc<dyn Texture>>) {
        self.state.bind_texture(index, target, texture.map(|t| TextureBinding(Arc::clone(t))));
    }

    fn bind_sampler_state(&mut self, index: u32, target: BindTarget, sampler: Option<&Arc<dyn SamplerState>>) {
        self.state.bind_sampler(index, target, sampler.map(|s| SamplerBinding(Arc::clone(s))));
    }

    fn bind_uniform(&mut self, desc: &UniformDesc, data: &[u8]) {
        self.state.bind_uniform(desc, data);
    }

    fn bind_push_constants(&mut self, offset: u32, data: &[u8]) {
        self.state.bind_push_constants(offset, data);
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, base_instance: u32) -> Result<()> {
        self.state.flush(&mut self.sink)?;
        unsafe {
            self.sink.ctx.device.cmd_draw(
                self.sink.command_buffer,
                vertex_count,
                instance_count,
                first_vertex,
                base_instance,
            );
        }
        self.command_buffer.record_draw();
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        base_instance: u32,
    ) -> Result<()> {
        if self.state.index_buffer().is_none() {
            hal_error!("prism::vulkan::RenderEncoder", "draw_indexed without an index buffer");
            return Err(Error::InvalidResource("No index buffer bound".to_string()));
        }
        self.state.flush(&mut self.sink)?;
        unsafe {
            self.sink.ctx.device.cmd_draw_indexed(
                self.sink.command_buffer,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                base_instance,
            );
        }
        self.command_buffer.record_draw();
        Ok(())
    }

    fn push_debug_group_label(&mut self, label: &str, color: Color) {
        let Some(debug_utils) = &self.sink.ctx.debug_utils else { return };
        let Some((name, color)) = Self::debug_label(label, color) else { return };
        let label = vk::DebugUtilsLabelEXT::default().label_name(&name).color(color);
        unsafe { debug_utils.cmd_begin_debug_utils_label(self.sink.command_buffer, &label) };
    }

    fn insert_debug_event_label(&mut self, label: &str, color: Color) {
        let Some(debug_utils) = &self.sink.ctx.debug_utils else { return };
        let Some((name, color)) = Self::debug_label(label, color) else { return };
        let label = vk::DebugUtilsLabelEXT::default().label_name(&name).color(color);
        unsafe { debug_utils.cmd_insert_debug_utils_label(self.sink.command_buffer, &label) };
    }

    fn pop_debug_group_label(&mut self) {
        let Some(debug_utils) = &self.sink.ctx.debug_utils else { return };
        unsafe { debug_utils.cmd_end_debug_utils_label(self.sink.command_buffer) };
    }
}

impl Drop for VulkanRenderCommandEncoder<'_> {
    fn drop(&mut self) {
        if self.state.state() == EncoderState::Encoding {
            hal_warn!("prism::vulkan::RenderEncoder", "Encoder dropped without end_encoding, closing the render pass");
            let _ = self.end_encoding();
        }
    }
}

#[cfg(test)]
#[path = "vulkan_render_encoder_tests.rs"]
mod tests;
