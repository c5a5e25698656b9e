/// ComputeCommandEncoder for Vulkan
///
/// Dispatches run outside render passes. `end_encoding` records a memory
/// barrier so later passes see what the shaders wrote.

use ash::vk;
use std::ffi::CString;
use std::sync::Arc;
use prism_hal::{hal_error, hal_trace, hal_warn};
use prism_hal::prism::{Error, Result};
use prism_hal::prism::device::{
    Buffer, Color, ComputeCommandEncoder, ComputePipelineState, Dimensions, Texture, UniformDesc,
};
use prism_hal::prism::state::{
    BufferBinding, ComputeBindingSink, ComputeBindingState, EncoderState, PushConstants, TextureBinding,
};
use crate::vulkan_command_buffer::VulkanCommandBuffer;
use crate::vulkan_context::VulkanContext;
use crate::vulkan_pipeline::VulkanComputePipelineState;
use crate::vulkan_resource_binder::ResourceBinder;

struct VulkanComputeSink {
    ctx: Arc<VulkanContext>,
    command_buffer: vk::CommandBuffer,
    resources: ResourceBinder,
}

impl ComputeBindingSink for VulkanComputeSink {
    fn bind_pipeline(&mut self, pipeline: &Arc<dyn ComputePipelineState>) -> Result<()> {
        let vk_pipeline = pipeline.as_any().downcast_ref::<VulkanComputePipelineState>().ok_or_else(|| {
            hal_error!("prism::vulkan::ComputeEncoder", "Pipeline was not created by the Vulkan device");
            Error::InvalidResource("Pipeline is not a Vulkan compute pipeline".to_string())
        })?;
        unsafe {
            self.ctx
                .device
                .cmd_bind_pipeline(self.command_buffer, vk::PipelineBindPoint::COMPUTE, vk_pipeline.vk_pipeline());
        }
        self.resources.set_pipeline(
            vk_pipeline.vk_pipeline_layout(),
            vk_pipeline.push_constant_stages(),
            pipeline.layout(),
        );
        Ok(())
    }

    fn bind_buffer(&mut self, index: u32, binding: Option<&BufferBinding>) -> Result<()> {
        self.resources.bind_buffer(index, binding)
    }

    fn bind_texture(&mut self, index: u32, texture: Option<&TextureBinding>) -> Result<()> {
        self.resources.bind_texture(index, texture)
    }

    fn bind_uniform(&mut self, desc: &UniformDesc, _data: &[u8]) -> Result<()> {
        hal_warn!("prism::vulkan::ComputeEncoder", "Loose uniform at location {} ignored", desc.location);
        Ok(())
    }

    fn bind_push_constants(&mut self, constants: &PushConstants) -> Result<()> {
        self.resources.push_constants(&self.ctx, self.command_buffer, constants)
    }

    fn end_flush(&mut self) -> Result<()> {
        self.resources.flush(&self.ctx, self.command_buffer)
    }
}

/// Vulkan compute command encoder
pub struct VulkanComputeCommandEncoder<'a> {
    // Held for the exclusive borrow: no other encoder may record meanwhile
    _command_buffer: &'a mut VulkanCommandBuffer,
    state: ComputeBindingState,
    sink: VulkanComputeSink,
}

impl<'a> VulkanComputeCommandEncoder<'a> {
    pub(crate) fn new(command_buffer: &'a mut VulkanCommandBuffer) -> Self {
        let sink = VulkanComputeSink {
            ctx: Arc::clone(command_buffer.ctx()),
            command_buffer: command_buffer.vk_command_buffer(),
            resources: ResourceBinder::new(vk::PipelineBindPoint::COMPUTE, command_buffer.default_sampler()),
        };
        let mut state = ComputeBindingState::new();
        state.begin();
        Self { _command_buffer: command_buffer, state, sink }
    }
}

impl ComputeCommandEncoder for VulkanComputeCommandEncoder<'_> {
    fn end_encoding(&mut self) -> Result<()> {
        self.state.end();
        let barrier = vk::MemoryBarrier::default()
            .src_access_mask(vk::AccessFlags::SHADER_WRITE)
            .dst_access_mask(vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE);
        unsafe {
            self.sink.ctx.device.cmd_pipeline_barrier(
                self.sink.command_buffer,
                vk::PipelineStageFlags::COMPUTE_SHADER,
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::DependencyFlags::empty(),
                &[barrier],
                &[],
                &[],
            );
        }
        Ok(())
    }

    fn bind_compute_pipeline_state(&mut self, pipeline: &Arc<dyn ComputePipelineState>) {
        self.state.bind_pipeline(pipeline);
    }

    fn bind_buffer(&mut self, index: u32, buffer: &Arc<dyn Buffer>, offset: u64, size: u64) {
        self.state.bind_buffer(index, Some(BufferBinding { buffer: Arc::clone(buffer), offset, size }));
    }

    fn bind_texture(&mut self, index: u32, texture: Option<&Arc<dyn Texture>>) {
        self.state.bind_texture(index, texture.map(|t| TextureBinding(Arc::clone(t))));
    }

    fn bind_uniform(&mut self, desc: &UniformDesc, data: &[u8]) {
        self.state.bind_uniform(desc, data);
    }

    fn bind_push_constants(&mut self, offset: u32, data: &[u8]) {
        self.state.bind_push_constants(offset, data);
    }

    /// The workgroup size is compiled into the shader; `thread_group_size` is ignored
    fn dispatch_thread_groups(&mut self, thread_group_count: Dimensions, thread_group_size: Dimensions) -> Result<()> {
        self.state.flush(&mut self.sink)?;
        hal_trace!(
            "prism::vulkan::ComputeEncoder",
            "Dispatch {:?} (group size {:?} comes from the shader)",
            thread_group_count,
            thread_group_size
        );
        unsafe {
            self.sink.ctx.device.cmd_dispatch(
                self.sink.command_buffer,
                thread_group_count.width,
                thread_group_count.height,
                thread_group_count.depth,
            );
        }
        Ok(())
    }

    fn push_debug_group_label(&mut self, label: &str, color: Color) {
        let Some(debug_utils) = &self.sink.ctx.debug_utils else { return };
        let Ok(name) = CString::new(label) else { return };
        let label = vk::DebugUtilsLabelEXT::default().label_name(&name).color(color.to_array());
        unsafe { debug_utils.cmd_begin_debug_utils_label(self.sink.command_buffer, &label) };
    }

    fn insert_debug_event_label(&mut self, label: &str, color: Color) {
        let Some(debug_utils) = &self.sink.ctx.debug_utils else { return };
        let Ok(name) = CString::new(label) else { return };
        let label = vk::DebugUtilsLabelEXT::default().label_name(&name).color(color.to_array());
        unsafe { debug_utils.cmd_insert_debug_utils_label(self.sink.command_buffer, &label) };
    }

    fn pop_debug_group_label(&mut self) {
        let Some(debug_utils) = &self.sink.ctx.debug_utils else { return };
        unsafe { debug_utils.cmd_end_debug_utils_label(self.sink.command_buffer) };
    }
}

impl Drop for VulkanComputeCommandEncoder<'_> {
    fn drop(&mut self) {
        if self.state.state() == EncoderState::Encoding {
            hal_warn!("prism::vulkan::ComputeEncoder", "Encoder dropped without end_encoding");
            let _ = self.end_encoding();
        }
    }
}
