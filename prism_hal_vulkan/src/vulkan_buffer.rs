/// Buffer - Vulkan implementation of the Buffer trait
///
/// Shared buffers live in host-visible memory and are written through the
/// persistent mapping. Private buffers are device-local; uploads go through a
/// temporary staging buffer and a one-shot copy.

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use gpu_allocator::MemoryLocation;
use std::any::Any;
use std::sync::{Arc, Mutex, PoisonError};
use prism_hal::hal_error;
use prism_hal::prism::{Error, Result};
use prism_hal::prism::device::{Buffer, BufferDesc, BufferUsage, StorageMode};
use crate::vulkan_context::VulkanContext;
use crate::vulkan_conversions::{buffer_usage_to_vk, native_error};

/// Raw buffer + allocation pair, freed on drop
pub(crate) struct RawBuffer {
    ctx: Arc<VulkanContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
}

impl RawBuffer {
    pub(crate) fn new(
        ctx: &Arc<VulkanContext>,
        size: u64,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
        name: &str,
    ) -> Result<Self> {
        let buffer_info = vk::BufferCreateInfo::default()
            .size(size.max(1))
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        unsafe {
            let buffer = ctx.device.create_buffer(&buffer_info, None).map_err(|e| native_error("buffer", e))?;
            let requirements = ctx.device.get_buffer_memory_requirements(buffer);

            let allocation = match ctx.allocate(name, requirements, location, true) {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            if let Err(e) = ctx.device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) {
                ctx.free(allocation);
                ctx.device.destroy_buffer(buffer, None);
                return Err(native_error("buffer memory binding", e));
            }

            ctx.set_debug_name(buffer, name);
            Ok(Self { ctx: Arc::clone(ctx), buffer, allocation: Some(allocation) })
        }
    }

    /// Copy `data` into the mapped memory at `offset`
    pub(crate) fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mapped = self
            .allocation
            .as_ref()
            .and_then(|a| a.mapped_ptr())
            .ok_or_else(|| Error::BackendError("Buffer is not CPU-accessible".to_string()))?;
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), (mapped.as_ptr() as *mut u8).add(offset as usize), data.len());
        }
        Ok(())
    }
}

impl Drop for RawBuffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            self.ctx.free(allocation);
        }
        unsafe { self.ctx.device.destroy_buffer(self.buffer, None) };
    }
}

/// Vulkan buffer
pub struct VulkanBuffer {
    ctx: Arc<VulkanContext>,
    raw: RawBuffer,
    size: u64,
    usage: BufferUsage,
    storage: StorageMode,
    /// Serializes staging copies into private memory
    upload_lock: Mutex<()>,
}

impl VulkanBuffer {
    pub fn new(ctx: &Arc<VulkanContext>, desc: &BufferDesc) -> Result<Self> {
        if desc.size == 0 {
            hal_error!("prism::vulkan::Buffer", "Buffer '{}' has size 0", desc.debug_name);
            return Err(Error::InvalidResource("Buffer size must be non-zero".to_string()));
        }

        let location = match desc.storage {
            StorageMode::Shared => MemoryLocation::CpuToGpu,
            StorageMode::Private => MemoryLocation::GpuOnly,
        };
        let raw = RawBuffer::new(ctx, desc.size, buffer_usage_to_vk(desc.usage), location, &desc.debug_name)?;

        let buffer = Self {
            ctx: Arc::clone(ctx),
            raw,
            size: desc.size,
            usage: desc.usage,
            storage: desc.storage,
            upload_lock: Mutex::new(()),
        };
        if !desc.data.is_empty() {
            buffer.upload(0, &desc.data)?;
        }
        Ok(buffer)
    }

    pub fn vk_buffer(&self) -> vk::Buffer {
        self.raw.buffer
    }

    pub fn storage(&self) -> StorageMode {
        self.storage
    }

    fn upload_staged(&self, offset: u64, data: &[u8]) -> Result<()> {
        let _guard = self.upload_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let staging = RawBuffer::new(
            &self.ctx,
            data.len() as u64,
            vk::BufferUsageFlags::TRANSFER_SRC,
            MemoryLocation::CpuToGpu,
            "staging",
        )?;
        staging.write(0, data)?;

        let region = vk::BufferCopy::default().src_offset(0).dst_offset(offset).size(data.len() as u64);
        self.ctx.submit_immediate(|cmd| unsafe {
            self.ctx.device.cmd_copy_buffer(cmd, staging.buffer, self.raw.buffer, &[region]);
        })
    }
}

impl Buffer for VulkanBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn upload(&self, offset: u64, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        if offset + data.len() as u64 > self.size {
            hal_error!(
                "prism::vulkan::Buffer",
                "Upload of {} bytes at offset {} exceeds buffer size {}",
                data.len(),
                offset,
                self.size
            );
            return Err(Error::InvalidResource("Buffer upload out of range".to_string()));
        }
        match self.storage {
            StorageMode::Shared => self.raw.write(offset, data),
            StorageMode::Private => self.upload_staged(offset, data),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
