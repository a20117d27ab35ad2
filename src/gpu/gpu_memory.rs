use std::sync::Arc;

use vulkanalia::vk::{self, DeviceV1_0, Handle};

use crate::{
    device::{DeviceMemory, check_range},
    error::BatchError,
};

use super::vk_gpu::Gpu;

/// A host-visible Vulkan buffer and its backing allocation.
///
/// Holds its [`Gpu`] so the device outlives every allocation made on it.
pub struct GPUMemory {
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
    properties: vk::MemoryPropertyFlags,
    gpu: Arc<Gpu>,
}

impl GPUMemory {
    pub(crate) fn new(
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        size: vk::DeviceSize,
        properties: vk::MemoryPropertyFlags,
        gpu: Arc<Gpu>,
    ) -> Self {
        Self {
            buffer,
            memory,
            size,
            properties,
            gpu,
        }
    }

    pub fn buffer(&self) -> vk::Buffer {
        self.buffer
    }

    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    pub fn properties(&self) -> vk::MemoryPropertyFlags {
        self.properties
    }

    /// Copy raw bytes into GPU memory at `offset`.
    pub fn copy_into(&self, offset: usize, data: &[u8]) -> Result<(), BatchError> {
        check_range(offset, data.len(), self.size as usize)?;
        if data.is_empty() {
            return Ok(());
        }

        let device = self.gpu.get_device();
        unsafe {
            let data_ptr = device.map_memory(
                self.memory,
                offset as vk::DeviceSize,
                data.len() as vk::DeviceSize,
                vk::MemoryMapFlags::empty(),
            )? as *mut u8;

            std::ptr::copy_nonoverlapping(data.as_ptr(), data_ptr, data.len());

            device.unmap_memory(self.memory);
        }

        Ok(())
    }

    /// Read raw bytes from GPU memory at `offset` into `dst`.
    pub fn read_into(&self, offset: usize, dst: &mut [u8]) -> Result<(), BatchError> {
        check_range(offset, dst.len(), self.size as usize)?;
        if dst.is_empty() {
            return Ok(());
        }

        let device = self.gpu.get_device();
        unsafe {
            let data_ptr = device.map_memory(
                self.memory,
                offset as vk::DeviceSize,
                dst.len() as vk::DeviceSize,
                vk::MemoryMapFlags::empty(),
            )? as *const u8;

            std::ptr::copy_nonoverlapping(data_ptr, dst.as_mut_ptr(), dst.len());

            device.unmap_memory(self.memory);
        }

        Ok(())
    }

    /// Read the whole buffer.
    pub fn read_memory(&self) -> Result<Vec<u8>, BatchError> {
        let mut output_data = vec![0u8; self.size as usize];
        self.read_into(0, &mut output_data)?;
        Ok(output_data)
    }
}

impl DeviceMemory for GPUMemory {
    // Vulkan 1.0 has no buffer device addresses; the buffer handle identifies the region.
    fn device_addr(&self) -> u64 {
        self.buffer.as_raw()
    }

    fn len_bytes(&self) -> usize {
        self.size as usize
    }

    fn read_bytes(&self, offset: usize, dst: &mut [u8]) -> Result<(), BatchError> {
        self.read_into(offset, dst)
    }

    fn write_bytes(&mut self, offset: usize, src: &[u8]) -> Result<(), BatchError> {
        self.copy_into(offset, src)
    }

    fn location_string(&self) -> String {
        format!("GPU {} Memory", self.gpu.device_index())
    }
}

impl Drop for GPUMemory {
    fn drop(&mut self) {
        let device = self.gpu.get_device();
        unsafe {
            device.destroy_buffer(self.buffer, None);
            device.free_memory(self.memory, None);
        }
        self.gpu.memory_tracker().deallocate(self.size);
    }
}

impl std::fmt::Debug for GPUMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GPUMemory")
            .field("buffer", &self.buffer)
            .field("size", &self.size)
            .field("properties", &self.properties)
            .field("gpu", &self.gpu.device_index())
            .finish()
    }
}
