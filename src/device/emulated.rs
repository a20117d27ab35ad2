use std::sync::Arc;

use crate::error::BatchError;

use super::memory::{DeviceAllocator, DeviceMemory, check_range};
use super::memory_tracker::MemoryTracker;

/// Device stand-in backed by system memory.
///
/// Useful where no accelerator is present; an optional capacity makes allocations
/// beyond it fail the same way an exhausted device would.
pub struct EmulatedDevice {
    tracker: Arc<MemoryTracker>,
}

impl EmulatedDevice {
    pub fn new() -> Self {
        Self::with_capacity(u64::MAX)
    }

    pub fn with_capacity(bytes: u64) -> Self {
        Self {
            tracker: Arc::new(MemoryTracker::new(bytes)),
        }
    }

    pub fn used_bytes(&self) -> u64 {
        self.tracker.get_current()
    }

    pub fn available_bytes(&self) -> u64 {
        self.tracker.get_available()
    }
}

impl Default for EmulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceAllocator for EmulatedDevice {
    type Memory = EmulatedMemory;

    fn allocate(&self, bytes: usize) -> Result<EmulatedMemory, BatchError> {
        self.tracker.allocate(bytes as u64)?;

        let mut data = Vec::new();
        if let Err(e) = data.try_reserve_exact(bytes) {
            self.tracker.deallocate(bytes as u64);
            return Err(BatchError::OutOfMemory(e.to_string()));
        }
        data.resize(bytes, 0u8);

        Ok(EmulatedMemory {
            data: data.into_boxed_slice(),
            tracker: Arc::clone(&self.tracker),
        })
    }
}

pub struct EmulatedMemory {
    data: Box<[u8]>,
    tracker: Arc<MemoryTracker>,
}

impl DeviceMemory for EmulatedMemory {
    fn device_addr(&self) -> u64 {
        self.data.as_ptr() as u64
    }

    fn len_bytes(&self) -> usize {
        self.data.len()
    }

    fn read_bytes(&self, offset: usize, dst: &mut [u8]) -> Result<(), BatchError> {
        check_range(offset, dst.len(), self.data.len())?;
        dst.copy_from_slice(&self.data[offset..offset + dst.len()]);
        Ok(())
    }

    fn write_bytes(&mut self, offset: usize, src: &[u8]) -> Result<(), BatchError> {
        check_range(offset, src.len(), self.data.len())?;
        self.data[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }

    fn location_string(&self) -> String {
        "Emulated Device".to_string()
    }
}

impl Drop for EmulatedMemory {
    fn drop(&mut self) {
        self.tracker.deallocate(self.data.len() as u64);
    }
}

impl std::fmt::Debug for EmulatedMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmulatedMemory")
            .field("addr", &self.device_addr())
            .field("size", &self.len_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_tracked_and_released() {
        let device = EmulatedDevice::with_capacity(1024);
        let memory = device.allocate(512).unwrap();
        assert_eq!(memory.len_bytes(), 512);
        assert_eq!(device.used_bytes(), 512);
        drop(memory);
        assert_eq!(device.used_bytes(), 0);
        assert_eq!(device.available_bytes(), 1024);
    }

    #[test]
    fn over_capacity_is_out_of_memory() {
        let device = EmulatedDevice::with_capacity(256);
        let err = device.allocate(257).unwrap_err();
        assert!(matches!(err, BatchError::OutOfMemory(_)));
        assert_eq!(device.used_bytes(), 0);
    }

    #[test]
    fn reads_and_writes_are_range_checked() {
        let device = EmulatedDevice::new();
        let mut memory = device.allocate(8).unwrap();
        memory.write_bytes(4, &[1, 2, 3, 4]).unwrap();

        let mut out = [0u8; 4];
        memory.read_bytes(4, &mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4]);

        assert!(matches!(
            memory.write_bytes(6, &[0; 4]),
            Err(BatchError::SizeMismatch { .. })
        ));
        assert!(memory.read_bytes(usize::MAX, &mut out).is_err());
    }
}
