use std::marker::PhantomData;

use bytemuck::Pod;

use crate::host::HostStridedBatchVector;
use crate::layout::{BatchShape, StorageLayout};

use super::memcpy::{Memcpy, memcpy};
use super::memory::{DeviceAllocator, DeviceMemory};
use super::status::DeviceStatus;

/// Device-resident counterpart of [`HostStridedBatchVector`].
///
/// Shares the host container's shape rules: the region is allocated once at
/// construction when the shape is valid, and released when the vector is dropped.
pub struct DeviceStridedBatchVector<T: Pod, M: DeviceMemory> {
    shape: BatchShape,
    element_total: usize,
    memory: Option<M>,
    _marker: PhantomData<T>,
}

impl<T: Pod, M: DeviceMemory> DeviceStridedBatchVector<T, M> {
    pub fn new<A>(
        allocator: &A,
        n: i64,
        inc: i64,
        stride: i64,
        batch_count: i64,
        layout: StorageLayout,
    ) -> Self
    where
        A: DeviceAllocator<Memory = M>,
    {
        Self::with_shape(allocator, BatchShape::new(n, inc, stride, batch_count, layout))
    }

    pub fn with_shape<A>(allocator: &A, shape: BatchShape) -> Self
    where
        A: DeviceAllocator<Memory = M>,
    {
        let element_total = shape.element_total();
        let memory = if shape.is_valid() {
            match element_total.checked_mul(std::mem::size_of::<T>()) {
                Some(bytes) => match allocator.allocate(bytes) {
                    Ok(memory) => Some(memory),
                    Err(e) => {
                        tracing::debug!("device allocation of {bytes} bytes failed: {e}");
                        None
                    }
                },
                None => None,
            }
        } else {
            tracing::debug!("device batch vector left unallocated for invalid shape {shape:?}");
            None
        };

        Self {
            shape,
            element_total,
            memory,
            _marker: PhantomData,
        }
    }

    pub fn shape(&self) -> &BatchShape {
        &self.shape
    }

    pub fn n(&self) -> i64 {
        self.shape.n()
    }

    pub fn inc(&self) -> i64 {
        self.shape.inc()
    }

    pub fn stride(&self) -> i64 {
        self.shape.stride()
    }

    pub fn batch_count(&self) -> i64 {
        self.shape.batch_count()
    }

    pub fn layout(&self) -> StorageLayout {
        self.shape.layout()
    }

    pub fn element_total(&self) -> usize {
        self.element_total
    }

    pub fn is_valid(&self) -> bool {
        self.memory.is_some()
    }

    pub fn memory(&self) -> Option<&M> {
        self.memory.as_ref()
    }

    pub fn memory_mut(&mut self) -> Option<&mut M> {
        self.memory.as_mut()
    }

    pub fn device_addr(&self) -> Option<u64> {
        self.memory.as_ref().map(|m| m.device_addr())
    }

    pub fn memcheck(&self) -> DeviceStatus {
        if self.is_valid() {
            DeviceStatus::Success
        } else {
            DeviceStatus::OutOfMemory
        }
    }

    /// Upload the whole host buffer, `element_total * size_of::<T>()` bytes of `host`.
    pub fn transfer_from(&mut self, host: &HostStridedBatchVector<T>) -> DeviceStatus {
        let (Some(memory), Some(src)) = (self.memory.as_mut(), host.as_bytes()) else {
            return DeviceStatus::OutOfMemory;
        };

        let byte_count = src.len();
        memcpy(Memcpy::HostToDevice { dst: memory, src }, byte_count)
    }
}

impl<T: Pod, M: DeviceMemory> std::fmt::Debug for DeviceStridedBatchVector<T, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceStridedBatchVector")
            .field("shape", &self.shape)
            .field("element_total", &self.element_total)
            .field("device_addr", &self.device_addr())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::emulated::EmulatedDevice;

    #[test]
    fn allocates_for_valid_shape() {
        let device = EmulatedDevice::new();
        let dvec = DeviceStridedBatchVector::<f32, _>::new(&device, 4, 1, 4, 3, StorageLayout::Block);
        assert!(dvec.is_valid());
        assert_eq!(dvec.element_total(), 12);
        assert_eq!(dvec.memory().unwrap().len_bytes(), 48);
        assert_eq!(dvec.memcheck(), DeviceStatus::Success);
        assert_eq!(device.used_bytes(), 48);
    }

    #[test]
    fn invalid_shape_is_null() {
        let device = EmulatedDevice::new();
        let dvec = DeviceStridedBatchVector::<f32, _>::new(&device, 4, 1, 2, 3, StorageLayout::Block);
        assert!(!dvec.is_valid());
        assert_eq!(dvec.device_addr(), None);
        assert_eq!(dvec.memcheck(), DeviceStatus::OutOfMemory);
        assert_eq!(device.used_bytes(), 0);
    }

    #[test]
    fn exhausted_device_is_null() {
        let device = EmulatedDevice::with_capacity(16);
        let dvec = DeviceStridedBatchVector::<f64, _>::new(&device, 4, 1, 4, 3, StorageLayout::Block);
        assert!(!dvec.is_valid());
        assert_eq!(dvec.memcheck(), DeviceStatus::OutOfMemory);
    }

    #[test]
    fn upload_from_null_host_is_out_of_memory() {
        let device = EmulatedDevice::new();
        let mut dvec =
            DeviceStridedBatchVector::<i32, _>::new(&device, 4, 1, 4, 3, StorageLayout::Block);
        let host = HostStridedBatchVector::<i32>::new(4, 1, 2, 3, StorageLayout::Block);
        assert_eq!(dvec.transfer_from(&host), DeviceStatus::OutOfMemory);
    }
}
