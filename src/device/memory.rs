use crate::error::BatchError;

/// A region of accelerator-resident memory.
///
/// Offsets and lengths are in bytes. Implementations validate ranges and return
/// [`BatchError::SizeMismatch`] before touching memory.
pub trait DeviceMemory {
    /// Base address of the region in the device address space. Backends without
    /// addressable memory return an opaque handle value.
    fn device_addr(&self) -> u64;

    fn len_bytes(&self) -> usize;

    /// Copy `dst.len()` bytes starting at `offset` into host memory.
    fn read_bytes(&self, offset: usize, dst: &mut [u8]) -> Result<(), BatchError>;

    /// Copy `src` into the region starting at `offset`.
    fn write_bytes(&mut self, offset: usize, src: &[u8]) -> Result<(), BatchError>;

    fn location_string(&self) -> String;
}

/// Something able to hand out [`DeviceMemory`] regions.
pub trait DeviceAllocator {
    type Memory: DeviceMemory;

    fn allocate(&self, bytes: usize) -> Result<Self::Memory, BatchError>;
}

pub(crate) fn check_range(offset: usize, len: usize, size: usize) -> Result<(), BatchError> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(BatchError::SizeMismatch {
            expected: size.saturating_sub(offset),
            actual: len,
        }),
    }
}
