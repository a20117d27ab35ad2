use super::{memory::DeviceMemory, status::DeviceStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemcpyKind {
    HostToDevice,
    DeviceToHost,
}

/// Destination and source of one directional copy.
pub enum Memcpy<'a, M: DeviceMemory + ?Sized> {
    HostToDevice { dst: &'a mut M, src: &'a [u8] },
    DeviceToHost { dst: &'a mut [u8], src: &'a M },
}

impl<M: DeviceMemory + ?Sized> Memcpy<'_, M> {
    pub fn kind(&self) -> MemcpyKind {
        match self {
            Memcpy::HostToDevice { .. } => MemcpyKind::HostToDevice,
            Memcpy::DeviceToHost { .. } => MemcpyKind::DeviceToHost,
        }
    }
}

/// Synchronously copy `byte_count` bytes between host and device memory.
///
/// Sizes are validated up front, so a failed copy never writes a partial range.
pub fn memcpy<M: DeviceMemory + ?Sized>(copy: Memcpy<'_, M>, byte_count: usize) -> DeviceStatus {
    let kind = copy.kind();

    let result = match copy {
        Memcpy::HostToDevice { dst, src } => {
            if byte_count > src.len() || byte_count > dst.len_bytes() {
                tracing::debug!(
                    "memcpy {:?}: {} bytes requested, host has {}, {} has {}",
                    kind,
                    byte_count,
                    src.len(),
                    dst.location_string(),
                    dst.len_bytes()
                );
                return DeviceStatus::InvalidValue;
            }
            dst.write_bytes(0, &src[..byte_count])
        }
        Memcpy::DeviceToHost { dst, src } => {
            if byte_count > dst.len() || byte_count > src.len_bytes() {
                tracing::debug!(
                    "memcpy {:?}: {} bytes requested, host has {}, {} has {}",
                    kind,
                    byte_count,
                    dst.len(),
                    src.location_string(),
                    src.len_bytes()
                );
                return DeviceStatus::InvalidValue;
            }
            src.read_bytes(0, &mut dst[..byte_count])
        }
    };

    match result {
        Ok(()) => DeviceStatus::Success,
        Err(e) => {
            tracing::warn!("memcpy {:?} of {} bytes failed: {}", kind, byte_count, e);
            DeviceStatus::from(&e)
        }
    }
}
