//! Accelerator-side collaborators: device memory regions, the directional copy
//! primitive and the device counterpart of the host batch vector.

mod emulated;
mod memcpy;
mod memory;
mod memory_tracker;
mod status;
mod strided_batch_vector;

pub use emulated::{EmulatedDevice, EmulatedMemory};
pub use memcpy::{Memcpy, MemcpyKind, memcpy};
pub use memory::{DeviceAllocator, DeviceMemory};
pub use memory_tracker::MemoryTracker;
pub use status::DeviceStatus;
pub use strided_batch_vector::DeviceStridedBatchVector;

pub(crate) use memory::check_range;
