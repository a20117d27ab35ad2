//! Strided batch vectors - host-side staging of batched vector data for accelerator tests
//!
//! A batch of equally shaped vectors lives in one allocation laid out either as blocks
//! (one stride-sized slot per vector) or interleaved (element `j` of every vector grouped
//! together). The host container checks that the vectors cannot overlap, maps batch and
//! element indices onto the shared buffer, and moves data to and from a device-resident
//! counterpart backed by Vulkan or by an emulated device.

pub mod device;

pub mod error;

pub mod gpu;

pub mod host;

pub mod layout;


pub use device::{
    DeviceAllocator, DeviceMemory, DeviceStatus, DeviceStridedBatchVector, EmulatedDevice,
};
pub use error::BatchError;
pub use gpu::{Gpu, GpuConfig};
pub use host::{BatchView, BatchViewMut, HostStridedBatchVector};
pub use layout::{BatchShape, StorageLayout};
