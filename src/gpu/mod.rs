mod config;
mod gpu_memory;
mod vk_gpu;

pub use config::GpuConfig;
pub use gpu_memory::GPUMemory;
pub use vk_gpu::Gpu;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceMemory, DeviceStatus, DeviceStridedBatchVector};
    use crate::host::HostStridedBatchVector;
    use crate::layout::StorageLayout;

    // Machines without a Vulkan loader or device skip these tests.
    fn try_gpu() -> Option<std::sync::Arc<Gpu>> {
        match Gpu::new(GpuConfig::default()) {
            Ok(gpu) => Some(gpu),
            Err(e) => {
                eprintln!("skipping Vulkan test: {e}");
                None
            }
        }
    }

    #[test]
    fn gpu_memory_round_trip() {
        let Some(gpu) = try_gpu() else {
            return;
        };

        let mut memory = Gpu::allocate_host_visible(&gpu, 64).unwrap();
        assert_eq!(memory.len_bytes(), 64);
        assert!(gpu.available_memory() < gpu.memory_total());

        let pattern: Vec<u8> = (0..64).collect();
        memory.write_bytes(0, &pattern).unwrap();
        assert_eq!(memory.read_memory().unwrap(), pattern);

        assert!(memory.write_bytes(60, &[0; 8]).is_err());

        drop(memory);
        assert_eq!(gpu.available_memory(), gpu.memory_total());
    }

    #[test]
    fn batch_vector_round_trip_through_gpu() {
        let Some(gpu) = try_gpu() else {
            return;
        };

        let mut host = HostStridedBatchVector::<f32>::block(5, -2, -11, 4);
        assert!(host.fill_with(|b, j| (b * 100 + j) as f32));

        let mut dvec = DeviceStridedBatchVector::<f32, _>::new(
            &gpu,
            5,
            -2,
            -11,
            4,
            StorageLayout::Block,
        );
        assert!(dvec.is_valid());
        assert_eq!(host.transfer_to(&mut dvec), DeviceStatus::Success);

        let mut back = HostStridedBatchVector::<f32>::block(5, -2, -11, 4);
        assert_eq!(back.transfer_from(&dvec), DeviceStatus::Success);
        assert_eq!(back.data(), host.data());
    }
}
