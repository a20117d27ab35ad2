use std::{ffi::CString, ptr, sync::Arc};

use vulkanalia::{
    Device, Entry, Instance,
    loader::{LIBRARY, LibloadingLoader},
    vk::{self, DeviceV1_0, InstanceV1_0},
};

use crate::{
    device::{DeviceAllocator, MemoryTracker},
    error::BatchError,
};

use super::{config::GpuConfig, gpu_memory::GPUMemory};

/// A Vulkan device used as the accelerator-side store for batch vectors.
///
/// Allocations are host-visible and host-coherent so transfers are plain mapped copies.
pub struct Gpu {
    _entry: Entry,
    instance: Instance,
    device: Device,
    physical_device: vk::PhysicalDevice,
    device_index: usize,
    name: String,
    require_device_local: bool,
    memory_tracker: MemoryTracker,
}

impl Gpu {
    pub fn new(config: GpuConfig) -> Result<Arc<Self>, BatchError> {
        let config = config.build()?;

        unsafe {
            let loader = LibloadingLoader::new(LIBRARY)
                .map_err(|e| BatchError::VulkanLoad(e.to_string()))?;
            let entry =
                Entry::new(loader).map_err(|e| BatchError::VulkanLoad(e.to_string()))?;

            let aname = CString::new(config.application_name.as_str())
                .map_err(|e| BatchError::InvalidConfig(e.to_string()))?;

            let appinfo = vk::ApplicationInfo {
                s_type: vk::StructureType::APPLICATION_INFO,
                next: ptr::null(),
                application_name: aname.as_ptr(),
                application_version: vk::make_version(1, 0, 0),
                engine_name: aname.as_ptr(),
                engine_version: vk::make_version(1, 0, 0),
                api_version: vk::make_version(1, 0, 0),
            };

            let create_info = vk::InstanceCreateInfo {
                s_type: vk::StructureType::INSTANCE_CREATE_INFO,
                next: ptr::null(),
                flags: vk::InstanceCreateFlags::empty(),
                application_info: &appinfo,
                enabled_layer_count: 0,
                enabled_layer_names: ptr::null(),
                enabled_extension_count: 0,
                enabled_extension_names: ptr::null(),
            };

            let instance = entry.create_instance(&create_info, None)?;

            match Self::open_device(&instance, &config) {
                Ok((physical_device, device, name, heap_size)) => {
                    let budget = (heap_size as f64 * config.memory_budget_fraction) as u64;
                    tracing::debug!(
                        "opened GPU {} ({}) with a budget of {} bytes",
                        config.device_index,
                        name,
                        budget
                    );

                    Ok(Arc::new(Self {
                        _entry: entry,
                        instance,
                        device,
                        physical_device,
                        device_index: config.device_index,
                        name,
                        require_device_local: config.require_device_local,
                        memory_tracker: MemoryTracker::new(budget),
                    }))
                }
                Err(e) => {
                    instance.destroy_instance(None);
                    Err(e)
                }
            }
        }
    }

    unsafe fn open_device(
        instance: &Instance,
        config: &GpuConfig,
    ) -> Result<(vk::PhysicalDevice, Device, String, u64), BatchError> {
        unsafe {
            let physical_devices = instance.enumerate_physical_devices()?;
            let physical_device = *physical_devices.get(config.device_index).ok_or_else(|| {
                BatchError::Vulkan(format!(
                    "GPU index {} out of range, {} devices found",
                    config.device_index,
                    physical_devices.len()
                ))
            })?;

            let queue_families =
                instance.get_physical_device_queue_family_properties(physical_device);

            // Transfers are mapped copies, any queue family works; prefer compute.
            let queue_family_index = queue_families
                .iter()
                .position(|props| props.queue_flags.contains(vk::QueueFlags::COMPUTE))
                .or_else(|| (!queue_families.is_empty()).then_some(0))
                .ok_or_else(|| BatchError::Vulkan("No queue family found".to_string()))?
                as u32;

            let queue_priorities = [1.0f32];

            let queue_info = vk::DeviceQueueCreateInfo {
                s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
                next: ptr::null(),
                flags: vk::DeviceQueueCreateFlags::empty(),
                queue_family_index,
                queue_count: 1,
                queue_priorities: queue_priorities.as_ptr(),
            };

            let device_features = vk::PhysicalDeviceFeatures::default();

            let device_create_info = vk::DeviceCreateInfo {
                s_type: vk::StructureType::DEVICE_CREATE_INFO,
                next: ptr::null(),
                flags: vk::DeviceCreateFlags::empty(),
                queue_create_info_count: 1,
                queue_create_infos: &queue_info,
                enabled_layer_count: 0,
                enabled_layer_names: ptr::null(),
                enabled_extension_count: 0,
                enabled_extension_names: ptr::null(),
                enabled_features: &device_features,
            };

            let device = instance.create_device(physical_device, &device_create_info, None)?;

            let properties = instance.get_physical_device_properties(physical_device);
            let name = String::from_utf8_lossy(
                &properties
                    .device_name
                    .iter()
                    .take_while(|&&c| c != 0)
                    .map(|&c| c as u8)
                    .collect::<Vec<u8>>(),
            )
            .to_string();

            let heap_size = Self::device_local_heap_size(instance, physical_device);

            Ok((physical_device, device, name, heap_size))
        }
    }

    fn device_local_heap_size(instance: &Instance, physical_device: vk::PhysicalDevice) -> u64 {
        unsafe {
            let memory_properties = instance.get_physical_device_memory_properties(physical_device);

            let device_local_heap_index = (0..memory_properties.memory_type_count)
                .find(|&i| {
                    let memory_type = memory_properties.memory_types[i as usize];
                    memory_type
                        .property_flags
                        .contains(vk::MemoryPropertyFlags::DEVICE_LOCAL)
                })
                .map(|i| memory_properties.memory_types[i as usize].heap_index)
                .unwrap_or(0);

            memory_properties.memory_heaps[device_local_heap_index as usize].size
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_index(&self) -> usize {
        self.device_index
    }

    pub fn memory_total(&self) -> u64 {
        self.memory_tracker.get_maximum()
    }

    pub fn available_memory(&self) -> u64 {
        self.memory_tracker.get_available()
    }

    pub fn get_device(&self) -> &Device {
        &self.device
    }

    pub(crate) fn memory_tracker(&self) -> &MemoryTracker {
        &self.memory_tracker
    }

    pub fn find_memory_type(
        &self,
        type_filter: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> Option<u32> {
        unsafe {
            let mem_properties = self
                .instance
                .get_physical_device_memory_properties(self.physical_device);

            (0..mem_properties.memory_type_count).find(|&i| {
                (type_filter & (1 << i)) != 0
                    && mem_properties.memory_types[i as usize]
                        .property_flags
                        .contains(properties)
            })
        }
    }

    /// Allocate `bytes` of host-visible, host-coherent device memory.
    pub fn allocate_host_visible(gpu: &Arc<Self>, bytes: usize) -> Result<GPUMemory, BatchError> {
        let size_in_bytes = bytes as vk::DeviceSize;
        gpu.memory_tracker.allocate(size_in_bytes)?;

        let result = unsafe { gpu.create_host_visible_buffer(size_in_bytes) };
        match result {
            Ok((buffer, memory, properties)) => Ok(GPUMemory::new(
                buffer,
                memory,
                size_in_bytes,
                properties,
                Arc::clone(gpu),
            )),
            Err(e) => {
                gpu.memory_tracker.deallocate(size_in_bytes);
                Err(e)
            }
        }
    }

    unsafe fn create_host_visible_buffer(
        &self,
        size_in_bytes: vk::DeviceSize,
    ) -> Result<(vk::Buffer, vk::DeviceMemory, vk::MemoryPropertyFlags), BatchError> {
        unsafe {
            let buffer_info = vk::BufferCreateInfo {
                s_type: vk::StructureType::BUFFER_CREATE_INFO,
                next: ptr::null(),
                flags: vk::BufferCreateFlags::empty(),
                size: size_in_bytes,
                usage: vk::BufferUsageFlags::STORAGE_BUFFER
                    | vk::BufferUsageFlags::TRANSFER_SRC
                    | vk::BufferUsageFlags::TRANSFER_DST,
                sharing_mode: vk::SharingMode::EXCLUSIVE,
                queue_family_index_count: 0,
                queue_family_indices: ptr::null(),
            };

            let buffer = self.device.create_buffer(&buffer_info, None)?;
            let mem_requirements = self.device.get_buffer_memory_requirements(buffer);

            let mut properties =
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
            if self.require_device_local {
                properties |= vk::MemoryPropertyFlags::DEVICE_LOCAL;
            }

            let Some(memory_type) =
                self.find_memory_type(mem_requirements.memory_type_bits, properties)
            else {
                self.device.destroy_buffer(buffer, None);
                return Err(BatchError::NoSuitableMemoryType(format!("{:?}", properties)));
            };

            let alloc_info = vk::MemoryAllocateInfo {
                s_type: vk::StructureType::MEMORY_ALLOCATE_INFO,
                next: ptr::null(),
                allocation_size: mem_requirements.size,
                memory_type_index: memory_type,
            };

            let memory = match self.device.allocate_memory(&alloc_info, None) {
                Ok(memory) => memory,
                Err(e) => {
                    self.device.destroy_buffer(buffer, None);
                    return Err(e.into());
                }
            };

            if let Err(e) = self.device.bind_buffer_memory(buffer, memory, 0) {
                self.device.destroy_buffer(buffer, None);
                self.device.free_memory(memory, None);
                return Err(e.into());
            }

            Ok((buffer, memory, properties))
        }
    }
}

impl DeviceAllocator for Arc<Gpu> {
    type Memory = GPUMemory;

    fn allocate(&self, bytes: usize) -> Result<GPUMemory, BatchError> {
        Gpu::allocate_host_visible(self, bytes)
    }
}

impl Drop for Gpu {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                tracing::debug!("failed to idle GPU {} before teardown: {e:?}", self.device_index);
            }
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

impl std::fmt::Debug for Gpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gpu")
            .field("device_index", &self.device_index)
            .field("name", &self.name)
            .field("budget", &self.memory_tracker.get_maximum())
            .field("used", &self.memory_tracker.get_current())
            .finish()
    }
}
