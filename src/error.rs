use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Vulkan error: {0}")]
    Vulkan(String),

    #[error("Vulkan load error: {0}")]
    VulkanLoad(String),

    #[error("Out of memory error: {0}")]
    OutOfMemory(String),

    #[error("No memory type satisfies {0}")]
    NoSuitableMemoryType(String),

    #[error("Size mismatch: expected at most {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// Convert vk::Result (Vulkan return codes) into BatchError
impl From<vulkanalia::vk::Result> for BatchError {
    fn from(r: vulkanalia::vk::Result) -> Self {
        BatchError::Vulkan(format!("vk::Result: {:?}", r))
    }
}

impl From<vulkanalia::vk::ErrorCode> for BatchError {
    fn from(c: vulkanalia::vk::ErrorCode) -> Self {
        use vulkanalia::vk::ErrorCode;

        if c == ErrorCode::OUT_OF_HOST_MEMORY || c == ErrorCode::OUT_OF_DEVICE_MEMORY {
            BatchError::OutOfMemory(format!("vk::ErrorCode: {:?}", c))
        } else {
            BatchError::Vulkan(format!("vk::ErrorCode: {:?}", c))
        }
    }
}
