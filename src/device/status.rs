use std::fmt;

use crate::error::BatchError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceStatus {
    Success,
    /// Also reported when either side of a transfer owns no buffer.
    OutOfMemory,
    InvalidValue,
    TransferFailed,
}

impl DeviceStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, DeviceStatus::Success)
    }
}

impl From<&BatchError> for DeviceStatus {
    fn from(err: &BatchError) -> Self {
        match err {
            BatchError::OutOfMemory(_) => DeviceStatus::OutOfMemory,
            BatchError::SizeMismatch { .. } => DeviceStatus::InvalidValue,
            _ => DeviceStatus::TransferFailed,
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceStatus::Success => "success",
            DeviceStatus::OutOfMemory => "out of memory",
            DeviceStatus::InvalidValue => "invalid value",
            DeviceStatus::TransferFailed => "transfer failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_status() {
        let oom = BatchError::OutOfMemory("heap".into());
        assert_eq!(DeviceStatus::from(&oom), DeviceStatus::OutOfMemory);

        let size = BatchError::SizeMismatch {
            expected: 4,
            actual: 8,
        };
        assert_eq!(DeviceStatus::from(&size), DeviceStatus::InvalidValue);

        let vk = BatchError::Vulkan("lost".into());
        assert_eq!(DeviceStatus::from(&vk), DeviceStatus::TransferFailed);
    }

    #[test]
    fn only_success_is_success() {
        assert!(DeviceStatus::Success.is_success());
        assert!(!DeviceStatus::OutOfMemory.is_success());
        assert_eq!(DeviceStatus::InvalidValue.to_string(), "invalid value");
    }
}
