use crate::error::BatchError;

pub struct GpuConfig {
    pub device_index: usize,
    pub application_name: String,
    pub memory_budget_fraction: f64,
    pub require_device_local: bool,
}

impl GpuConfig {
    pub fn build(self) -> Result<Self, BatchError> {
        if !(self.memory_budget_fraction > 0.0 && self.memory_budget_fraction <= 1.0) {
            return Err(BatchError::InvalidConfig(format!(
                "memory budget fraction must be in (0, 1], got {}",
                self.memory_budget_fraction
            )));
        }

        if self.application_name.is_empty() || self.application_name.contains('\0') {
            return Err(BatchError::InvalidConfig(format!(
                "application name {:?} must be non-empty and free of NUL bytes",
                self.application_name
            )));
        }

        Ok(self)
    }
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            application_name: "strided-batch".to_string(),
            memory_budget_fraction: 0.6,
            require_device_local: false,
        }
    }
}
