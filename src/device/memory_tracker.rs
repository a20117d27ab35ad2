use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::BatchError;

pub struct MemoryTracker {
    maximum: u64,
    current: AtomicU64,
}

// Reservation is a single compare-exchange loop, so a refused request never shows up
// in `current`.

impl MemoryTracker {
    pub fn new(maximum: u64) -> Self {
        Self {
            maximum,
            current: AtomicU64::new(0),
        }
    }

    pub fn allocate(&self, size: u64) -> Result<(), BatchError> {
        self.current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| {
                prev.checked_add(size).filter(|&new| new <= self.maximum)
            })
            .map(|_| ())
            .map_err(|prev| {
                BatchError::OutOfMemory(format!(
                    "tried to allocate {} bytes when {} of {} bytes are used",
                    size, prev, self.maximum
                ))
            })
    }

    pub fn deallocate(&self, size: u64) {
        self.current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| {
                Some(prev.saturating_sub(size))
            })
            .ok();
    }

    pub fn get_current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    pub fn get_available(&self) -> u64 {
        self.maximum.saturating_sub(self.get_current())
    }

    pub fn get_maximum(&self) -> u64 {
        self.maximum
    }
}
