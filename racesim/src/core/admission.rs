//! Admission control for race runs.
//!
//! At most one race may tick at any time. [`AdmissionControl::try_admit`] never waits: when the
//! slot is taken the caller gets a `Conflict` right away. The slot is released when the returned
//! [`AdmissionPermit`] is dropped, including when the run is aborted by an error.

use crate::core::error::RallyError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct AdmissionControl {
    occupied: Arc<AtomicBool>,
}

#[derive(Debug)]
pub struct AdmissionPermit {
    occupied: Arc<AtomicBool>,
    race_id: u32,
}

impl AdmissionControl {
    pub fn new() -> AdmissionControl {
        AdmissionControl::default()
    }

    pub fn try_admit(&self, race_id: u32) -> Result<AdmissionPermit, RallyError> {
        if self
            .occupied
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(race_id, "Start refused, another race is running");
            return Err(RallyError::Conflict(format!(
                "cannot start race {}, another race is already running",
                race_id
            )));
        }
        Ok(AdmissionPermit {
            occupied: Arc::clone(&self.occupied),
            race_id,
        })
    }
}

impl AdmissionPermit {
    pub fn race_id(&self) -> u32 {
        self.race_id
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.occupied.store(false, Ordering::Release);
    }
}
