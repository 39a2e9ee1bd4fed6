//! Scoped COM acquisition.

use windows::Win32::System::Com::{CoDecrementMTAUsage, CoIncrementMTAUsage, CO_MTA_USAGE_COOKIE};

use openmeters_core::models::error::CaptureError;

/// Keeps the process multithreaded apartment alive.
///
/// Unlike `CoInitializeEx`, the usage cookie is not tied to the calling
/// thread, so it can be acquired on the caller's thread and released from
/// whichever thread drops the last client. Every thread that has not
/// initialized COM itself (including the capture thread) is an implicit
/// MTA member while a cookie is held.
pub struct MtaUsage {
    cookie: CO_MTA_USAGE_COOKIE,
}

// SAFETY: the cookie is an opaque token that CoDecrementMTAUsage accepts from any thread.
unsafe impl Send for MtaUsage {}
unsafe impl Sync for MtaUsage {}

impl MtaUsage {
    pub fn acquire() -> Result<Self, CaptureError> {
        let cookie = unsafe { CoIncrementMTAUsage() }
            .map_err(|e| {
                CaptureError::SubsystemUnavailable(format!("CoIncrementMTAUsage failed: {}", e))
            })?;
        Ok(Self { cookie })
    }
}

impl Drop for MtaUsage {
    fn drop(&mut self) {
        if let Err(e) = unsafe { CoDecrementMTAUsage(self.cookie) } {
            log::warn!("CoDecrementMTAUsage failed: {}", e);
        }
    }
}
