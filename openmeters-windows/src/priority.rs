//! Capture-thread scheduling priority.

use windows::core::w;
use windows::Win32::Foundation::HANDLE;
use windows::Win32::System::Threading::{
    AvRevertMmThreadCharacteristics, AvSetMmThreadCharacteristicsW, GetCurrentThread,
    SetThreadPriority,
    THREAD_PRIORITY_NORMAL, THREAD_PRIORITY_TIME_CRITICAL,
};

use openmeters_core::models::error::CaptureError;

/// Elevated priority for the current thread, reverted on drop.
///
/// Must be dropped on the thread that created it.
pub enum PriorityGuard {
    /// Registered with MMCSS under the "Pro Audio" task.
    Mmcss(HANDLE),
    /// MMCSS unavailable; plain time-critical thread priority.
    TimeCritical,
}

impl PriorityGuard {
    pub fn elevate() -> Result<Self, CaptureError> {
        let mut task_index: u32 = 0;
        match unsafe { AvSetMmThreadCharacteristicsW(w!("Pro Audio"), &mut task_index) } {
            Ok(handle) => {
                log::debug!("Registered with MMCSS (task index {})", task_index);
                return Ok(Self::Mmcss(handle));
            }
            Err(e) => log::debug!("AvSetMmThreadCharacteristicsW failed: {}", e),
        }

        unsafe { SetThreadPriority(GetCurrentThread(), THREAD_PRIORITY_TIME_CRITICAL) }
            .map(|_| Self::TimeCritical)
            .map_err(|e| {
                log::debug!("SetThreadPriority failed: {}", e);
                CaptureError::PriorityUnavailable
            })
    }
}

impl Drop for PriorityGuard {
    fn drop(&mut self) {
        let reverted = match self {
            Self::Mmcss(handle) => unsafe { AvRevertMmThreadCharacteristics(*handle) },
            Self::TimeCritical => unsafe {
                SetThreadPriority(GetCurrentThread(), THREAD_PRIORITY_NORMAL)
            },
        };
        if let Err(e) = reverted {
            log::debug!("Failed to revert thread priority: {}", e);
        }
    }
}
