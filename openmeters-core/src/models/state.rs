/// Capture source lifecycle.
///
/// ```text
/// uninitialized → initialized → capturing ⇄ stopped
///        ↑              ↓            ↓         ↓
///        └──────── shut down ←───────┴─────────┘
/// ```
///
/// `stopped` behaves like `initialized`: `start()` resumes without
/// re-initialization. A shut-down source may be initialized again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureState {
    Uninitialized,
    Initialized,
    Capturing,
    Stopped,
    ShutDown,
}

impl CaptureState {
    /// Whether device resources are currently held.
    pub fn is_initialized(&self) -> bool {
        matches!(self, Self::Initialized | Self::Capturing | Self::Stopped)
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing)
    }

    /// Whether `start()` may be attempted from this state.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Initialized | Self::Stopped)
    }

    pub(crate) fn to_raw(self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::Initialized => 1,
            Self::Capturing => 2,
            Self::Stopped => 3,
            Self::ShutDown => 4,
        }
    }

    pub(crate) fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Initialized,
            2 => Self::Capturing,
            3 => Self::Stopped,
            4 => Self::ShutDown,
            _ => Self::Uninitialized,
        }
    }
}
