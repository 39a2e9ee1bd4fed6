use thiserror::Error;

/// Errors produced by the capture source and engine.
///
/// Initialization errors are recoverable: nothing acquired before the
/// failing step survives, so `initialize()` may simply be retried later.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("audio subsystem unavailable: {0}")]
    SubsystemUnavailable(String),

    #[error("no default render device available")]
    DeviceNotAvailable,

    #[error("client activation failed: {0}")]
    ActivationFailed(String),

    #[error("unsupported mix format: {0}")]
    UnsupportedFormat(String),

    #[error("unsupported channel count: {0} (mono or stereo only)")]
    UnsupportedChannelCount(u16),

    #[error("stream initialization failed: {0}")]
    StreamInitFailed(String),

    #[error("capture source is not initialized")]
    NotInitialized,

    #[error("stream start failed: {0}")]
    StreamStartFailed(String),

    #[error("stream stop failed: {0}")]
    StreamStopFailed(String),

    #[error("failed to spawn capture thread: {0}")]
    ThreadSpawnFailed(String),

    #[error("device buffer unavailable: {0}")]
    BufferUnavailable(String),

    #[error("elevated thread priority unavailable")]
    PriorityUnavailable,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl CaptureError {
    /// Mid-capture errors the capture loop absorbs and retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::BufferUnavailable(_))
    }
}
