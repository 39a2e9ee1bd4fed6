use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Engine and capture-source configuration.
///
/// Constructed by the caller and passed in; there is no process-wide
/// configuration state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bounded wait on the stop signal per capture-loop iteration, in ms (default: 100).
    pub poll_interval_ms: u64,

    /// Request elevated scheduling priority for the capture thread (default: true).
    pub elevate_priority: bool,

    /// Name given to the capture thread.
    pub thread_name: String,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), CaptureError> {
        if !(1..=1000).contains(&self.poll_interval_ms) {
            return Err(CaptureError::InvalidConfiguration(format!(
                "poll interval must be 1..=1000 ms, got {}",
                self.poll_interval_ms
            )));
        }
        if self.thread_name.trim().is_empty() {
            return Err(CaptureError::InvalidConfiguration("thread name must not be empty".into()));
        }
        Ok(())
    }

    /// Parse and validate a JSON document. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, CaptureError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| {
                CaptureError::InvalidConfiguration(format!("failed to parse config: {}", e))
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            elevate_priority: true,
            thread_name: "openmeters-capture".into(),
        }
    }
}
