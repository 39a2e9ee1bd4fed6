use serde::Serialize;

/// Lowest level reported by [`linear_to_dbfs`].
pub const DBFS_FLOOR: f32 = -96.0;

/// Per-channel meter reading, 0.0–1.0 of full scale.
///
/// Mono input is reported with `left == right`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ChannelLevels {
    pub left: f32,
    pub right: f32,
}

impl ChannelLevels {
    pub const SILENT: Self = Self { left: 0.0, right: 0.0 };

    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Same value on both channels (mono).
    pub fn mono(level: f32) -> Self {
        Self { left: level, right: level }
    }

    pub fn to_dbfs(&self) -> (f32, f32) {
        (linear_to_dbfs(self.left), linear_to_dbfs(self.right))
    }
}

/// One meter reading per delivered buffer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MeterSnapshot {
    pub peak: ChannelLevels,
    pub rms: ChannelLevels,
    /// Milliseconds since the engine was created (monotonic clock).
    pub timestamp_ms: u64,
    /// Buffers metered since the engine was created, starting at 0.
    pub sequence: u64,
    /// Frames in the buffer this reading was computed from.
    pub frame_count: usize,
}

/// Convert a linear magnitude to dBFS, clamped at [`DBFS_FLOOR`].
pub fn linear_to_dbfs(level: f32) -> f32 {
    if level <= 0.0 {
        return DBFS_FLOOR;
    }
    (20.0 * level.log10()).max(DBFS_FLOOR)
}
