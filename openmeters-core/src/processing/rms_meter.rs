use crate::models::buffer::AudioBuffer;
use crate::models::meter::ChannelLevels;

/// Per-channel root-mean-square level over one buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RmsMeter;

impl RmsMeter {
    pub fn new() -> Self {
        Self
    }

    /// `sqrt(mean(sample^2))` per channel, clamped to full scale.
    /// Mono reports the same value on both channels.
    pub fn process(&self, buffer: &AudioBuffer<'_>) -> ChannelLevels {
        if buffer.is_empty() {
            return ChannelLevels::SILENT;
        }

        let left = rms_level(buffer.channel(0));
        if buffer.format().is_stereo() {
            ChannelLevels::new(left, rms_level(buffer.channel(1)))
        } else {
            ChannelLevels::mono(left)
        }
    }
}

/// RMS of a run of samples, clamped to `[0.0, 1.0]`. Empty input is 0.0.
pub fn rms_level(samples: impl IntoIterator<Item = f32>) -> f32 {
    // Accumulate in f64 so long buffers of small samples keep precision.
    let (sum_sq, count) = samples
        .into_iter()
        .fold((0.0f64, 0usize), |(sum, n), s| (sum + (s as f64) * (s as f64), n + 1));
    if count == 0 {
        return 0.0;
    }
    let rms = (sum_sq / count as f64).sqrt() as f32;
    if rms.is_nan() {
        0.0
    } else {
        rms.min(1.0)
    }
}
