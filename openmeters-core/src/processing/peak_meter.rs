use crate::models::buffer::AudioBuffer;
use crate::models::meter::ChannelLevels;

/// Per-channel peak: the largest absolute sample in the buffer.
///
/// Stateless; each call reflects only the buffer it is given. Hold and
/// decay are left to whoever draws the meter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeakMeter;

impl PeakMeter {
    pub fn new() -> Self {
        Self
    }

    /// Peak of each channel, clamped to full scale. Mono reports the same
    /// value on both channels; an empty buffer reads as silence.
    pub fn process(&self, buffer: &AudioBuffer<'_>) -> ChannelLevels {
        if buffer.is_empty() {
            return ChannelLevels::SILENT;
        }

        let left = peak_level(buffer.channel(0));
        if buffer.format().is_stereo() {
            ChannelLevels::new(left, peak_level(buffer.channel(1)))
        } else {
            ChannelLevels::mono(left)
        }
    }
}

/// Peak absolute level of a run of samples, clamped to `[0.0, 1.0]`.
pub fn peak_level(samples: impl IntoIterator<Item = f32>) -> f32 {
    samples
        .into_iter()
        .map(f32::abs)
        .filter(|s| !s.is_nan())
        .fold(0.0f32, f32::max)
        .min(1.0)
}
