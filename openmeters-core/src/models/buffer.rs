use super::audio_format::AudioFormat;

/// Borrowed view of one delivered buffer of canonical f32 samples.
///
/// Samples are interleaved by channel. The view only lives for the duration
/// of a single observer call; copy the samples out if they are needed later.
#[derive(Debug, Clone, Copy)]
pub struct AudioBuffer<'a> {
    samples: &'a [f32],
    frame_count: usize,
    format: AudioFormat,
}

impl<'a> AudioBuffer<'a> {
    /// Wrap interleaved samples. `frame_count` is derived from the slice
    /// length; a trailing partial frame is ignored.
    pub fn new(samples: &'a [f32], format: AudioFormat) -> Self {
        let frame_count = samples.len() / format.samples_per_frame();
        Self {
            samples: &samples[..frame_count * format.samples_per_frame()],
            frame_count,
            format,
        }
    }

    pub fn samples(&self) -> &'a [f32] {
        self.samples
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// Iterate frames as `&[f32]` slices of `channels` samples each.
    pub fn frames(&self) -> impl Iterator<Item = &'a [f32]> + 'a {
        self.samples.chunks_exact(self.format.samples_per_frame())
    }

    /// Iterate the samples of a single channel. Out-of-range channels yield nothing.
    pub fn channel(&self, index: usize) -> impl Iterator<Item = f32> + 'a {
        let channels = self.format.samples_per_frame();
        let start = if index < channels { index } else { self.samples.len() };
        self.samples.iter().skip(start).step_by(channels).copied()
    }
}
