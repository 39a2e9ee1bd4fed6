//! Device-native PCM to canonical interleaved f32 conversion.
//!
//! Float sources are copied through unchanged. 16- and 32-bit integer PCM
//! is scaled into `[-1.0, 1.0)`. Every other layout produces silence
//! rather than reinterpreting bytes it does not understand.

use crate::models::audio_format::{DeviceFormat, SampleEncoding};

const I16_SCALE: f32 = 1.0 / 32768.0;
const I32_SCALE: f32 = 1.0 / 2147483648.0;

/// How a device payload maps onto f32 samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Float32,
    Int16,
    Int32,
    /// Unsupported bit depth or encoding; output is zero-filled.
    Zero,
}

impl Conversion {
    pub fn for_format(format: &DeviceFormat) -> Self {
        match (format.encoding, format.bits_per_sample) {
            (SampleEncoding::Float, 32) => Self::Float32,
            (SampleEncoding::Pcm, 16) => Self::Int16,
            (SampleEncoding::Pcm, 32) => Self::Int32,
            _ => Self::Zero,
        }
    }

    fn bytes_per_sample(&self) -> usize {
        match self {
            Self::Int16 => 2,
            Self::Float32 | Self::Int32 => 4,
            Self::Zero => 0,
        }
    }
}

/// Stateless converter bound to one negotiated device format.
#[derive(Debug, Clone, Copy)]
pub struct SampleConverter {
    conversion: Conversion,
    channels: usize,
    block_align: usize,
}

impl SampleConverter {
    pub fn new(format: &DeviceFormat) -> Self {
        Self {
            conversion: Conversion::for_format(format),
            channels: format.channels as usize,
            block_align: format.block_align as usize,
        }
    }

    pub fn conversion(&self) -> Conversion {
        self.conversion
    }

    /// Convert `frames` frames of `data` into `out`, replacing its contents.
    ///
    /// `out` always ends up with exactly `frames * channels` samples. Payload
    /// shorter than that is zero-padded; `out` only reallocates when it grows.
    pub fn convert(&self, data: &[u8], frames: usize, out: &mut Vec<f32>) {
        let total = frames * self.channels;
        out.clear();
        out.resize(total, 0.0);

        let width = self.conversion.bytes_per_sample();
        if width == 0 || self.channels == 0 {
            return;
        }

        // Samples are read per frame so padded frames (block_align larger
        // than channels * width) never shift the channel layout.
        let frame_bytes = self.block_align.max(width * self.channels);
        let available = (data.len() / frame_bytes).min(frames);

        for (frame, dest) in data
            .chunks_exact(frame_bytes)
            .take(available)
            .zip(out.chunks_exact_mut(self.channels))
        {
            for (sample, raw) in dest.iter_mut().zip(frame.chunks_exact(width)) {
                *sample = self.decode(raw);
            }
        }
    }

    /// Zero-filled buffer for device packets flagged silent.
    pub fn silence(&self, frames: usize, out: &mut Vec<f32>) {
        out.clear();
        out.resize(frames * self.channels, 0.0);
    }

    #[inline]
    fn decode(&self, raw: &[u8]) -> f32 {
        match self.conversion {
            Conversion::Float32 => f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            Conversion::Int16 => i16::from_le_bytes([raw[0], raw[1]]) as f32 * I16_SCALE,
            Conversion::Int32 => {
                i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as f32 * I32_SCALE
            }
            Conversion::Zero => 0.0,
        }
    }
}
