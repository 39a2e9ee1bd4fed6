use std::fmt;

use serde::Serialize;

use super::error::CaptureError;

/// Sample encoding reported by the device mix format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleEncoding {
    /// Signed little-endian integer PCM.
    Pcm,
    /// IEEE 754 floating point.
    Float,
    /// Anything else; carries the raw format tag for diagnostics.
    Unsupported(u16),
}

/// The device-native mix format, as described by the backend before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceFormat {
    pub encoding: SampleEncoding,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Bytes per frame (all channels).
    pub block_align: u16,
}

impl DeviceFormat {
    /// Packed PCM/float layout with `block_align` derived from the other fields.
    pub fn packed(
        encoding: SampleEncoding,
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
    ) -> Self {
        Self {
            encoding,
            sample_rate,
            channels,
            bits_per_sample,
            block_align: channels * (bits_per_sample / 8),
        }
    }

    /// The usual shared-mode mix format: 32-bit float, interleaved.
    pub fn float32(sample_rate: u32, channels: u16) -> Self {
        Self::packed(SampleEncoding::Float, sample_rate, channels, 32)
    }

    /// Signed 16-bit integer PCM, interleaved.
    pub fn pcm16(sample_rate: u32, channels: u16) -> Self {
        Self::packed(SampleEncoding::Pcm, sample_rate, channels, 16)
    }

    /// Signed 32-bit integer PCM, interleaved.
    pub fn pcm32(sample_rate: u32, channels: u16) -> Self {
        Self::packed(SampleEncoding::Pcm, sample_rate, channels, 32)
    }
}

impl fmt::Display for DeviceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoding = match self.encoding {
            SampleEncoding::Pcm => "pcm".to_string(),
            SampleEncoding::Float => "float".to_string(),
            SampleEncoding::Unsupported(tag) => format!("tag 0x{:04x}", tag),
        };
        write!(
            f,
            "{} Hz, {} ch, {}-bit {}",
            self.sample_rate, self.channels, self.bits_per_sample, encoding
        )
    }
}

/// Validated canonical format shared by every component after initialization.
///
/// Channel count is always 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AudioFormat {
    sample_rate: u32,
    channels: u16,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, channels: u16) -> Result<Self, CaptureError> {
        if sample_rate == 0 {
            return Err(CaptureError::UnsupportedFormat("sample rate must be positive".into()));
        }
        if !(1..=2).contains(&channels) {
            return Err(CaptureError::UnsupportedChannelCount(channels));
        }
        Ok(Self { sample_rate, channels })
    }

    /// Validate a device mix format: integer PCM or IEEE float, mono or stereo.
    pub fn from_device(device: &DeviceFormat) -> Result<Self, CaptureError> {
        if let SampleEncoding::Unsupported(tag) = device.encoding {
            return Err(CaptureError::UnsupportedFormat(format!(
                "format tag 0x{:04x} is neither integer PCM nor IEEE float",
                tag
            )));
        }
        Self::new(device.sample_rate, device.channels)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Samples in one frame; equal to the channel count.
    pub fn samples_per_frame(&self) -> usize {
        self.channels as usize
    }

    pub fn is_stereo(&self) -> bool {
        self.channels == 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_mono_and_stereo() {
        assert_eq!(AudioFormat::new(48000, 1).unwrap().samples_per_frame(), 1);
        assert!(AudioFormat::new(44100, 2).unwrap().is_stereo());
    }

    #[test]
    fn rejects_other_channel_counts() {
        assert_eq!(AudioFormat::new(48000, 0), Err(CaptureError::UnsupportedChannelCount(0)));
        assert_eq!(AudioFormat::new(48000, 6), Err(CaptureError::UnsupportedChannelCount(6)));
    }

    #[test]
    fn rejects_zero_sample_rate() {
        assert!(matches!(AudioFormat::new(0, 2), Err(CaptureError::UnsupportedFormat(_))));
    }

    #[test]
    fn from_device_rejects_unknown_encoding() {
        let mut device = DeviceFormat::float32(48000, 2);
        device.encoding = SampleEncoding::Unsupported(0x0055);
        assert!(matches!(
            AudioFormat::from_device(&device),
            Err(CaptureError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn from_device_keeps_rate_and_channels() {
        let format = AudioFormat::from_device(&DeviceFormat::pcm16(44100, 1)).unwrap();
        assert_eq!(format.sample_rate(), 44100);
        assert_eq!(format.channels(), 1);
    }

    #[test]
    fn packed_block_align() {
        assert_eq!(DeviceFormat::float32(48000, 2).block_align, 8);
        assert_eq!(DeviceFormat::pcm16(48000, 2).block_align, 4);
        assert_eq!(DeviceFormat::pcm32(48000, 1).block_align, 4);
    }
}
