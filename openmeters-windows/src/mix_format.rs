//! Owned `WAVEFORMATEX` returned by `IAudioClient::GetMixFormat`.

use std::ffi::c_void;
use std::ptr;

use windows::core::GUID;
use windows::Win32::Media::Audio::{WAVEFORMATEX, WAVEFORMATEXTENSIBLE};
use windows::Win32::System::Com::CoTaskMemFree;

use openmeters_core::models::audio_format::{DeviceFormat, SampleEncoding};

const WAVE_FORMAT_PCM: u16 = 0x0001;
const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;
const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// KSDATAFORMAT_SUBTYPE_PCM
const SUBTYPE_PCM: GUID = GUID::from_u128(0x00000001_0000_0010_8000_00aa00389b71);
/// KSDATAFORMAT_SUBTYPE_IEEE_FLOAT
const SUBTYPE_IEEE_FLOAT: GUID = GUID::from_u128(0x00000003_0000_0010_8000_00aa00389b71);

/// Bytes `cbSize` must cover for the extensible tail to be present.
const EXTENSIBLE_TAIL: u16 = 22;

/// CoTaskMem-allocated mix format, freed on drop.
pub struct MixFormat {
    ptr: *mut WAVEFORMATEX,
}

impl MixFormat {
    /// Take ownership of a pointer returned by `GetMixFormat`.
    ///
    /// # Safety
    /// `ptr` must be a valid CoTaskMem allocation holding a `WAVEFORMATEX`
    /// (followed by its `cbSize` extra bytes) and must not be freed elsewhere.
    pub unsafe fn from_raw(ptr: *mut WAVEFORMATEX) -> Self {
        Self { ptr }
    }

    pub fn as_ptr(&self) -> *const WAVEFORMATEX {
        self.ptr
    }

    /// Describe the format for core-side validation.
    pub fn describe(&self) -> DeviceFormat {
        // SAFETY: ptr is valid for the lifetime of self; the struct is
        // packed so it is copied out rather than referenced.
        let header = unsafe { ptr::read_unaligned(self.ptr) };
        let tag = header.wFormatTag;

        let encoding = match tag {
            WAVE_FORMAT_PCM => SampleEncoding::Pcm,
            WAVE_FORMAT_IEEE_FLOAT => SampleEncoding::Float,
            WAVE_FORMAT_EXTENSIBLE if header.cbSize >= EXTENSIBLE_TAIL => {
                let ext = self.ptr as *const WAVEFORMATEXTENSIBLE;
                // SAFETY: cbSize says the extensible tail is present.
                let sub_format = unsafe { ptr::read_unaligned(ptr::addr_of!((*ext).SubFormat)) };
                if sub_format == SUBTYPE_IEEE_FLOAT {
                    SampleEncoding::Float
                } else if sub_format == SUBTYPE_PCM {
                    SampleEncoding::Pcm
                } else {
                    SampleEncoding::Unsupported(tag)
                }
            }
            other => SampleEncoding::Unsupported(other),
        };

        DeviceFormat {
            encoding,
            sample_rate: header.nSamplesPerSec,
            channels: header.nChannels,
            bits_per_sample: header.wBitsPerSample,
            block_align: header.nBlockAlign,
        }
    }
}

impl Drop for MixFormat {
    fn drop(&mut self) {
        unsafe { CoTaskMemFree(Some(self.ptr as *const c_void)) };
    }
}
