//! WASAPI loopback backend for the default render endpoint.
//!
//! Opens the endpoint in shared mode with `AUDCLNT_STREAMFLAGS_LOOPBACK`
//! to capture the mix being played to it. No special permissions needed.
//!
//! ## Notes
//! - DRM-protected audio is silenced in loopback
//! - The stream is polled; the capture source decides the interval

use std::sync::Arc;

use windows::Win32::Media::Audio::{
    IAudioCaptureClient, IAudioClient, IMMDevice, IMMDeviceEnumerator, AUDCLNT_BUFFERFLAGS_SILENT,
    AUDCLNT_SHAREMODE_SHARED, AUDCLNT_STREAMFLAGS_LOOPBACK,
};
use windows::Win32::System::Com::CLSCTX_ALL;

use openmeters_core::models::audio_format::DeviceFormat;
use openmeters_core::models::error::CaptureError;
use openmeters_core::traits::loopback_backend::{
    DevicePacket, LoopbackBackend, LoopbackClient, PacketReader,
};

use crate::com::MtaUsage;
use crate::endpoint;
use crate::mix_format::MixFormat;
use crate::priority::PriorityGuard;

/// Shared-mode buffer duration requested from the engine: 100 ms in 100 ns units.
const BUFFER_DURATION: i64 = 1_000_000;

/// [`LoopbackBackend`] over WASAPI.
#[derive(Debug, Clone, Copy, Default)]
pub struct WasapiLoopback;

impl WasapiLoopback {
    pub fn new() -> Self {
        Self
    }
}

impl LoopbackBackend for WasapiLoopback {
    type Client = WasapiClient;

    /// Subsystem startup, enumerator, default render endpoint, client activation.
    fn activate_default_render(&self) -> Result<WasapiClient, CaptureError> {
        let apartment = Arc::new(MtaUsage::acquire()?);
        let enumerator = endpoint::enumerator()?;
        let device = endpoint::default_render(&enumerator)?;
        let audio_client: IAudioClient = unsafe { device.Activate(CLSCTX_ALL, None) }
            .map_err(|e| {
                CaptureError::ActivationFailed(format!("IMMDevice::Activate failed: {}", e))
            })?;
        let device_name = endpoint::friendly_name(&device);

        Ok(WasapiClient {
            mix_format: None,
            audio_client,
            device_name,
            _device: device,
            _enumerator: enumerator,
            apartment,
        })
    }
}

/// Activated `IAudioClient` on the default render endpoint.
///
/// Fields drop top to bottom, releasing resources in reverse acquisition
/// order; the MTA usage goes last.
pub struct WasapiClient {
    mix_format: Option<MixFormat>,
    audio_client: IAudioClient,
    device_name: Option<String>,
    _device: IMMDevice,
    _enumerator: IMMDeviceEnumerator,
    apartment: Arc<MtaUsage>,
}

// SAFETY: the interfaces were created in the MTA, whose objects may be
// called from any member thread, and the process keeps the MTA alive for
// as long as `apartment` is held.
unsafe impl Send for WasapiClient {}

impl LoopbackClient for WasapiClient {
    type Reader = WasapiReader;

    fn mix_format(&mut self) -> Result<DeviceFormat, CaptureError> {
        let ptr = unsafe { self.audio_client.GetMixFormat() }
            .map_err(|e| CaptureError::ActivationFailed(format!("GetMixFormat failed: {}", e)))?;
        // SAFETY: GetMixFormat hands over a CoTaskMem allocation.
        let format = unsafe { MixFormat::from_raw(ptr) };
        let described = format.describe();
        self.mix_format = Some(format);
        Ok(described)
    }

    fn initialize_stream(&mut self) -> Result<WasapiReader, CaptureError> {
        let format = self
            .mix_format
            .as_ref()
            .ok_or_else(|| CaptureError::StreamInitFailed("mix format not queried".into()))?;
        let block_align = format.describe().block_align;

        unsafe {
            self.audio_client
                .Initialize(
                    AUDCLNT_SHAREMODE_SHARED,
                    AUDCLNT_STREAMFLAGS_LOOPBACK,
                    BUFFER_DURATION,
                    0,
                    format.as_ptr(),
                    None,
                )
                .map_err(|e| {
                    CaptureError::StreamInitFailed(format!(
                        "IAudioClient::Initialize (loopback) failed: {}",
                        e
                    ))
                })?;
        }

        let capture_client: IAudioCaptureClient = unsafe { self.audio_client.GetService() }
            .map_err(|e| CaptureError::StreamInitFailed(format!("GetService failed: {}", e)))?;

        Ok(WasapiReader {
            capture_client,
            block_align: block_align as usize,
            pending: false,
            priority: None,
            _apartment: Arc::clone(&self.apartment),
        })
    }

    fn start(&self) -> Result<(), CaptureError> {
        unsafe { self.audio_client.Start() }
            .map_err(|e| {
                CaptureError::StreamStartFailed(format!("IAudioClient::Start failed: {}", e))
            })
    }

    fn stop(&self) -> Result<(), CaptureError> {
        unsafe { self.audio_client.Stop() }
            .map_err(|e| {
                CaptureError::StreamStopFailed(format!("IAudioClient::Stop failed: {}", e))
            })
    }

    fn device_name(&self) -> Option<String> {
        self.device_name.clone()
    }
}

/// `IAudioCaptureClient` wrapper driven by the capture thread.
pub struct WasapiReader {
    capture_client: IAudioCaptureClient,
    block_align: usize,
    /// A buffer obtained from `GetBuffer` has not been released yet.
    pending: bool,
    priority: Option<PriorityGuard>,
    _apartment: Arc<MtaUsage>,
}

// SAFETY: see `WasapiClient`. The priority guard is only created and
// dropped on the capture thread that owns this reader.
unsafe impl Send for WasapiReader {}

impl Clone for WasapiReader {
    fn clone(&self) -> Self {
        Self {
            capture_client: self.capture_client.clone(),
            block_align: self.block_align,
            pending: false,
            priority: None,
            _apartment: Arc::clone(&self._apartment),
        }
    }
}

impl PacketReader for WasapiReader {
    fn acquire(&mut self) -> Result<DevicePacket<'_>, CaptureError> {
        let queued = unsafe { self.capture_client.GetNextPacketSize() }
            .map_err(|e| {
                CaptureError::BufferUnavailable(format!("GetNextPacketSize failed: {}", e))
            })?;
        if queued == 0 {
            return Ok(DevicePacket::EMPTY);
        }

        let mut data: *mut u8 = std::ptr::null_mut();
        let mut frames: u32 = 0;
        let mut flags: u32 = 0;
        unsafe {
            self.capture_client
                .GetBuffer(&mut data, &mut frames, &mut flags, None, None)
                .map_err(|e| CaptureError::BufferUnavailable(format!("GetBuffer failed: {}", e)))?;
        }
        self.pending = true;

        let silent = flags & (AUDCLNT_BUFFERFLAGS_SILENT.0 as u32) != 0;
        let bytes: &[u8] = if data.is_null() || frames == 0 {
            &[]
        } else {
            // SAFETY: GetBuffer returned `frames` frames of `block_align`
            // bytes, valid until ReleaseBuffer, which needs `&mut self`.
            unsafe { std::slice::from_raw_parts(data, frames as usize * self.block_align) }
        };

        Ok(DevicePacket { data: bytes, frames, silent })
    }

    fn release(&mut self, frames: u32) -> Result<(), CaptureError> {
        if !self.pending {
            return Ok(());
        }
        self.pending = false;
        unsafe { self.capture_client.ReleaseBuffer(frames) }
            .map_err(|e| CaptureError::BufferUnavailable(format!("ReleaseBuffer failed: {}", e)))
    }

    fn elevate_priority(&mut self) -> Result<(), CaptureError> {
        if self.priority.is_none() {
            self.priority = Some(PriorityGuard::elevate()?);
        }
        Ok(())
    }
}
