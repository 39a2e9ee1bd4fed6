//! In-process loopback device.
//!
//! `SyntheticDevice` stands in for the OS render endpoint: packets pushed
//! onto it are handed to the capture thread exactly as a real stream would
//! hand out device buffers. Failure points can be armed to exercise the
//! initialization rollback and start-failure paths, and resource counters
//! show whether anything leaked.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_format::DeviceFormat;
use crate::models::error::CaptureError;
use crate::traits::loopback_backend::{DevicePacket, LoopbackBackend, LoopbackClient, PacketReader};

/// Step at which the synthetic device reports failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Activation,
    MixFormat,
    StreamInit,
    Start,
}

/// One queued device buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticPacket {
    data: Vec<u8>,
    frames: u32,
    silent: bool,
}

impl SyntheticPacket {
    pub fn raw(data: Vec<u8>, frames: u32, silent: bool) -> Self {
        Self { data, frames, silent }
    }

    /// Interleaved f32 samples.
    pub fn float32(samples: &[f32], channels: u16) -> Self {
        Self {
            data: samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
            frames: (samples.len() / channels.max(1) as usize) as u32,
            silent: false,
        }
    }

    /// Interleaved signed 16-bit samples.
    pub fn pcm16(samples: &[i16], channels: u16) -> Self {
        Self {
            data: samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
            frames: (samples.len() / channels.max(1) as usize) as u32,
            silent: false,
        }
    }

    /// A buffer flagged silent. The payload is deliberately non-zero so a
    /// reader that ignores the flag would produce a non-zero level.
    pub fn silent(frames: u32, block_align: u16) -> Self {
        Self {
            data: vec![0x5a; frames as usize * block_align as usize],
            frames,
            silent: true,
        }
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }
}

#[derive(Debug)]
struct DeviceState {
    format: DeviceFormat,
    name: String,
    queue: VecDeque<SyntheticPacket>,
    failure: Option<FailurePoint>,
    read_errors: usize,
    running: bool,
    live_clients: usize,
    activations: usize,
    packets_read: usize,
}

/// Shared handle to the simulated endpoint.
#[derive(Debug, Clone)]
pub struct SyntheticDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl SyntheticDevice {
    pub fn new(format: DeviceFormat) -> Self {
        Self {
            state: Arc::new(Mutex::new(DeviceState {
                format,
                name: "Synthetic Loopback".into(),
                queue: VecDeque::new(),
                failure: None,
                read_errors: 0,
                running: false,
                live_clients: 0,
                activations: 0,
                packets_read: 0,
            })),
        }
    }

    /// A backend bound to this device.
    pub fn backend(&self) -> SyntheticBackend {
        SyntheticBackend { device: self.clone() }
    }

    pub fn format(&self) -> DeviceFormat {
        self.state.lock().format
    }

    /// Arm (or with `None`, disarm) a failure point.
    pub fn fail_at(&self, failure: Option<FailurePoint>) {
        self.state.lock().failure = failure;
    }

    /// Make the next `count` buffer retrievals fail transiently.
    pub fn inject_read_errors(&self, count: usize) {
        self.state.lock().read_errors = count;
    }

    pub fn push(&self, packet: SyntheticPacket) {
        self.state.lock().queue.push_back(packet);
    }

    pub fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Clients currently holding device resources.
    pub fn live_clients(&self) -> usize {
        self.state.lock().live_clients
    }

    /// Successful activations since the device was created.
    pub fn activations(&self) -> usize {
        self.state.lock().activations
    }

    pub fn packets_read(&self) -> usize {
        self.state.lock().packets_read
    }

    fn check(&self, point: FailurePoint) -> bool {
        self.state.lock().failure == Some(point)
    }
}

/// [`LoopbackBackend`] over a [`SyntheticDevice`].
#[derive(Debug, Clone)]
pub struct SyntheticBackend {
    device: SyntheticDevice,
}

impl SyntheticBackend {
    pub fn device(&self) -> &SyntheticDevice {
        &self.device
    }
}

impl LoopbackBackend for SyntheticBackend {
    type Client = SyntheticClient;

    fn activate_default_render(&self) -> Result<SyntheticClient, CaptureError> {
        if self.device.check(FailurePoint::Activation) {
            return Err(CaptureError::DeviceNotAvailable);
        }
        let mut state = self.device.state.lock();
        state.live_clients += 1;
        state.activations += 1;
        drop(state);

        Ok(SyntheticClient {
            device: self.device.clone(),
            format: None,
        })
    }
}

/// Activated synthetic client. Dropping it releases the device.
#[derive(Debug)]
pub struct SyntheticClient {
    device: SyntheticDevice,
    format: Option<DeviceFormat>,
}

impl LoopbackClient for SyntheticClient {
    type Reader = SyntheticReader;

    fn mix_format(&mut self) -> Result<DeviceFormat, CaptureError> {
        if self.device.check(FailurePoint::MixFormat) {
            return Err(CaptureError::ActivationFailed("mix format query failed".into()));
        }
        let format = self.device.format();
        self.format = Some(format);
        Ok(format)
    }

    fn initialize_stream(&mut self) -> Result<SyntheticReader, CaptureError> {
        if self.format.is_none() {
            return Err(CaptureError::StreamInitFailed("mix format not queried".into()));
        }
        if self.device.check(FailurePoint::StreamInit) {
            return Err(CaptureError::StreamInitFailed("loopback stream rejected".into()));
        }
        Ok(SyntheticReader {
            device: self.device.clone(),
            current: None,
        })
    }

    fn start(&self) -> Result<(), CaptureError> {
        if self.device.check(FailurePoint::Start) {
            return Err(CaptureError::StreamStartFailed("synthetic start failure".into()));
        }
        self.device.state.lock().running = true;
        Ok(())
    }

    fn stop(&self) -> Result<(), CaptureError> {
        self.device.state.lock().running = false;
        Ok(())
    }

    fn device_name(&self) -> Option<String> {
        Some(self.device.state.lock().name.clone())
    }
}

impl Drop for SyntheticClient {
    fn drop(&mut self) {
        let mut state = self.device.state.lock();
        state.live_clients -= 1;
        state.running = false;
    }
}

/// Capture-thread reader over the synthetic queue.
#[derive(Debug)]
pub struct SyntheticReader {
    device: SyntheticDevice,
    current: Option<SyntheticPacket>,
}

impl Clone for SyntheticReader {
    fn clone(&self) -> Self {
        Self {
            device: self.device.clone(),
            current: None,
        }
    }
}

impl PacketReader for SyntheticReader {
    fn acquire(&mut self) -> Result<DevicePacket<'_>, CaptureError> {
        {
            let mut state = self.device.state.lock();
            if state.read_errors > 0 {
                state.read_errors -= 1;
                return Err(CaptureError::BufferUnavailable("injected read error".into()));
            }
            self.current = if state.running { state.queue.pop_front() } else { None };
            if self.current.is_some() {
                state.packets_read += 1;
            }
        }

        Ok(match &self.current {
            Some(packet) => DevicePacket {
                data: &packet.data,
                frames: packet.frames,
                silent: packet.silent,
            },
            None => DevicePacket::EMPTY,
        })
    }

    fn release(&mut self, _frames: u32) -> Result<(), CaptureError> {
        self.current = None;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    use std::time::{Duration, Instant};

    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}
