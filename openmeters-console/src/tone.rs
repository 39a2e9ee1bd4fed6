//! Test tone fed into the synthetic loopback device.

use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use openmeters_core::synthetic::{SyntheticDevice, SyntheticPacket};

/// Packet length pushed per tick.
const PACKET: Duration = Duration::from_millis(10);

/// Sine generator pushing float packets at roughly real-time pace.
pub struct ToneGenerator {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ToneGenerator {
    /// Start a sine of `frequency` Hz at `amplitude` full scale on every channel.
    pub fn spawn(device: SyntheticDevice, frequency: f32, amplitude: f32) -> std::io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new().name("openmeters-tone".into()).spawn(move || {
            let format = device.format();
            let channels = format.channels.max(1) as usize;
            let rate = format.sample_rate.max(1) as f32;
            let frames = (format.sample_rate as u64 * PACKET.as_millis() as u64 / 1000) as usize;
            let mut phase = 0.0f32;
            let mut samples = Vec::with_capacity(frames * channels);

            while flag.load(Ordering::SeqCst) {
                thread::sleep(PACKET);
                // Nothing drains the queue while the stream is stopped.
                if !device.is_running() {
                    continue;
                }
                samples.clear();
                for _ in 0..frames {
                    let value = amplitude * phase.sin();
                    samples.extend(std::iter::repeat(value).take(channels));
                    phase = (phase + TAU * frequency / rate) % TAU;
                }
                device.push(SyntheticPacket::float32(&samples, channels as u16));
            }
        })?;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ToneGenerator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openmeters_core::models::audio_format::DeviceFormat;
    use openmeters_core::traits::loopback_backend::{LoopbackBackend, LoopbackClient};

    #[test]
    fn pushes_only_while_the_stream_runs() {
        let device = SyntheticDevice::new(DeviceFormat::float32(48000, 2));
        let mut tone = ToneGenerator::spawn(device.clone(), 440.0, 0.5).unwrap();

        thread::sleep(Duration::from_millis(50));
        assert_eq!(device.queued(), 0);

        let client = device.backend().activate_default_render().unwrap();
        client.start().unwrap();
        thread::sleep(Duration::from_millis(50));
        client.stop().unwrap();
        tone.stop();

        assert!(device.queued() > 0);
    }
}
