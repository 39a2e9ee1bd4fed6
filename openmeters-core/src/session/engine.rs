use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::models::audio_format::AudioFormat;
use crate::models::buffer::AudioBuffer;
use crate::models::config::EngineConfig;
use crate::models::error::CaptureError;
use crate::models::meter::MeterSnapshot;
use crate::models::state::CaptureState;
use crate::processing::peak_meter::PeakMeter;
use crate::processing::rms_meter::RmsMeter;
use crate::session::capture_source::CaptureSource;
use crate::session::registry::{CallbackHandle, CallbackRegistry};
use crate::traits::audio_callback::AudioDataCallback;
use crate::traits::loopback_backend::LoopbackBackend;

/// Capture-source observer that meters every buffer and fans the result
/// out to the engine's external observers.
struct MeteringCallback {
    observers: Arc<CallbackRegistry>,
    peak: PeakMeter,
    rms: RmsMeter,
    epoch: Instant,
    sequence: AtomicU64,
}

impl MeteringCallback {
    fn snapshot(&self, buffer: &AudioBuffer<'_>) -> MeterSnapshot {
        MeterSnapshot {
            peak: self.peak.process(buffer),
            rms: self.rms.process(buffer),
            timestamp_ms: self.epoch.elapsed().as_millis() as u64,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            frame_count: buffer.frame_count(),
        }
    }
}

impl AudioDataCallback for MeteringCallback {
    fn on_audio_data(&self, buffer: &AudioBuffer<'_>) {
        let snapshot = self.snapshot(buffer);
        log::trace!(
            "meter #{}: peak {:.3}/{:.3} rms {:.3}/{:.3}",
            snapshot.sequence,
            snapshot.peak.left,
            snapshot.peak.right,
            snapshot.rms.left,
            snapshot.rms.right
        );

        self.observers.for_each(|observer| {
            if observer.wants_audio_data() {
                observer.on_audio_data(buffer);
            }
            observer.on_meter_data(&snapshot);
        });
    }
}

/// Capture source plus built-in peak/RMS metering.
///
/// ```text
/// CaptureSource ─→ MeteringCallback (peak + RMS) ─→ external observers
///                                                   (buffer if wanted, then snapshot)
/// ```
///
/// Capture being unavailable never takes the engine down: observers stay
/// registered, `is_capturing()` reports false, and `initialize()` may be
/// retried.
pub struct AudioEngine<B: LoopbackBackend> {
    capture: CaptureSource<B>,
    metering: Arc<MeteringCallback>,
    metering_handle: Mutex<Option<CallbackHandle>>,
    observers: Arc<CallbackRegistry>,
}

impl<B: LoopbackBackend> AudioEngine<B> {
    pub fn new(backend: B) -> Self {
        Self::compose(CaptureSource::new(backend))
    }

    pub fn with_config(backend: B, config: EngineConfig) -> Result<Self, CaptureError> {
        Ok(Self::compose(CaptureSource::with_config(backend, config)?))
    }

    fn compose(capture: CaptureSource<B>) -> Self {
        let observers = Arc::new(CallbackRegistry::new());
        Self {
            capture,
            metering: Arc::new(MeteringCallback {
                observers: Arc::clone(&observers),
                peak: PeakMeter::new(),
                rms: RmsMeter::new(),
                epoch: Instant::now(),
                sequence: AtomicU64::new(0),
            }),
            metering_handle: Mutex::new(None),
            observers,
        }
    }

    /// Initialize the capture source, then attach metering to it.
    pub fn initialize(&self) -> Result<(), CaptureError> {
        self.capture.initialize()?;

        let mut handle = self.metering_handle.lock();
        if handle.is_none() {
            *handle = Some(self.capture.register_callback(&self.metering));
        }
        Ok(())
    }

    pub fn start(&self) -> Result<(), CaptureError> {
        self.capture.start()
    }

    pub fn stop(&self) {
        self.capture.stop();
    }

    /// Tear down in order: stop capture, detach metering, drop external
    /// observers, release the device. Safe to call repeatedly.
    pub fn shutdown(&self) {
        self.capture.stop();
        if let Some(handle) = self.metering_handle.lock().take() {
            self.capture.unregister_callback(handle);
        }
        self.observers.clear();
        self.capture.shutdown();
    }

    /// Subscribe `observer` to meter snapshots (and raw buffers if it asks).
    ///
    /// Registering the same observer twice delivers twice.
    pub fn register_callback<C: AudioDataCallback + 'static>(
        &self,
        observer: &Arc<C>,
    ) -> CallbackHandle {
        self.observers.register(observer)
    }

    pub fn unregister_callback(&self, handle: CallbackHandle) {
        self.observers.unregister(handle);
    }

    pub fn format(&self) -> Option<AudioFormat> {
        self.capture.format()
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_capturing()
    }

    pub fn state(&self) -> CaptureState {
        self.capture.state()
    }

    pub fn device_name(&self) -> Option<String> {
        self.capture.device_name()
    }

    pub fn capture(&self) -> &CaptureSource<B> {
        &self.capture
    }
}

impl<B: LoopbackBackend> Drop for AudioEngine<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
