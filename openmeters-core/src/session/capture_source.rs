use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::models::audio_format::{AudioFormat, DeviceFormat};
use crate::models::buffer::AudioBuffer;
use crate::models::config::EngineConfig;
use crate::models::error::CaptureError;
use crate::models::state::CaptureState;
use crate::processing::sample_converter::SampleConverter;
use crate::session::registry::{CallbackHandle, CallbackRegistry};
use crate::session::stop_signal::StopSignal;
use crate::traits::audio_callback::AudioDataCallback;
use crate::traits::loopback_backend::{LoopbackBackend, LoopbackClient, PacketReader};

/// Everything acquired by a successful `initialize()`.
///
/// Fields drop in declaration order, so the reader (capture client) is
/// released before the client that owns the stream.
struct OpenStream<C: LoopbackClient> {
    reader: C::Reader,
    client: C,
    device_format: DeviceFormat,
    format: AudioFormat,
}

/// Read-mostly facts about the open stream, kept outside the lifecycle
/// lock so status queries never wait on `stop()`.
#[derive(Debug, Clone)]
struct StreamInfo {
    format: AudioFormat,
    device_format: DeviceFormat,
    device_name: Option<String>,
}

/// One spawned capture thread and the signal only it listens to.
struct Worker {
    handle: JoinHandle<()>,
    stop_signal: Arc<StopSignal>,
}

struct Lifecycle<C: LoopbackClient> {
    stream: Option<OpenStream<C>>,
    worker: Option<Worker>,
    /// Worker stopped from its own thread; joined before the next spawn.
    detached: Option<JoinHandle<()>>,
}

/// Owns the loopback stream and the real-time capture thread.
///
/// ```text
/// [device] → acquire → SampleConverter → AudioBuffer → observers (in order) → release
/// ```
///
/// All methods take `&self` and may be called from any thread while the
/// capture thread runs. Status queries (`state()`, `is_capturing()`,
/// `format()`) never wait on a lifecycle operation in progress.
pub struct CaptureSource<B: LoopbackBackend> {
    backend: B,
    config: EngineConfig,
    lifecycle: Mutex<Lifecycle<B::Client>>,
    /// Written only while `lifecycle` is held.
    state: AtomicU8,
    info: RwLock<Option<StreamInfo>>,
    observers: Arc<CallbackRegistry>,
    capturing: AtomicBool,
}

impl<B: LoopbackBackend> CaptureSource<B> {
    pub fn new(backend: B) -> Self {
        Self::build(backend, EngineConfig::default())
    }

    pub fn with_config(backend: B, config: EngineConfig) -> Result<Self, CaptureError> {
        config.validate()?;
        Ok(Self::build(backend, config))
    }

    fn build(backend: B, config: EngineConfig) -> Self {
        Self {
            backend,
            config,
            lifecycle: Mutex::new(Lifecycle {
                stream: None,
                worker: None,
                detached: None,
            }),
            state: AtomicU8::new(CaptureState::Uninitialized.to_raw()),
            info: RwLock::new(None),
            observers: Arc::new(CallbackRegistry::new()),
            capturing: AtomicBool::new(false),
        }
    }

    /// Acquire the loopback stream on the default render device.
    ///
    /// Idempotent while initialized. On failure nothing stays acquired and
    /// the call may be retried later.
    pub fn initialize(&self) -> Result<(), CaptureError> {
        let mut lifecycle = self.lifecycle.lock();
        if self.state().is_initialized() {
            return Ok(());
        }

        let stream = match open_stream(&self.backend) {
            Ok(stream) => stream,
            Err(e) => {
                log::warn!("Loopback initialization failed: {}", e);
                return Err(e);
            }
        };

        let device_name = stream.client.device_name();
        log::info!(
            "Loopback stream ready on {}: {}",
            device_name.as_deref().unwrap_or("default render device"),
            stream.device_format
        );

        *self.info.write() = Some(StreamInfo {
            format: stream.format,
            device_format: stream.device_format,
            device_name,
        });
        lifecycle.stream = Some(stream);
        self.set_state(CaptureState::Initialized);
        Ok(())
    }

    /// Start the OS stream and spawn the capture thread.
    ///
    /// Idempotent while capturing. If the thread cannot be spawned the
    /// stream is stopped again and the error returned.
    pub fn start(&self) -> Result<(), CaptureError> {
        let mut guard = self.lifecycle.lock();
        let lifecycle = &mut *guard;
        let state = self.state();
        if state.is_capturing() {
            return Ok(());
        }
        if !state.can_start() {
            return Err(CaptureError::NotInitialized);
        }
        let stream = lifecycle.stream.as_ref().ok_or(CaptureError::NotInitialized)?;

        if let Some(previous) = lifecycle.detached.take() {
            join_worker(previous);
        }

        if let Err(e) = stream.client.start() {
            log::error!("Failed to start loopback stream: {}", e);
            return Err(e);
        }

        let stop_signal = Arc::new(StopSignal::new());
        let worker = CaptureWorker {
            reader: stream.reader.clone(),
            converter: SampleConverter::new(&stream.device_format),
            format: stream.format,
            observers: Arc::clone(&self.observers),
            stop_signal: Arc::clone(&stop_signal),
            poll_interval: self.config.poll_interval(),
            elevate_priority: self.config.elevate_priority,
        };

        let spawned = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => {
                lifecycle.worker = Some(Worker { handle, stop_signal });
                self.set_state(CaptureState::Capturing);
                self.capturing.store(true, Ordering::SeqCst);
                log::info!("Loopback capture started");
                Ok(())
            }
            Err(e) => {
                if let Err(stop_err) = stream.client.stop() {
                    log::warn!("Failed to stop stream after spawn failure: {}", stop_err);
                }
                log::error!("Failed to spawn capture thread: {}", e);
                Err(CaptureError::ThreadSpawnFailed(e.to_string()))
            }
        }
    }

    /// Signal the capture thread, stop the OS stream, and wait for the
    /// thread to exit. No-op unless capturing.
    ///
    /// Called from an observer on the capture thread, the thread cannot be
    /// joined; it exits once the observer returns and is joined by the
    /// next `start()`.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock();
        self.stop_locked(&mut lifecycle);
    }

    /// Stop, then release every device resource. Safe to call repeatedly
    /// and before `initialize()`.
    pub fn shutdown(&self) {
        let mut lifecycle = self.lifecycle.lock();
        self.stop_locked(&mut lifecycle);
        if let Some(previous) = lifecycle.detached.take() {
            join_worker(previous);
        }

        if let Some(stream) = lifecycle.stream.take() {
            drop(stream);
            *self.info.write() = None;
            self.set_state(CaptureState::ShutDown);
            log::info!("Loopback stream released");
        }
    }

    fn stop_locked(&self, lifecycle: &mut Lifecycle<B::Client>) {
        if !self.state().is_capturing() {
            return;
        }
        self.capturing.store(false, Ordering::SeqCst);

        let worker = lifecycle.worker.take();
        if let Some(worker) = worker.as_ref() {
            worker.stop_signal.signal();
        }
        if let Some(stream) = lifecycle.stream.as_ref() {
            if let Err(e) = stream.client.stop() {
                log::warn!("Failed to stop loopback stream: {}", e);
            }
        }

        if let Some(worker) = worker {
            if worker.handle.thread().id() == thread::current().id() {
                log::debug!("stop() called from the capture thread; joining on next start");
                lifecycle.detached = Some(worker.handle);
            } else {
                join_worker(worker.handle);
            }
        }

        self.set_state(CaptureState::Stopped);
        log::info!("Loopback capture stopped");
    }

    fn set_state(&self, state: CaptureState) {
        self.state.store(state.to_raw(), Ordering::SeqCst);
    }

    /// Validated format, once initialized.
    pub fn format(&self) -> Option<AudioFormat> {
        self.info.read().as_ref().map(|info| info.format)
    }

    /// Raw mix format reported by the device, once initialized.
    pub fn device_format(&self) -> Option<DeviceFormat> {
        self.info.read().as_ref().map(|info| info.device_format)
    }

    pub fn device_name(&self) -> Option<String> {
        self.info.read().as_ref().and_then(|info| info.device_name.clone())
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> CaptureState {
        CaptureState::from_raw(self.state.load(Ordering::SeqCst))
    }

    /// Deliver every subsequent buffer to `observer`, after those already registered.
    pub fn register_callback<C: AudioDataCallback + 'static>(
        &self,
        observer: &Arc<C>,
    ) -> CallbackHandle {
        self.observers.register(observer)
    }

    /// Stop delivery to the observer behind `handle`. Unknown handles are ignored.
    pub fn unregister_callback(&self, handle: CallbackHandle) {
        self.observers.unregister(handle);
    }
}

impl<B: LoopbackBackend> Drop for CaptureSource<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn join_worker(handle: JoinHandle<()>) {
    if handle.thread().id() == thread::current().id() {
        // start() from the detached thread itself; its own signal is already set.
        return;
    }
    if handle.join().is_err() {
        log::error!("Capture thread panicked");
    }
}

/// Staged acquisition. Any `?` drops what was acquired so far.
fn open_stream<B: LoopbackBackend>(backend: &B) -> Result<OpenStream<B::Client>, CaptureError> {
    let mut client = backend.activate_default_render()?;
    let device_format = client.mix_format()?;
    let format = AudioFormat::from_device(&device_format)?;
    let reader = client.initialize_stream()?;

    Ok(OpenStream {
        reader,
        client,
        device_format,
        format,
    })
}

/// State moved onto the capture thread.
struct CaptureWorker<R: PacketReader> {
    reader: R,
    converter: SampleConverter,
    format: AudioFormat,
    observers: Arc<CallbackRegistry>,
    stop_signal: Arc<StopSignal>,
    poll_interval: Duration,
    elevate_priority: bool,
}

impl<R: PacketReader> CaptureWorker<R> {
    fn run(mut self) {
        if self.elevate_priority {
            match self.reader.elevate_priority() {
                Ok(()) => log::debug!("Capture thread running at elevated priority"),
                Err(e) => log::warn!("{}; capturing at normal priority", e),
            }
        }

        let mut scratch: Vec<f32> = Vec::new();
        let mut delivered: u64 = 0;
        while !self.stop_signal.wait_timeout(self.poll_interval) {
            delivered += self.drain(&mut scratch);
        }
        log::debug!("Capture loop exiting after {} buffers", delivered);
    }

    /// Deliver queued device buffers until the queue is empty, a read
    /// fails, or stop is signaled. Each buffer reaches every observer
    /// before the next one is acquired.
    fn drain(&mut self, scratch: &mut Vec<f32>) -> u64 {
        let mut delivered = 0;
        while !self.stop_signal.is_signaled() {
            let frames = match self.reader.acquire() {
                Ok(packet) if packet.is_empty() => 0,
                Ok(packet) => {
                    if packet.silent {
                        self.converter.silence(packet.frames as usize, scratch);
                    } else {
                        self.converter.convert(packet.data, packet.frames as usize, scratch);
                    }
                    packet.frames
                }
                Err(e) => {
                    log::trace!("Buffer retrieval failed, retrying next poll: {}", e);
                    return delivered;
                }
            };

            if frames == 0 {
                if let Err(e) = self.reader.release(0) {
                    log::trace!("Releasing empty buffer failed: {}", e);
                }
                return delivered;
            }

            let buffer = AudioBuffer::new(scratch, self.format);
            self.observers.for_each(|observer| observer.on_audio_data(&buffer));

            if let Err(e) = self.reader.release(frames) {
                log::debug!("Releasing device buffer failed: {}", e);
            }
            delivered += 1;
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{
        wait_until, FailurePoint, SyntheticBackend, SyntheticDevice, SyntheticPacket,
    };
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Weak;
    use std::thread::ThreadId;

    fn fast_config() -> EngineConfig {
        EngineConfig {
            poll_interval_ms: 2,
            elevate_priority: false,
            ..Default::default()
        }
    }

    fn source(device: &SyntheticDevice) -> CaptureSource<SyntheticBackend> {
        CaptureSource::with_config(device.backend(), fast_config()).unwrap()
    }

    fn stereo_device() -> SyntheticDevice {
        SyntheticDevice::new(DeviceFormat::float32(48000, 2))
    }

    #[derive(Default)]
    struct Counter {
        buffers: AtomicUsize,
        last: Mutex<Vec<f32>>,
    }

    impl Counter {
        fn count(&self) -> usize {
            self.buffers.load(Ordering::SeqCst)
        }
    }

    impl AudioDataCallback for Counter {
        fn on_audio_data(&self, buffer: &AudioBuffer<'_>) {
            *self.last.lock() = buffer.samples().to_vec();
            self.buffers.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Sleeps inside the first delivery, then reads the source state.
    #[derive(Default)]
    struct Stalling {
        source: Mutex<Weak<CaptureSource<SyntheticBackend>>>,
        entered: AtomicBool,
        observed: Mutex<Option<CaptureState>>,
    }

    impl AudioDataCallback for Stalling {
        fn on_audio_data(&self, _buffer: &AudioBuffer<'_>) {
            if self.entered.swap(true, Ordering::SeqCst) {
                return;
            }
            thread::sleep(Duration::from_millis(100));
            let source = self.source.lock().upgrade();
            if let Some(source) = source {
                *self.observed.lock() = Some(source.state());
            }
        }
    }

    /// Stops its own source from the capture thread on the first buffer.
    #[derive(Default)]
    struct SelfStopping {
        source: Mutex<Weak<CaptureSource<SyntheticBackend>>>,
        stopped: AtomicBool,
        threads: Mutex<HashSet<ThreadId>>,
        buffers: AtomicUsize,
    }

    impl AudioDataCallback for SelfStopping {
        fn on_audio_data(&self, _buffer: &AudioBuffer<'_>) {
            self.threads.lock().insert(thread::current().id());
            self.buffers.fetch_add(1, Ordering::SeqCst);
            if !self.stopped.swap(true, Ordering::SeqCst) {
                let source = self.source.lock().upgrade();
                if let Some(source) = source {
                    source.stop();
                }
            }
        }
    }

    #[derive(Default)]
    struct Slow {
        in_flight: AtomicBool,
        buffers: AtomicUsize,
    }

    impl AudioDataCallback for Slow {
        fn on_audio_data(&self, _buffer: &AudioBuffer<'_>) {
            self.in_flight.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            self.buffers.fetch_add(1, Ordering::SeqCst);
            self.in_flight.store(false, Ordering::SeqCst);
        }
    }

    #[test]
    fn initialize_exposes_format() {
        let device = SyntheticDevice::new(DeviceFormat::pcm16(44100, 1));
        let capture = source(&device);
        assert_eq!(capture.format(), None);

        capture.initialize().unwrap();

        let format = capture.format().unwrap();
        assert_eq!(format.sample_rate(), 44100);
        assert_eq!(format.channels(), 1);
        assert_eq!(capture.state(), CaptureState::Initialized);
        assert_eq!(capture.device_name().as_deref(), Some("Synthetic Loopback"));
    }

    #[test]
    fn initialize_is_idempotent() {
        let device = stereo_device();
        let capture = source(&device);

        capture.initialize().unwrap();
        capture.initialize().unwrap();

        assert_eq!(device.activations(), 1);
        assert_eq!(device.live_clients(), 1);
    }

    #[test]
    fn unsupported_channel_count_rolls_back() {
        let device = SyntheticDevice::new(DeviceFormat::float32(48000, 6));
        let capture = source(&device);

        assert_eq!(capture.initialize(), Err(CaptureError::UnsupportedChannelCount(6)));
        assert_eq!(device.live_clients(), 0);
        assert_eq!(capture.state(), CaptureState::Uninitialized);
        assert_eq!(capture.format(), None);
    }

    #[test]
    fn every_failure_point_rolls_back() {
        for point in [FailurePoint::Activation, FailurePoint::MixFormat, FailurePoint::StreamInit] {
            let device = stereo_device();
            device.fail_at(Some(point));
            let capture = source(&device);

            assert!(capture.initialize().is_err(), "{:?} should fail", point);
            assert_eq!(device.live_clients(), 0, "{:?} leaked", point);
        }
    }

    #[test]
    fn initialize_can_be_retried_after_failure() {
        let device = stereo_device();
        device.fail_at(Some(FailurePoint::Activation));
        let capture = source(&device);
        assert_eq!(capture.initialize(), Err(CaptureError::DeviceNotAvailable));

        device.fail_at(None);
        capture.initialize().unwrap();
        assert!(capture.state().is_initialized());
    }

    #[test]
    fn start_requires_initialize() {
        let device = stereo_device();
        let capture = source(&device);

        assert_eq!(capture.start(), Err(CaptureError::NotInitialized));
        assert!(!capture.is_capturing());
    }

    #[test]
    fn start_failure_is_reported() {
        let device = stereo_device();
        let capture = source(&device);
        capture.initialize().unwrap();
        device.fail_at(Some(FailurePoint::Start));

        assert!(matches!(capture.start(), Err(CaptureError::StreamStartFailed(_))));
        assert!(!capture.is_capturing());
        assert_eq!(capture.state(), CaptureState::Initialized);

        device.fail_at(None);
        capture.start().unwrap();
        assert!(capture.is_capturing());
    }

    #[test]
    fn delivers_converted_buffers() {
        let device = SyntheticDevice::new(DeviceFormat::pcm16(48000, 2));
        let capture = source(&device);
        let counter = Arc::new(Counter::default());
        capture.register_callback(&counter);
        capture.initialize().unwrap();
        capture.start().unwrap();

        device.push(SyntheticPacket::pcm16(&[16384, -16384, 8192, 0], 2));

        assert!(wait_until(|| counter.count() == 1));
        assert_eq!(*counter.last.lock(), vec![0.5, -0.5, 0.25, 0.0]);
    }

    #[test]
    fn silent_flag_yields_zeros() {
        let device = stereo_device();
        let capture = source(&device);
        let counter = Arc::new(Counter::default());
        capture.register_callback(&counter);
        capture.initialize().unwrap();
        capture.start().unwrap();

        device.push(SyntheticPacket::silent(16, 8));

        assert!(wait_until(|| counter.count() == 1));
        assert_eq!(*counter.last.lock(), vec![0.0; 32]);
    }

    #[test]
    fn transient_read_errors_are_retried() {
        let device = stereo_device();
        let capture = source(&device);
        let counter = Arc::new(Counter::default());
        capture.register_callback(&counter);
        capture.initialize().unwrap();
        device.inject_read_errors(3);
        capture.start().unwrap();

        device.push(SyntheticPacket::float32(&[0.1, 0.2], 2));

        assert!(wait_until(|| counter.count() == 1));
        assert!(capture.is_capturing());
    }

    #[test]
    fn stop_then_start_resumes_delivery() {
        let device = stereo_device();
        let capture = source(&device);
        let counter = Arc::new(Counter::default());
        capture.register_callback(&counter);
        capture.initialize().unwrap();
        capture.start().unwrap();

        device.push(SyntheticPacket::float32(&[0.1, 0.1], 2));
        assert!(wait_until(|| counter.count() == 1));

        capture.stop();
        assert!(!capture.is_capturing());
        assert_eq!(capture.state(), CaptureState::Stopped);
        assert!(!device.is_running());

        device.push(SyntheticPacket::float32(&[0.2, 0.2], 2));
        capture.start().unwrap();
        assert!(wait_until(|| counter.count() == 2));
        assert_eq!(device.activations(), 1);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let device = stereo_device();
        let capture = source(&device);
        capture.initialize().unwrap();

        capture.stop(); // not capturing yet
        capture.start().unwrap();
        capture.start().unwrap();
        assert!(capture.is_capturing());

        capture.stop();
        capture.stop();
        assert!(!capture.is_capturing());
    }

    #[test]
    fn registration_applies_from_next_buffer() {
        let device = stereo_device();
        let capture = source(&device);
        let first = Arc::new(Counter::default());
        let late = Arc::new(Counter::default());
        capture.register_callback(&first);
        capture.initialize().unwrap();
        capture.start().unwrap();

        device.push(SyntheticPacket::float32(&[0.1, 0.1], 2));
        assert!(wait_until(|| first.count() == 1));

        let late_handle = capture.register_callback(&late);
        device.push(SyntheticPacket::float32(&[0.2, 0.2], 2));
        assert!(wait_until(|| late.count() == 1));
        assert_eq!(first.count(), 2);

        capture.unregister_callback(late_handle);
        device.push(SyntheticPacket::float32(&[0.3, 0.3], 2));
        assert!(wait_until(|| first.count() == 3));
        assert_eq!(late.count(), 1);
    }

    #[test]
    fn observer_can_read_state_while_stop_waits() {
        let device = stereo_device();
        let capture = Arc::new(source(&device));
        let observer = Arc::new(Stalling::default());
        *observer.source.lock() = Arc::downgrade(&capture);
        capture.register_callback(&observer);
        capture.initialize().unwrap();
        capture.start().unwrap();

        device.push(SyntheticPacket::float32(&[0.1, 0.1], 2));
        assert!(wait_until(|| observer.entered.load(Ordering::SeqCst)));

        let stopper = {
            let capture = Arc::clone(&capture);
            thread::spawn(move || capture.stop())
        };
        assert!(wait_until(|| stopper.is_finished()));
        stopper.join().unwrap();

        assert_eq!(*observer.observed.lock(), Some(CaptureState::Capturing));
        assert_eq!(capture.state(), CaptureState::Stopped);
    }

    #[test]
    fn restart_after_observer_stop_runs_one_capture_thread() {
        let device = stereo_device();
        let capture = Arc::new(source(&device));
        let observer = Arc::new(SelfStopping::default());
        *observer.source.lock() = Arc::downgrade(&capture);
        capture.register_callback(&observer);
        capture.initialize().unwrap();
        capture.start().unwrap();

        device.push(SyntheticPacket::float32(&[0.1, 0.1], 2));
        assert!(wait_until(|| capture.state() == CaptureState::Stopped));
        assert!(!capture.is_capturing());

        observer.threads.lock().clear();
        let before = observer.buffers.load(Ordering::SeqCst);
        capture.start().unwrap();
        for _ in 0..50 {
            device.push(SyntheticPacket::float32(&[0.2, 0.2], 2));
            thread::sleep(Duration::from_millis(1));
        }

        assert!(wait_until(|| observer.buffers.load(Ordering::SeqCst) == before + 50));
        assert_eq!(observer.threads.lock().len(), 1);
        capture.stop();
    }

    #[test]
    fn no_delivery_after_stop_returns() {
        let device = stereo_device();
        let capture = source(&device);
        let observer = Arc::new(Slow::default());
        capture.register_callback(&observer);
        capture.initialize().unwrap();
        capture.start().unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let pusher = {
            let device = device.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    device.push(SyntheticPacket::float32(&[0.3, 0.3], 2));
                    thread::sleep(Duration::from_millis(1));
                }
            })
        };
        assert!(wait_until(|| observer.buffers.load(Ordering::SeqCst) >= 3));

        capture.stop();
        assert!(!observer.in_flight.load(Ordering::SeqCst));
        let delivered = observer.buffers.load(Ordering::SeqCst);

        thread::sleep(Duration::from_millis(50));
        assert_eq!(observer.buffers.load(Ordering::SeqCst), delivered);

        done.store(true, Ordering::SeqCst);
        pusher.join().unwrap();
    }

    #[test]
    fn shutdown_before_initialize_and_twice() {
        let device = stereo_device();
        let capture = source(&device);

        capture.shutdown();
        assert!(!capture.is_capturing());
        assert_eq!(capture.state(), CaptureState::Uninitialized);

        capture.initialize().unwrap();
        capture.start().unwrap();
        capture.shutdown();
        capture.shutdown();

        assert!(!capture.is_capturing());
        assert_eq!(capture.state(), CaptureState::ShutDown);
        assert_eq!(device.live_clients(), 0);
        assert_eq!(capture.format(), None);
    }

    #[test]
    fn reinitialize_after_shutdown() {
        let device = stereo_device();
        let capture = source(&device);
        capture.initialize().unwrap();
        capture.shutdown();

        capture.initialize().unwrap();
        assert_eq!(device.activations(), 2);
        assert_eq!(device.live_clients(), 1);
    }

    #[test]
    fn drop_releases_device() {
        let device = stereo_device();
        {
            let capture = source(&device);
            capture.initialize().unwrap();
            capture.start().unwrap();
        }
        assert_eq!(device.live_clients(), 0);
    }

    #[test]
    fn rejects_invalid_config() {
        let device = stereo_device();
        let config = EngineConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(CaptureSource::with_config(device.backend(), config).is_err());
    }
}
