//! # openmeters-core
//!
//! Platform-agnostic loopback capture and metering core.
//!
//! Converts device-native samples to canonical f32, computes per-channel
//! peak and RMS levels, and fans buffers and meter snapshots out to
//! registered observers. Platform backends (Windows WASAPI) implement the
//! `LoopbackBackend` trait and plug into the generic `CaptureSource`.
//!
//! ## Architecture
//!
//! ```text
//! openmeters-core (this crate)
//! ├── traits/       ← LoopbackBackend, LoopbackClient, PacketReader, AudioDataCallback
//! ├── models/       ← CaptureError, CaptureState, AudioFormat, AudioBuffer,
//! │                  MeterSnapshot, EngineConfig
//! ├── processing/   ← SampleConverter, PeakMeter, RmsMeter
//! ├── session/      ← CaptureSource, AudioEngine, CallbackRegistry, StopSignal
//! └── synthetic     ← in-process loopback device
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod synthetic;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_format::{AudioFormat, DeviceFormat, SampleEncoding};
pub use models::buffer::AudioBuffer;
pub use models::config::EngineConfig;
pub use models::error::CaptureError;
pub use models::meter::{linear_to_dbfs, ChannelLevels, MeterSnapshot, DBFS_FLOOR};
pub use models::state::CaptureState;
pub use processing::peak_meter::PeakMeter;
pub use processing::rms_meter::RmsMeter;
pub use processing::sample_converter::SampleConverter;
pub use session::capture_source::CaptureSource;
pub use session::engine::AudioEngine;
pub use session::registry::CallbackHandle;
pub use traits::audio_callback::AudioDataCallback;
pub use traits::loopback_backend::{DevicePacket, LoopbackBackend, LoopbackClient, PacketReader};
