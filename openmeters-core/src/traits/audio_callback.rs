use crate::models::buffer::AudioBuffer;
use crate::models::meter::MeterSnapshot;

/// Observer of the capture pipeline.
///
/// Both methods are called on the real-time capture thread while the
/// registry lock is held: keep work short, never block, and never call
/// back into `register_callback` / `unregister_callback` from here.
pub trait AudioDataCallback: Send + Sync {
    /// Called once per delivered buffer of canonical f32 samples.
    ///
    /// Capture-source observers always receive this. Engine observers
    /// receive it only if [`wants_audio_data`](Self::wants_audio_data) is true.
    fn on_audio_data(&self, buffer: &AudioBuffer<'_>) {
        let _ = buffer;
    }

    /// Called once per buffer with its peak/RMS reading.
    fn on_meter_data(&self, snapshot: &MeterSnapshot) {
        let _ = snapshot;
    }

    /// Whether the engine should forward raw buffers to this observer.
    fn wants_audio_data(&self) -> bool {
        false
    }
}
