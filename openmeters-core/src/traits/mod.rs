pub mod audio_callback;
pub mod loopback_backend;
