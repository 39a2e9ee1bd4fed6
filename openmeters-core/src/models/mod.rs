pub mod audio_format;
pub mod buffer;
pub mod config;
pub mod error;
pub mod meter;
pub mod state;
