//! OpenMeters console meter.
//!
//! Captures what the default output device is playing and prints peak and
//! RMS levels until the requested duration elapses. Off Windows the
//! synthetic loopback device is driven with a test tone instead.

mod cli;
mod printer;
#[cfg(not(target_os = "windows"))]
mod tone;

use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{debug, error, info, warn};

use openmeters_core::models::config::EngineConfig;
use openmeters_core::models::error::CaptureError;
use openmeters_core::session::engine::AudioEngine;
use openmeters_core::traits::loopback_backend::LoopbackBackend;

use crate::printer::{ConsolePrinter, OutputMode};

/// Delay between attempts to bring capture up while it is unavailable.
const RETRY_INTERVAL: Duration = Duration::from_secs(1);

fn main() -> ExitCode {
    let args = cli::Args::parse();
    cli::init_logging(&args);

    info!("Starting OpenMeters console meter");

    let config = match args.engine_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&args, config) {
        Ok(()) => {
            info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_os = "windows")]
fn run(args: &cli::Args, config: EngineConfig) -> Result<(), CaptureError> {
    use openmeters_windows::WasapiLoopback;

    let engine = AudioEngine::with_config(WasapiLoopback::new(), config)?;
    meter(&engine, args);
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn run(args: &cli::Args, config: EngineConfig) -> Result<(), CaptureError> {
    use openmeters_core::models::audio_format::DeviceFormat;
    use openmeters_core::synthetic::SyntheticDevice;

    warn!("WASAPI loopback is Windows-only; metering a synthetic 440 Hz tone");

    let device = SyntheticDevice::new(DeviceFormat::float32(48000, 2));
    let mut tone = tone::ToneGenerator::spawn(device.clone(), 440.0, 0.5)
        .map_err(|e| CaptureError::ThreadSpawnFailed(e.to_string()))?;

    let engine = AudioEngine::with_config(device.backend(), config)?;
    meter(&engine, args);
    tone.stop();
    debug!("Synthetic device delivered {} packets", device.packets_read());
    Ok(())
}

/// Meter for `args.seconds`, retrying capture while it is unavailable,
/// then tear down in order.
fn meter<B: LoopbackBackend>(engine: &AudioEngine<B>, args: &cli::Args) {
    let mode = if args.json {
        OutputMode::Json
    } else if args.db {
        OutputMode::Decibels
    } else {
        OutputMode::Linear
    };
    let printer = Arc::new(ConsolePrinter::new(mode));
    let handle = engine.register_callback(&printer);

    let deadline = Instant::now() + Duration::from_secs(args.seconds);
    while Instant::now() < deadline {
        if !engine.is_capturing() {
            match engine.initialize().and_then(|()| engine.start()) {
                Ok(()) => {
                    if let Some(format) = engine.format() {
                        info!(
                            "Capturing {} Hz, {} channel(s) from {}",
                            format.sample_rate(),
                            format.channels(),
                            engine.device_name().as_deref().unwrap_or("default output")
                        );
                    }
                }
                Err(e) => warn!("Capture unavailable, retrying: {}", e),
            }
        }
        thread::sleep(RETRY_INTERVAL.min(deadline.saturating_duration_since(Instant::now())));
    }

    engine.stop();
    printer.finish();
    engine.unregister_callback(handle);
    engine.shutdown();
}
