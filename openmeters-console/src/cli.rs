//! Command-line interface for the console meter.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use openmeters_core::models::config::EngineConfig;
use openmeters_core::models::error::CaptureError;

/// OpenMeters - prints peak and RMS levels of the audio currently playing
#[derive(Parser, Debug)]
#[command(name = "openmeters")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// How long to meter before shutting down, in seconds
    #[arg(short, long, default_value_t = 10)]
    pub seconds: u64,

    /// JSON engine configuration; missing keys take their defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print one JSON snapshot per line instead of a live meter line
    #[arg(long)]
    pub json: bool,

    /// Show levels in dBFS instead of linear full scale
    #[arg(long)]
    pub db: bool,

    /// Increase logging verbosity
    /// -v = debug, -vv = trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn engine_config(&self) -> Result<EngineConfig, CaptureError> {
        let Some(path) = &self.config else {
            return Ok(EngineConfig::default());
        };
        let json = fs::read_to_string(path).map_err(|e| {
            CaptureError::InvalidConfiguration(format!("cannot read {}: {}", path.display(), e))
        })?;
        EngineConfig::from_json_str(&json)
    }
}

/// Initialize logging. `RUST_LOG` overrides the verbosity flags.
pub fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    builder.filter_level(LevelFilter::Warn);
    builder.filter_module("openmeters", args.log_level());
    builder.filter_module("openmeters_core", args.log_level());
    builder.filter_module("openmeters_windows", args.log_level());
    builder.parse_default_env();

    builder.format_timestamp_millis().init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["openmeters"]);
        assert_eq!(args.seconds, 10);
        assert!(!args.json);
        assert_eq!(args.log_level(), LevelFilter::Info);
        assert_eq!(args.engine_config().unwrap(), EngineConfig::default());
    }

    #[test]
    fn flags() {
        let args = Args::parse_from(["openmeters", "-s", "3", "--db", "-vv"]);
        assert_eq!(args.seconds, 3);
        assert!(args.db);
        assert_eq!(args.log_level(), LevelFilter::Trace);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = Args::parse_from(["openmeters", "--config", "/nonexistent/openmeters.json"]);
        assert!(matches!(args.engine_config(), Err(CaptureError::InvalidConfiguration(_))));
    }
}
