//! Console observer.

use std::io::{self, Write};

use openmeters_core::models::meter::MeterSnapshot;
use openmeters_core::traits::audio_callback::AudioDataCallback;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One line rewritten in place, linear full scale.
    Linear,
    /// One line rewritten in place, dBFS.
    Decibels,
    /// One JSON object per snapshot.
    Json,
}

/// Prints every meter snapshot to stdout.
pub struct ConsolePrinter {
    mode: OutputMode,
}

impl ConsolePrinter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn render(&self, snapshot: &MeterSnapshot) -> String {
        match self.mode {
            OutputMode::Linear => format!(
                "\rPeak L: {:.3} R: {:.3} | RMS L: {:.3} R: {:.3}    ",
                snapshot.peak.left, snapshot.peak.right, snapshot.rms.left, snapshot.rms.right
            ),
            OutputMode::Decibels => {
                let (peak_l, peak_r) = snapshot.peak.to_dbfs();
                let (rms_l, rms_r) = snapshot.rms.to_dbfs();
                format!(
                    "\rPeak L: {:6.1} R: {:6.1} | RMS L: {:6.1} R: {:6.1} dBFS    ",
                    peak_l, peak_r, rms_l, rms_r
                )
            }
            OutputMode::Json => match serde_json::to_string(snapshot) {
                Ok(line) => format!("{}\n", line),
                Err(e) => {
                    log::debug!("Snapshot serialization failed: {}", e);
                    String::new()
                }
            },
        }
    }

    /// Move past the in-place meter line.
    pub fn finish(&self) {
        if self.mode != OutputMode::Json {
            println!();
        }
    }
}

impl AudioDataCallback for ConsolePrinter {
    fn on_meter_data(&self, snapshot: &MeterSnapshot) {
        let mut stdout = io::stdout().lock();
        // A closed stdout is not worth stopping capture for.
        let _ = stdout.write_all(self.render(snapshot).as_bytes());
        let _ = stdout.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openmeters_core::models::meter::ChannelLevels;

    fn snapshot() -> MeterSnapshot {
        MeterSnapshot {
            peak: ChannelLevels::new(1.0, 0.5),
            rms: ChannelLevels::new(0.25, 0.0),
            timestamp_ms: 1500,
            sequence: 7,
            frame_count: 480,
        }
    }

    #[test]
    fn linear_line() {
        let line = ConsolePrinter::new(OutputMode::Linear).render(&snapshot());
        assert_eq!(line, "\rPeak L: 1.000 R: 0.500 | RMS L: 0.250 R: 0.000    ");
    }

    #[test]
    fn decibel_line_uses_floor_for_silence() {
        let line = ConsolePrinter::new(OutputMode::Decibels).render(&snapshot());
        assert!(line.contains("Peak L:    0.0 R:   -6.0"));
        assert!(line.contains("R:  -96.0 dBFS"));
    }

    #[test]
    fn json_line_round_trips_fields() {
        let line = ConsolePrinter::new(OutputMode::Json).render(&snapshot());
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["sequence"], 7);
        assert_eq!(value["frame_count"], 480);
        assert_eq!(value["peak"]["right"], 0.5);
    }
}
