//! Terminal output for detections.
//!
//! Live mode rewrites a single status line; file mode prints one line per
//! block with its start time. JSON mode prints one object per detection.

use std::io::{self, Write};

use log::trace;
use piano_listen_core::Detection;
use serde::Serialize;

/// How detections are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Status,
    Json,
}

/// One detection as emitted in JSON mode.
#[derive(Debug, Serialize)]
struct Record<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<f64>,
    note: &'a str,
    note_frequency: f64,
    raw_frequency: f64,
    magnitude: f64,
    corrected: bool,
}

pub struct Reporter<W: Write> {
    out: W,
    format: Format,
    reported: usize,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: Format) -> Self {
        Self {
            out,
            format,
            reported: 0,
        }
    }

    /// Number of detections written so far.
    pub fn reported(&self) -> usize {
        self.reported
    }

    pub fn banner(&mut self) -> io::Result<()> {
        if self.format == Format::Status {
            writeln!(self.out, "Listening for piano notes... Press Ctrl+C to stop.")?;
        }
        Ok(())
    }

    pub fn stopped(&mut self) -> io::Result<()> {
        if self.format == Format::Status {
            writeln!(self.out, "\nStopped listening.")?;
        }
        self.out.flush()
    }

    /// Writes one block's outcome. Idle blocks produce no output.
    ///
    /// `time` is the block's start in seconds when reading from a file.
    pub fn report(&mut self, detection: &Detection<'_>, time: Option<f64>) -> io::Result<()> {
        let Some(result) = detection.result() else {
            trace!("idle block");
            return Ok(());
        };
        self.reported += 1;

        match (self.format, time) {
            (Format::Json, _) => {
                let record = Record {
                    time,
                    note: &result.note.name,
                    note_frequency: result.note.frequency,
                    raw_frequency: result.raw_frequency,
                    magnitude: result.magnitude,
                    corrected: result.corrected(),
                };
                serde_json::to_writer(&mut self.out, &record)?;
                writeln!(self.out)?;
            }
            (Format::Status, None) => {
                write!(
                    self.out,
                    "\rDetected: {} ({:.2} Hz) | Raw Freq: {:.2} Hz | Magnitude: {:.4}    ",
                    result.note.name, result.note.frequency, result.raw_frequency, result.magnitude
                )?;
            }
            (Format::Status, Some(t)) => {
                writeln!(
                    self.out,
                    "[{:>8.3}s] Detected: {} ({:.2} Hz) | Raw Freq: {:.2} Hz | Magnitude: {:.4}",
                    t, result.note.name, result.note.frequency, result.raw_frequency, result.magnitude
                )?;
            }
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
