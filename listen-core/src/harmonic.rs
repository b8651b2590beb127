//! # Octave Correction Module
//!
//! A single-bin peak picker often locks onto the second harmonic of a piano
//! tone, since the fundamental can be weaker than its octave. This module
//! applies one octave-down correction when halving the detected frequency
//! lands close to a real note.
//!
//! The correction is one-shot: at most one octave per block, never upwards,
//! and never at or below the harmonic floor (about C4).

use crate::config::HeuristicParams;
use crate::matcher;
use crate::tuning::{Note, NoteTable};

/// Outcome of the octave check for one peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction<'t> {
    /// Final note to report.
    pub note: &'t Note,
    /// Working frequency after correction, either the raw or the halved one.
    pub frequency: f64,
    /// True when the frequency was halved.
    pub halved: bool,
}

/// Maps `raw_freq` to a note, dropping an octave when the evidence allows it.
///
/// Steps:
/// 1. The baseline is the nearest note to `raw_freq`.
/// 2. Nothing else happens unless `raw_magnitude > magnitude_floor` and
///    `raw_freq > harmonic_floor_hz`.
/// 3. If `raw_freq / 2` is less than one bin width away from its own nearest
///    note, that lower note replaces the baseline.
///
/// # Arguments
/// * `raw_freq` - Frequency of the dominant bin in Hz
/// * `raw_magnitude` - Magnitude of the dominant bin
/// * `table` - Reference notes
/// * `freq_resolution` - Bin width in Hz
/// * `params` - Heuristic thresholds
pub fn correct<'t>(
    raw_freq: f64,
    raw_magnitude: f64,
    table: &'t NoteTable,
    freq_resolution: f64,
    params: &HeuristicParams,
) -> Correction<'t> {
    let closest = matcher::nearest(raw_freq, table);
    let unchanged = Correction {
        note: closest,
        frequency: raw_freq,
        halved: false,
    };

    if raw_magnitude <= params.magnitude_floor || raw_freq <= params.harmonic_floor_hz {
        return unchanged;
    }

    let fundamental = raw_freq / 2.0;
    let candidate = matcher::nearest(fundamental, table);
    if (fundamental - candidate.frequency).abs() < freq_resolution {
        Correction {
            note: candidate,
            frequency: fundamental,
            halved: true,
        }
    } else {
        unchanged
    }
}
