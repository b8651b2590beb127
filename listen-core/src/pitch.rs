//! # Peak Detection Module
//!
//! Picks the single strongest bin of a magnitude spectrum within the
//! musically relevant range. There is no interpolation between bins, so the
//! reported frequency is always a multiple of the bin width (~21.5 Hz at
//! 44.1kHz / 2048).

use serde::Serialize;

/// Dominant bin of a spectrum, converted to Hz.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Peak {
    /// Centre frequency of the winning bin in Hz.
    pub frequency: f64,
    /// Magnitude of the winning bin.
    pub magnitude: f64,
}

/// Width of one spectrum bin in Hz.
pub fn freq_resolution(sample_rate: u32, frame_size: usize) -> f64 {
    sample_rate as f64 / frame_size as f64
}

/// Index of the first bin excluded from the search, `floor(ceiling / resolution)`.
pub fn search_limit(freq_resolution: f64, ceiling_hz: f64) -> usize {
    (ceiling_hz / freq_resolution).floor() as usize
}

/// Finds the strongest bin among `[0, min(search_limit, len))`.
///
/// Ties keep the lowest bin. A spectrum that is zero throughout the range
/// yields `Peak { frequency: 0.0, magnitude: 0.0 }`.
///
/// # Arguments
/// * `spectrum` - Magnitudes from the spectral analyzer
/// * `sample_rate` - Sample rate in Hz
/// * `frame_size` - Block size the spectrum was computed from
/// * `ceiling_hz` - Upper bound of the search
pub fn find_peak(spectrum: &[f64], sample_rate: u32, frame_size: usize, ceiling_hz: f64) -> Peak {
    let resolution = freq_resolution(sample_rate, frame_size);
    let limit = search_limit(resolution, ceiling_hz).min(spectrum.len());

    let mut max_mag = 0.0;
    let mut max_idx = 0;
    for (i, &magnitude) in spectrum[..limit].iter().enumerate() {
        if magnitude > max_mag {
            max_mag = magnitude;
            max_idx = i;
        }
    }

    Peak {
        frequency: max_idx as f64 * resolution,
        magnitude: max_mag,
    }
}
