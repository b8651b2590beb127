//! # Detector Configuration
//!
//! The sample rate and block size are fixed when a pipeline is built and never
//! change afterwards. The heuristic thresholds are empirical constants; they
//! live here as named values so they can be tuned without touching the
//! pipeline's control flow.

use serde::{Deserialize, Serialize};

use crate::error::DetectorError;

/// Default input sample rate (CD quality).
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default number of samples per block (~46ms at 44.1kHz).
pub const DEFAULT_FRAME_SIZE: usize = 2048;

/// Peaks at or below this magnitude are treated as "no usable signal".
pub const MAGNITUDE_FLOOR: f64 = 0.05;

/// Octave correction is only attempted above this frequency (about C4).
pub const HARMONIC_FLOOR_HZ: f64 = 261.0;

/// Upper bound of the peak search, just above the highest note in the table.
pub const SEARCH_CEILING_HZ: f64 = 2200.0;

/// Tunable thresholds of the peak picker and the octave corrector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicParams {
    pub magnitude_floor: f64,
    pub harmonic_floor_hz: f64,
    pub search_ceiling_hz: f64,
}

impl Default for HeuristicParams {
    fn default() -> Self {
        Self {
            magnitude_floor: MAGNITUDE_FLOOR,
            harmonic_floor_hz: HARMONIC_FLOOR_HZ,
            search_ceiling_hz: SEARCH_CEILING_HZ,
        }
    }
}

/// Stream parameters and heuristics for one detection pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Samples per second delivered by the audio source.
    pub sample_rate: u32,
    /// Samples per block. Must be even and non-zero.
    pub frame_size: usize,
    pub heuristics: HeuristicParams,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frame_size: DEFAULT_FRAME_SIZE,
            heuristics: HeuristicParams::default(),
        }
    }
}

impl DetectorConfig {
    /// Creates a validated config with the default heuristics.
    pub fn new(sample_rate: u32, frame_size: usize) -> Result<Self, DetectorError> {
        let config = Self {
            sample_rate,
            frame_size,
            heuristics: HeuristicParams::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants every pipeline relies on.
    pub fn validate(&self) -> Result<(), DetectorError> {
        if self.sample_rate == 0 {
            return Err(DetectorError::Configuration(
                "sample_rate cannot be zero".into(),
            ));
        }
        if self.frame_size == 0 || self.frame_size % 2 != 0 {
            return Err(DetectorError::Configuration(format!(
                "frame_size must be a non-zero even number, got {}",
                self.frame_size
            )));
        }
        let h = &self.heuristics;
        if !(h.magnitude_floor.is_finite() && h.harmonic_floor_hz.is_finite()) {
            return Err(DetectorError::Configuration(
                "heuristic thresholds must be finite".into(),
            ));
        }
        if !(h.search_ceiling_hz.is_finite() && h.search_ceiling_hz > 0.0) {
            return Err(DetectorError::Configuration(
                "search_ceiling_hz must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Width of one spectrum bin in Hz.
    pub fn freq_resolution(&self) -> f64 {
        crate::pitch::freq_resolution(self.sample_rate, self.frame_size)
    }

    /// Length of one block in seconds; the real-time budget per callback.
    pub fn block_duration(&self) -> f64 {
        self.frame_size as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = DetectorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.frame_size, 2048);
        assert_eq!(config.heuristics.magnitude_floor, 0.05);
    }

    #[test]
    fn rejects_odd_or_empty_frames() {
        assert!(matches!(
            DetectorConfig::new(44_100, 0),
            Err(DetectorError::Configuration(_))
        ));
        assert!(matches!(
            DetectorConfig::new(44_100, 1023),
            Err(DetectorError::Configuration(_))
        ));
        assert!(matches!(
            DetectorConfig::new(0, 2048),
            Err(DetectorError::Configuration(_))
        ));
    }

    #[test]
    fn block_budget_at_reference_rate() {
        let config = DetectorConfig::default();
        assert!((config.block_duration() - 0.04644).abs() < 1e-4);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: DetectorConfig = serde_json::from_str(r#"{ "frame_size": 4096 }"#).unwrap();
        assert_eq!(config.frame_size, 4096);
        assert_eq!(config.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(config.heuristics, HeuristicParams::default());
    }
}
