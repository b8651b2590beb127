//! # Detection Pipeline
//!
//! Runs one block of audio through spectrum, peak, octave correction and
//! note matching. Each block is classified on its own: there is no smoothing
//! or hysteresis between consecutive blocks.
//!
//! The pipeline is meant to run synchronously inside the audio callback. It
//! owns preallocated FFT buffers and only borrows the note table, so
//! [`DetectionPipeline::process`] does not allocate.

use log::debug;

use crate::config::DetectorConfig;
use crate::error::DetectorError;
use crate::fft::SpectralAnalyzer;
use crate::harmonic;
use crate::pitch::{self, Peak};
use crate::tuning::{Note, NoteTable};

/// A note reported for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionResult<'t> {
    /// Final note after octave correction.
    pub note: &'t Note,
    /// Frequency of the dominant bin before correction, in Hz.
    pub raw_frequency: f64,
    /// Magnitude of the dominant bin.
    pub magnitude: f64,
    halved: bool,
}

impl DetectionResult<'_> {
    /// True when the octave correction moved the note down.
    pub fn corrected(&self) -> bool {
        self.halved
    }
}

/// Per-block outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Detection<'t> {
    /// No usable signal in this block.
    Idle,
    /// A note was found.
    Detected(DetectionResult<'t>),
}

impl<'t> Detection<'t> {
    pub fn is_detected(&self) -> bool {
        matches!(self, Detection::Detected(_))
    }

    pub fn result(&self) -> Option<&DetectionResult<'t>> {
        match self {
            Detection::Detected(result) => Some(result),
            Detection::Idle => None,
        }
    }
}

/// Block-by-block note detector.
pub struct DetectionPipeline<'t> {
    config: DetectorConfig,
    table: &'t NoteTable,
    analyzer: SpectralAnalyzer,
    freq_resolution: f64,
}

impl DetectionPipeline<'static> {
    /// Builds a pipeline over the process-wide A4 = 440 Hz table.
    pub fn with_standard_table(config: DetectorConfig) -> Result<Self, DetectorError> {
        DetectionPipeline::new(config, NoteTable::standard())
    }
}

impl<'t> DetectionPipeline<'t> {
    /// Validates `config` and plans the FFT for its block size.
    pub fn new(config: DetectorConfig, table: &'t NoteTable) -> Result<Self, DetectorError> {
        config.validate()?;
        let freq_resolution = config.freq_resolution();
        debug!(
            "[PIPELINE] {} Hz / {} samples: {:.2} Hz per bin, {} bins searched",
            config.sample_rate,
            config.frame_size,
            freq_resolution,
            pitch::search_limit(freq_resolution, config.heuristics.search_ceiling_hz)
                .min(config.frame_size / 2),
        );

        Ok(Self {
            analyzer: SpectralAnalyzer::new(config.frame_size),
            config,
            table,
            freq_resolution,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn table(&self) -> &'t NoteTable {
        self.table
    }

    /// Bin width in Hz.
    pub fn freq_resolution(&self) -> f64 {
        self.freq_resolution
    }

    /// Finds the dominant bin of `block` without classifying it.
    pub fn peak(&mut self, block: &[f32]) -> Result<Peak, DetectorError> {
        let spectrum = self.analyzer.analyze(block)?;
        Ok(pitch::find_peak(
            spectrum,
            self.config.sample_rate,
            self.config.frame_size,
            self.config.heuristics.search_ceiling_hz,
        ))
    }

    /// Processes one block of exactly `frame_size` samples.
    ///
    /// # Errors
    /// * `InvalidFrameSize` if the block has the wrong length
    pub fn process(&mut self, block: &[f32]) -> Result<Detection<'t>, DetectorError> {
        let peak = self.peak(block)?;
        Ok(self.classify(peak))
    }

    /// Decides between idle and detected for an already located peak.
    ///
    /// The magnitude must be strictly above the floor to count as a note.
    pub fn classify(&self, peak: Peak) -> Detection<'t> {
        if peak.magnitude <= self.config.heuristics.magnitude_floor {
            return Detection::Idle;
        }

        let correction = harmonic::correct(
            peak.frequency,
            peak.magnitude,
            self.table,
            self.freq_resolution,
            &self.config.heuristics,
        );

        Detection::Detected(DetectionResult {
            note: correction.note,
            raw_frequency: peak.frequency,
            magnitude: peak.magnitude,
            halved: correction.halved,
        })
    }
}
