//! Errors produced by the detection pipeline itself.
//!
//! Device and file failures belong to the audio collaborators and are
//! reported through `anyhow` instead.

use thiserror::Error;

/// Errors returned by the note detector.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectorError {
    /// A block did not have exactly `frame_size` samples.
    #[error("expected block of length {expected}, got {got}")]
    InvalidFrameSize {
        /// The configured block size.
        expected: usize,
        /// The length of the block that was passed in.
        got: usize,
    },

    /// The detector was configured with unusable parameters.
    #[error("configuration error: {0}")]
    Configuration(String),
}
