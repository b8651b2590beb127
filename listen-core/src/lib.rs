// listen-core/src/lib.rs

//! The core logic for the piano note listener.
//! This crate turns fixed-size blocks of mono audio into note detections:
//! magnitude spectrum, dominant peak, octave correction and nearest-note
//! matching against an equal-tempered table. It also provides the live
//! (cpal) and offline (WAV) audio sources. It contains no terminal output.

pub mod audio;
pub mod config;
pub mod error;
pub mod fft;
pub mod harmonic;
pub mod matcher;
pub mod pipeline;
pub mod pitch;
pub mod tuning;
pub mod wav;

pub use config::{DetectorConfig, HeuristicParams};
pub use error::DetectorError;
pub use pipeline::{Detection, DetectionPipeline, DetectionResult};
pub use pitch::Peak;
pub use tuning::{Note, NoteTable};
