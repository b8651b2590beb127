//! Offline audio source: a WAV file split into detector blocks.

use std::path::Path;

use anyhow::{Context, Result, bail};
use hound::{SampleFormat, WavReader};
use log::debug;

use crate::audio::downmix;

/// Mono samples decoded from a WAV file.
#[derive(Debug, Clone)]
pub struct WavClip {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl WavClip {
    /// Consecutive full blocks of `frame_size` samples. A trailing partial block is skipped.
    pub fn blocks(&self, frame_size: usize) -> std::slice::ChunksExact<'_, f32> {
        self.samples.chunks_exact(frame_size.max(1))
    }

    /// Length of the clip in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Reads a WAV file, normalizing samples to [-1.0, 1.0] and averaging channels to mono.
pub fn read_mono(path: impl AsRef<Path>) -> Result<WavClip> {
    let path = path.as_ref();
    let mut reader =
        WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("failed to decode float samples")?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                bail!("unsupported bit depth {}", spec.bits_per_sample);
            }
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<Result<_, _>>()
                .context("failed to decode integer samples")?
        }
    };

    let samples: Vec<f32> = interleaved.chunks(channels).map(downmix).collect();
    debug!(
        "Read {} ({} Hz, {} channel(s), {} samples)",
        path.display(),
        spec.sample_rate,
        channels,
        samples.len()
    );

    Ok(WavClip {
        sample_rate: spec.sample_rate,
        samples,
    })
}
