//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library).
//! It selects an input device, opens an `f32` stream at the configured sample rate and
//! runs the detection pipeline directly inside the stream callback.
//!
//! ## Features
//! - Default or name-filtered input device selection
//! - Mono down-mix of multi-channel input
//! - Fixed-size block assembly without allocating on the audio thread
//! - Results handed to the caller over a bounded channel that never blocks

use anyhow::{Context, Result, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;
use crossbeam_channel::Sender;
use log::{error, info, warn};

use crate::pipeline::{Detection, DetectionPipeline};

/// Collects callback chunks of any length into blocks of exactly `frame_size` mono samples.
pub struct FrameAssembler {
    frame: Vec<f32>,
    filled: usize,
}

impl FrameAssembler {
    pub fn new(frame_size: usize) -> Self {
        Self {
            frame: vec![0.0; frame_size],
            filled: 0,
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame.len()
    }

    /// Samples waiting for the next complete block.
    pub fn pending(&self) -> usize {
        self.filled
    }

    /// Appends interleaved `data` with `channels` channels per frame.
    ///
    /// Channels are averaged to mono. `on_frame` is called once for each
    /// block that becomes complete; leftover samples stay buffered for the
    /// next call.
    pub fn push<F>(&mut self, data: &[f32], channels: usize, mut on_frame: F)
    where
        F: FnMut(&[f32]),
    {
        let channels = channels.max(1);
        for frame in data.chunks(channels) {
            self.frame[self.filled] = downmix(frame);
            self.filled += 1;

            if self.filled == self.frame.len() {
                on_frame(&self.frame);
                self.filled = 0;
            }
        }
    }
}

/// Averages one interleaved frame to a single sample.
pub fn downmix(frame: &[f32]) -> f32 {
    match frame {
        [] => 0.0,
        [mono] => *mono,
        _ => frame.iter().sum::<f32>() / frame.len() as f32,
    }
}

/// A running input stream feeding a detection pipeline.
///
/// Dropping the listener also stops the stream; [`AudioListener::stop`]
/// does it explicitly and reports errors.
pub struct AudioListener {
    stream: cpal::Stream,
    device_name: String,
    sample_rate: u32,
    channels: u16,
}

impl AudioListener {
    /// Starts audio capture and detection.
    ///
    /// This function:
    /// 1. Selects the default input device, or the first whose name contains `device_filter`
    /// 2. Picks an `f32` input format covering the pipeline's sample rate, preferring mono
    /// 3. Runs `pipeline` on every complete block inside the stream callback
    ///
    /// Every block's [`Detection`] is offered to `sender` with `try_send`; when
    /// the receiver falls behind, results are dropped rather than stalling the
    /// callback.
    ///
    /// # Returns
    /// * `Ok(listener)` - The stream is playing
    /// * `Err(e)` - No device, no matching format, or the stream failed to start
    pub fn start(
        pipeline: DetectionPipeline<'static>,
        device_filter: Option<&str>,
        sender: Sender<Detection<'static>>,
    ) -> Result<Self> {
        let host = cpal::default_host();
        let device = select_device(&host, device_filter)?;
        let device_name = device.name().unwrap_or_else(|_| "<unknown>".to_string());
        info!("Using audio input device: {}", device_name);

        let target_rate = pipeline.config().sample_rate;
        let configs = device
            .supported_input_configs()
            .context("failed to query input formats")?
            .collect::<Vec<_>>();
        let supported_config = find_supported_config(configs, target_rate)
            .ok_or_else(|| anyhow!("No f32 input format supports {} Hz", target_rate))?;

        let config: cpal::StreamConfig = supported_config
            .with_sample_rate(cpal::SampleRate(target_rate))
            .into();
        let channels = config.channels;
        info!(
            "Selected {} Hz, {} channel(s), {} samples per block",
            target_rate,
            channels,
            pipeline.config().frame_size
        );

        let err_fn = |err| error!("An error occurred on the audio stream: {}", err);

        let mut assembler = FrameAssembler::new(pipeline.config().frame_size);
        let mut pipeline = pipeline;

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                assembler.push(data, channels as usize, |block| {
                    match pipeline.process(block) {
                        Ok(detection) => {
                            // Full channel: the consumer is behind, drop this block.
                            let _ = sender.try_send(detection);
                        }
                        Err(e) => error!("Dropped block: {}", e),
                    }
                });
            },
            err_fn,
            None,
        )?;

        stream.play().context("failed to start the input stream")?;

        Ok(Self {
            stream,
            device_name,
            sample_rate: target_rate,
            channels,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Stops the stream and releases the device.
    ///
    /// The callback in flight, if any, finishes its block before the stream
    /// is torn down.
    pub fn stop(self) -> Result<()> {
        info!("Stopping input stream on {}", self.device_name);
        if let Err(e) = self.stream.pause() {
            warn!("Error pausing stream: {}", e);
        }
        drop(self.stream);
        Ok(())
    }
}

/// Names of all input devices on the default host.
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .context("failed to enumerate input devices")?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

fn select_device(host: &cpal::Host, filter: Option<&str>) -> Result<cpal::Device> {
    match filter {
        None => host
            .default_input_device()
            .ok_or_else(|| anyhow!("No input device available")),
        Some(filter) => {
            let needle = filter.to_lowercase();
            host.input_devices()
                .context("failed to enumerate input devices")?
                .find(|d| {
                    d.name()
                        .map(|name| name.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
                .ok_or_else(|| anyhow!("No input device matching \"{}\"", filter))
        }
    }
}

/// Finds the best supported audio configuration for the target sample rate.
///
/// Only `f32` formats whose rate range contains `target_rate` qualify; among
/// those the one with the fewest channels wins.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .filter(|c| c.min_sample_rate().0 <= target_rate && target_rate <= c.max_sample_rate().0)
        .min_by_key(|c| c.channels())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::{SampleFormat, SampleRate, SupportedBufferSize};

    fn range(channels: u16, min: u32, max: u32, format: SampleFormat) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Unknown,
            format,
        )
    }

    #[test]
    fn assembles_exact_blocks_across_chunks() {
        let mut assembler = FrameAssembler::new(4);
        let mut blocks: Vec<Vec<f32>> = Vec::new();

        assembler.push(&[1.0, 2.0, 3.0], 1, |b| blocks.push(b.to_vec()));
        assert!(blocks.is_empty());
        assert_eq!(assembler.pending(), 3);

        assembler.push(&[4.0, 5.0, 6.0, 7.0, 8.0, 9.0], 1, |b| blocks.push(b.to_vec()));
        assert_eq!(blocks, vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]]);
        assert_eq!(assembler.pending(), 1);
    }

    #[test]
    fn stereo_is_averaged() {
        let mut assembler = FrameAssembler::new(2);
        let mut blocks = Vec::new();
        assembler.push(&[1.0, 0.0, -0.5, -0.5], 2, |b| blocks.push(b.to_vec()));
        assert_eq!(blocks, vec![vec![0.5, -0.5]]);
    }

    #[test]
    fn downmix_edge_cases() {
        assert_eq!(downmix(&[]), 0.0);
        assert_eq!(downmix(&[0.25]), 0.25);
        assert_eq!(downmix(&[0.2, 0.4, 0.6]), 0.4);
    }

    #[test]
    fn prefers_mono_f32_covering_the_rate() {
        let configs = vec![
            range(2, 8_000, 96_000, SampleFormat::F32),
            range(1, 8_000, 96_000, SampleFormat::I16),
            range(1, 44_100, 48_000, SampleFormat::F32),
        ];
        let chosen = find_supported_config(configs, 44_100).unwrap();
        assert_eq!(chosen.channels(), 1);
        assert_eq!(chosen.sample_format(), SampleFormat::F32);
    }

    #[test]
    fn rejects_formats_outside_the_rate() {
        let configs = vec![
            range(1, 48_000, 48_000, SampleFormat::F32),
            range(1, 44_100, 44_100, SampleFormat::I16),
        ];
        assert!(find_supported_config(configs, 44_100).is_none());
    }
}
