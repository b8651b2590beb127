//! # piano-listen
//!
//! Listens to an audio input and prints which piano note is being played,
//! one detection per block.
//!
//! ## Architecture
//! - **Audio Thread**: the cpal callback assembles blocks and runs the detection pipeline
//! - **Main Thread**: prints detections and waits for Ctrl+C
//! - **Communication**: Crossbeam channels for detections and the shutdown signal

mod report;

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{bounded, select};
use log::{info, warn};
use piano_listen_core::audio::{self, AudioListener};
use piano_listen_core::{Detection, DetectionPipeline, DetectorConfig, wav};
use report::{Format, Reporter};

/// Detections buffered between the audio callback and the printer.
const RESULT_QUEUE: usize = 64;

#[derive(Parser, Debug)]
#[command(name = "piano-listen")]
#[command(about = "Names the piano note being played on an audio input")]
struct Args {
    /// Input sample rate in Hz [default: 44100]
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Samples per analysis block [default: 2048]
    #[arg(long)]
    frame_size: Option<usize>,

    /// JSON file holding a detector configuration; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to this JSON file and exit
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Use the first input device whose name contains this text
    #[arg(long, short)]
    device: Option<String>,

    /// Analyze a WAV file instead of listening to a device
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Print one JSON object per detection
    #[arg(long)]
    json: bool,

    /// List input devices and exit
    #[arg(long)]
    list_devices: bool,
}

impl Args {
    /// Builds the detector configuration from the config file and flags.
    fn detector_config(&self) -> Result<DetectorConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => DetectorConfig::default(),
        };
        if let Some(rate) = self.sample_rate {
            config.sample_rate = rate;
        }
        if let Some(size) = self.frame_size {
            config.frame_size = size;
        }
        config.validate()?;
        Ok(config)
    }

    fn format(&self) -> Format {
        if self.json { Format::Json } else { Format::Status }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    if args.list_devices {
        for name in audio::list_input_devices()? {
            println!("{}", name);
        }
        return Ok(());
    }

    let config = args.detector_config()?;
    if let Some(path) = &args.save_config {
        save_config(&config, path)?;
        info!("Configuration saved to {}", path.display());
        return Ok(());
    }

    let mut reporter = Reporter::new(io::stdout(), args.format());
    match &args.input {
        Some(path) => analyze_file(path, config, &mut reporter),
        None => listen(config, args.device.as_deref(), &mut reporter),
    }
}

/// Streams from an input device until Ctrl+C.
///
/// The shutdown signal is only checked between detections, so a block that
/// is being analyzed always completes before the stream is stopped.
fn listen<W: Write>(
    config: DetectorConfig,
    device: Option<&str>,
    reporter: &mut Reporter<W>,
) -> Result<()> {
    let pipeline = DetectionPipeline::with_standard_table(config)?;

    let (detection_tx, detection_rx) = bounded::<Detection<'static>>(RESULT_QUEUE);
    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .context("failed to install the Ctrl+C handler")?;

    let listener = AudioListener::start(pipeline, device, detection_tx)?;
    info!(
        "Listening on {} ({} Hz, {} channel(s))",
        listener.device_name(),
        listener.sample_rate(),
        listener.channels()
    );
    reporter.banner()?;

    loop {
        select! {
            recv(detection_rx) -> msg => match msg {
                Ok(detection) => reporter.report(&detection, None)?,
                Err(_) => {
                    warn!("Audio channel closed");
                    break;
                }
            },
            recv(shutdown_rx) -> _ => {
                info!("Received shutdown signal");
                break;
            },
        }
    }

    listener.stop()?;
    reporter.stopped()?;
    info!("{} detection(s) reported", reporter.reported());
    Ok(())
}

/// Runs every full block of a WAV file through the pipeline.
fn analyze_file<W: Write>(
    path: &Path,
    mut config: DetectorConfig,
    reporter: &mut Reporter<W>,
) -> Result<()> {
    let clip = wav::read_mono(path)?;
    if clip.sample_rate != config.sample_rate {
        info!(
            "Using the file's sample rate of {} Hz instead of {} Hz",
            clip.sample_rate, config.sample_rate
        );
        config.sample_rate = clip.sample_rate;
    }

    let mut pipeline = DetectionPipeline::with_standard_table(config)?;
    let block_duration = config.block_duration();
    let mut blocks = 0;
    for (i, block) in clip.blocks(config.frame_size).enumerate() {
        let detection = pipeline.process(block)?;
        reporter.report(&detection, Some(i as f64 * block_duration))?;
        blocks += 1;
    }

    info!(
        "{}: {} block(s) in {:.2}s, {} with a note",
        path.display(),
        blocks,
        clip.duration(),
        reporter.reported()
    );
    Ok(())
}

/// Loads a detector configuration from a JSON file.
fn load_config(path: &Path) -> Result<DetectorConfig> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut data = String::new();
    file.read_to_string(&mut data)?;
    let config = serde_json::from_str(&data)
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Saves a detector configuration as pretty-printed JSON.
fn save_config(config: &DetectorConfig, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(config)?;
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(json_string.as_bytes())?;
    Ok(())
}
