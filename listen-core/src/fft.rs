//! # Spectral Analysis Module
//!
//! Turns one block of real samples into a magnitude spectrum using RustFFT.
//!
//! No window function and no DC removal are applied. The raw rectangular
//! transform leaks more energy into neighbouring bins, but the magnitude
//! floor used downstream is calibrated against these unwindowed values.
//!
//! All buffers are allocated once in [`SpectralAnalyzer::new`] and reused for
//! every block, so analysis never allocates on the audio thread.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::DetectorError;

/// Forward FFT plus the buffers it works in.
pub struct SpectralAnalyzer {
    frame_size: usize,
    fft: Arc<dyn Fft<f64>>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    magnitudes: Vec<f64>,
}

impl SpectralAnalyzer {
    /// Plans the transform for blocks of `frame_size` samples.
    pub fn new(frame_size: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(frame_size);
        let scratch_len = fft.get_inplace_scratch_len();

        Self {
            frame_size,
            fft,
            buffer: vec![Complex { re: 0.0, im: 0.0 }; frame_size],
            scratch: vec![Complex { re: 0.0, im: 0.0 }; scratch_len],
            magnitudes: vec![0.0; frame_size / 2],
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Computes the magnitude spectrum of `block`.
    ///
    /// Returns `frame_size / 2` values; bin `i` is centred on
    /// `i * sample_rate / frame_size` Hz. Only the lower half is kept since
    /// the transform of a real signal is Hermitian-symmetric.
    ///
    /// # Errors
    /// * `InvalidFrameSize` if `block.len() != frame_size`
    pub fn analyze(&mut self, block: &[f32]) -> Result<&[f64], DetectorError> {
        if block.len() != self.frame_size {
            return Err(DetectorError::InvalidFrameSize {
                expected: self.frame_size,
                got: block.len(),
            });
        }

        for (slot, &sample) in self.buffer.iter_mut().zip(block) {
            *slot = Complex { re: sample as f64, im: 0.0 };
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        for (magnitude, c) in self.magnitudes.iter_mut().zip(&self.buffer) {
            *magnitude = c.norm(); // .norm() is sqrt(re^2 + im^2)
        }
        Ok(&self.magnitudes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn generate_sine(sample_rate: f64, frequency: f64, amplitude: f64, sample_count: usize) -> Vec<f32> {
        (0..sample_count)
            .map(|i| (amplitude * (2.0 * PI * frequency * i as f64 / sample_rate).sin()) as f32)
            .collect()
    }

    #[test]
    fn silence_has_an_empty_spectrum() {
        let mut analyzer = SpectralAnalyzer::new(2048);
        let spectrum = analyzer.analyze(&[0.0; 2048]).unwrap();
        assert_eq!(spectrum.len(), 1024);
        assert!(spectrum.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn dc_lands_in_bin_zero() {
        let mut analyzer = SpectralAnalyzer::new(256);
        let spectrum = analyzer.analyze(&[0.5; 256]).unwrap();
        assert!((spectrum[0] - 128.0).abs() < 1e-9);
        assert!(spectrum[1..].iter().all(|&m| m < 1e-9));
    }

    #[test]
    fn bin_centred_sine_is_not_windowed() {
        // A sine exactly on bin 10 keeps its full rectangular-window
        // magnitude of N * A / 2.
        let frame_size = 1024;
        let sample_rate = 44_100.0;
        let freq = 10.0 * sample_rate / frame_size as f64;
        let block = generate_sine(sample_rate, freq, 0.5, frame_size);

        let mut analyzer = SpectralAnalyzer::new(frame_size);
        let spectrum = analyzer.analyze(&block).unwrap();
        assert!((spectrum[10] - 256.0).abs() < 1e-3, "{}", spectrum[10]);
        assert!(spectrum[9] < 1e-3);
        assert!(spectrum[11] < 1e-3);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let mut analyzer = SpectralAnalyzer::new(2048);
        assert_eq!(
            analyzer.analyze(&[0.0; 2047]),
            Err(DetectorError::InvalidFrameSize { expected: 2048, got: 2047 })
        );
        assert!(analyzer.analyze(&[0.0; 4096]).is_err());
    }

    #[test]
    fn buffers_are_reused_between_blocks() {
        let mut analyzer = SpectralAnalyzer::new(512);
        let loud = generate_sine(44_100.0, 1000.0, 1.0, 512);
        let peak_loud = analyzer.analyze(&loud).unwrap().iter().cloned().fold(0.0, f64::max);
        assert!(peak_loud > 1.0);

        let spectrum = analyzer.analyze(&[0.0; 512]).unwrap();
        assert!(spectrum.iter().all(|&m| m == 0.0));
    }
}
