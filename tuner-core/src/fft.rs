//! # Fast Fourier Transform (FFT) Module
//!
//! Windowed spectral analysis of audio chunks. A [`SpectrumEngine`] is planned
//! once per chunk size and then turns chunks into power spectra.
//!
//! ## Pipeline
//! 1. Hamming window
//! 2. Removal of the windowed signal's own mean
//! 3. Subtraction of the stored noise profile
//! 4. Forward FFT, keeping the non-negative half scaled by `2/N`
//!
//! All arithmetic is `f64`. For odd chunk sizes the spectrum has `N / 2`
//! bins and the last transform bin is dropped.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// Computes the symmetric Hamming window of length `n`.
///
/// `w[i] = 0.54 - 0.46 cos(2 pi i / (n - 1))`
pub fn hamming_window(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    let n_minus_1 = (n - 1) as f64;
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / n_minus_1).cos())
        .collect()
}

/// Removes the DC offset from a signal by making its average value zero.
pub(crate) fn remove_dc_offset(signal: &mut [f64]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let avg = signal.iter().sum::<f64>() / len as f64;
    for sample in signal.iter_mut() {
        *sample -= avg;
    }
}

/// Planned transforms and window coefficients for one chunk size.
///
/// The engine holds no mutable state: every method is a pure function of its
/// inputs, so repeated calls on the same data give bit-identical results.
pub struct SpectrumEngine {
    chunk_size: usize,
    window: Vec<f64>,
    pub(crate) forward: Arc<dyn Fft<f64>>,
    pub(crate) inverse: Arc<dyn Fft<f64>>,
    pub(crate) cepstrum_inverse: Arc<dyn Fft<f64>>,
}

impl SpectrumEngine {
    pub fn new(chunk_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            chunk_size,
            window: hamming_window(chunk_size),
            forward: planner.plan_fft_forward(chunk_size),
            inverse: planner.plan_fft_inverse(chunk_size),
            cepstrum_inverse: planner.plan_fft_inverse(chunk_size / 4),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Windows the chunk, removes its mean and subtracts the noise profile:
    /// `windowed - mean(windowed) - noise`.
    ///
    /// Both slices must be `chunk_size` long; callers check this.
    pub fn preprocess(&self, samples: &[i16], noise: &[f64]) -> Vec<f64> {
        debug_assert_eq!(samples.len(), self.chunk_size);
        debug_assert_eq!(noise.len(), self.chunk_size);

        let mut signal: Vec<f64> = samples
            .iter()
            .zip(&self.window)
            .map(|(&sample, &w)| sample as f64 * w)
            .collect();
        remove_dc_offset(&mut signal);
        for (value, &n) in signal.iter_mut().zip(noise) {
            *value -= n;
        }
        signal
    }

    /// Forward FFT of the preprocessed chunk.
    pub(crate) fn transform(&self, samples: &[i16], noise: &[f64]) -> Vec<Complex<f64>> {
        let mut buffer: Vec<Complex<f64>> = self
            .preprocess(samples, noise)
            .into_iter()
            .map(|sample| Complex { re: sample, im: 0.0 })
            .collect();
        self.forward.process(&mut buffer);
        buffer
    }

    /// Power spectrum: magnitudes of the first `N / 2` FFT bins, scaled by `2/N`.
    pub fn power_spectrum(&self, samples: &[i16], noise: &[f64]) -> Vec<f64> {
        let spectrum = self.transform(samples, noise);
        spectrum_to_magnitudes(&spectrum, self.chunk_size)
    }
}

/// Magnitudes of the non-negative frequency half of `spectrum`, each scaled by
/// `2 / chunk_size`.
pub fn spectrum_to_magnitudes(spectrum: &[Complex<f64>], chunk_size: usize) -> Vec<f64> {
    let scale = 2.0 / chunk_size as f64;
    spectrum
        .iter()
        .take(chunk_size / 2)
        .map(|c| c.norm() * scale) // .norm() is sqrt(re^2 + im^2)
        .collect()
}
