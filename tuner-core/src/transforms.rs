//! # Derived Transforms
//!
//! Alternative pitch representations computed from the same preprocessing as
//! the power spectrum. Neither feeds the peak-based detector.
//!
//! Inverse transforms are normalized by `1/len`, so an inverse of a forward
//! transform returns the original signal.

use rustfft::num_complex::Complex;
use rustfft::Fft;

use crate::fft::SpectrumEngine;

/// Lower bound applied to power values before taking their logarithm.
pub const LOG_FLOOR: f64 = 1e-12;

impl SpectrumEngine {
    /// Cepstrum: inverse FFT of the log of the first half of the power
    /// spectrum, as magnitudes. The result has `N / 4` values.
    ///
    /// Non-positive power values are clamped to [`LOG_FLOOR`] so silent bins
    /// give a large negative log instead of `-inf`.
    pub fn cepstrum(&self, samples: &[i16], noise: &[f64]) -> Vec<f64> {
        let spectrum = self.power_spectrum(samples, noise);
        let half = spectrum.len() / 2;

        let mut buffer: Vec<Complex<f64>> = spectrum[..half]
            .iter()
            .map(|&power| Complex {
                re: power.max(LOG_FLOOR).ln(),
                im: 0.0,
            })
            .collect();
        self.cepstrum_inverse.process(&mut buffer);

        let scale = 1.0 / half as f64;
        buffer.iter().map(|c| c.norm() * scale).collect()
    }

    /// "Autocorrelation" of the preprocessed chunk: the forward transform is
    /// multiplied by itself (not by its conjugate), inverted, and scaled by
    /// `2/N`. This is the circular self-convolution of the signal. The result
    /// has `N` values.
    pub fn auto_correlation(&self, samples: &[i16], noise: &[f64]) -> Vec<f64> {
        let n = self.chunk_size();
        let mut buffer = self.transform(samples, noise);
        for value in buffer.iter_mut() {
            *value = *value * *value;
        }
        self.inverse.process(&mut buffer);

        let scale = 2.0 / (n as f64 * n as f64);
        buffer.iter().map(|c| c.norm() * scale).collect()
    }
}
