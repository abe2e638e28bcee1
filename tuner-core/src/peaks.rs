//! # Peak Extraction Module
//!
//! Finds the dominant frequencies in a power spectrum. The spectrum is
//! normalized to its maximum, and every strict local maximum reaching the
//! relative threshold counts as a peak. Peaks are returned lowest bin first;
//! the first one is the fundamental estimate.

use crate::error::{Result, TunerError};

/// Scales a spectrum so its largest value is 1.0.
///
/// Fails with [`TunerError::DegenerateSpectrum`] when the maximum is not a
/// positive finite number (a silent or fully cancelled chunk).
pub fn normalize(spectrum: &[f64]) -> Result<Vec<f64>> {
    let max = spectrum.iter().cloned().fold(0.0f64, f64::max);
    if !(max > 0.0 && max.is_finite()) {
        return Err(TunerError::DegenerateSpectrum);
    }
    Ok(spectrum.iter().map(|&value| value / max).collect())
}

/// Returns the bins of all strict local maxima whose normalized height is at
/// least `threshold`, in ascending order.
///
/// The first and last bins have only one neighbor and are never peaks. A
/// degenerate spectrum yields no peaks.
pub fn find_peaks(spectrum: &[f64], threshold: f64) -> Vec<usize> {
    let normalized = match normalize(spectrum) {
        Ok(normalized) => normalized,
        Err(_) => {
            log::trace!("Degenerate spectrum; reporting no peaks");
            return Vec::new();
        }
    };

    normalized
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] >= threshold && w[1] > w[0] && w[1] > w[2])
        .map(|(i, _)| i + 1)
        .collect()
}

/// Converts a spectrum bin to its frequency in Hz: `bin * R / N`.
pub fn bin_to_frequency(bin: usize, sample_rate: u32, chunk_size: usize) -> f64 {
    bin as f64 * sample_rate as f64 / chunk_size as f64
}
