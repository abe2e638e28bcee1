//! # Tuner Session Module
//!
//! A [`TunerSession`] owns one chunk source, its configuration, the planned
//! spectrum engine and the noise profile. Independent sessions share nothing.
//!
//! ## Usage discipline
//! Capture the noise profile first, then run spectral calls. The profile is
//! only written by `capture_noise`/`calibrate`/`set_noise_profile`, all of
//! which take `&mut self`, so the borrow checker already rules out a capture
//! while spectral calls are in flight on the same session.

use crate::audio::{AudioChunk, ChunkSource};
use crate::config::TunerConfig;
use crate::error::{Result, TunerError};
use crate::fft::SpectrumEngine;
use crate::noise::{self, NoiseProfile};
use crate::peaks;
use crate::AnalysisResult;

/// A single-source pitch detection session.
pub struct TunerSession<S: ChunkSource> {
    source: S,
    config: TunerConfig,
    engine: SpectrumEngine,
    noise: Option<NoiseProfile>,
}

impl<S: ChunkSource> TunerSession<S> {
    /// Creates a session. The source must deliver the configured chunk size
    /// and sample rate.
    pub fn new(source: S, config: TunerConfig) -> Result<Self> {
        config.validate()?;
        if source.chunk_size() != config.chunk_size {
            return Err(TunerError::Config(format!(
                "source delivers {}-sample chunks, config expects {}",
                source.chunk_size(),
                config.chunk_size
            )));
        }
        if source.sample_rate() != config.sample_rate {
            return Err(TunerError::Config(format!(
                "source runs at {} Hz, config expects {} Hz",
                source.sample_rate(),
                config.sample_rate
            )));
        }

        let engine = SpectrumEngine::new(config.chunk_size);
        log::debug!(
            "Tuner session ready: {} Hz, {} samples/chunk, {:.3} Hz/bin",
            config.sample_rate,
            config.chunk_size,
            config.bin_resolution()
        );

        Ok(Self {
            source,
            config,
            engine,
            noise: None,
        })
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn noise_profile(&self) -> Option<&NoiseProfile> {
        self.noise.as_ref()
    }

    /// Reads `chunk_count` chunks and stores their average as the new noise
    /// profile, replacing any previous one. On failure the old profile is kept.
    pub fn capture_noise(&mut self, chunk_count: usize) -> Result<()> {
        let profile = noise::capture_noise(&mut self.source, chunk_count)?;
        self.noise = Some(profile);
        Ok(())
    }

    /// Captures a noise profile over the configured number of chunks.
    pub fn calibrate(&mut self) -> Result<()> {
        self.capture_noise(self.config.noise_chunks)
    }

    /// Installs an externally built profile, e.g. [`NoiseProfile::silent`].
    pub fn set_noise_profile(&mut self, profile: NoiseProfile) -> Result<()> {
        if profile.len() != self.config.chunk_size {
            return Err(TunerError::SizeMismatch {
                expected: self.config.chunk_size,
                actual: profile.len(),
            });
        }
        self.noise = Some(profile);
        Ok(())
    }

    /// Reads the next chunk from the source.
    pub fn read_chunk(&mut self) -> Result<AudioChunk> {
        self.source.read_chunk()
    }

    /// Returns the stored profile after checking the chunk against it.
    fn checked_noise(&self, chunk: &AudioChunk) -> Result<&[f64]> {
        let noise = self.noise.as_ref().ok_or(TunerError::UninitializedProfile)?;
        if chunk.len() != self.config.chunk_size {
            return Err(TunerError::SizeMismatch {
                expected: self.config.chunk_size,
                actual: chunk.len(),
            });
        }
        Ok(noise.samples())
    }

    /// Noise-subtracted power spectrum of `chunk` (`N / 2` values).
    pub fn power_spectrum(&self, chunk: &AudioChunk) -> Result<Vec<f64>> {
        let noise = self.checked_noise(chunk)?;
        Ok(self.engine.power_spectrum(chunk.samples(), noise))
    }

    /// Cepstrum of `chunk` (`N / 4` values).
    pub fn cepstrum(&self, chunk: &AudioChunk) -> Result<Vec<f64>> {
        let noise = self.checked_noise(chunk)?;
        Ok(self.engine.cepstrum(chunk.samples(), noise))
    }

    /// Self-product "autocorrelation" of `chunk` (`N` values).
    pub fn auto_correlation(&self, chunk: &AudioChunk) -> Result<Vec<f64>> {
        let noise = self.checked_noise(chunk)?;
        Ok(self.engine.auto_correlation(chunk.samples(), noise))
    }

    /// Frequencies of all spectrum peaks, lowest first. Empty for silence.
    pub fn main_frequencies(&self, chunk: &AudioChunk) -> Result<Vec<f64>> {
        let spectrum = self.power_spectrum(chunk)?;
        Ok(self.frequencies_from_spectrum(&spectrum))
    }

    /// The lowest detected peak, taken as the fundamental.
    pub fn fundamental(&self, chunk: &AudioChunk) -> Result<Option<f64>> {
        Ok(self.main_frequencies(chunk)?.first().copied())
    }

    /// Power spectrum and detected frequencies of one chunk.
    pub fn analyze(&self, chunk: &AudioChunk) -> Result<AnalysisResult> {
        let spectrum = self.power_spectrum(chunk)?;
        let frequencies = self.frequencies_from_spectrum(&spectrum);
        Ok(AnalysisResult {
            frequencies,
            spectrum,
        })
    }

    /// Reads the next chunk and analyzes it.
    pub fn analyze_next(&mut self) -> Result<AnalysisResult> {
        let chunk = self.read_chunk()?;
        self.analyze(&chunk)
    }

    fn frequencies_from_spectrum(&self, spectrum: &[f64]) -> Vec<f64> {
        peaks::find_peaks(spectrum, self.config.peak_threshold)
            .into_iter()
            .map(|bin| peaks::bin_to_frequency(bin, self.config.sample_rate, self.config.chunk_size))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::BufferedChunkSource;

    fn small_config() -> TunerConfig {
        TunerConfig {
            sample_rate: 8000,
            chunk_size: 16,
            noise_chunks: 2,
            ..TunerConfig::default()
        }
    }

    #[test]
    fn rejects_mismatched_source() {
        let source = BufferedChunkSource::new(8000, 32);
        assert!(matches!(
            TunerSession::new(source, small_config()),
            Err(TunerError::Config(_))
        ));

        let source = BufferedChunkSource::new(44100, 16);
        assert!(TunerSession::new(source, small_config()).is_err());
    }

    #[test]
    fn set_noise_profile_checks_length() {
        let source = BufferedChunkSource::new(8000, 16);
        let mut session = TunerSession::new(source, small_config()).unwrap();
        assert!(matches!(
            session.set_noise_profile(NoiseProfile::silent(8)),
            Err(TunerError::SizeMismatch { expected: 16, actual: 8 })
        ));
        assert!(session.noise_profile().is_none());
        session.set_noise_profile(NoiseProfile::silent(16)).unwrap();
        assert!(session.noise_profile().is_some());
    }

    #[test]
    fn failed_capture_keeps_previous_profile() {
        let source = BufferedChunkSource::new(8000, 16).with_chunks(vec![vec![3; 16]; 2]);
        let mut session = TunerSession::new(source, small_config()).unwrap();
        session.calibrate().unwrap();
        let before = session.noise_profile().cloned();

        assert!(session.calibrate().is_err());
        assert_eq!(session.noise_profile().cloned(), before);
    }
}
