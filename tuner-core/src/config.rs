//! # Configuration Module
//!
//! Session parameters for the tuner. A configuration is fixed for the
//! lifetime of a [`crate::session::TunerSession`]: the chunk size and the
//! sample rate must not change once chunks are flowing.
//!
//! Configurations are stored as pretty-printed JSON. Missing fields fall back
//! to the defaults, so a file containing only `{"chunk_size": 2048}` is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, TunerError};

/// Number of samples in one audio chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

/// Sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Number of chunks averaged into the noise profile.
pub const DEFAULT_NOISE_CHUNKS: usize = 10;

/// Relative height (of the spectrum maximum) a peak must reach.
pub const DEFAULT_PEAK_THRESHOLD: f64 = 0.70;

/// How long a chunk read may block before failing.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Parameters of a tuning session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per chunk (N).
    pub chunk_size: usize,
    /// Chunks read by a calibration run.
    pub noise_chunks: usize,
    /// Relative peak threshold in `(0, 1]`.
    pub peak_threshold: f64,
    /// Chunk read timeout in milliseconds.
    pub read_timeout_ms: u64,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            noise_chunks: DEFAULT_NOISE_CHUNKS,
            peak_threshold: DEFAULT_PEAK_THRESHOLD,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl TunerConfig {
    /// Loads and validates a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;
        let config: TunerConfig = serde_json::from_str(&data)?;
        config.validate()?;
        log::debug!("Loaded tuner config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Saves the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        fs::write(path, json_string)?;
        Ok(())
    }

    /// Checks that the parameters describe a usable session.
    ///
    /// The chunk size must be at least 4 so the cepstrum (computed over
    /// `chunk_size / 4` values) is never empty.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size < 4 {
            return Err(TunerError::Config(format!(
                "chunk_size must be at least 4, got {}",
                self.chunk_size
            )));
        }
        if self.sample_rate == 0 {
            return Err(TunerError::Config("sample_rate must be positive".into()));
        }
        if self.noise_chunks == 0 {
            return Err(TunerError::Config("noise_chunks must be positive".into()));
        }
        if !(self.peak_threshold > 0.0 && self.peak_threshold <= 1.0) {
            return Err(TunerError::Config(format!(
                "peak_threshold must lie in (0, 1], got {}",
                self.peak_threshold
            )));
        }
        Ok(())
    }

    /// Frequency spacing between adjacent spectrum bins, in Hz.
    pub fn bin_resolution(&self) -> f64 {
        self.sample_rate as f64 / self.chunk_size as f64
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}
