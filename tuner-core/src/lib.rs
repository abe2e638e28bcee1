// tuner-core/src/lib.rs

//! The core logic for the pitch tuner.
//! This crate turns raw audio chunks into fundamental-frequency estimates:
//! noise-profile capture, windowed spectral analysis, derived transforms
//! and peak extraction. It is completely headless and contains no GUI code.

pub mod audio;
pub mod config;
pub mod error;
pub mod fft;
pub mod noise;
pub mod notes;
pub mod peaks;
pub mod session;
pub mod transforms;

pub use audio::{AudioChunk, BufferedChunkSource, ChunkSource, CpalChunkSource};
pub use config::TunerConfig;
pub use error::{Result, TunerError};
pub use noise::NoiseProfile;
pub use notes::{NoteEntry, NoteTable, UNKNOWN_NOTE};
pub use session::TunerSession;

/// Represents the result of a single audio analysis frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    /// Detected peak frequencies in Hz, lowest first. Empty when nothing
    /// cleared the peak threshold.
    pub frequencies: Vec<f64>,
    /// Power spectrum the peaks were taken from.
    pub spectrum: Vec<f64>,
}

impl AnalysisResult {
    /// The fundamental estimate: the lowest detected peak.
    pub fn main_frequency(&self) -> Option<f64> {
        self.frequencies.first().copied()
    }
}
