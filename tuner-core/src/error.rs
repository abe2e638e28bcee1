//! # Error Module
//!
//! Every fallible operation in the core returns [`TunerError`]. Capture and
//! size errors come from the environment and are surfaced to the caller;
//! a degenerate spectrum is the only condition recovered locally.

use thiserror::Error;

/// Errors produced by the pitch-detection pipeline.
#[derive(Debug, Error)]
pub enum TunerError {
    /// The chunk source is unavailable or produced a malformed read.
    #[error("audio capture failed: {0}")]
    Capture(String),

    /// A spectral computation was attempted before any noise capture.
    #[error("no noise profile captured; call capture_noise first")]
    UninitializedProfile,

    /// A chunk (or profile) length differs from the configured chunk size.
    #[error("chunk size mismatch: expected {expected} samples, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The power spectrum has no positive maximum and cannot be normalized.
    #[error("power spectrum is all zero")]
    DegenerateSpectrum,

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A note table row could not be parsed. `line` is 1-based.
    #[error("note table line {line}: {message}")]
    NoteTable { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TunerError>;
