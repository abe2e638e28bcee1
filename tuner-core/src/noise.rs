//! # Noise Profile Module
//!
//! Ambient-noise baseline captured before live processing. The profile is the
//! mean-centered average of `K` consecutive chunks:
//!
//! `profile = (sum - mean(sum)) / K`
//!
//! It is subtracted from every later chunk after windowing and mean removal.
//! A capture always replaces the previous profile; profiles are never merged.

use crate::audio::ChunkSource;
use crate::error::{Result, TunerError};

/// Averaged, mean-centered baseline waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseProfile {
    samples: Vec<f64>,
    chunk_count: usize,
}

impl NoiseProfile {
    /// An all-zero profile of length `len`, as captured from perfect silence.
    pub fn silent(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
            chunk_count: 0,
        }
    }

    /// Builds a profile from chunks already in memory.
    ///
    /// Every chunk must have exactly `chunk_size` samples.
    pub fn from_chunks<'a, I>(chunks: I, chunk_size: usize) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [i16]>,
    {
        let mut sum = vec![0.0f64; chunk_size];
        let mut chunk_count = 0;

        for chunk in chunks {
            if chunk.len() != chunk_size {
                return Err(TunerError::SizeMismatch {
                    expected: chunk_size,
                    actual: chunk.len(),
                });
            }
            for (acc, &sample) in sum.iter_mut().zip(chunk) {
                *acc += sample as f64;
            }
            chunk_count += 1;
        }

        if chunk_count == 0 {
            return Err(TunerError::Config("noise capture needs at least one chunk".into()));
        }

        let mean = sum.iter().sum::<f64>() / chunk_size as f64;
        let samples = sum
            .into_iter()
            .map(|value| (value - mean) / chunk_count as f64)
            .collect();

        Ok(Self { samples, chunk_count })
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of chunks averaged into this profile (0 for a synthetic one).
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }
}

/// Reads `chunk_count` consecutive chunks from `source` and averages them into
/// a new profile.
///
/// Fails with [`TunerError::Capture`] when the source fails or yields a chunk
/// of the wrong size.
pub fn capture_noise<S>(source: &mut S, chunk_count: usize) -> Result<NoiseProfile>
where
    S: ChunkSource + ?Sized,
{
    if chunk_count == 0 {
        return Err(TunerError::Config("noise capture needs at least one chunk".into()));
    }

    let chunk_size = source.chunk_size();
    let mut chunks = Vec::with_capacity(chunk_count);
    for index in 0..chunk_count {
        let chunk = source.read_chunk()?;
        if chunk.len() != chunk_size {
            return Err(TunerError::Capture(format!(
                "noise chunk {} has {} samples, expected {}",
                index,
                chunk.len(),
                chunk_size
            )));
        }
        chunks.push(chunk);
    }

    let profile = NoiseProfile::from_chunks(chunks.iter().map(|c| c.samples()), chunk_size)?;
    log::info!("Captured noise profile from {} chunks", chunk_count);
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::BufferedChunkSource;

    #[test]
    fn profile_is_mean_centred_average() {
        let chunks: Vec<Vec<i16>> = vec![vec![1, 2, 3, 6], vec![3, 2, 1, 2]];
        let profile =
            NoiseProfile::from_chunks(chunks.iter().map(|c| c.as_slice()), 4).unwrap();
        // sum = [4, 4, 4, 8], mean 5, (sum - 5) / 2
        assert_eq!(profile.samples(), &[-0.5, -0.5, -0.5, 1.5]);
        assert_eq!(profile.chunk_count(), 2);
        assert!(profile.samples().iter().sum::<f64>().abs() < 1e-12);
    }

    #[test]
    fn capture_reads_exactly_the_requested_chunks() {
        let mut source = BufferedChunkSource::new(8000, 4)
            .with_chunks(vec![vec![0, 0, 0, 4]; 3]);
        let profile = capture_noise(&mut source, 2).unwrap();
        assert_eq!(source.remaining(), 1);
        assert_eq!(profile.samples(), &[-1.0, -1.0, -1.0, 3.0]);
    }

    #[test]
    fn wrong_sized_chunk_is_a_capture_error() {
        let mut source = BufferedChunkSource::new(8000, 4)
            .with_chunks(vec![vec![0, 0, 0, 0], vec![1, 2, 3]]);
        assert!(matches!(capture_noise(&mut source, 2), Err(TunerError::Capture(_))));
    }

    #[test]
    fn short_source_is_a_capture_error() {
        let mut source = BufferedChunkSource::new(8000, 4).with_chunks(vec![vec![0; 4]]);
        assert!(matches!(capture_noise(&mut source, 3), Err(TunerError::Capture(_))));
    }
}
