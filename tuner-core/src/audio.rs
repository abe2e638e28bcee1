//! # Audio Capture Module
//!
//! Chunk sources feed the pitch pipeline with fixed-size blocks of signed
//! 16-bit samples. The pipeline only sees the [`ChunkSource`] trait; device
//! handling stays in the implementations.
//!
//! ## Sources
//! - [`CpalChunkSource`]: live microphone input through CPAL
//! - [`BufferedChunkSource`]: replays pre-recorded chunks

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample, SupportedStreamConfigRange};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::collections::VecDeque;
use std::time::Duration;

use crate::config::TunerConfig;
use crate::error::{Result, TunerError};

/// Number of chunks buffered between the audio callback and the reader.
/// Chunks arriving while the buffer is full are dropped.
const CHANNEL_CAPACITY: usize = 8;

/// One fixed-length block of mono samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl AudioChunk {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Supplies fixed-size chunks at a fixed sample rate.
///
/// `read_chunk` may block until a chunk is available. Implementations
/// report device failures and timeouts as [`TunerError::Capture`] and never
/// retry internally.
pub trait ChunkSource {
    fn sample_rate(&self) -> u32;
    fn chunk_size(&self) -> usize;
    fn read_chunk(&mut self) -> Result<AudioChunk>;
}

/// Replays a queue of pre-recorded chunks.
#[derive(Debug, Clone)]
pub struct BufferedChunkSource {
    chunks: VecDeque<Vec<i16>>,
    sample_rate: u32,
    chunk_size: usize,
}

impl BufferedChunkSource {
    pub fn new(sample_rate: u32, chunk_size: usize) -> Self {
        Self {
            chunks: VecDeque::new(),
            sample_rate,
            chunk_size,
        }
    }

    /// Queues a chunk. Its length is not checked here; consumers reject
    /// chunks that do not match the configured size.
    pub fn push(&mut self, samples: Vec<i16>) {
        self.chunks.push_back(samples);
    }

    pub fn with_chunks<I>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = Vec<i16>>,
    {
        self.chunks.extend(chunks);
        self
    }

    pub fn remaining(&self) -> usize {
        self.chunks.len()
    }
}

impl ChunkSource for BufferedChunkSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn read_chunk(&mut self) -> Result<AudioChunk> {
        self.chunks
            .pop_front()
            .map(|samples| AudioChunk::new(samples, self.sample_rate))
            .ok_or_else(|| TunerError::Capture("buffered source exhausted".into()))
    }
}

/// Live microphone input from the default CPAL input device.
///
/// The stream callback reframes whatever block sizes the driver delivers into
/// chunks of exactly `chunk_size` samples. The stream stays open until the
/// source is dropped. `cpal::Stream` is not `Send` on every platform, so the
/// source should be created on the thread that reads from it.
pub struct CpalChunkSource {
    stream: cpal::Stream,
    receiver: Receiver<Vec<i16>>,
    sample_rate: u32,
    chunk_size: usize,
    read_timeout: Duration,
}

impl CpalChunkSource {
    /// Opens the default input device as a mono stream at the configured rate.
    ///
    /// Devices offering signed 16-bit input are used directly; `f32` devices
    /// are converted sample by sample.
    pub fn open_default(config: &TunerConfig) -> Result<Self> {
        config.validate()?;

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| TunerError::Capture("no input device available".into()))?;

        match device.name() {
            Ok(name) => log::info!("Using audio input device: {}", name),
            Err(e) => log::warn!("Could not read input device name: {}", e),
        }

        let configs = device
            .supported_input_configs()
            .map_err(|e| TunerError::Capture(e.to_string()))?
            .collect::<Vec<_>>();
        let supported_config = find_supported_config(configs, config.sample_rate).ok_or_else(|| {
            TunerError::Capture(format!(
                "no mono i16/f32 input format supports {} Hz",
                config.sample_rate
            ))
        })?;

        let sample_format = supported_config.sample_format();
        let stream_config: cpal::StreamConfig = supported_config
            .with_sample_rate(cpal::SampleRate(config.sample_rate))
            .into();
        log::info!(
            "Selected input format: {:?} at {} Hz, {} samples per chunk",
            sample_format,
            config.sample_rate,
            config.chunk_size
        );

        let (sender, receiver) = crossbeam_channel::bounded(CHANNEL_CAPACITY);
        let stream = match sample_format {
            cpal::SampleFormat::I16 => {
                build_chunked_stream::<i16>(&device, &stream_config, config.chunk_size, sender)?
            }
            cpal::SampleFormat::F32 => {
                build_chunked_stream::<f32>(&device, &stream_config, config.chunk_size, sender)?
            }
            other => {
                return Err(TunerError::Capture(format!(
                    "unsupported sample format {:?}",
                    other
                )));
            }
        };

        stream.play().map_err(|e| TunerError::Capture(e.to_string()))?;

        Ok(Self {
            stream,
            receiver,
            sample_rate: config.sample_rate,
            chunk_size: config.chunk_size,
            read_timeout: config.read_timeout(),
        })
    }
}

impl ChunkSource for CpalChunkSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn read_chunk(&mut self) -> Result<AudioChunk> {
        match self.receiver.recv_timeout(self.read_timeout) {
            Ok(samples) => Ok(AudioChunk::new(samples, self.sample_rate)),
            Err(RecvTimeoutError::Timeout) => Err(TunerError::Capture(format!(
                "no audio received within {} ms",
                self.read_timeout.as_millis()
            ))),
            Err(RecvTimeoutError::Disconnected) => {
                Err(TunerError::Capture("audio stream closed".into()))
            }
        }
    }
}

impl Drop for CpalChunkSource {
    fn drop(&mut self) {
        if let Err(e) = self.stream.pause() {
            log::warn!("Error pausing input stream: {}", e);
        }
    }
}

/// Builds an input stream that converts samples to `i16` and sends them on
/// in chunks of `chunk_size`.
fn build_chunked_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    chunk_size: usize,
    sender: Sender<Vec<i16>>,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    // Accumulates callback data until a full chunk is available.
    let mut pending: Vec<i16> = Vec::with_capacity(chunk_size * 2);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                pending.extend(data.iter().map(|&sample| i16::from_sample(sample)));
                while pending.len() >= chunk_size {
                    let chunk: Vec<i16> = pending.drain(..chunk_size).collect();
                    if sender.try_send(chunk).is_err() {
                        log::trace!("Reader is behind; dropped one audio chunk");
                    }
                }
            },
            |err| log::error!("An error occurred on the audio stream: {}", err),
            None,
        )
        .map_err(|e| TunerError::Capture(e.to_string()))
}

/// Picks a mono `i16` (preferred) or `f32` configuration whose rate range
/// contains `target_rate`.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1)
        .filter(|c| c.min_sample_rate().0 <= target_rate && target_rate <= c.max_sample_rate().0)
        .filter(|c| matches!(c.sample_format(), cpal::SampleFormat::I16 | cpal::SampleFormat::F32))
        .min_by_key(|c| match c.sample_format() {
            cpal::SampleFormat::I16 => 0,
            _ => 1,
        })
}
