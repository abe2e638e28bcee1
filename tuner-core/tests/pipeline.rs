//! End-to-end checks of the pitch pipeline on synthesized chunks.

use pitch_tuner_core::{
    AudioChunk, BufferedChunkSource, NoiseProfile, NoteTable, TunerConfig, TunerError,
    TunerSession,
};
use std::f64::consts::PI;

const SAMPLE_RATE: u32 = 44100;
const CHUNK_SIZE: usize = 4096;

fn tone(freqs: &[f64], amplitude: f64) -> Vec<i16> {
    (0..CHUNK_SIZE)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE as f64;
            let value: f64 = freqs.iter().map(|f| (2.0 * PI * f * t).sin()).sum();
            (amplitude * value).round() as i16
        })
        .collect()
}

fn chunk(samples: Vec<i16>) -> AudioChunk {
    AudioChunk::new(samples, SAMPLE_RATE)
}

/// A session whose noise profile was captured from `noise_chunks` of silence.
fn calibrated_session(extra: Vec<Vec<i16>>) -> TunerSession<BufferedChunkSource> {
    let config = TunerConfig::default();
    let mut chunks = vec![vec![0i16; CHUNK_SIZE]; config.noise_chunks];
    chunks.extend(extra);
    let source = BufferedChunkSource::new(SAMPLE_RATE, CHUNK_SIZE).with_chunks(chunks);
    let mut session = TunerSession::new(source, config).unwrap();
    session.calibrate().unwrap();
    session
}

fn total_power(spectrum: &[f64]) -> f64 {
    spectrum.iter().map(|v| v * v).sum()
}

#[test]
fn a440_is_reported_within_one_bin() {
    let mut session = calibrated_session(vec![tone(&[440.0], 8000.0)]);
    let bin_width = session.config().bin_resolution();
    assert!((bin_width - 10.767).abs() < 1e-3);

    let result = session.analyze_next().unwrap();
    assert_eq!(result.frequencies.len(), 1, "peaks: {:?}", result.frequencies);
    let freq = result.main_frequency().unwrap();
    assert!((freq - 440.0).abs() <= bin_width, "got {} Hz", freq);
    assert!((429.2..=450.8).contains(&freq));

    let table = NoteTable::equal_temperament();
    assert_eq!(table.label_for(result.main_frequency()), "A4");
}

#[test]
fn sine_within_one_bin_across_the_range() {
    let session = calibrated_session(Vec::new());
    let bin_width = session.config().bin_resolution();
    for &f0 in &[82.41, 146.83, 329.63, 987.77, 2093.0] {
        let freqs = session.main_frequencies(&chunk(tone(&[f0], 6000.0))).unwrap();
        assert_eq!(freqs.len(), 1, "{} Hz gave {:?}", f0, freqs);
        assert!((freqs[0] - f0).abs() <= bin_width, "{} Hz gave {}", f0, freqs[0]);
    }
}

#[test]
fn peaks_are_ordered_lowest_first() {
    let session = calibrated_session(Vec::new());
    let bin_width = session.config().bin_resolution();
    let low = 20.0 * bin_width;
    let high = 60.0 * bin_width;

    let input = chunk(tone(&[high, low], 6000.0));
    let freqs = session.main_frequencies(&input).unwrap();
    assert_eq!(freqs.len(), 2, "peaks: {:?}", freqs);
    assert!((freqs[0] - low).abs() < 1e-9);
    assert!((freqs[1] - high).abs() < 1e-9);
    assert_eq!(session.fundamental(&input).unwrap(), Some(freqs[0]));
}

#[test]
fn silence_yields_no_frequencies() {
    let session = calibrated_session(Vec::new());
    let silent = chunk(vec![0; CHUNK_SIZE]);
    assert!(session.main_frequencies(&silent).unwrap().is_empty());
    assert_eq!(session.fundamental(&silent).unwrap(), None);

    let result = session.analyze(&silent).unwrap();
    assert!(result.main_frequency().is_none());
    assert!(result.spectrum.iter().all(|&v| v == 0.0));
}

#[test]
fn spectrum_length_is_half_the_chunk() {
    let session = calibrated_session(Vec::new());
    let input = chunk(tone(&[440.0], 1000.0));
    assert_eq!(session.power_spectrum(&input).unwrap().len(), CHUNK_SIZE / 2);
    assert_eq!(session.cepstrum(&input).unwrap().len(), CHUNK_SIZE / 4);
    assert_eq!(session.auto_correlation(&input).unwrap().len(), CHUNK_SIZE);
}

#[test]
fn noise_subtraction_lowers_power() {
    let hum = tone(&[120.0, 350.0], 3000.0);
    let config = TunerConfig::default();
    let source = BufferedChunkSource::new(SAMPLE_RATE, CHUNK_SIZE)
        .with_chunks(vec![hum.clone(); config.noise_chunks]);
    let mut session = TunerSession::new(source, config).unwrap();
    session.calibrate().unwrap();

    let input = chunk(hum);
    let with_profile = total_power(&session.power_spectrum(&input).unwrap());

    session.set_noise_profile(NoiseProfile::silent(CHUNK_SIZE)).unwrap();
    let without_profile = total_power(&session.power_spectrum(&input).unwrap());

    assert!(without_profile > 0.0);
    assert!(with_profile < without_profile);
}

#[test]
fn power_spectrum_is_deterministic() {
    let hum = tone(&[60.0], 500.0);
    let config = TunerConfig::default();
    let source = BufferedChunkSource::new(SAMPLE_RATE, CHUNK_SIZE)
        .with_chunks(vec![hum; config.noise_chunks]);
    let mut session = TunerSession::new(source, config).unwrap();
    session.calibrate().unwrap();

    let input = chunk(tone(&[440.0, 883.0], 4000.0));
    let first = session.power_spectrum(&input).unwrap();
    let second = session.power_spectrum(&input).unwrap();
    assert_eq!(first, second);
}

#[test]
fn capture_replaces_the_previous_profile() {
    let first: Vec<Vec<i16>> = vec![tone(&[200.0], 900.0); 2];
    let second: Vec<Vec<i16>> = vec![tone(&[50.0], 300.0), tone(&[75.0], 100.0)];
    let source = BufferedChunkSource::new(SAMPLE_RATE, CHUNK_SIZE)
        .with_chunks(first.iter().cloned().chain(second.iter().cloned()));
    let mut session = TunerSession::new(source, TunerConfig::default()).unwrap();

    session.capture_noise(2).unwrap();
    session.capture_noise(2).unwrap();

    let expected =
        NoiseProfile::from_chunks(second.iter().map(|c| c.as_slice()), CHUNK_SIZE).unwrap();
    assert_eq!(session.noise_profile(), Some(&expected));
}

#[test]
fn spectral_calls_need_a_profile() {
    let source = BufferedChunkSource::new(SAMPLE_RATE, CHUNK_SIZE);
    let session = TunerSession::new(source, TunerConfig::default()).unwrap();
    let input = chunk(tone(&[440.0], 1000.0));
    assert!(matches!(
        session.main_frequencies(&input),
        Err(TunerError::UninitializedProfile)
    ));
    assert!(matches!(session.cepstrum(&input), Err(TunerError::UninitializedProfile)));
    assert!(matches!(
        session.auto_correlation(&input),
        Err(TunerError::UninitializedProfile)
    ));
}

#[test]
fn wrong_chunk_size_is_rejected() {
    let session = calibrated_session(Vec::new());
    let short = chunk(vec![0; CHUNK_SIZE - 1]);
    assert!(matches!(
        session.main_frequencies(&short),
        Err(TunerError::SizeMismatch { expected: CHUNK_SIZE, actual })
            if actual == CHUNK_SIZE - 1
    ));
}

#[test]
fn capture_errors_propagate() {
    let mut session = calibrated_session(Vec::new());
    assert!(matches!(session.analyze_next(), Err(TunerError::Capture(_))));
    assert!(matches!(session.calibrate(), Err(TunerError::Capture(_))));
}
