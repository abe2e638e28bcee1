//! # Pitch Tuner - Live Pitch Display
//!
//! Shows the fundamental frequency of the microphone signal, the matching
//! note, and a live plot of the waveform or one of its transforms.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI, refreshed every 100 ms
//! - **Audio Thread**: owns the microphone and the tuner session
//! - **Communication**: Crossbeam channels; the GUI stops the worker with an
//!   explicit shutdown command

mod ui;
mod widgets;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use iced::{Element, Subscription, Theme};
use pitch_tuner_core::{
    AudioChunk, ChunkSource, CpalChunkSource, NoteTable, TunerConfig, TunerSession,
};
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use ui::main_display::create_main_view;

/// Optional configuration file in the working directory.
const CONFIG_PATH: &str = "tuner_config.json";
/// Display refresh period.
const REFRESH_INTERVAL: Duration = Duration::from_millis(100);
const COMMAND_CAPACITY: usize = 4;

pub fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting pitch tuner...");
    let result = iced::application("Pitch Tuner", TunerApp::update, TunerApp::view)
        .subscription(TunerApp::subscription)
        .theme(TunerApp::theme)
        .run();
    log::info!("Application finished with result: {:?}", result);
    result
}

/// Application message types for the Iced GUI framework.
#[derive(Debug, Clone)]
pub enum Message {
    SelectPlot(PlotMode),
    RecaptureNoise,
    Tick,
}

/// Which signal the live plot shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotMode {
    Waveform,
    Spectrum,
    Cepstrum,
    AutoCorrelation,
}

impl PlotMode {
    pub const ALL: [PlotMode; 4] = [
        PlotMode::Waveform,
        PlotMode::Spectrum,
        PlotMode::Cepstrum,
        PlotMode::AutoCorrelation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PlotMode::Waveform => "Waveform",
            PlotMode::Spectrum => "Spectrum",
            PlotMode::Cepstrum => "Cepstrum",
            PlotMode::AutoCorrelation => "Autocorrelation",
        }
    }
}

/// Everything the display needs from one processed chunk.
#[derive(Debug, Clone)]
pub struct DisplayFrame {
    pub main_frequency: Option<f64>,
    pub note_name: String,
    pub waveform: Vec<f32>,
    pub spectrum: Vec<f32>,
    pub cepstrum: Vec<f32>,
    pub auto_correlation: Vec<f32>,
}

impl DisplayFrame {
    pub fn plot_data(&self, mode: PlotMode) -> &[f32] {
        match mode {
            PlotMode::Waveform => &self.waveform,
            PlotMode::Spectrum => &self.spectrum,
            PlotMode::Cepstrum => &self.cepstrum,
            PlotMode::AutoCorrelation => &self.auto_correlation,
        }
    }
}

/// UI-specific data needed for rendering the interface.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub status: String,
    pub last_frame: Option<DisplayFrame>,
    pub plot_mode: PlotMode,
}

/// Events sent from the audio thread to the GUI.
enum WorkerEvent {
    Calibrating,
    Frame(DisplayFrame),
    Failed(String),
}

/// Commands sent from the GUI to the audio thread.
enum WorkerCommand {
    RecaptureNoise,
    Shutdown,
}

struct TunerApp {
    audio_worker: Option<AudioWorker>,
    event_receiver: Receiver<WorkerEvent>,
    display_data: AppDisplayData,
}

/// Audio worker thread management structure.
///
/// Dropping the worker sends the shutdown command and joins the thread.
struct AudioWorker {
    command_tx: Sender<WorkerCommand>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Default for TunerApp {
    fn default() -> Self {
        let config = load_config();
        let notes = load_note_table();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();

        Self {
            audio_worker: Some(AudioWorker::spawn(config, notes, event_tx)),
            event_receiver: event_rx,
            display_data: AppDisplayData {
                status: "Starting audio...".to_string(),
                last_frame: None,
                plot_mode: PlotMode::Spectrum,
            },
        }
    }
}

impl TunerApp {
    fn update(&mut self, message: Message) {
        match message {
            Message::SelectPlot(mode) => {
                self.display_data.plot_mode = mode;
            }
            Message::RecaptureNoise => {
                if let Some(worker) = &self.audio_worker {
                    if worker.command_tx.try_send(WorkerCommand::RecaptureNoise).is_err() {
                        log::warn!("Audio worker is not accepting commands");
                    }
                }
            }
            Message::Tick => {
                while let Ok(event) = self.event_receiver.try_recv() {
                    self.process_worker_event(event);
                }
            }
        }
    }

    fn process_worker_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Calibrating => {
                self.display_data.status = "Capturing ambient noise, keep quiet...".to_string();
            }
            WorkerEvent::Frame(frame) => {
                self.display_data.status = "Listening".to_string();
                self.display_data.last_frame = Some(frame);
            }
            WorkerEvent::Failed(message) => {
                self.display_data.status = format!("Audio error: {}", message);
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data)
    }

    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(REFRESH_INTERVAL).map(|_| Message::Tick)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

impl AudioWorker {
    /// Spawns the audio thread. The microphone is opened on that thread
    /// because the stream handle cannot move between threads.
    fn spawn(config: TunerConfig, notes: NoteTable, events: Sender<WorkerEvent>) -> Self {
        let (command_tx, command_rx) = crossbeam_channel::bounded(COMMAND_CAPACITY);
        let thread_handle = thread::spawn(move || {
            if let Err(e) = run_audio_worker(config, &notes, &events, &command_rx) {
                log::error!("Audio worker stopped: {:#}", e);
                let _ = events.send(WorkerEvent::Failed(format!("{:#}", e)));
            }
            log::info!("Audio thread finished");
        });

        Self {
            command_tx,
            thread_handle: Some(thread_handle),
        }
    }
}

impl Drop for AudioWorker {
    fn drop(&mut self) {
        let _ = self.command_tx.send(WorkerCommand::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("Audio thread panicked");
            }
        }
    }
}

/// Captures noise, then analyzes chunks until told to stop or the GUI goes away.
fn run_audio_worker(
    config: TunerConfig,
    notes: &NoteTable,
    events: &Sender<WorkerEvent>,
    commands: &Receiver<WorkerCommand>,
) -> anyhow::Result<()> {
    let source = CpalChunkSource::open_default(&config).context("opening microphone")?;
    let mut session = TunerSession::new(source, config)?;

    recapture_noise(&mut session, events)?;

    loop {
        match commands.try_recv() {
            Ok(WorkerCommand::Shutdown) | Err(TryRecvError::Disconnected) => {
                log::info!("Audio worker received shutdown");
                break;
            }
            Ok(WorkerCommand::RecaptureNoise) => recapture_noise(&mut session, events)?,
            Err(TryRecvError::Empty) => {}
        }

        let chunk = session.read_chunk()?;
        let frame = build_display_frame(&session, &chunk, notes)?;
        if events.send(WorkerEvent::Frame(frame)).is_err() {
            break;
        }
    }
    Ok(())
}

fn recapture_noise<S: ChunkSource>(
    session: &mut TunerSession<S>,
    events: &Sender<WorkerEvent>,
) -> anyhow::Result<()> {
    let _ = events.send(WorkerEvent::Calibrating);
    session.calibrate().context("capturing ambient noise")?;
    Ok(())
}

/// Runs one chunk through every transform the display can show.
fn build_display_frame<S: ChunkSource>(
    session: &TunerSession<S>,
    chunk: &AudioChunk,
    notes: &NoteTable,
) -> pitch_tuner_core::Result<DisplayFrame> {
    let analysis = session.analyze(chunk)?;
    let main_frequency = analysis.main_frequency();

    Ok(DisplayFrame {
        main_frequency,
        note_name: notes.label_for(main_frequency).to_string(),
        waveform: chunk
            .samples()
            .iter()
            .map(|&s| s as f32 / i16::MAX as f32)
            .collect(),
        spectrum: analysis.spectrum.iter().map(|&v| v as f32).collect(),
        // Quefrency 0 is the mean log power and dwarfs the rest.
        cepstrum: session
            .cepstrum(chunk)?
            .iter()
            .skip(1)
            .map(|&v| v as f32)
            .collect(),
        auto_correlation: session
            .auto_correlation(chunk)?
            .iter()
            .map(|&v| v as f32)
            .collect(),
    })
}

fn load_config() -> TunerConfig {
    if !Path::new(CONFIG_PATH).exists() {
        return TunerConfig::default();
    }
    match TunerConfig::load(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Ignoring {}: {}", CONFIG_PATH, e);
            TunerConfig::default()
        }
    }
}

/// Uses the note table named by the first argument, or the built-in
/// equal-temperament table.
fn load_note_table() -> NoteTable {
    let Some(path) = std::env::args().nth(1) else {
        return NoteTable::equal_temperament().clone();
    };
    match NoteTable::load(&path) {
        Ok(table) => table,
        Err(e) => {
            log::warn!("Could not load note table {}: {}", path, e);
            NoteTable::equal_temperament().clone()
        }
    }
}
