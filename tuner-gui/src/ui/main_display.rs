//! # Main Display Module
//!
//! This module contains the main display components and layout logic
//! for the pitch tuner: the frequency readout, the live plot and the controls.

use iced::widget::{button, column, container, row, text, Space};
use iced::{Alignment, Element, Length};
use pitch_tuner_core::UNKNOWN_NOTE;

use crate::widgets::plot::{Plot, PlotScale};
use crate::{AppDisplayData, Message, PlotMode};

/// Creates the complete main application view
pub fn create_main_view(data: &AppDisplayData) -> Element<'static, Message> {
    let title = text("Pitch Tuner").size(28);

    let main_content = column![
        title,
        create_readout(data),
        create_plot_panel(data),
        create_controls(data.plot_mode),
    ]
    .spacing(15)
    .padding(20)
    .width(Length::Fill);

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// Text shown for the detected frequency.
fn frequency_label(main_frequency: Option<f64>) -> String {
    match main_frequency {
        Some(freq) => format!("Main Freq. = {:6.2} Hz", freq),
        None => "No frequency detected".to_string(),
    }
}

/// Note name, frequency and worker status.
fn create_readout(data: &AppDisplayData) -> Element<'static, Message> {
    let frame = data.last_frame.as_ref();
    let note_name = frame
        .map(|f| f.note_name.clone())
        .unwrap_or_else(|| UNKNOWN_NOTE.to_string());
    let freq_text = frequency_label(frame.and_then(|f| f.main_frequency));

    container(
        column![
            text(note_name).size(48),
            text(freq_text).size(24),
            text(data.status.clone()).size(14),
        ]
        .spacing(5)
        .align_x(Alignment::Center),
    )
    .center_x(Length::Fill)
    .into()
}

fn create_plot_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let mode = data.plot_mode;
    let plot_data = data
        .last_frame
        .as_ref()
        .map(|f| f.plot_data(mode).to_vec())
        .unwrap_or_default();
    let scale = match mode {
        PlotMode::Waveform => PlotScale::Signed,
        PlotMode::Spectrum | PlotMode::Cepstrum | PlotMode::AutoCorrelation => {
            PlotScale::Magnitude
        }
    };

    container(
        column![
            text(mode.label()).size(18),
            Space::with_height(10),
            Plot::new(plot_data, scale).view(),
        ]
        .spacing(5)
        .padding(15),
    )
    .width(Length::Fill)
    .height(Length::Fixed(300.0))
    .into()
}

/// Plot selection buttons followed by the noise recapture button.
fn create_controls(selected: PlotMode) -> Element<'static, Message> {
    let plot_buttons = PlotMode::ALL
        .iter()
        .fold(row![].spacing(8), |buttons, &mode| {
            buttons.push(make_plot_button(mode, mode == selected))
        });

    row![
        plot_buttons,
        Space::with_width(Length::Fill),
        button(text("Recapture noise").size(14))
            .padding([6, 10])
            .on_press(Message::RecaptureNoise),
    ]
    .align_y(Alignment::Center)
    .into()
}

fn make_plot_button(mode: PlotMode, active: bool) -> Element<'static, Message> {
    let mut plot_button = button(text(mode.label()).size(14))
        .padding([6, 10])
        .on_press(Message::SelectPlot(mode));

    if active {
        plot_button = plot_button.style(|_theme, _status| {
            use iced::widget::button;
            button::Style {
                background: Some(iced::Background::Color(iced::Color::from_rgb(0.2, 0.6, 0.86))),
                text_color: iced::Color::WHITE,
                ..button::Style::default()
            }
        });
    }

    plot_button.into()
}
