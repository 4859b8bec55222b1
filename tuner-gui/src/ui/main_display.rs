//! # Main Display Module
//!
//! This module contains the main display components and layout logic
//! for the tuner application.

use iced::widget::{button, column, container, pick_list, row, text, Space};
use iced::{Alignment, Color, Element, Length};
use tuner_core::{ReferencePitch, SessionState, TunerReading};

use super::cent_meter::{deviation_color, CentMeter};
use crate::{AppDisplayData, Message, Status};

/// Creates the complete main application view
pub fn create_main_view(data: &AppDisplayData) -> Element<'static, Message> {
    let title = text("Chromatic Tuner").size(28);

    let main_content = column![
        title,
        Space::with_height(20),
        create_note_panel(&data.reading),
        CentMeter::new(data.reading.note().map(|n| n.cents as f32)).view(),
        create_details_row(&data.reading),
        Space::with_height(20),
        create_controls(data.state, data.reference),
        text(status_text(&data.status)).size(16),
    ]
    .spacing(10)
    .align_x(Alignment::Center)
    .padding(20);

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .into()
}

/// Big note name with its octave, or `--` when there is no signal.
fn create_note_panel(reading: &TunerReading) -> Element<'static, Message> {
    let (label, color) = match reading.note() {
        Some(note) => (
            format!("{}{}", note.note, note.octave),
            deviation_color(note.cents as f32),
        ),
        None => ("--".to_string(), Color::from_rgb8(0x80, 0x80, 0x80)),
    };

    container(text(label).size(96).color(color))
        .center_x(Length::Fill)
        .into()
}

/// Cents, frequency and confidence of the current reading.
fn create_details_row(reading: &TunerReading) -> Element<'static, Message> {
    let (cents, frequency, confidence) = match reading.note() {
        Some(note) => (
            format!("{:+} cents", note.cents),
            format!("{:.2} Hz", note.frequency),
            format!("{:.0}%", note.confidence * 100.0),
        ),
        None => ("--".to_string(), "-- Hz".to_string(), "--".to_string()),
    };

    row![
        text(cents).size(20),
        Space::with_width(30),
        text(frequency).size(20),
        Space::with_width(30),
        text(confidence).size(20),
    ]
    .align_y(Alignment::Center)
    .into()
}

/// Reference picker and the start/stop button.
fn create_controls(state: SessionState, reference: ReferencePitch) -> Element<'static, Message> {
    let toggle = match state {
        SessionState::Idle => button("Start").on_press(Message::Start),
        SessionState::Starting | SessionState::Listening => {
            button("Stop").on_press(Message::Stop)
        }
    };

    row![
        text("Reference").size(16),
        reference_control(state, reference),
        Space::with_width(20),
        toggle,
    ]
    .spacing(10)
    .align_y(Alignment::Center)
    .into()
}

/// The reference can only be changed while idle; otherwise it is shown as text.
fn reference_control(state: SessionState, reference: ReferencePitch) -> Element<'static, Message> {
    if reference_editable(state) {
        pick_list(ReferencePitch::ALL, Some(reference), Message::ReferenceSelected).into()
    } else {
        text(reference.to_string()).size(16).into()
    }
}

fn reference_editable(state: SessionState) -> bool {
    state == SessionState::Idle
}

fn status_text(status: &Status) -> String {
    match status {
        Status::Idle => "Idle".to_string(),
        Status::Starting => "Opening microphone...".to_string(),
        Status::Listening { sample_rate } => format!("Listening at {} Hz", sample_rate),
        Status::PermissionDenied(reason) => format!("Microphone unavailable: {}", reason),
        Status::DeviceLost(reason) => format!("Microphone lost: {}", reason),
        Status::Notice(message) => message.clone(),
    }
}
