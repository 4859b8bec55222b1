//! # Chromatic Tuner GUI
//!
//! The presentation layer of the tuner: shows the detected note, its deviation
//! in cents and the raw frequency, lets the user pick the A4 reference and
//! start or stop listening.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme
//! - **Analysis Thread**: owned by [`TunerSession`] for the duration of a session
//! - **Updates**: 60 FPS ticks drain session events via [`TunerSession::poll`]

mod settings;
mod ui;

use iced::{Element, Subscription, Theme};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tuner_core::audio::CpalCapture;
use tuner_core::{
    ReferencePitch, SessionState, TunerError, TunerEvent, TunerReading, TunerSession,
};
use ui::main_display::create_main_view;

/// Where the selected reference pitch and analysis settings are kept.
const SETTINGS_PATH: &str = "tuner_settings.json";

/// Main entry point for the tuner application.
pub fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting tuner application...");
    let result = iced::application("Chromatic Tuner", TunerApp::update, TunerApp::view)
        .subscription(TunerApp::subscription)
        .theme(TunerApp::theme)
        .run();
    info!("Application finished with result: {:?}", result);
    result
}

/// Application message types for the Iced GUI framework.
#[derive(Debug, Clone)]
pub enum Message {
    Start,
    Stop,
    ReferenceSelected(ReferencePitch),
    /// Timer tick for real-time updates
    Tick,
}

/// Line shown under the controls.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Starting,
    Listening { sample_rate: u32 },
    PermissionDenied(String),
    DeviceLost(String),
    Notice(String),
}

/// UI-specific data needed for rendering the interface.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub reading: TunerReading,
    pub reference: ReferencePitch,
    pub state: SessionState,
    pub status: Status,
}

/// Main application state.
#[derive(Debug)]
struct TunerApp {
    session: Option<TunerSession>,
    display_data: AppDisplayData,
}

impl Default for TunerApp {
    fn default() -> Self {
        let config = settings::load_or_default(SETTINGS_PATH);
        let reference = config.reference;
        let (session, status) = match TunerSession::new(CpalCapture, config) {
            Ok(session) => (Some(session), Status::Idle),
            Err(e) => {
                warn!("Tuner unavailable: {}", e);
                (None, Status::Notice(e.to_string()))
            }
        };

        Self {
            session,
            display_data: AppDisplayData {
                reading: TunerReading::NoSignal,
                reference,
                state: SessionState::Idle,
                status,
            },
        }
    }
}

impl TunerApp {
    fn update(&mut self, message: Message) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match message {
            Message::Start => match session.start() {
                Ok(()) => self.display_data.status = Status::Starting,
                Err(e) => self.display_data.status = Status::Notice(e.to_string()),
            },
            Message::Stop => session.stop(),
            Message::ReferenceSelected(reference) => match session.set_reference(reference) {
                Ok(()) => {
                    self.display_data.reference = reference;
                    if let Err(e) = settings::save_settings(session.config(), SETTINGS_PATH) {
                        warn!("Error saving settings: {:#}", e);
                    }
                }
                Err(TunerError::ReferenceLocked) => {
                    self.display_data.status =
                        Status::Notice("Stop the tuner to change the reference pitch".to_string());
                }
                Err(e) => self.display_data.status = Status::Notice(e.to_string()),
            },
            Message::Tick => {
                for event in session.poll() {
                    Self::process_event(&mut self.display_data, event);
                }
            }
        }

        if let Some(session) = &self.session {
            self.display_data.state = session.state();
            self.display_data.reading = session.current_reading();
        }
    }

    /// Applies one session event to the display data.
    fn process_event(data: &mut AppDisplayData, event: TunerEvent) {
        match event {
            TunerEvent::Started { sample_rate } => {
                data.status = Status::Listening { sample_rate };
            }
            TunerEvent::Reading(reading) => data.reading = reading,
            TunerEvent::Stopped => data.status = Status::Idle,
            TunerEvent::PermissionDenied(reason) => {
                warn!("Microphone access denied: {}", reason);
                data.status = Status::PermissionDenied(reason);
            }
            TunerEvent::DeviceLost(reason) => {
                warn!("Microphone lost: {}", reason);
                data.status = Status::DeviceLost(reason);
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data)
    }

    /// Ticks every 16ms (60 FPS) to pick up new readings.
    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(std::time::Duration::from_millis(16)).map(|_| Message::Tick)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}
