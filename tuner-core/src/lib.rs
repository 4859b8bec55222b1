// tuner-core/src/lib.rs

//! The core logic for the chromatic tuner.
//! This crate is responsible for audio capture, pitch detection,
//! and note mapping. It is completely headless
//! and contains no GUI code.
//!
//! Data flows one way, once per captured frame:
//! capture source → [`buffer`] → [`gate`] → [`pitch`] → [`tuning`] → [`session`] → presentation.

pub mod audio;
pub mod buffer;
pub mod config;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod pitch;
pub mod session;
pub mod synthetic;
pub mod tuning;

pub use config::{ReferencePitch, TunerConfig};
pub use error::{Result, TunerError};
pub use pipeline::Analyzer;
pub use pitch::{PitchEstimate, PitchEstimator};
pub use session::{SessionState, TunerEvent, TunerSession};
pub use tuning::{NoteMapper, NoteReading, PitchClass, TunerReading};
