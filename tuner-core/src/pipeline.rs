//! # Analysis Pipeline
//!
//! One analysis cycle: buffer the incoming frame, gate on energy, estimate the
//! pitch, and map it to a note. Every inconclusive outcome collapses into
//! [`TunerReading::NoSignal`].

use tracing::debug;

use crate::buffer::SampleWindow;
use crate::config::TunerConfig;
use crate::gate::SignalGate;
use crate::pitch::{PitchEstimate, PitchEstimator};
use crate::tuning::{NoteMapper, TunerReading};

/// Per-session analysis state.
///
/// Only the sample window carries data from one cycle to the next; the gate,
/// estimator and mapper are pure.
#[derive(Debug, Clone)]
pub struct Analyzer {
    window: SampleWindow,
    gate: SignalGate,
    estimator: PitchEstimator,
    mapper: NoteMapper,
}

impl Analyzer {
    pub fn new(config: &TunerConfig, sample_rate: u32) -> Self {
        Self {
            window: SampleWindow::new(config.window_size, sample_rate),
            gate: SignalGate::new(config.gate_threshold),
            estimator: PitchEstimator::from_config(config),
            mapper: NoteMapper::new(config.reference),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.window.sample_rate()
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    /// Runs one cycle on a freshly captured frame.
    pub fn process(&mut self, frame: &[f32]) -> TunerReading {
        self.window.push(frame);
        match self.estimate() {
            Some(estimate) => self.mapper.map_estimate(&estimate),
            None => TunerReading::NoSignal,
        }
    }

    /// Gates and estimates the current window without mapping it.
    pub fn estimate(&self) -> Option<PitchEstimate> {
        let samples = self.window.samples();
        if !self.gate.is_usable(samples) {
            return None;
        }
        let estimate = self
            .estimator
            .estimate(samples, self.window.sample_rate());
        if estimate.is_none() {
            debug!("inconclusive cycle over {} samples", samples.len());
        }
        estimate
    }
}
