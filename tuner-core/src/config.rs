//! # Tuner Configuration
//!
//! The reference pitch and the analysis constants a session runs with.
//! A configuration is fixed for the lifetime of one listening session; the
//! [`TunerSession`](crate::session::TunerSession) only accepts changes while idle.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TunerError};

/// Number of samples in the analysis window.
pub const DEFAULT_WINDOW_SIZE: usize = 2048;

/// RMS level below which a window is treated as silence.
pub const DEFAULT_GATE_THRESHOLD: f32 = 0.01;

/// Minimum correlation for a pitch candidate to be reported.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.9;

/// Lowest detectable fundamental in Hz.
pub const DEFAULT_MIN_FREQUENCY: f32 = 40.0;

/// Highest detectable fundamental in Hz.
pub const DEFAULT_MAX_FREQUENCY: f32 = 800.0;

/// Sample rate requested from the capture device.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Frequency assigned to concert A4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReferencePitch {
    #[serde(rename = "432")]
    A432,
    #[serde(rename = "435")]
    A435,
    #[default]
    #[serde(rename = "440")]
    A440,
    #[serde(rename = "442")]
    A442,
    #[serde(rename = "443")]
    A443,
}

impl ReferencePitch {
    /// Every selectable reference, lowest first.
    pub const ALL: [ReferencePitch; 5] = [
        ReferencePitch::A432,
        ReferencePitch::A435,
        ReferencePitch::A440,
        ReferencePitch::A442,
        ReferencePitch::A443,
    ];

    /// The A4 frequency in Hz.
    pub fn hz(self) -> f32 {
        match self {
            ReferencePitch::A432 => 432.0,
            ReferencePitch::A435 => 435.0,
            ReferencePitch::A440 => 440.0,
            ReferencePitch::A442 => 442.0,
            ReferencePitch::A443 => 443.0,
        }
    }
}

impl fmt::Display for ReferencePitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A4 = {} Hz", self.hz())
    }
}

/// Settings for one tuner session.
///
/// Every field has a default, so a partially written settings file still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Frequency of A4 used by the note mapper.
    pub reference: ReferencePitch,
    /// Capacity of the analysis window in samples.
    pub window_size: usize,
    /// RMS threshold of the signal gate.
    pub gate_threshold: f32,
    /// Correlation a candidate must exceed to be reported.
    pub confidence_threshold: f32,
    /// Lowest fundamental searched, in Hz.
    pub min_frequency: f32,
    /// Highest fundamental searched, in Hz.
    pub max_frequency: f32,
    /// Sample rate requested from the capture device.
    pub preferred_sample_rate: u32,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            reference: ReferencePitch::default(),
            window_size: DEFAULT_WINDOW_SIZE,
            gate_threshold: DEFAULT_GATE_THRESHOLD,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            min_frequency: DEFAULT_MIN_FREQUENCY,
            max_frequency: DEFAULT_MAX_FREQUENCY,
            preferred_sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl TunerConfig {
    /// Returns a copy with a different reference pitch.
    pub fn with_reference(mut self, reference: ReferencePitch) -> Self {
        self.reference = reference;
        self
    }

    /// Checks that every value is usable by the analysis pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(TunerError::InvalidConfig(
                "window_size must be greater than zero".to_string(),
            ));
        }
        if !(self.gate_threshold >= 0.0 && self.gate_threshold.is_finite()) {
            return Err(TunerError::InvalidConfig(format!(
                "gate_threshold must be a non-negative number, got {}",
                self.gate_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(TunerError::InvalidConfig(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !(self.min_frequency > 0.0 && self.min_frequency < self.max_frequency) {
            return Err(TunerError::InvalidConfig(format!(
                "frequency range {}..{} Hz is empty or non-positive",
                self.min_frequency, self.max_frequency
            )));
        }
        if self.preferred_sample_rate == 0 {
            return Err(TunerError::InvalidConfig(
                "preferred_sample_rate must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_detector_constants() {
        let config = TunerConfig::default();
        assert_eq!(config.reference, ReferencePitch::A440);
        assert_eq!(config.window_size, 2048);
        assert_eq!(config.gate_threshold, 0.01);
        assert_eq!(config.confidence_threshold, 0.9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reference_display() {
        assert_eq!(ReferencePitch::A432.to_string(), "A4 = 432 Hz");
    }

    #[test]
    fn inverted_frequency_range_is_rejected() {
        let config = TunerConfig {
            min_frequency: 900.0,
            ..TunerConfig::default()
        };
        assert!(matches!(config.validate(), Err(TunerError::InvalidConfig(_))));
    }

    #[test]
    fn zero_window_is_rejected() {
        let config = TunerConfig {
            window_size: 0,
            ..TunerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn confidence_above_one_is_rejected() {
        let config = TunerConfig {
            confidence_threshold: 1.5,
            ..TunerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
