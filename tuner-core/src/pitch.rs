//! # Pitch Detection Module
//!
//! This module estimates the fundamental frequency of a monophonic tone with a
//! time-domain autocorrelation search. It is cheap, needs no windowing or
//! frequency bins, and yields the period of the waveform directly.
//!
//! ## Features
//! - Lag search bounded by the musically useful range (40 Hz to 800 Hz by default)
//! - Energy-normalized correlation, so confidence lives in [0, 1]
//! - Confidence threshold that suppresses weak periodicity instead of guessing
//!
//! ## Known limitation
//! When the fundamental carries little energy compared to its overtones the
//! strongest periodicity may belong to a sub-harmonic or an overtone, and the
//! estimate lands an octave (or more) away from the perceived pitch. Plain
//! autocorrelation has no way to tell these apart and no correction is applied.

use crate::config::{
    TunerConfig, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MAX_FREQUENCY, DEFAULT_MIN_FREQUENCY,
};

/// A fundamental-frequency candidate that cleared the confidence threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Detected fundamental in Hz.
    pub frequency: f32,
    /// Normalized correlation at the chosen lag, in [0, 1].
    pub confidence: f32,
    /// Period of the waveform in samples.
    pub lag: usize,
}

/// Autocorrelation pitch estimator.
///
/// The estimator is stateless between calls: the same window always yields the
/// same estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimator {
    min_frequency: f32,
    max_frequency: f32,
    confidence_threshold: f32,
}

impl PitchEstimator {
    pub fn new(min_frequency: f32, max_frequency: f32, confidence_threshold: f32) -> Self {
        Self {
            min_frequency,
            max_frequency,
            confidence_threshold,
        }
    }

    pub fn from_config(config: &TunerConfig) -> Self {
        Self::new(
            config.min_frequency,
            config.max_frequency,
            config.confidence_threshold,
        )
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Returns the half-open lag range `[min_lag, max_lag)` searched at `sample_rate`.
    ///
    /// `min_lag = floor(sr / max_frequency)` and `max_lag = floor(sr / min_frequency)`.
    /// The comparison span used for every lag is `max_lag` samples long.
    /// Lags that would leave fewer than `min_overlap` compared samples are
    /// skipped, so a partly filled window only searches the shorter periods.
    pub fn lag_bounds(&self, sample_rate: u32) -> (usize, usize) {
        let sr = sample_rate as f64;
        let min_lag = ((sr / self.max_frequency as f64).floor() as usize).max(1);
        let max_lag = (sr / self.min_frequency as f64).floor() as usize;
        (min_lag, max_lag)
    }

    /// Estimates the fundamental frequency of `signal`.
    ///
    /// The lag range is scanned upwards, remembering the strongest local maximum
    /// of the correlation. The scan ends at the first maximum above the
    /// confidence threshold; a correlation still rising at the end of the range
    /// counts as a maximum at the last lag.
    ///
    /// # Returns
    /// * `Some(estimate)` - the winning lag cleared the confidence threshold
    /// * `None` - the window is too short, silent, or not periodic enough
    pub fn estimate(&self, signal: &[f32], sample_rate: u32) -> Option<PitchEstimate> {
        let (min_lag, max_lag) = self.lag_bounds(sample_rate);
        let usable = signal.len().checked_sub(min_overlap(min_lag, max_lag))?;
        let end_lag = max_lag.min(usable + 1);
        if min_lag >= end_lag {
            return None;
        }
        let span = max_lag;

        let mut prev = correlation(signal, min_lag - 1, span);
        let mut rising = false;
        let mut best: Option<(usize, f32)> = None;
        let mut last_lag = min_lag;

        for lag in min_lag..end_lag {
            let r = correlation(signal, lag, span);
            last_lag = lag;
            if r > prev {
                rising = true;
            } else if rising {
                // lag - 1 is a local maximum
                rising = false;
                if best.is_none_or(|(_, c)| prev > c) {
                    best = Some((lag - 1, prev));
                }
                if prev > self.confidence_threshold {
                    break;
                }
            }
            prev = r;
        }

        if rising && best.is_none_or(|(_, c)| prev > c) {
            best = Some((last_lag, prev));
        }

        let (lag, confidence) = best?;
        if confidence <= self.confidence_threshold {
            return None;
        }

        Some(PitchEstimate {
            frequency: sample_rate as f32 / lag as f32,
            confidence: confidence.clamp(0.0, 1.0),
            lag,
        })
    }
}

impl Default for PitchEstimator {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIN_FREQUENCY,
            DEFAULT_MAX_FREQUENCY,
            DEFAULT_CONFIDENCE_THRESHOLD,
        )
    }
}

/// Fewest samples a lag must be compared over.
///
/// A span of a handful of samples correlates to about ±1 whatever the input, so
/// noise in a short window would pass any confidence threshold.
pub fn min_overlap(min_lag: usize, max_lag: usize) -> usize {
    (max_lag / 2).max(min_lag)
}

/// Normalized correlation between `signal[i]` and `signal[i + lag]`.
///
/// The products are summed over `span` samples, or over as many as fit in the
/// window when `lag + span` runs past its end. The sum is divided by the energy
/// of the two compared segments, so a perfectly periodic signal scores 1
/// whatever its level. Segments without energy score 0.
pub fn correlation(signal: &[f32], lag: usize, span: usize) -> f32 {
    let n = span.min(signal.len().saturating_sub(lag));
    if n == 0 {
        return 0.0;
    }

    let (mut dot, mut energy_a, mut energy_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&a, &b) in signal[..n].iter().zip(&signal[lag..lag + n]) {
        let (a, b) = (a as f64, b as f64);
        dot += a * b;
        energy_a += a * a;
        energy_b += b * b;
    }

    let norm = (energy_a * energy_b).sqrt();
    if norm <= f64::EPSILON {
        return 0.0;
    }
    (dot / norm) as f32
}
