//! Energy gate in front of the pitch estimator.

use crate::config::DEFAULT_GATE_THRESHOLD;

/// Root-mean-square level of a block of samples. Empty input is silent.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|&s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Rejects windows too quiet to carry a usable pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalGate {
    threshold: f32,
}

impl SignalGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// True when the window is loud enough to analyse.
    pub fn is_usable(&self, samples: &[f32]) -> bool {
        rms(samples) >= self.threshold && !samples.is_empty()
    }
}

impl Default for SignalGate {
    fn default() -> Self {
        Self::new(DEFAULT_GATE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rms_of_constant_signal() {
        assert_relative_eq!(rms(&[0.5; 64]), 0.5);
    }

    #[test]
    fn silence_is_rejected() {
        let gate = SignalGate::default();
        assert!(!gate.is_usable(&[0.0; 2048]));
        assert!(!gate.is_usable(&[]));
    }

    #[test]
    fn quiet_noise_floor_is_rejected() {
        let gate = SignalGate::default();
        let hiss: Vec<f32> = (0..2048)
            .map(|i| if i % 2 == 0 { 0.005 } else { -0.005 })
            .collect();
        assert!(!gate.is_usable(&hiss));
    }

    #[test]
    fn audible_tone_passes() {
        let gate = SignalGate::default();
        let tone: Vec<f32> = (0..2048)
            .map(|i| 0.2 * (i as f32 * 0.05).sin())
            .collect();
        assert!(gate.is_usable(&tone));
    }
}
