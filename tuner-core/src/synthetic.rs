//! A capture source that plays back a generated tone.
//!
//! Useful for exercising a whole session without audio hardware. The source can
//! also refuse access or drop the stream after a number of frames, which is how
//! device loss is simulated.

use crossbeam_channel::Sender;
use std::f32::consts::PI;

use crate::audio::{CaptureEvent, CaptureSource, CaptureStream};
use crate::config::TunerConfig;
use crate::error::{Result, TunerError};

/// Waveform of the generated tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Silence,
}

/// Deterministic tone generator posing as a capture device.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneSource {
    pub waveform: Waveform,
    pub frequency: f32,
    pub amplitude: f32,
    pub sample_rate: u32,
    pub frame_len: usize,
    /// Frames queued when the stream opens.
    pub frames: usize,
    /// Report the stream as lost after the queued frames instead of idling.
    pub lose_after: bool,
    /// Refuse `acquire` with this reason.
    pub deny: Option<String>,
}

impl ToneSource {
    pub fn sine(frequency: f32, sample_rate: u32) -> Self {
        Self {
            waveform: Waveform::Sine,
            frequency,
            amplitude: 0.5,
            sample_rate,
            frame_len: 512,
            frames: 16,
            lose_after: false,
            deny: None,
        }
    }

    pub fn silence(sample_rate: u32) -> Self {
        Self {
            waveform: Waveform::Silence,
            ..Self::sine(0.0, sample_rate)
        }
    }

    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn with_frames(mut self, frames: usize, frame_len: usize) -> Self {
        self.frames = frames;
        self.frame_len = frame_len;
        self
    }

    pub fn losing_device(mut self) -> Self {
        self.lose_after = true;
        self
    }

    pub fn denied(mut self, reason: impl Into<String>) -> Self {
        self.deny = Some(reason.into());
        self
    }

    /// Generates `len` samples starting at absolute sample index `offset`.
    pub fn render(&self, offset: usize, len: usize) -> Vec<f32> {
        let step = 2.0 * PI * self.frequency / self.sample_rate as f32;
        (offset..offset + len)
            .map(|n| {
                let phase = step * n as f32;
                match self.waveform {
                    Waveform::Sine => self.amplitude * phase.sin(),
                    Waveform::Square => self.amplitude * phase.sin().signum(),
                    Waveform::Silence => 0.0,
                }
            })
            .collect()
    }
}

impl CaptureSource for ToneSource {
    fn acquire(&self, _config: &TunerConfig) -> Result<CaptureStream> {
        if let Some(reason) = &self.deny {
            return Err(TunerError::PermissionDenied(reason.clone()));
        }

        let (tx, rx) = crossbeam_channel::unbounded();
        for i in 0..self.frames {
            let _ = tx.send(CaptureEvent::Frame(
                self.render(i * self.frame_len, self.frame_len),
            ));
        }

        if self.lose_after {
            let _ = tx.send(CaptureEvent::Lost("tone source exhausted".to_string()));
            return Ok(CaptureStream::new(self.sample_rate, rx, Box::new(())));
        }

        // Holding the sender keeps the stream open and silent once drained.
        let keep_open: Sender<CaptureEvent> = tx;
        Ok(CaptureStream::new(self.sample_rate, rx, Box::new(keep_open)))
    }
}
