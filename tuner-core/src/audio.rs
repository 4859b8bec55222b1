//! # Audio Capture Module
//!
//! This module defines the boundary between the tuner and whatever produces
//! audio. A [`CaptureSource`] is asked for a device once per session; on
//! success it hands back a [`CaptureStream`], a channel of mono sample frames
//! at a fixed sample rate.
//!
//! ## Features
//! - Device acquisition that may be refused ([`TunerError::PermissionDenied`])
//! - Stream loss reported in-band as [`CaptureEvent::Lost`], or on a separate
//!   loss signal when the producer cannot wait for room in the frame queue
//! - Microphone capture through CPAL (cargo feature `cpal`)
//!
//! The stream handle owns the device: dropping it releases the input.

use crossbeam_channel::Receiver;
use std::any::Any;

use crate::config::TunerConfig;
use crate::error::Result;

#[cfg(feature = "cpal")]
pub use device::CpalCapture;

/// Something the capture callback delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// Mono samples in [-1, 1].
    Frame(Vec<f32>),
    /// The device stopped producing audio; no further frames will arrive.
    Lost(String),
}

/// An open capture stream.
///
/// The stream is active while this value exists. It is created on the thread
/// that consumes it and is not required to be `Send`.
pub struct CaptureStream {
    sample_rate: u32,
    events: Receiver<CaptureEvent>,
    lost: Receiver<String>,
    _device: Box<dyn Any>,
}

impl CaptureStream {
    /// Wraps a frame channel. `device` is kept alive until the stream is dropped.
    pub fn new(sample_rate: u32, events: Receiver<CaptureEvent>, device: Box<dyn Any>) -> Self {
        Self {
            sample_rate,
            events,
            lost: crossbeam_channel::never(),
            _device: device,
        }
    }

    /// Adds a loss signal that bypasses the frame queue.
    ///
    /// A full frame queue cannot hold back a message sent here.
    pub fn with_loss_signal(mut self, lost: Receiver<String>) -> Self {
        self.lost = lost;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn events(&self) -> &Receiver<CaptureEvent> {
        &self.events
    }

    /// Fires once with the reason the device went away.
    pub fn lost(&self) -> &Receiver<String> {
        &self.lost
    }
}

impl std::fmt::Debug for CaptureStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureStream")
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

/// A provider of live audio.
///
/// `acquire` may block while the platform opens the device. Implementations
/// report refusal or absence of a device as [`TunerError::PermissionDenied`].
///
/// [`TunerError::PermissionDenied`]: crate::error::TunerError::PermissionDenied
pub trait CaptureSource: Send + Sync {
    fn acquire(&self, config: &TunerConfig) -> Result<CaptureStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_stream_is_never_lost() {
        let (_tx, rx) = crossbeam_channel::unbounded::<CaptureEvent>();
        let stream = CaptureStream::new(44100, rx, Box::new(()));
        assert!(stream.lost().try_recv().is_err());
    }

    #[test]
    fn loss_signal_ignores_a_full_frame_queue() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        tx.send(CaptureEvent::Frame(vec![0.0; 4])).unwrap();
        assert!(tx.try_send(CaptureEvent::Frame(vec![0.0; 4])).is_err());

        let (lost_tx, lost_rx) = crossbeam_channel::bounded(1);
        let stream = CaptureStream::new(44100, rx, Box::new(tx)).with_loss_signal(lost_rx);
        lost_tx.try_send("unplugged".to_string()).unwrap();
        assert_eq!(stream.lost().try_recv(), Ok("unplugged".to_string()));
    }
}

#[cfg(feature = "cpal")]
mod device {
    use anyhow::{Context, anyhow};
    use cpal::SupportedStreamConfigRange;
    use crossbeam_channel::Sender;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use tracing::{info, warn};

    use super::{CaptureEvent, CaptureSource, CaptureStream};
    use crate::config::TunerConfig;
    use crate::error::{Result, TunerError};

    /// Frames held between the callback and the analysis thread before the
    /// callback starts dropping them.
    const FRAME_QUEUE_DEPTH: usize = 8;

    /// Captures from the host's default input device.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct CpalCapture;

    impl CaptureSource for CpalCapture {
        fn acquire(&self, config: &TunerConfig) -> Result<CaptureStream> {
            open_default_input(config)
                .map_err(|e| TunerError::PermissionDenied(format!("{e:#}")))
        }
    }

    /// Opens the default input, preferring a mono f32 configuration near the
    /// requested sample rate.
    fn open_default_input(config: &TunerConfig) -> anyhow::Result<CaptureStream> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("No input device available"))?;

        info!("Using audio input device: {}", device.name()?);

        let configs = device
            .supported_input_configs()
            .context("querying input configurations")?
            .collect::<Vec<_>>();
        let target = config.preferred_sample_rate;
        let supported = find_supported_config(configs, target)
            .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

        let rate = target.clamp(supported.min_sample_rate().0, supported.max_sample_rate().0);
        let stream_config = supported.with_sample_rate(cpal::SampleRate(rate));
        let channels = stream_config.channels() as usize;
        let stream_config: cpal::StreamConfig = stream_config.into();

        info!("Selected sample rate: {} Hz, {} channel(s)", rate, channels);

        let (tx, rx) = crossbeam_channel::bounded(FRAME_QUEUE_DEPTH);
        let (lost_tx, lost_rx) = crossbeam_channel::bounded(1);
        let block = (config.window_size / 4).max(1);
        let mut pending: Vec<f32> = Vec::with_capacity(block * 2);

        let stream = device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                downmix_into(&mut pending, data, channels);
                while pending.len() >= block {
                    let frame: Vec<f32> = pending.drain(..block).collect();
                    // A full queue means analysis is behind; drop rather than block
                    // the audio thread.
                    let _ = tx.try_send(CaptureEvent::Frame(frame));
                }
            },
            move |err| signal_loss(&lost_tx, &err),
            None,
        )?;

        stream.play()?;

        Ok(CaptureStream::new(rate, rx, Box::new(stream)).with_loss_signal(lost_rx))
    }

    /// Reports a stream error as the end of the session.
    ///
    /// Every [`cpal::StreamError`] ends it: a vanished device obviously, and a
    /// backend error leaves the stream in an unknown state that is never
    /// restarted. Only the first error is kept.
    fn signal_loss(lost_tx: &Sender<String>, err: &cpal::StreamError) {
        warn!("An error occurred on the audio stream: {}", err);
        let _ = lost_tx.try_send(err.to_string());
    }

    /// Appends `data` to `out`, averaging interleaved channels down to mono.
    fn downmix_into(out: &mut Vec<f32>, data: &[f32], channels: usize) {
        if channels <= 1 {
            out.extend_from_slice(data);
            return;
        }
        out.extend(
            data.chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
    }

    /// Picks the supported configuration best suited for pitch tracking:
    /// f32 samples, fewest channels, and a rate range closest to `target_rate`.
    fn find_supported_config(
        configs: Vec<SupportedStreamConfigRange>,
        target_rate: u32,
    ) -> Option<SupportedStreamConfigRange> {
        configs
            .into_iter()
            .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
            .min_by_key(|c| {
                let min = c.min_sample_rate().0;
                let max = c.max_sample_rate().0;
                let distance = if (min..=max).contains(&target_rate) {
                    0
                } else {
                    (min as i64 - target_rate as i64)
                        .abs()
                        .min((max as i64 - target_rate as i64).abs())
                };
                (distance, c.channels())
            })
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn stereo_is_averaged() {
            let mut out = Vec::new();
            downmix_into(&mut out, &[1.0, 0.0, 0.5, 0.5], 2);
            assert_eq!(out, vec![0.5, 0.5]);
        }

        #[test]
        fn first_stream_error_is_kept() {
            let (lost_tx, lost_rx) = crossbeam_channel::bounded(1);
            signal_loss(&lost_tx, &cpal::StreamError::DeviceNotAvailable);
            signal_loss(
                &lost_tx,
                &cpal::StreamError::BackendSpecific {
                    err: cpal::BackendSpecificError {
                        description: "poll failed".to_string(),
                    },
                },
            );
            let reason = lost_rx.try_recv().expect("loss must be reported");
            assert_eq!(reason, cpal::StreamError::DeviceNotAvailable.to_string());
            assert!(lost_rx.try_recv().is_err());
        }

        #[test]
        fn mono_passes_through() {
            let mut out = vec![0.1];
            downmix_into(&mut out, &[0.2, 0.3], 1);
            assert_eq!(out, vec![0.1, 0.2, 0.3]);
        }
    }
}
