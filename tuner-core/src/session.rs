//! # Tuner Session
//!
//! Owns the start/stop lifecycle of a listening session and the worker thread
//! that runs the analysis loop.
//!
//! ## Architecture
//! - **Controller** ([`TunerSession`]): lives on the presentation thread, holds the
//!   configuration and the latest reading, and turns worker messages into
//!   [`TunerEvent`]s through [`TunerSession::poll`].
//! - **Worker thread**: acquires the capture device, then runs one analysis cycle
//!   per captured frame until it is told to stop or the device goes away.
//! - **Communication**: crossbeam channels. Every worker message is tagged with
//!   the session generation, so nothing from an abandoned session leaks into
//!   the next one.
//!
//! ```text
//! Idle --start()--> Starting --device opened--> Listening
//!   ^                  |                            |
//!   +---- stop() / permission denied / device lost -+
//! ```

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::audio::{CaptureEvent, CaptureSource};
use crate::config::{ReferencePitch, TunerConfig};
use crate::error::{Result, TunerError};
use crate::pipeline::Analyzer;
use crate::tuning::TunerReading;

/// Lifecycle state of a [`TunerSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No capture device held. The configuration may be changed.
    Idle,
    /// `start` was called and the device is being acquired.
    Starting,
    /// Frames are being analysed.
    Listening,
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TunerEvent {
    /// The capture device was acquired.
    Started { sample_rate: u32 },
    /// Result of one analysis cycle.
    Reading(TunerReading),
    /// The session was stopped by the user.
    Stopped,
    /// The capture device could not be opened. The session is idle again.
    PermissionDenied(String),
    /// The capture stream ended mid-session. The session is idle again.
    DeviceLost(String),
}

type Tagged = (u64, TunerEvent);

/// Handle to the analysis thread of the current session.
#[derive(Debug)]
struct Worker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

/// The tuner's session controller.
pub struct TunerSession {
    source: Arc<dyn CaptureSource>,
    config: TunerConfig,
    state: SessionState,
    reading: TunerReading,
    sample_rate: Option<u32>,
    generation: u64,
    worker: Option<Worker>,
    events_tx: Sender<Tagged>,
    events_rx: Receiver<Tagged>,
    pending: Vec<TunerEvent>,
}

impl TunerSession {
    /// Creates an idle session reading from `source`.
    pub fn new(source: impl CaptureSource + 'static, config: TunerConfig) -> Result<Self> {
        config.validate()?;
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        Ok(Self {
            source: Arc::new(source),
            config,
            state: SessionState::Idle,
            reading: TunerReading::NoSignal,
            sample_rate: None,
            generation: 0,
            worker: None,
            events_tx,
            events_rx,
            pending: Vec::new(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    pub fn reference(&self) -> ReferencePitch {
        self.config.reference
    }

    /// The most recent reading; [`TunerReading::NoSignal`] while idle.
    pub fn current_reading(&self) -> TunerReading {
        self.reading
    }

    /// Sample rate of the open capture stream, once listening.
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    /// Changes the A4 reference. Only honoured while idle.
    pub fn set_reference(&mut self, reference: ReferencePitch) -> Result<()> {
        self.sync();
        if self.state != SessionState::Idle {
            return Err(TunerError::ReferenceLocked);
        }
        info!("Reference pitch set to {}", reference);
        self.config.reference = reference;
        Ok(())
    }

    /// Replaces the whole configuration. Only honoured while idle.
    pub fn set_config(&mut self, config: TunerConfig) -> Result<()> {
        self.sync();
        if self.state != SessionState::Idle {
            return Err(TunerError::AlreadyActive);
        }
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Starts a session on a dedicated analysis thread.
    ///
    /// Returns immediately; the outcome of device acquisition arrives later as
    /// [`TunerEvent::Started`] or [`TunerEvent::PermissionDenied`].
    pub fn start(&mut self) -> Result<()> {
        self.sync();
        if self.state != SessionState::Idle {
            return Err(TunerError::AlreadyActive);
        }

        self.generation += 1;
        let generation = self.generation;
        let source = Arc::clone(&self.source);
        let config = self.config.clone();
        let events_tx = self.events_tx.clone();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

        info!(generation, reference = %config.reference, "Starting tuner session");
        let thread_handle = thread::spawn(move || {
            run_worker(generation, source, config, events_tx, shutdown_rx);
        });

        self.worker = Some(Worker {
            shutdown_tx,
            thread_handle: Some(thread_handle),
        });
        self.state = SessionState::Starting;
        Ok(())
    }

    /// Stops the session and releases the capture device.
    ///
    /// Safe to call in any state. A device acquisition still in flight is
    /// abandoned: its worker releases the device as soon as the platform returns
    /// it, and nothing it reports afterwards is delivered.
    pub fn stop(&mut self) {
        self.sync();
        let Some(mut worker) = self.worker.take() else {
            return;
        };

        info!("Stopping tuner session");
        let _ = worker.shutdown_tx.try_send(());
        if let Some(handle) = worker.thread_handle.take() {
            if self.state == SessionState::Listening {
                if handle.join().is_err() {
                    warn!("Analysis thread panicked");
                }
            } else {
                debug!("Abandoning device acquisition");
            }
        }

        self.reset_to_idle();
        self.pending.push(TunerEvent::Reading(TunerReading::NoSignal));
        self.pending.push(TunerEvent::Stopped);
    }

    /// Returns every event since the last poll, oldest first, and updates the
    /// session state accordingly.
    pub fn poll(&mut self) -> Vec<TunerEvent> {
        self.sync();
        std::mem::take(&mut self.pending)
    }

    /// Moves worker messages of the current generation into `pending`.
    fn sync(&mut self) {
        loop {
            let (generation, event) = match self.events_rx.try_recv() {
                Ok(tagged) => tagged,
                Err(_) => break,
            };
            if generation != self.generation || self.worker.is_none() {
                continue;
            }
            self.apply(&event);
            self.pending.push(event);
        }
    }

    fn apply(&mut self, event: &TunerEvent) {
        match event {
            TunerEvent::Started { sample_rate } => {
                self.state = SessionState::Listening;
                self.sample_rate = Some(*sample_rate);
            }
            TunerEvent::Reading(reading) => self.reading = *reading,
            TunerEvent::PermissionDenied(_) | TunerEvent::DeviceLost(_) => {
                // The worker has returned or is about to.
                if let Some(mut worker) = self.worker.take() {
                    if let Some(handle) = worker.thread_handle.take() {
                        let _ = handle.join();
                    }
                }
                self.reset_to_idle();
            }
            TunerEvent::Stopped => {}
        }
    }

    fn reset_to_idle(&mut self) {
        self.state = SessionState::Idle;
        self.reading = TunerReading::NoSignal;
        self.sample_rate = None;
    }
}

impl Drop for TunerSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for TunerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunerSession")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("reading", &self.reading)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// True once the controller has asked the worker to stop or has gone away.
fn stop_requested(shutdown_rx: &Receiver<()>) -> bool {
    !matches!(shutdown_rx.try_recv(), Err(TryRecvError::Empty))
}

/// Body of the analysis thread for one session.
fn run_worker(
    generation: u64,
    source: Arc<dyn CaptureSource>,
    config: TunerConfig,
    events_tx: Sender<Tagged>,
    shutdown_rx: Receiver<()>,
) {
    let send = |event: TunerEvent| events_tx.send((generation, event)).is_ok();

    debug!("Attempting to start audio capture...");
    let stream = match source.acquire(&config) {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Audio capture could not start: {}", e);
            let reason = match e {
                TunerError::PermissionDenied(reason) => reason,
                other => other.to_string(),
            };
            send(TunerEvent::PermissionDenied(reason));
            return;
        }
    };

    if stop_requested(&shutdown_rx) {
        info!("Stop requested during acquisition; releasing audio input");
        return;
    }

    let sample_rate = stream.sample_rate();
    let mut analyzer = Analyzer::new(&config, sample_rate);
    info!(sample_rate, "Audio capture started");
    if !send(TunerEvent::Started { sample_rate }) {
        return;
    }

    loop {
        crossbeam_channel::select! {
            recv(stream.events()) -> msg => {
                if stop_requested(&shutdown_rx) {
                    break;
                }
                match msg {
                    Ok(CaptureEvent::Frame(frame)) => {
                        let reading = analyzer.process(&frame);
                        if !send(TunerEvent::Reading(reading)) {
                            break;
                        }
                    }
                    Ok(CaptureEvent::Lost(reason)) => {
                        warn!("Audio input lost: {}", reason);
                        send(TunerEvent::DeviceLost(reason));
                        break;
                    }
                    Err(_) => {
                        warn!("Audio channel closed");
                        send(TunerEvent::DeviceLost("capture stream closed".to_string()));
                        break;
                    }
                }
            },
            recv(stream.lost()) -> msg => {
                let reason = msg.unwrap_or_else(|_| "capture device released".to_string());
                warn!("Audio input lost: {}", reason);
                send(TunerEvent::DeviceLost(reason));
                break;
            },
            recv(shutdown_rx) -> _ => {
                debug!("Received shutdown signal");
                break;
            },
        }
    }

    drop(stream);
    info!("Audio capture released");
}
