//! Error types for the tuner engine.
//!
//! Only capture failures and misuse of the session API are errors. A silent or
//! inconclusive analysis cycle is not: it resolves to
//! [`TunerReading::NoSignal`](crate::tuning::TunerReading::NoSignal).

use thiserror::Error;

/// Errors surfaced by the tuner engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TunerError {
    /// The audio input device could not be opened or access was refused.
    #[error("audio input unavailable: {0}")]
    PermissionDenied(String),

    /// The capture stream ended while a session was listening.
    #[error("audio input lost: {0}")]
    DeviceLost(String),

    /// The reference pitch was changed while a session was active.
    #[error("reference pitch can only be changed while the tuner is idle")]
    ReferenceLocked,

    /// `start` was called on a session that is already starting or listening.
    #[error("tuner session is already active")]
    AlreadyActive,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TunerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_display() {
        let err = TunerError::PermissionDenied("no input device".to_string());
        assert_eq!(err.to_string(), "audio input unavailable: no input device");
    }

    #[test]
    fn device_lost_display() {
        let err = TunerError::DeviceLost("stream closed".to_string());
        assert_eq!(err.to_string(), "audio input lost: stream closed");
    }

    #[test]
    fn reference_locked_display() {
        let msg = TunerError::ReferenceLocked.to_string();
        assert!(msg.contains("idle"), "got: {msg}");
    }
}
