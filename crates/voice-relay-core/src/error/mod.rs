use crate::{RecordingEvent, RecordingState};

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Recorder errors with source location tracking.
#[derive(Error, Debug)]
pub enum RecorderError {
    /// The event is not accepted in the current state. The state is unchanged.
    #[error("Illegal transition: {event:?} in state {from:?} {location}")]
    IllegalTransition {
        /// State the machine was in when the event arrived.
        from: RecordingState,
        /// The rejected event.
        event: RecordingEvent,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Recorder settings are inconsistent.
    #[error("Invalid recorder settings: {reason} {location}")]
    InvalidSettings {
        /// Description of the invalid setting.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The orchestrator was constructed outside of a tokio runtime.
    #[error("No tokio runtime available {location}")]
    NoRuntime {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The background worker has stopped and no longer accepts commands.
    #[error("Recorder worker unavailable {location}")]
    WorkerUnavailable {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No audio input device found.
    #[error("No microphone found {location}")]
    NoMicrophoneFound {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Capture device operation failed.
    #[error("Capture device error: {reason} {location}")]
    DeviceError {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// IO error from filesystem operations.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl From<std::io::Error> for RecorderError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        RecorderError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Result type alias using [`RecorderError`].
pub type Result<T> = std::result::Result<T, RecorderError>;
