//! Voice-relay Core Library
//!
//! Push-to-talk capture orchestration: a pure recording state machine, a
//! single-worker orchestrator that drives a capture device through
//! prepare/start/poll/stop, and a cpal-backed device that writes WAV segments.
//!
//! # Example
//!
//! ```no_run
//! use voice_relay_core::{CoreResult, CpalRecorder, RecorderListener, RecorderSettings, RecordingOrchestrator};
//!
//! use std::path::Path;
//!
//! struct Printer;
//!
//! impl RecorderListener for Printer {
//!     fn on_send(&mut self, artifact: &Path, duration: u32) {
//!         println!("Segment ready: {:?} ({}s)", artifact, duration);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let settings = RecorderSettings::new("/tmp/voice-relay");
//!     let recorder = RecordingOrchestrator::spawn(CpalRecorder::new(), Printer, settings)?;
//!
//!     recorder.begin()?;
//!     tokio::time::sleep(std::time::Duration::from_secs(3)).await;
//!     recorder.end()?;
//!
//!     recorder.shutdown().await;
//!     Ok(())
//! }
//! ```

mod device;
mod error;
mod recorder;
mod state;

pub use {
    device::{
        AudioSource, CaptureDevice, CaptureSpec, CpalRecorder, MAX_AMPLITUDE, MicrophoneGate,
        OutputFormat, STREAM_ERROR_CODE, amplitude_to_level,
    },
    error::{RecorderError, Result as CoreResult},
    recorder::{
        AlwaysGranted, COUNTDOWN_SECS, DEFAULT_AMPLITUDE_LEVELS, DEFAULT_MAX_LENGTH_SECS,
        DEFAULT_MIN_LENGTH_SECS, DEFAULT_POLL_INTERVAL, DeviceErrorReporter, PERMISSION_DENIED,
        PERMISSION_GRANTED_ON_REQUEST, PermissionGate, RecorderListener, RecorderSettings,
        RecorderStatus, RecordingOrchestrator, SegmentId, SegmentInfo, VoiceSession,
    },
    state::{RecordingEvent, RecordingState, StateMachine, StopCause},
};
