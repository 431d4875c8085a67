mod command;
mod error_reporter;
mod listener;
mod orchestrator;
mod polling;
mod segment;
mod session;
mod settings;
mod status;
mod worker;

pub(crate) use {
    command::Command, polling::PollingActivity, segment::Segment, worker::RecorderWorker,
};

pub use {
    error_reporter::DeviceErrorReporter,
    listener::RecorderListener,
    orchestrator::RecordingOrchestrator,
    segment::SegmentId,
    session::{
        AlwaysGranted, PERMISSION_DENIED, PERMISSION_GRANTED_ON_REQUEST, PermissionGate,
        VoiceSession,
    },
    settings::{
        COUNTDOWN_SECS, DEFAULT_AMPLITUDE_LEVELS, DEFAULT_MAX_LENGTH_SECS,
        DEFAULT_MIN_LENGTH_SECS, DEFAULT_POLL_INTERVAL, RecorderSettings,
    },
    status::{RecorderStatus, SegmentInfo},
};
