mod machine;
mod recording_event;
mod recording_state;

pub use {
    machine::StateMachine,
    recording_event::RecordingEvent,
    recording_state::{RecordingState, StopCause},
};
