use crate::{CoreResult, RecorderError, RecordingEvent, RecordingState};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::debug;

/// Single-writer holder of the current [`RecordingState`].
///
/// Exclusive access (`&mut self`) is the mutual exclusion: the orchestrator
/// keeps the machine inside its one worker, so every `apply` is an atomic
/// read-modify-write.
#[derive(Debug, Default)]
pub struct StateMachine {
    state: RecordingState,
}

impl StateMachine {
    /// Creates a machine in [`RecordingState::Idle`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Applies `event` and returns the new state.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::IllegalTransition`] when the event is not
    /// accepted in the current state. The state is left unchanged.
    #[track_caller]
    pub fn apply(&mut self, event: RecordingEvent) -> CoreResult<RecordingState> {
        let from = self.state;

        let to = from
            .next(event)
            .ok_or_else(|| RecorderError::IllegalTransition {
                from,
                event,
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.state = to;
        debug!(?from, ?event, ?to, "State transition");

        Ok(to)
    }

    /// Forces the machine back to `Idle`, bypassing the transition table.
    ///
    /// Returns the state that was replaced.
    pub fn force_idle(&mut self) -> RecordingState {
        let from = std::mem::take(&mut self.state);
        if from != RecordingState::Idle {
            debug!(?from, "State forced to Idle");
        }
        from
    }
}
