use crate::RecordingEvent;

/// Why a segment left `Recording`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopCause {
    /// The user let go of the gesture.
    Released,
    /// The segment hit the maximum length while the gesture was still held.
    TimedOut,
}

/// Recorder lifecycle state.
///
/// `Stopping` and `Sending` remember the [`StopCause`] so the decision to
/// re-arm after a send depends on the state alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordingState {
    /// Nothing acquired.
    #[default]
    Idle,
    /// Capture device is being prepared and started.
    Preparing,
    /// Device is capturing; the polling activity is running.
    Recording,
    /// Device stop in progress.
    Stopping {
        /// What ended the recording.
        cause: StopCause,
    },
    /// Segment is being handed to the send callback.
    Sending {
        /// What ended the recording.
        cause: StopCause,
    },
}

impl RecordingState {
    /// Every state, including both causes of `Stopping` and `Sending`.
    pub const ALL: [RecordingState; 7] = [
        RecordingState::Idle,
        RecordingState::Preparing,
        RecordingState::Recording,
        RecordingState::Stopping {
            cause: StopCause::Released,
        },
        RecordingState::Stopping {
            cause: StopCause::TimedOut,
        },
        RecordingState::Sending {
            cause: StopCause::Released,
        },
        RecordingState::Sending {
            cause: StopCause::TimedOut,
        },
    ];

    /// Transition table. Returns `None` when `event` is not accepted here.
    pub fn next(self, event: RecordingEvent) -> Option<RecordingState> {
        use RecordingEvent as E;
        use RecordingState as S;

        match (self, event) {
            (S::Idle, E::Pressed) => Some(S::Preparing),
            (S::Preparing, E::Released) => Some(S::Idle),
            (S::Preparing, E::Elapsed) => Some(S::Recording),
            (S::Recording, E::Released) => Some(S::Stopping {
                cause: StopCause::Released,
            }),
            (S::Recording, E::TimedOut) => Some(S::Stopping {
                cause: StopCause::TimedOut,
            }),
            (S::Stopping { cause }, E::Elapsed) => Some(S::Sending { cause }),
            (S::Stopping { .. }, E::QuickReleased) => Some(S::Idle),
            // Only a timeout means the gesture is still held, so only then
            // may the next segment start without a new press.
            (S::Sending { cause }, E::Elapsed) => match cause {
                StopCause::TimedOut => Some(S::Preparing),
                StopCause::Released => Some(S::Idle),
            },
            _ => None,
        }
    }

    /// Whether a segment is allocated while in this state.
    pub fn holds_segment(&self) -> bool {
        !matches!(self, RecordingState::Idle)
    }

    /// Whether the polling activity runs in this state.
    pub fn is_polling(&self) -> bool {
        matches!(self, RecordingState::Recording)
    }
}
