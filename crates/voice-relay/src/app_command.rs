use uuid::Uuid;

/// Commands sent to the main application loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// The push-to-talk hotkey went down.
    Press {
        /// Unique id for this gesture, for log correlation.
        gesture_id: Uuid,
    },
    /// The push-to-talk hotkey came back up.
    Release {
        /// Id of the gesture being released.
        gesture_id: Uuid,
    },
    /// The recorder reported an error code to its listener.
    DeviceFailed {
        /// Code passed to `on_error`.
        code: i32,
    },
}
