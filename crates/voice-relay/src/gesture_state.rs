use std::time::Instant;

use uuid::Uuid;

/// Hotkey gesture state for the hotkey handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    /// The hotkey is up.
    Released,
    /// The hotkey is held down.
    Held {
        /// When the press was seen.
        pressed_at: Instant,
        /// Unique gesture ID for log correlation.
        gesture_id: Uuid,
    },
}
