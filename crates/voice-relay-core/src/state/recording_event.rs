/// Inputs to the recording state machine.
///
/// `Pressed` and `Released` come from the user gesture, `TimedOut` from the
/// polling loop, and `Elapsed`/`QuickReleased` from device outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordingEvent {
    /// The push-to-talk gesture started.
    Pressed,
    /// The push-to-talk gesture ended.
    Released,
    /// The stopped segment was shorter than the minimum length.
    QuickReleased,
    /// The current step finished successfully.
    Elapsed,
    /// The segment reached its maximum length while still held.
    TimedOut,
}

impl RecordingEvent {
    /// Every event, in declaration order.
    pub const ALL: [RecordingEvent; 5] = [
        RecordingEvent::Pressed,
        RecordingEvent::Released,
        RecordingEvent::QuickReleased,
        RecordingEvent::Elapsed,
        RecordingEvent::TimedOut,
    ];
}
