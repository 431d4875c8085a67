use crate::SegmentId;

/// Work items drained by the recorder worker, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    /// Gesture pressed.
    Begin,
    /// Gesture released.
    End,
    /// Hard reset to `Idle`.
    Reset,
    /// Start capture for a prepared segment.
    Start { segment: SegmentId },
    /// Polling tick for a recording segment.
    Tick { segment: SegmentId },
    /// Asynchronous error code to forward to the listener.
    Error { code: i32 },
    /// Stop the worker.
    Shutdown,
}
