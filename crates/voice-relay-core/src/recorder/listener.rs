use std::path::Path;

/// Receives recorder lifecycle notifications.
///
/// Every method runs on the recorder worker, never on the thread that called
/// `begin`/`end`. Only [`on_send`](RecorderListener::on_send) is required.
pub trait RecorderListener: Send + 'static {
    /// Device preparation for a new segment is starting.
    fn on_preparing(&mut self) {}

    /// The device accepted the segment configuration.
    fn on_prepared(&mut self) {}

    /// A gesture or segment ended. `duration` is zero when nothing was captured.
    fn on_stopped(&mut self, _duration: u32) {}

    /// A finished segment of at least the minimum length.
    ///
    /// Blocks the worker until it returns; deliver synchronously.
    fn on_send(&mut self, artifact: &Path, duration: u32);

    /// Input level for the current tick, in `0..=amplitude_levels`.
    fn on_amplitude_changed(&mut self, _level: u32) {}

    /// Seconds left before the segment hits its maximum length.
    fn on_expire_countdown(&mut self, _seconds_remaining: u32) {}

    /// The artifact after one second of capture. Once per segment.
    fn on_artifact(&mut self, _artifact: &Path) {}

    /// Elapsed seconds of the current segment.
    fn on_elapsed(&mut self, _seconds: u32) {}

    /// Opaque error code from the device or the session facade.
    fn on_error(&mut self, _code: i32) {}
}
