use crate::{CaptureSpec, CoreResult, DeviceErrorReporter};

use std::path::Path;

/// Upper bound of [`CaptureDevice::max_amplitude`] readings.
pub const MAX_AMPLITUDE: u32 = 32_767;

/// Capture device driven by the orchestrator.
///
/// All methods are called from the orchestrator's single worker, one at a
/// time. They may block.
pub trait CaptureDevice: Send + 'static {
    /// Acquires and configures the device for a new segment written to `target`.
    ///
    /// # Errors
    ///
    /// Any error abandons the segment and returns the recorder to `Idle`.
    fn prepare(&mut self, spec: &CaptureSpec, target: &Path) -> CoreResult<()>;

    /// Starts capturing into the prepared target.
    ///
    /// # Errors
    ///
    /// Any error abandons the segment and returns the recorder to `Idle`.
    fn start(&mut self) -> CoreResult<()>;

    /// Whole seconds captured so far, or a negative value when no meaningful
    /// reading is available yet.
    fn progress_seconds(&mut self) -> i32;

    /// Peak amplitude since the previous call, in `0..=MAX_AMPLITUDE`.
    fn max_amplitude(&mut self) -> u32;

    /// Stops capturing, finishes the artifact and returns its length in seconds.
    ///
    /// # Errors
    ///
    /// Errors are logged by the orchestrator and treated as a zero-second stop.
    fn stop(&mut self) -> CoreResult<u32>;

    /// Drops whatever `prepare`/`start` acquired without finishing the artifact.
    fn release(&mut self) {}

    /// Hands the device a channel for asynchronous error codes.
    ///
    /// Called once, before the device is moved onto the worker.
    fn attach_error_reporter(&mut self, _reporter: DeviceErrorReporter) {}
}

/// Maps a raw amplitude reading onto `0..=levels`.
pub fn amplitude_to_level(amplitude: u32, levels: u32) -> u32 {
    let clamped = u64::from(amplitude.min(MAX_AMPLITUDE));
    (clamped * u64::from(levels) / u64::from(MAX_AMPLITUDE)) as u32
}
