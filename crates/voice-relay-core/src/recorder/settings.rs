use crate::{CaptureSpec, CoreResult, RecorderError};

use std::{
    panic::Location,
    path::{Path, PathBuf},
    time::Duration,
};

use error_location::ErrorLocation;

/// Segments shorter than this are discarded.
pub const DEFAULT_MIN_LENGTH_SECS: u32 = 1;
/// Segments are stopped when they reach this length.
pub const DEFAULT_MAX_LENGTH_SECS: u32 = 60;
/// Interval between polling ticks while recording.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);
/// Highest amplitude level reported to the listener.
pub const DEFAULT_AMPLITUDE_LEVELS: u32 = 8;
/// The countdown starts this many seconds before the maximum length.
pub const COUNTDOWN_SECS: u32 = 3;

/// Construction-time recorder configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderSettings {
    /// Directory that receives segment artifacts.
    pub capture_dir: PathBuf,
    /// Minimum segment length in seconds.
    pub min_length_secs: u32,
    /// Maximum segment length in seconds.
    pub max_length_secs: u32,
    /// Polling interval while recording.
    pub poll_interval: Duration,
    /// Amplitude is reported in `0..=amplitude_levels`.
    pub amplitude_levels: u32,
    /// Device source and artifact format.
    pub capture: CaptureSpec,
}

impl RecorderSettings {
    /// Default settings writing segments into `capture_dir`.
    pub fn new<P: AsRef<Path>>(capture_dir: P) -> Self {
        Self {
            capture_dir: capture_dir.as_ref().to_path_buf(),
            min_length_secs: DEFAULT_MIN_LENGTH_SECS,
            max_length_secs: DEFAULT_MAX_LENGTH_SECS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            amplitude_levels: DEFAULT_AMPLITUDE_LEVELS,
            capture: CaptureSpec::default(),
        }
    }

    /// Sets the minimum segment length.
    pub fn with_min_length_secs(mut self, secs: u32) -> Self {
        self.min_length_secs = secs;
        self
    }

    /// Sets the maximum segment length.
    pub fn with_max_length_secs(mut self, secs: u32) -> Self {
        self.max_length_secs = secs;
        self
    }

    /// Sets the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the number of amplitude levels.
    pub fn with_amplitude_levels(mut self, levels: u32) -> Self {
        self.amplitude_levels = levels;
        self
    }

    /// Sets the capture source and format.
    pub fn with_capture(mut self, capture: CaptureSpec) -> Self {
        self.capture = capture;
        self
    }

    /// Checks the settings for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::InvalidSettings`] when the maximum length is
    /// zero or below the minimum, or the poll interval or amplitude levels
    /// are zero.
    #[track_caller]
    pub fn validate(&self) -> CoreResult<()> {
        let reason = if self.max_length_secs == 0 {
            Some("max_length_secs must be greater than zero".to_string())
        } else if self.min_length_secs > self.max_length_secs {
            Some(format!(
                "min_length_secs ({}) exceeds max_length_secs ({})",
                self.min_length_secs, self.max_length_secs
            ))
        } else if self.poll_interval.is_zero() {
            Some("poll_interval must be greater than zero".to_string())
        } else if self.amplitude_levels == 0 {
            Some("amplitude_levels must be greater than zero".to_string())
        } else {
            None
        };

        match reason {
            Some(reason) => Err(RecorderError::InvalidSettings {
                reason,
                location: ErrorLocation::from(Location::caller()),
            }),
            None => Ok(()),
        }
    }
}
