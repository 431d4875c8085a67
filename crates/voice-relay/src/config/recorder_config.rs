use crate::config::{
    default_amplitude_levels, default_max_length_secs, default_min_length_secs,
    default_poll_interval_ms,
};

use voice_relay_core::{AudioSource, CaptureSpec, RecorderSettings};

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// Segment length limits, polling and capture source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Segments shorter than this are discarded.
    #[serde(default = "default_min_length_secs")]
    pub min_length_secs: u32,
    /// Segments are cut and sent at this length while the hotkey is held.
    #[serde(default = "default_max_length_secs")]
    pub max_length_secs: u32,
    /// Polling interval while recording, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Number of amplitude meter levels.
    #[serde(default = "default_amplitude_levels")]
    pub amplitude_levels: u32,
    /// Directory for in-progress segments (None = platform cache directory).
    #[serde(default)]
    pub capture_dir: Option<PathBuf>,
    /// Input device name (None = default device).
    #[serde(default)]
    pub input_device: Option<String>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            min_length_secs: default_min_length_secs(),
            max_length_secs: default_max_length_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            amplitude_levels: default_amplitude_levels(),
            capture_dir: None,
            input_device: None,
        }
    }
}

impl RecorderConfig {
    /// Builds core recorder settings. `default_capture_dir` is used when no
    /// capture directory is configured.
    pub fn to_settings(&self, default_capture_dir: &Path) -> RecorderSettings {
        let capture_dir = self
            .capture_dir
            .clone()
            .unwrap_or_else(|| default_capture_dir.to_path_buf());

        let source = match &self.input_device {
            Some(name) => AudioSource::Named(name.clone()),
            None => AudioSource::DefaultInput,
        };

        RecorderSettings::new(capture_dir)
            .with_min_length_secs(self.min_length_secs)
            .with_max_length_secs(self.max_length_secs)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_amplitude_levels(self.amplitude_levels)
            .with_capture(CaptureSpec {
                source,
                ..CaptureSpec::default()
            })
    }
}
