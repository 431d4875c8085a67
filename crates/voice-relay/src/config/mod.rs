#[allow(clippy::module_inception)]
mod config;
mod outbox_config;
mod recorder_config;

pub(crate) use {config::Config, outbox_config::OutboxConfig, recorder_config::RecorderConfig};

use voice_relay_core::{
    DEFAULT_AMPLITUDE_LEVELS, DEFAULT_MAX_LENGTH_SECS, DEFAULT_MIN_LENGTH_SECS,
    DEFAULT_POLL_INTERVAL,
};

pub(crate) fn default_min_length_secs() -> u32 {
    DEFAULT_MIN_LENGTH_SECS
}

pub(crate) fn default_max_length_secs() -> u32 {
    DEFAULT_MAX_LENGTH_SECS
}

pub(crate) fn default_poll_interval_ms() -> u64 {
    u64::try_from(DEFAULT_POLL_INTERVAL.as_millis()).unwrap_or(u64::MAX)
}

pub(crate) fn default_amplitude_levels() -> u32 {
    DEFAULT_AMPLITUDE_LEVELS
}
