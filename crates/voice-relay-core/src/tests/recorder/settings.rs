use crate::{
    AudioSource, CaptureSpec, DEFAULT_AMPLITUDE_LEVELS, DEFAULT_MAX_LENGTH_SECS,
    DEFAULT_MIN_LENGTH_SECS, DEFAULT_POLL_INTERVAL, OutputFormat, RecorderError,
    RecorderSettings,
};

use std::time::Duration;

/// WHAT: New settings carry the documented defaults and validate
/// WHY: A recorder built from defaults must start without tuning
#[test]
fn given_new_settings_when_validating_then_defaults_accepted() {
    // Given: Settings with only a capture directory
    let settings = RecorderSettings::new("/tmp/segments");

    // When/Then: Defaults are in place and valid
    assert_eq!(settings.min_length_secs, DEFAULT_MIN_LENGTH_SECS);
    assert_eq!(settings.max_length_secs, DEFAULT_MAX_LENGTH_SECS);
    assert_eq!(settings.poll_interval, DEFAULT_POLL_INTERVAL);
    assert_eq!(settings.amplitude_levels, DEFAULT_AMPLITUDE_LEVELS);
    assert_eq!(settings.capture, CaptureSpec::default());
    assert!(settings.validate().is_ok());
}

/// WHAT: Each invalid field is rejected
/// WHY: Zero lengths and intervals would stall or spin the worker
#[test]
fn given_invalid_fields_when_validating_then_invalid_settings() {
    let base = RecorderSettings::new("/tmp/segments");
    let cases = [
        base.clone().with_max_length_secs(0),
        base.clone().with_min_length_secs(61),
        base.clone().with_poll_interval(Duration::ZERO),
        base.clone().with_amplitude_levels(0),
    ];

    for settings in cases {
        assert!(
            matches!(
                settings.validate(),
                Err(RecorderError::InvalidSettings { .. })
            ),
            "{settings:?}"
        );
    }
}

/// WHAT: Min equal to max is accepted
/// WHY: A fixed segment length is a legitimate configuration
#[test]
fn given_min_equal_to_max_when_validating_then_ok() {
    // Given: min == max == 5
    let settings = RecorderSettings::new("/tmp/segments")
        .with_min_length_secs(5)
        .with_max_length_secs(5);

    // When/Then: Valid
    assert!(settings.validate().is_ok());
}

/// WHAT: Builder sets the capture spec
/// WHY: Named devices and float output come through configuration
#[test]
fn given_capture_spec_when_building_then_stored() {
    // Given: A named source with float output
    let capture = CaptureSpec {
        source: AudioSource::Named("USB Mic".to_string()),
        format: OutputFormat::WavFloat32,
    };

    // When: Building settings
    let settings = RecorderSettings::new("/tmp/segments").with_capture(capture.clone());

    // Then: Stored unchanged, and the artifact extension is still wav
    assert_eq!(settings.capture, capture);
    assert_eq!(settings.capture.format.extension(), "wav");
}
