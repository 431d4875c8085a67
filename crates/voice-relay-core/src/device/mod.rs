mod capture_device;
mod capture_spec;
mod cpal_recorder;

pub use {
    capture_device::{CaptureDevice, MAX_AMPLITUDE, amplitude_to_level},
    capture_spec::{AudioSource, CaptureSpec, OutputFormat},
    cpal_recorder::{CpalRecorder, MicrophoneGate, STREAM_ERROR_CODE},
};

#[cfg(test)]
pub(crate) use cpal_recorder::sample_to_i16;
