/// Which input the device should capture from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AudioSource {
    /// The host's default input device.
    #[default]
    DefaultInput,
    /// An input device selected by name.
    Named(String),
}

/// Encoding of the produced artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// 16-bit integer PCM in a WAV container.
    #[default]
    WavPcm16,
    /// 32-bit float PCM in a WAV container.
    WavFloat32,
}

impl OutputFormat {
    /// File extension used for artifacts of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::WavPcm16 | OutputFormat::WavFloat32 => "wav",
        }
    }
}

/// Source and output configuration passed to [`CaptureDevice::prepare`].
///
/// [`CaptureDevice::prepare`]: crate::CaptureDevice::prepare
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaptureSpec {
    /// Input to capture from.
    pub source: AudioSource,
    /// Artifact encoding.
    pub format: OutputFormat,
}
