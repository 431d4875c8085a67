use crate::{
    AudioSource, CaptureDevice, CaptureSpec, CoreResult, DeviceErrorReporter, MAX_AMPLITUDE,
    OutputFormat, PermissionGate, RecorderError,
};

use std::{
    fs::File,
    io::BufWriter,
    panic::Location,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    time::Instant,
};

use cpal::{
    Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use hound::{WavSpec, WavWriter};
use tracing::{debug, error, info, instrument, warn};

/// Error code reported when the cpal stream signals a failure mid-capture.
pub const STREAM_ERROR_CODE: i32 = 1;

type SharedWriter = Arc<Mutex<Option<WavWriter<BufWriter<File>>>>>;

struct PreparedInput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    format: OutputFormat,
}

/// [`CaptureDevice`] backed by a cpal input stream written to a WAV file.
///
/// `prepare` resolves the input device and opens the WAV writer; `start`
/// builds and plays the stream. Samples are written from the audio callback
/// as they arrive, so memory use does not grow with segment length.
pub struct CpalRecorder {
    prepared: Option<PreparedInput>,
    stream: Option<Stream>,
    writer: SharedWriter,
    target: Option<PathBuf>,
    started_at: Option<Instant>,
    /// Peak |sample| since the last `max_amplitude` read, stored as f32 bits.
    /// Bit patterns of non-negative floats order like the floats themselves.
    peak: Arc<AtomicU32>,
    /// Set before the stream is dropped so a late callback writes nothing.
    shutdown: Arc<AtomicBool>,
    reporter: Option<DeviceErrorReporter>,
}

impl Default for CpalRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalRecorder {
    /// Creates an idle recorder. No audio device is touched until `prepare`.
    pub fn new() -> Self {
        Self {
            prepared: None,
            stream: None,
            writer: Arc::new(Mutex::new(None)),
            target: None,
            started_at: None,
            peak: Arc::new(AtomicU32::new(0)),
            shutdown: Arc::new(AtomicBool::new(true)),
            reporter: None,
        }
    }

    #[track_caller]
    fn resolve_device(source: &AudioSource) -> CoreResult<Device> {
        let host = cpal::default_host();

        match source {
            AudioSource::DefaultInput => {
                host.default_input_device()
                    .ok_or(RecorderError::NoMicrophoneFound {
                        location: ErrorLocation::from(Location::caller()),
                    })
            }
            AudioSource::Named(name) => {
                let mut devices =
                    host.input_devices()
                        .map_err(|e| RecorderError::DeviceError {
                            reason: format!("Failed to enumerate input devices: {}", e),
                            location: ErrorLocation::from(Location::caller()),
                        })?;

                #[allow(deprecated)]
                let found = devices.find(|d| d.name().map(|n| n == *name).unwrap_or(false));

                found.ok_or(RecorderError::NoMicrophoneFound {
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    #[track_caller]
    fn build_stream(&self, input: &PreparedInput) -> CoreResult<Stream> {
        match input.sample_format {
            SampleFormat::F32 => self.build_stream_typed::<f32>(input),
            SampleFormat::I16 => self.build_stream_typed::<i16>(input),
            SampleFormat::U16 => self.build_stream_typed::<u16>(input),
            other => Err(RecorderError::DeviceError {
                reason: format!("Unsupported sample format: {:?}", other),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    #[track_caller]
    fn build_stream_typed<T>(&self, input: &PreparedInput) -> CoreResult<Stream>
    where
        T: SizedSample + Send + 'static,
        f32: FromSample<T>,
    {
        let writer = Arc::clone(&self.writer);
        let peak = Arc::clone(&self.peak);
        let shutdown = Arc::clone(&self.shutdown);
        let reporter = self.reporter.clone();
        let format = input.format;

        input
            .device
            .build_input_stream(
                &input.config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    if shutdown.load(Ordering::Acquire) {
                        return;
                    }

                    let mut local_peak = 0.0f32;
                    let mut guard = writer.lock().unwrap_or_else(|e| {
                        error!("WAV writer lock poisoned, recovering: {}", e);
                        e.into_inner()
                    });

                    if let Some(w) = guard.as_mut() {
                        for &sample in data {
                            let value = f32::from_sample(sample).clamp(-1.0, 1.0);
                            local_peak = local_peak.max(value.abs());

                            let written = match format {
                                OutputFormat::WavPcm16 => w.write_sample(sample_to_i16(value)),
                                OutputFormat::WavFloat32 => w.write_sample(value),
                            };
                            if let Err(e) = written {
                                error!("Failed to write sample: {}", e);
                                break;
                            }
                        }
                    }

                    peak.fetch_max(local_peak.to_bits(), Ordering::Relaxed);
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    if let Some(reporter) = &reporter {
                        reporter.report(STREAM_ERROR_CODE);
                    }
                },
                None,
            )
            .map_err(|e| RecorderError::DeviceError {
                reason: format!("Failed to build stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn take_writer(&self) -> Option<WavWriter<BufWriter<File>>> {
        self.writer
            .lock()
            .unwrap_or_else(|e| {
                error!("WAV writer lock poisoned, recovering: {}", e);
                e.into_inner()
            })
            .take()
    }
}

impl CaptureDevice for CpalRecorder {
    #[track_caller]
    #[instrument(skip(self))]
    fn prepare(&mut self, spec: &CaptureSpec, target: &Path) -> CoreResult<()> {
        self.release();

        let device = Self::resolve_device(&spec.source)?;

        let supported = device
            .default_input_config()
            .map_err(|e| RecorderError::DeviceError {
                reason: format!("Failed to get config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let wav_spec = match spec.format {
            OutputFormat::WavPcm16 => WavSpec {
                channels: supported.channels(),
                sample_rate: supported.sample_rate(),
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            },
            OutputFormat::WavFloat32 => WavSpec {
                channels: supported.channels(),
                sample_rate: supported.sample_rate(),
                bits_per_sample: 32,
                sample_format: hound::SampleFormat::Float,
            },
        };

        let writer = WavWriter::create(target, wav_spec).map_err(|e| RecorderError::DeviceError {
            reason: format!("Failed to create {:?}: {}", target, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        *self.writer.lock().unwrap_or_else(|e| e.into_inner()) = Some(writer);

        info!(
            sample_rate = supported.sample_rate(),
            channels = supported.channels(),
            sample_format = ?supported.sample_format(),
            "Capture device prepared"
        );

        self.prepared = Some(PreparedInput {
            device,
            sample_format: supported.sample_format(),
            config: supported.into(),
            format: spec.format,
        });
        self.target = Some(target.to_path_buf());

        Ok(())
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn start(&mut self) -> CoreResult<()> {
        let input = self
            .prepared
            .as_ref()
            .ok_or_else(|| RecorderError::DeviceError {
                reason: "start called before prepare".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.peak.store(0, Ordering::Relaxed);
        self.shutdown.store(false, Ordering::Release);

        let stream = match self.build_stream(input) {
            Ok(stream) => stream,
            Err(e) => {
                self.shutdown.store(true, Ordering::Release);
                return Err(e);
            }
        };

        stream.play().map_err(|e| {
            self.shutdown.store(true, Ordering::Release);
            RecorderError::DeviceError {
                reason: format!("Failed to start stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        self.stream = Some(stream);
        self.started_at = Some(Instant::now());
        info!("Audio capture started");

        Ok(())
    }

    fn progress_seconds(&mut self) -> i32 {
        match self.started_at {
            Some(started_at) => i32::try_from(started_at.elapsed().as_secs()).unwrap_or(i32::MAX),
            None => -1,
        }
    }

    fn max_amplitude(&mut self) -> u32 {
        let peak = f32::from_bits(self.peak.swap(0, Ordering::Relaxed));
        (peak.clamp(0.0, 1.0) * MAX_AMPLITUDE as f32) as u32
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn stop(&mut self) -> CoreResult<u32> {
        self.shutdown.store(true, Ordering::Release);
        let elapsed = self.started_at.take().map(|t| t.elapsed());

        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!("Audio capture stopped");
        }

        self.prepared = None;
        let target = self.target.take();

        if let Some(writer) = self.take_writer() {
            writer.finalize().map_err(|e| RecorderError::DeviceError {
                reason: format!("Failed to finalize WAV: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        }

        let elapsed = elapsed.ok_or_else(|| RecorderError::DeviceError {
            reason: "stop called before start".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let seconds = u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX);
        debug!(seconds, target = ?target, "Segment finalized");

        Ok(seconds)
    }

    fn release(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.started_at = None;
        self.prepared = None;
        drop(self.stream.take());
        drop(self.take_writer());

        if let Some(target) = self.target.take()
            && target.exists()
        {
            if let Err(e) = std::fs::remove_file(&target) {
                warn!(target = ?target, error = %e, "Failed to remove abandoned segment");
            } else {
                debug!(target = ?target, "Removed abandoned segment");
            }
        }
    }

    fn attach_error_reporter(&mut self, reporter: DeviceErrorReporter) {
        self.reporter = Some(reporter);
    }
}

/// Converts a clamped float sample to 16-bit PCM.
pub(crate) fn sample_to_i16(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

/// [`PermissionGate`] that treats the presence of an input device as permission.
///
/// Desktop hosts have no runtime microphone prompt, so asking again simply
/// re-queries the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicrophoneGate;

impl PermissionGate for MicrophoneGate {
    fn is_granted(&self) -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    fn request(&self) -> bool {
        self.is_granted()
    }
}
