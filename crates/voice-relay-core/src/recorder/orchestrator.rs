use crate::{
    CaptureDevice, CoreResult, DeviceErrorReporter, RecorderError, RecorderListener,
    RecorderSettings, RecorderStatus, RecordingState,
    recorder::{Command, RecorderWorker},
};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use tokio::{
    runtime::Handle,
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info, instrument, warn};

/// How long `shutdown` waits for the worker to drain.
const WORKER_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Push-to-talk recorder.
///
/// Owns a single background worker that holds the state machine, the
/// capture device and the listener. `begin`, `end` and `reset` only queue a
/// command and return immediately; results surface through the
/// [`RecorderListener`] and the published [`RecorderStatus`].
///
/// # Ordering
///
/// Commands are applied strictly in the order they were issued, so a
/// `begin` right after an `end` always observes the finished teardown of
/// the previous segment.
pub struct RecordingOrchestrator {
    command_tx: mpsc::UnboundedSender<Command>,
    status_rx: watch::Receiver<RecorderStatus>,
    worker: Option<JoinHandle<()>>,
}

impl RecordingOrchestrator {
    /// Validates `settings`, creates the capture directory and starts the worker.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if the settings are invalid, the capture directory
    /// cannot be created, or no runtime is available.
    #[track_caller]
    #[instrument(skip(device, listener))]
    pub fn spawn<D, L>(mut device: D, listener: L, settings: RecorderSettings) -> CoreResult<Self>
    where
        D: CaptureDevice,
        L: RecorderListener,
    {
        settings.validate()?;

        let runtime = Handle::try_current().map_err(|_| RecorderError::NoRuntime {
            location: ErrorLocation::from(Location::caller()),
        })?;

        std::fs::create_dir_all(&settings.capture_dir)?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(RecorderStatus::default());

        device.attach_error_reporter(DeviceErrorReporter::new(command_tx.clone()));

        let worker = RecorderWorker::new(
            Box::new(device),
            Box::new(listener),
            settings,
            command_tx.clone(),
            status_tx,
            runtime.clone(),
        );
        let handle = runtime.spawn_blocking(move || worker.run(command_rx));

        info!("Recording orchestrator started");

        Ok(Self {
            command_tx,
            status_rx,
            worker: Some(handle),
        })
    }

    /// Gesture pressed: starts preparing a segment if the recorder is idle.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::WorkerUnavailable`] if the worker has stopped.
    #[track_caller]
    pub fn begin(&self) -> CoreResult<()> {
        self.send(Command::Begin)
    }

    /// Gesture released: stops the current segment, or cancels preparation.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::WorkerUnavailable`] if the worker has stopped.
    #[track_caller]
    pub fn end(&self) -> CoreResult<()> {
        self.send(Command::End)
    }

    /// Hard reset: cancels polling, abandons any segment and forces `Idle`.
    ///
    /// Safe to call repeatedly and in any state.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::WorkerUnavailable`] if the worker has stopped.
    #[track_caller]
    pub fn reset(&self) -> CoreResult<()> {
        self.send(Command::Reset)
    }

    /// Latest published snapshot.
    pub fn status(&self) -> RecorderStatus {
        self.status_rx.borrow().clone()
    }

    /// Latest published state.
    pub fn state(&self) -> RecordingState {
        self.status_rx.borrow().state
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<RecorderStatus> {
        self.status_rx.clone()
    }

    /// Channel for asynchronous error codes, forwarded to the listener.
    pub fn error_reporter(&self) -> DeviceErrorReporter {
        DeviceErrorReporter::new(self.command_tx.clone())
    }

    /// Stops the worker and waits briefly for it to finish.
    ///
    /// Any active segment is abandoned.
    #[instrument(skip(self))]
    pub async fn shutdown(mut self) {
        let _ = self.command_tx.send(Command::Shutdown);

        let Some(handle) = self.worker.take() else {
            return;
        };

        match tokio::time::timeout(WORKER_JOIN_TIMEOUT, handle).await {
            Ok(Ok(())) => info!("Recorder worker stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Recorder worker task panicked"),
            Err(_) => debug!(
                "Recorder worker did not stop within timeout, \
                   likely blocked in a device call"
            ),
        }
    }

    #[track_caller]
    fn send(&self, command: Command) -> CoreResult<()> {
        self.command_tx
            .send(command)
            .map_err(|_| RecorderError::WorkerUnavailable {
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

impl Drop for RecordingOrchestrator {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.command_tx.send(Command::Shutdown);
        }
    }
}
