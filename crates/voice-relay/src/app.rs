use crate::{AppCommand, AppResult, Outbox, RelayListener, UiCommand, config::Config};

use voice_relay_core::{
    CpalRecorder, MicrophoneGate, RecordingOrchestrator, STREAM_ERROR_CODE, VoiceSession,
};

use tao::event_loop::EventLoopProxy;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, instrument, warn};

/// Main application state.
///
/// Runs on the async runtime thread and owns the push-to-talk session.
/// Process exit is requested from the main thread through `ui_proxy`,
/// because the event loop must stay on the UI thread.
pub struct App {
    pub(crate) session: VoiceSession<MicrophoneGate>,
    pub(crate) ui_proxy: EventLoopProxy<UiCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
}

impl App {
    /// Builds the outbox, listener and recorder from `config`.
    ///
    /// Must be called from inside the tokio runtime.
    #[track_caller]
    #[instrument(skip_all)]
    pub(crate) fn new(
        config: &Config,
        ui_proxy: EventLoopProxy<UiCommand>,
        command_tx: mpsc::Sender<AppCommand>,
        command_rx: mpsc::Receiver<AppCommand>,
        shutdown_tx: watch::Sender<bool>,
    ) -> AppResult<Self> {
        let outbox = Outbox::new(config.outbox_dir()?)?;
        let settings = config.recorder.to_settings(&config.capture_dir()?);

        info!(
            capture_dir = ?settings.capture_dir,
            outbox_dir = ?outbox.dir(),
            min_length_secs = settings.min_length_secs,
            max_length_secs = settings.max_length_secs,
            "Recorder configured"
        );

        let listener = RelayListener::new(outbox, command_tx);
        let orchestrator = RecordingOrchestrator::spawn(CpalRecorder::new(), listener, settings)?;

        Ok(Self {
            session: VoiceSession::new(orchestrator, MicrophoneGate),
            ui_proxy,
            command_rx,
            shutdown_tx,
        })
    }

    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Voice-Relay starting");

        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        AppCommand::Press { gesture_id } => {
                            if let Err(e) = self.session.press().await {
                                error!(gesture_id = %gesture_id, error = ?e, "Failed to begin recording");
                            }
                        }
                        AppCommand::Release { gesture_id } => {
                            if let Err(e) = self.session.release() {
                                error!(gesture_id = %gesture_id, error = ?e, "Failed to end recording");
                            }
                        }
                        AppCommand::DeviceFailed { code } => self.handle_device_error(code),
                    }
                }

                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => info!("Interrupt received, shutting down"),
                        Err(e) => warn!(error = ?e, "Failed to listen for interrupt, shutting down"),
                    }
                    break;
                }
            }
        }

        let _ = self.shutdown_tx.send(true);
        self.session.shutdown().await;

        if self.ui_proxy.send_event(UiCommand::Shutdown).is_err() {
            warn!("Event loop already closed");
        }

        info!("Voice-Relay shut down successfully");

        Ok(())
    }

    /// A failed input stream leaves the recorder believing it still
    /// captures, so the session is reset.
    fn handle_device_error(&self, code: i32) {
        if code != STREAM_ERROR_CODE {
            return;
        }

        warn!(code, "Input stream failed, resetting recorder");
        if let Err(e) = self.session.reset() {
            error!(error = ?e, "Failed to reset recorder");
        }
    }
}
