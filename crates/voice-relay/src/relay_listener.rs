use crate::{AppCommand, Outbox};

use voice_relay_core::{PERMISSION_DENIED, PERMISSION_GRANTED_ON_REQUEST, RecorderListener};

use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

/// Recorder listener for the desktop shim.
///
/// Logs every lifecycle notification, delivers sent segments to the
/// [`Outbox`], and forwards device errors to the app loop, which decides
/// whether to reset.
pub struct RelayListener {
    outbox: Outbox,
    command_tx: mpsc::Sender<AppCommand>,
}

impl RelayListener {
    /// Creates a listener delivering into `outbox`.
    pub fn new(outbox: Outbox, command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self { outbox, command_tx }
    }
}

impl RecorderListener for RelayListener {
    fn on_preparing(&mut self) {
        debug!("Preparing capture device");
    }

    fn on_prepared(&mut self) {
        debug!("Capture device ready");
    }

    fn on_stopped(&mut self, duration: u32) {
        info!(duration, "Recording stopped");
    }

    fn on_send(&mut self, artifact: &Path, duration: u32) {
        if let Err(e) = self.outbox.deliver(artifact, duration) {
            error!(artifact = ?artifact, error = ?e, "Failed to deliver segment");
        }
    }

    fn on_amplitude_changed(&mut self, level: u32) {
        trace!(level, "Amplitude");
    }

    fn on_expire_countdown(&mut self, seconds_remaining: u32) {
        info!(seconds_remaining, "Segment about to be cut");
    }

    fn on_artifact(&mut self, artifact: &Path) {
        debug!(artifact = ?artifact, "Segment file is being written");
    }

    fn on_elapsed(&mut self, seconds: u32) {
        trace!(seconds, "Elapsed");
    }

    fn on_error(&mut self, code: i32) {
        match code {
            PERMISSION_GRANTED_ON_REQUEST => {
                info!("Microphone available, press the hotkey again to record");
            }
            PERMISSION_DENIED => warn!("No microphone available"),
            code => warn!(code, "Recorder reported an error"),
        }

        if let Err(e) = self.command_tx.try_send(AppCommand::DeviceFailed { code }) {
            warn!(code, error = %e, "Failed to forward device error");
        }
    }
}
