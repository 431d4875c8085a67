use crate::recorder::Command;

use tokio::sync::mpsc;
use tracing::debug;

/// Clonable channel for asynchronous device error codes.
///
/// Codes are forwarded to [`RecorderListener::on_error`] on the worker. They
/// never change the recorder state; the listener decides whether to reset.
///
/// [`RecorderListener::on_error`]: crate::RecorderListener::on_error
#[derive(Debug, Clone)]
pub struct DeviceErrorReporter {
    command_tx: mpsc::UnboundedSender<Command>,
}

impl DeviceErrorReporter {
    pub(crate) fn new(command_tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { command_tx }
    }

    /// Queues `code` for the listener. Safe to call from any thread.
    pub fn report(&self, code: i32) {
        if self.command_tx.send(Command::Error { code }).is_err() {
            debug!(code, "Recorder worker gone, dropping device error");
        }
    }
}
