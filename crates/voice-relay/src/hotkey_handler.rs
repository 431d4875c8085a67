//! Global push-to-talk hotkey handler.
//!
//! Registers CTRL+SHIFT+Space as a global hotkey. Holding it down is a press
//! and letting go is a release; both are forwarded to the main application
//! over an async channel.

use crate::{AppCommand, AppError, AppResult, GestureState};

use std::{
    panic::Location,
    sync::Arc,
    time::{Duration, Instant},
};

use error_location::ErrorLocation;
use global_hotkey::{
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
    hotkey::{Code, HotKey, Modifiers},
};
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

/// Global hotkey handler tracking the press/release gesture.
pub struct HotkeyHandler {
    hotkey_id: u32,
    state: Arc<Mutex<GestureState>>,
    command_tx: mpsc::Sender<AppCommand>,
}

impl HotkeyHandler {
    /// Register CTRL+SHIFT+Space as the global hotkey.
    ///
    /// Must be called on a thread with a message pump (e.g. the main thread
    /// running a `tao` event loop) so that `WM_HOTKEY` messages are
    /// dispatched on Windows. The returned [`GlobalHotKeyManager`] must be
    /// kept alive on that thread for the hotkey to remain registered.
    #[track_caller]
    #[instrument]
    pub fn register_hotkey() -> AppResult<(GlobalHotKeyManager, u32)> {
        let manager =
            GlobalHotKeyManager::new().map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to create manager: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let hotkey = HotKey::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::Space);

        manager
            .register(hotkey)
            .map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to register CTRL+SHIFT+Space: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(hotkey = "CTRL+SHIFT+Space", "Global hotkey registered");

        Ok((manager, hotkey.id()))
    }

    /// Create a handler for a previously registered hotkey.
    ///
    /// The `hotkey_id` should come from [`register_hotkey`]. This struct is
    /// `Send` and can live on any thread. It only listens on the global
    /// [`GlobalHotKeyEvent`] channel.
    pub fn new(hotkey_id: u32, command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self {
            hotkey_id,
            state: Arc::new(Mutex::new(GestureState::Released)),
            command_tx,
        }
    }

    /// Run the hotkey handler event loop until a shutdown signal is received.
    #[instrument(skip(self))]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let receiver = GlobalHotKeyEvent::receiver().clone();
        let (event_tx, mut event_rx) = mpsc::channel(32);

        // One blocking task forwards hotkey events. It exits on the first
        // event after `event_rx` is dropped.
        let handle = tokio::task::spawn_blocking(move || {
            while let Ok(event) = receiver.recv() {
                if event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Hotkey handler shutting down");
                    break;
                }
                Some(event) = event_rx.recv() => {
                    if event.id == self.hotkey_id {
                        self.handle_hotkey(event.state).await?;
                    }
                }
            }
        }

        drop(event_rx);

        // The forwarder may be parked in recv() until the next hotkey event.
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(Ok(())) => debug!("Hotkey event forwarder stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Hotkey event forwarder task panicked"),
            Err(_) => debug!(
                "Hotkey event forwarder did not stop within timeout, \
                   will be cleaned up on exit"
            ),
        }

        Ok(())
    }

    /// Applies one hotkey edge to the gesture state.
    ///
    /// Key repeat delivers extra `Pressed` events while held; those and a
    /// `Released` without a matching press are ignored. The state only
    /// changes after the command has been delivered.
    #[instrument(skip(self))]
    pub(crate) async fn handle_hotkey(&self, edge: HotKeyState) -> AppResult<()> {
        let mut state = self.state.lock().await;

        match (edge, *state) {
            (HotKeyState::Pressed, GestureState::Released) => {
                let gesture_id = Uuid::new_v4();

                self.command_tx
                    .send(AppCommand::Press { gesture_id })
                    .await
                    .map_err(|e| AppError::ChannelSendFailed {
                        message: format!("Failed to send Press: {}", e),
                        location: ErrorLocation::from(Location::caller()),
                    })?;

                *state = GestureState::Held {
                    pressed_at: Instant::now(),
                    gesture_id,
                };

                info!(gesture_id = %gesture_id, "Hotkey pressed");
            }
            (
                HotKeyState::Released,
                GestureState::Held {
                    pressed_at,
                    gesture_id,
                },
            ) => {
                self.command_tx
                    .send(AppCommand::Release { gesture_id })
                    .await
                    .map_err(|e| AppError::ChannelSendFailed {
                        message: format!("Failed to send Release: {}", e),
                        location: ErrorLocation::from(Location::caller()),
                    })?;

                *state = GestureState::Released;

                info!(
                    gesture_id = %gesture_id,
                    held_ms = pressed_at.elapsed().as_millis(),
                    "Hotkey released"
                );
            }
            (edge, current) => {
                trace!(?edge, ?current, "Hotkey edge ignored");
            }
        }

        Ok(())
    }

    /// Current gesture state.
    #[cfg(test)]
    pub(crate) async fn gesture(&self) -> GestureState {
        *self.state.lock().await
    }
}
