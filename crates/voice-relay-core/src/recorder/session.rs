use crate::{
    CoreResult, DeviceErrorReporter, RecorderError, RecorderStatus, RecordingOrchestrator,
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tracing::{info, instrument, warn};

/// Reported when permission was missing but granted on request. The gesture
/// that triggered the request is not recorded.
pub const PERMISSION_GRANTED_ON_REQUEST: i32 = -1;
/// Reported when permission was missing and the request was refused.
pub const PERMISSION_DENIED: i32 = -2;

/// Source of capture permission.
///
/// Both methods may block. [`VoiceSession`] calls them on a blocking thread.
pub trait PermissionGate: Send + Sync + 'static {
    /// Whether capture is currently allowed.
    fn is_granted(&self) -> bool;

    /// Asks for permission and returns the outcome. May block on user input.
    fn request(&self) -> bool;
}

/// [`PermissionGate`] that always allows capture.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysGranted;

impl PermissionGate for AlwaysGranted {
    fn is_granted(&self) -> bool {
        true
    }

    fn request(&self) -> bool {
        true
    }
}

/// Outcome of one permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Granted,
    GrantedOnRequest,
    Denied,
}

/// Push-to-talk front end over a [`RecordingOrchestrator`].
///
/// Every press starts from a hard reset, and capture only begins once the
/// permission gate allows it.
pub struct VoiceSession<P: PermissionGate> {
    orchestrator: RecordingOrchestrator,
    permissions: Arc<P>,
    errors: DeviceErrorReporter,
}

impl<P: PermissionGate> VoiceSession<P> {
    /// Wraps an orchestrator.
    pub fn new(orchestrator: RecordingOrchestrator, permissions: P) -> Self {
        let errors = orchestrator.error_reporter();
        Self {
            orchestrator,
            permissions: Arc::new(permissions),
            errors,
        }
    }

    /// Gesture pressed.
    ///
    /// Resets the recorder, then begins capture if permission is granted.
    /// Otherwise requests permission and reports
    /// [`PERMISSION_GRANTED_ON_REQUEST`] or [`PERMISSION_DENIED`] to the
    /// listener's error channel. The gate runs on a blocking thread, so the
    /// calling task is never stalled by a host query or a prompt.
    ///
    /// # Errors
    ///
    /// Returns error if the recorder worker has stopped or the permission
    /// check panicked.
    #[instrument(skip(self))]
    pub async fn press(&self) -> CoreResult<()> {
        self.orchestrator.reset()?;

        let permissions = Arc::clone(&self.permissions);
        let access = tokio::task::spawn_blocking(move || {
            if permissions.is_granted() {
                Access::Granted
            } else if permissions.request() {
                Access::GrantedOnRequest
            } else {
                Access::Denied
            }
        })
        .await
        .map_err(|e| RecorderError::DeviceError {
            reason: format!("Permission check failed: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        match access {
            Access::Granted => return self.orchestrator.begin(),
            Access::GrantedOnRequest => {
                info!("Capture permission granted, press again to record");
                self.errors.report(PERMISSION_GRANTED_ON_REQUEST);
            }
            Access::Denied => {
                warn!("Capture permission denied");
                self.errors.report(PERMISSION_DENIED);
            }
        }

        Ok(())
    }

    /// Gesture released.
    ///
    /// # Errors
    ///
    /// Returns error if the recorder worker has stopped.
    #[track_caller]
    pub fn release(&self) -> CoreResult<()> {
        self.orchestrator.end()
    }

    /// Hard reset without starting a new gesture.
    ///
    /// # Errors
    ///
    /// Returns error if the recorder worker has stopped.
    #[track_caller]
    pub fn reset(&self) -> CoreResult<()> {
        self.orchestrator.reset()
    }

    /// Latest published snapshot.
    pub fn status(&self) -> RecorderStatus {
        self.orchestrator.status()
    }

    /// The wrapped orchestrator.
    pub fn orchestrator(&self) -> &RecordingOrchestrator {
        &self.orchestrator
    }

    /// Stops the recorder worker.
    pub async fn shutdown(self) {
        self.orchestrator.shutdown().await;
    }
}
