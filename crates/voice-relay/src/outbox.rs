//! Delivery of sent segments to a local outbox directory.

use crate::{AppError, AppResult};

use std::{
    fs,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Local directory that receives each sent segment.
#[derive(Debug, Clone)]
pub struct Outbox {
    dir: PathBuf,
}

impl Outbox {
    /// Opens the outbox, creating the directory if needed.
    #[track_caller]
    #[instrument]
    pub fn new(dir: PathBuf) -> AppResult<Self> {
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            debug!(outbox_dir = ?dir, "Created outbox directory");
        }

        Ok(Self { dir })
    }

    /// The outbox directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Moves `artifact` into the outbox and returns its new path.
    ///
    /// Uses a rename so a reader never sees a partial file. When the capture
    /// directory is on another filesystem the segment is copied under a
    /// temporary name first and then renamed into place.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn deliver(&self, artifact: &Path, duration: u32) -> AppResult<PathBuf> {
        let file_name = artifact.file_name().ok_or_else(|| AppError::OutboxError {
            reason: format!("Segment path has no file name: {:?}", artifact),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let destination = self.dir.join(file_name);

        if let Err(e) = fs::rename(artifact, &destination) {
            if !artifact.exists() {
                return Err(AppError::OutboxError {
                    reason: format!("Segment {:?} is missing: {}", artifact, e),
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            debug!(error = %e, "Rename failed, copying segment into outbox");

            let staging = destination.with_extension("part");
            fs::copy(artifact, &staging).map_err(|e| AppError::OutboxError {
                reason: format!("Failed to copy {:?} into outbox: {}", artifact, e),
                location: ErrorLocation::from(Location::caller()),
            })?;
            fs::rename(&staging, &destination).map_err(|e| AppError::OutboxError {
                reason: format!("Failed to move {:?} into place: {}", staging, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            if let Err(e) = fs::remove_file(artifact) {
                warn!(artifact = ?artifact, error = %e, "Failed to remove delivered segment");
            }
        }

        info!(destination = ?destination, duration, "Segment delivered to outbox");

        Ok(destination)
    }
}
