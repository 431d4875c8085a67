use std::{
    fmt,
    path::{Path, PathBuf},
};

use uuid::Uuid;

/// Unique token identifying one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId(Uuid);

impl SegmentId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One span of capture and the artifact it is written to.
///
/// Owned by the recorder worker from `Preparing` until the segment is sent,
/// discarded or abandoned.
#[derive(Debug)]
pub(crate) struct Segment {
    id: SegmentId,
    path: PathBuf,
    elapsed_secs: u32,
    artifact_reported: bool,
    stopped: bool,
}

impl Segment {
    /// Allocates a segment at `<dir>/<token>.<extension>`.
    pub(crate) fn allocate(dir: &Path, extension: &str) -> Self {
        let id = SegmentId::new();
        let path = dir.join(format!("{}.{}", id.0.simple(), extension));

        Self {
            id,
            path,
            elapsed_secs: 0,
            artifact_reported: false,
            stopped: false,
        }
    }

    pub(crate) fn id(&self) -> SegmentId {
        self.id
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    /// Advances the elapsed counter. Never moves it backwards.
    pub(crate) fn record_elapsed(&mut self, seconds: u32) {
        self.elapsed_secs = self.elapsed_secs.max(seconds);
    }

    /// Returns `true` the first time it is called for this segment.
    pub(crate) fn mark_artifact_reported(&mut self) -> bool {
        !std::mem::replace(&mut self.artifact_reported, true)
    }

    /// The device has finalized this segment's artifact.
    pub(crate) fn mark_stopped(&mut self) {
        self.stopped = true;
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped
    }
}
