use crate::{RecordingState, SegmentId};

use std::path::PathBuf;

/// Public view of the segment currently owned by the recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentInfo {
    /// Segment token.
    pub id: SegmentId,
    /// Artifact path.
    pub path: PathBuf,
    /// Highest elapsed seconds observed so far.
    pub elapsed_secs: u32,
}

/// Snapshot published after every serialized recorder step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecorderStatus {
    /// Current state.
    pub state: RecordingState,
    /// Segment owned in this state, if any.
    pub segment: Option<SegmentInfo>,
    /// Whether the polling activity is running.
    pub polling: bool,
}
