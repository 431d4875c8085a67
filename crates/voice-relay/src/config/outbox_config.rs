use serde::{Deserialize, Serialize};

use std::path::PathBuf;

/// Where sent segments are delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxConfig {
    /// Outbox directory (None = `outbox` under the platform data directory).
    #[serde(default)]
    pub dir: Option<PathBuf>,
}
