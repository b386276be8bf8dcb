//! Configuration for user-issued commands.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest upload the detection service accepts.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Seconds to wait for a recording confirmation before failing the command.
    /// Zero waits indefinitely.
    pub pending_timeout_seconds: u64,
    /// Files larger than this are rejected before upload
    pub max_upload_bytes: u64,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            pending_timeout_seconds: 15,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl CommandConfig {
    pub fn pending_timeout(&self) -> Option<Duration> {
        (self.pending_timeout_seconds > 0).then(|| Duration::from_secs(self.pending_timeout_seconds))
    }
}
