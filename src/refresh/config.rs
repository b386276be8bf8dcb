//! Configuration for snapshot refreshes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between periodic refreshes while the session is active
    pub interval_seconds: u64,
    /// Detections requested from the history endpoint
    pub history_limit: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 30,
            history_limit: 10,
        }
    }
}
