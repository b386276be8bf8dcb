//! Configuration for the detection feeds.

use serde::{Deserialize, Serialize};

/// Capacities of the bounded detection feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Entries kept in the dashboard detection feed
    pub dashboard_capacity: usize,
    /// Live chunk results kept while recording
    pub live_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            dashboard_capacity: 10,
            live_capacity: 5,
        }
    }
}
