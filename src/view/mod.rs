//! View state aggregation.
//!
//! All session state lives in one [`ViewState`] owned by a [`ViewStore`]. The push
//! channel, the command correlator and the snapshot refresher each describe their
//! changes as a [`ViewUpdate`]; the store applies them one at a time and publishes whole
//! snapshots to readers over a `watch` channel.

pub mod buffer;
mod config;
mod state;
mod update;

pub use buffer::BoundedBuffer;
pub use config::BufferConfig;
pub use state::{Applied, ViewState};
pub use update::{Notice, NoticeLevel, ViewUpdate};

use crate::commands::CommandError;
use std::sync::Arc;
use tokio::sync::watch;

/// Single writer for the view state.
///
/// Cloning is cheap; every clone dispatches into the same state.
#[derive(Debug, Clone)]
pub struct ViewStore {
    sender: Arc<watch::Sender<ViewState>>,
}

impl ViewStore {
    pub fn new(buffers: &BufferConfig) -> Self {
        let (sender, _) = watch::channel(ViewState::new(buffers));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Applies `update` and notifies readers if anything changed.
    pub fn dispatch(&self, update: ViewUpdate) -> Result<Applied, CommandError> {
        let name = update.name();
        let mut outcome = Ok(Applied::Unchanged);
        self.sender.send_if_modified(|state| {
            outcome = state.apply(update);
            matches!(&outcome, Ok(applied) if applied.changed())
        });
        match &outcome {
            Ok(applied) => {
                tracing::trace!(update = name, changed = applied.changed(), "View update applied")
            }
            Err(e) => tracing::debug!(update = name, error = %e, "View update rejected"),
        }
        outcome
    }

    /// Subscribe to snapshots. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.sender.subscribe()
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> ViewState {
        self.sender.borrow().clone()
    }

    /// Reads the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&ViewState) -> R) -> R {
        f(&self.sender.borrow())
    }
}
