//! Out-of-band refresh requests.

use tokio::sync::mpsc;

/// Why a snapshot refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    Activation,
    Interval,
    AnalysisCompleted,
    /// The push channel came back after a drop; broadcasts may have been missed
    Reconnected,
    Manual,
}

impl std::fmt::Display for RefreshReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshReason::Activation => write!(f, "activation"),
            RefreshReason::Interval => write!(f, "interval"),
            RefreshReason::AnalysisCompleted => write!(f, "analysis_completed"),
            RefreshReason::Reconnected => write!(f, "reconnected"),
            RefreshReason::Manual => write!(f, "manual"),
        }
    }
}

/// Cloneable handle for asking the refresher to run now.
#[derive(Debug, Clone)]
pub struct RefreshTrigger {
    sender: mpsc::UnboundedSender<RefreshReason>,
}

impl RefreshTrigger {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RefreshReason>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queues a refresh. A no-op once the refresher is gone.
    pub fn request(&self, reason: RefreshReason) {
        if self.sender.send(reason).is_err() {
            tracing::debug!(%reason, "Refresh requested with no refresher running");
        }
    }
}
