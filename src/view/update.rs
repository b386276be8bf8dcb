//! Updates that can be applied to the view state.
//!
//! Producers describe what changed; `ViewState::apply` decides how the composite state
//! moves.

use crate::channel::ConnectionState;
use crate::detection::{AggregateStats, AnimalCount, DetectionEvent, FileAnalysis, LiveChunkResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    // Push-owned
    Connection(ConnectionState),
    LiveChunk(LiveChunkResult),
    /// Authoritative recording state from the push channel; resolves pending commands
    RecordingStatus {
        recording: bool,
        at: DateTime<Utc>,
    },
    Visualization(Vec<f32>),

    // Commands
    RecordingRequested {
        correlation_key: Uuid,
        submitted_at: DateTime<Utc>,
    },
    /// Synchronous acknowledgement. `recording` is set when the backend reports a state
    /// it will not broadcast (already recording / not recording).
    CommandAcknowledged {
        correlation_key: Uuid,
        recording: Option<bool>,
    },
    CommandFailed {
        correlation_key: Uuid,
        reason: String,
    },
    CommandTimedOut {
        correlation_key: Uuid,
    },
    AnalysisStarted {
        correlation_key: Uuid,
        file_name: String,
        submitted_at: DateTime<Utc>,
    },
    AnalysisFinished {
        correlation_key: Uuid,
        outcome: FileAnalysis,
    },

    // Pull-owned
    StatsRefreshed(AggregateStats),
    HistoryRefreshed(Vec<DetectionEvent>),
    AnimalCountsRefreshed(Vec<AnimalCount>),
    /// Recording flag as polled; never resolves pending commands
    RecordingSynced {
        recording: bool,
    },
    RefreshCompleted {
        at: DateTime<Utc>,
    },

    // Notices
    Notice(Notice),
    DismissNotice,
}

impl ViewUpdate {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ViewUpdate::Connection(_) => "connection",
            ViewUpdate::LiveChunk(_) => "live_chunk",
            ViewUpdate::RecordingStatus { .. } => "recording_status",
            ViewUpdate::Visualization(_) => "visualization",
            ViewUpdate::RecordingRequested { .. } => "recording_requested",
            ViewUpdate::CommandAcknowledged { .. } => "command_acknowledged",
            ViewUpdate::CommandFailed { .. } => "command_failed",
            ViewUpdate::CommandTimedOut { .. } => "command_timed_out",
            ViewUpdate::AnalysisStarted { .. } => "analysis_started",
            ViewUpdate::AnalysisFinished { .. } => "analysis_finished",
            ViewUpdate::StatsRefreshed(_) => "stats_refreshed",
            ViewUpdate::HistoryRefreshed(_) => "history_refreshed",
            ViewUpdate::AnimalCountsRefreshed(_) => "animal_counts_refreshed",
            ViewUpdate::RecordingSynced { .. } => "recording_synced",
            ViewUpdate::RefreshCompleted { .. } => "refresh_completed",
            ViewUpdate::Notice(_) => "notice",
            ViewUpdate::DismissNotice => "dismiss_notice",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Inline, dismissable message scoped to the action that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}
