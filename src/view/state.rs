//! The composite state object read by renderers, and its reducer.

use super::buffer::BoundedBuffer;
use super::config::BufferConfig;
use super::update::{Notice, ViewUpdate};
use crate::channel::ConnectionState;
use crate::commands::{CommandError, CommandKind, CommandStatus, CorrelationTable, PendingCommand};
use crate::detection::{
    AggregateStats, AnimalCount, DetectionEvent, FileAnalysis, LiveChunkResult,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What a successful `apply` did.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// State changed; readers are notified
    Changed,
    /// Nothing to do (stale or duplicate update)
    Unchanged,
    /// A command was registered in the correlation table
    Issued(PendingCommand),
}

impl Applied {
    pub fn changed(&self) -> bool {
        !matches!(self, Applied::Unchanged)
    }
}

/// Everything a renderer needs, in one consistent snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub connection: ConnectionState,
    pub is_recording: bool,
    /// Within `[0, 100]`
    pub live_audio_level: f64,
    /// Latest visualization samples only; never buffered
    pub visualization_frame: Vec<f32>,
    pub live_chunks: BoundedBuffer<LiveChunkResult>,
    pub dashboard_detections: BoundedBuffer<DetectionEvent>,
    pub stats: AggregateStats,
    pub animal_counts: Vec<AnimalCount>,
    pub pending: CorrelationTable,
    pub file_analysis: Option<FileAnalysis>,
    pub is_analyzing: bool,
    pub notice: Option<Notice>,
    pub last_refresh: Option<DateTime<Utc>>,
}

impl ViewState {
    pub fn new(buffers: &BufferConfig) -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            is_recording: false,
            live_audio_level: 0.0,
            visualization_frame: Vec::new(),
            live_chunks: BoundedBuffer::new(buffers.live_capacity),
            dashboard_detections: BoundedBuffer::new(buffers.dashboard_capacity),
            stats: AggregateStats::default(),
            animal_counts: Vec::new(),
            pending: CorrelationTable::new(),
            file_analysis: None,
            is_analyzing: false,
            notice: None,
            last_refresh: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// The outstanding start/stop command, if any.
    pub fn pending_command(&self) -> Option<&PendingCommand> {
        self.pending.recording()
    }

    /// Applies one update. Command-issuing updates enforce their preconditions here, so
    /// the check and the registration happen in the same step.
    pub fn apply(&mut self, update: ViewUpdate) -> Result<Applied, CommandError> {
        let applied = match update {
            ViewUpdate::Connection(connection) => {
                if self.connection == connection {
                    Applied::Unchanged
                } else {
                    self.connection = connection;
                    Applied::Changed
                }
            }
            ViewUpdate::LiveChunk(chunk) => self.apply_live_chunk(chunk),
            ViewUpdate::RecordingStatus { recording, at } => {
                let kind = if recording {
                    CommandKind::StartRecording
                } else {
                    CommandKind::StopRecording
                };
                let resolved = self.pending.resolve_kind(kind, CommandStatus::Confirmed);
                if let Some(command) = &resolved {
                    tracing::debug!(
                        kind = %command.kind,
                        key = %command.correlation_key,
                        latency_ms = (at - command.submitted_at).num_milliseconds(),
                        "Recording command confirmed"
                    );
                }
                let transitioned = self.set_recording(recording);
                if resolved.is_some() || transitioned {
                    Applied::Changed
                } else {
                    Applied::Unchanged
                }
            }
            ViewUpdate::Visualization(frame) => {
                if !self.is_recording {
                    tracing::debug!("Dropping visualization frame outside a recording session");
                    Applied::Unchanged
                } else {
                    self.visualization_frame = frame;
                    Applied::Changed
                }
            }
            ViewUpdate::RecordingRequested {
                correlation_key,
                submitted_at,
            } => {
                if !self.is_connected() {
                    return Err(CommandError::NotReady(
                        "push channel is not connected".to_string(),
                    ));
                }
                if let Some(outstanding) = self.pending.recording() {
                    return Err(CommandError::NotReady(format!(
                        "{} command is still pending",
                        outstanding.kind
                    )));
                }
                let kind = if self.is_recording {
                    CommandKind::StopRecording
                } else {
                    CommandKind::StartRecording
                };
                let command = PendingCommand::new(kind, correlation_key, submitted_at);
                self.pending.register(command.clone());
                Applied::Issued(command)
            }
            ViewUpdate::CommandAcknowledged {
                correlation_key,
                recording,
            } => match recording {
                Some(recording) => {
                    let resolved = self
                        .pending
                        .resolve_key(correlation_key, CommandStatus::Confirmed);
                    let transitioned = self.set_recording(recording);
                    if resolved.is_some() || transitioned {
                        Applied::Changed
                    } else {
                        Applied::Unchanged
                    }
                }
                None => Applied::Unchanged,
            },
            ViewUpdate::CommandFailed {
                correlation_key,
                reason,
            } => match self.pending.resolve_key(correlation_key, CommandStatus::Failed) {
                Some(command) => {
                    self.notice = Some(Notice::error(format!(
                        "Could not {}: {}",
                        command.kind, reason
                    )));
                    Applied::Changed
                }
                None => Applied::Unchanged,
            },
            ViewUpdate::CommandTimedOut { correlation_key } => {
                match self.pending.resolve_key(correlation_key, CommandStatus::Failed) {
                    Some(command) => {
                        self.notice = Some(Notice::warning(format!(
                            "No confirmation received for {} request",
                            command.kind
                        )));
                        Applied::Changed
                    }
                    None => Applied::Unchanged,
                }
            }
            ViewUpdate::AnalysisStarted {
                correlation_key,
                file_name,
                submitted_at,
            } => {
                if self.is_analyzing {
                    return Err(CommandError::Busy);
                }
                let command =
                    PendingCommand::new(CommandKind::AnalyzeFile, correlation_key, submitted_at);
                if !self.pending.register(command.clone()) {
                    return Err(CommandError::Busy);
                }
                tracing::debug!(file = %file_name, "File analysis started");
                self.is_analyzing = true;
                self.file_analysis = None;
                Applied::Issued(command)
            }
            ViewUpdate::AnalysisFinished {
                correlation_key,
                outcome,
            } => {
                let status = if outcome.is_success() {
                    CommandStatus::Confirmed
                } else {
                    CommandStatus::Failed
                };
                self.pending.resolve_key(correlation_key, status);
                self.is_analyzing = false;
                self.file_analysis = Some(outcome);
                Applied::Changed
            }
            ViewUpdate::StatsRefreshed(stats) => {
                self.stats = stats.normalized();
                Applied::Changed
            }
            ViewUpdate::HistoryRefreshed(history) => {
                self.dashboard_detections.replace_with(history);
                Applied::Changed
            }
            ViewUpdate::AnimalCountsRefreshed(counts) => {
                self.animal_counts = counts;
                Applied::Changed
            }
            ViewUpdate::RecordingSynced { recording } => {
                // An outstanding directive means the polled value may already be stale.
                if self.pending.recording().is_some() {
                    return Ok(Applied::Unchanged);
                }
                if self.set_recording(recording) {
                    Applied::Changed
                } else {
                    Applied::Unchanged
                }
            }
            ViewUpdate::RefreshCompleted { at } => {
                self.last_refresh = Some(at);
                Applied::Changed
            }
            ViewUpdate::Notice(notice) => {
                self.notice = Some(notice);
                Applied::Changed
            }
            ViewUpdate::DismissNotice => {
                if self.notice.take().is_some() {
                    Applied::Changed
                } else {
                    Applied::Unchanged
                }
            }
        };
        Ok(applied)
    }

    fn apply_live_chunk(&mut self, chunk: LiveChunkResult) -> Applied {
        let mut fed = false;
        if let Some(best) = chunk.best() {
            // The service persists a result before broadcasting it, so history may hold it already.
            fed = self.dashboard_detections.push_unique_by(best.clone(), |e| e.id);
            if !fed {
                tracing::debug!(id = best.id, "Live detection already in the dashboard feed");
            }
        }
        // Late chunks from a finished session must not repopulate the live feed.
        if !self.is_recording {
            tracing::debug!(
                chunk_timestamp = %chunk.chunk_timestamp,
                "Live chunk arrived outside a recording session"
            );
            return if fed { Applied::Changed } else { Applied::Unchanged };
        }
        self.live_audio_level = chunk.audio_level;
        self.live_chunks.push(chunk);
        Applied::Changed
    }

    /// Moves the recording flag, resetting session-scoped data on either edge.
    /// Returns whether the flag changed.
    fn set_recording(&mut self, recording: bool) -> bool {
        if self.is_recording == recording {
            return false;
        }
        self.is_recording = recording;
        self.live_chunks.clear();
        self.live_audio_level = 0.0;
        self.visualization_frame.clear();
        true
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
