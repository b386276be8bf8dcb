//! Pending command tracking.
//!
//! Commands are issued over the request channel but confirmed later over the push
//! channel, so each one is parked here under its kind until a terminal status arrives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// User-issued actions that resolve asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    StartRecording,
    StopRecording,
    AnalyzeFile,
}

impl CommandKind {
    pub fn is_recording(self) -> bool {
        matches!(self, CommandKind::StartRecording | CommandKind::StopRecording)
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandKind::StartRecording => write!(f, "start recording"),
            CommandKind::StopRecording => write!(f, "stop recording"),
            CommandKind::AnalyzeFile => write!(f, "analyze file"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCommand {
    pub kind: CommandKind,
    pub submitted_at: DateTime<Utc>,
    pub status: CommandStatus,
    pub correlation_key: Uuid,
}

impl PendingCommand {
    pub fn new(kind: CommandKind, correlation_key: Uuid, submitted_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            submitted_at,
            status: CommandStatus::Pending,
            correlation_key,
        }
    }
}

/// Outstanding commands keyed by kind, plus the most recently resolved one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorrelationTable {
    outstanding: HashMap<CommandKind, PendingCommand>,
    last_resolved: Option<PendingCommand>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks a command. Returns false if one of the same kind is already outstanding.
    pub fn register(&mut self, command: PendingCommand) -> bool {
        if self.outstanding.contains_key(&command.kind) {
            return false;
        }
        self.outstanding.insert(command.kind, command);
        true
    }

    /// The outstanding start or stop command, if any. At most one exists.
    pub fn recording(&self) -> Option<&PendingCommand> {
        self.outstanding
            .get(&CommandKind::StartRecording)
            .or_else(|| self.outstanding.get(&CommandKind::StopRecording))
    }

    pub fn get(&self, kind: CommandKind) -> Option<&PendingCommand> {
        self.outstanding.get(&kind)
    }

    pub fn find(&self, key: Uuid) -> Option<&PendingCommand> {
        self.outstanding.values().find(|c| c.correlation_key == key)
    }

    /// Resolves whatever command of `kind` is outstanding.
    pub fn resolve_kind(
        &mut self,
        kind: CommandKind,
        status: CommandStatus,
    ) -> Option<PendingCommand> {
        let mut command = self.outstanding.remove(&kind)?;
        command.status = status;
        self.last_resolved = Some(command.clone());
        Some(command)
    }

    /// Resolves the command carrying `key`; a no-op if it already resolved.
    pub fn resolve_key(&mut self, key: Uuid, status: CommandStatus) -> Option<PendingCommand> {
        let kind = self.find(key)?.kind;
        self.resolve_kind(kind, status)
    }

    pub fn outstanding(&self) -> impl Iterator<Item = &PendingCommand> {
        self.outstanding.values()
    }

    pub fn last_resolved(&self) -> Option<&PendingCommand> {
        self.last_resolved.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.outstanding.is_empty()
    }
}
