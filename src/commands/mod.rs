//! Command correlation.
//!
//! Recording directives are sent over the request channel but confirmed over the push
//! channel. The [`CommandCorrelator`] registers each directive in the view's correlation
//! table before sending it, so the confirmation can resolve it whenever it arrives. File
//! analysis is a single request/response and resolves when the upload returns.

mod analysis;
mod config;
mod error;
mod pending;

pub use analysis::{interpret_upload, AudioFormat};
pub use config::{CommandConfig, DEFAULT_MAX_UPLOAD_BYTES};
pub use error::CommandError;
pub use pending::{CommandKind, CommandStatus, CorrelationTable, PendingCommand};

use crate::backend::{AudioUpload, DetectionBackend};
use crate::detection::FileAnalysis;
use crate::refresh::{RefreshReason, RefreshTrigger};
use crate::view::{Applied, ViewStore, ViewUpdate};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Issues user commands and tracks them until they resolve.
#[derive(Clone)]
pub struct CommandCorrelator {
    backend: Arc<dyn DetectionBackend>,
    store: ViewStore,
    refresh: RefreshTrigger,
    config: CommandConfig,
    cancel_token: CancellationToken,
}

impl CommandCorrelator {
    /// `cancel_token` bounds the lifetime of pending-command timers.
    pub fn new(
        backend: Arc<dyn DetectionBackend>,
        store: ViewStore,
        refresh: RefreshTrigger,
        config: CommandConfig,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            backend,
            store,
            refresh,
            config,
            cancel_token,
        }
    }

    /// Sends whichever recording directive is opposite to the current state.
    ///
    /// Rejected with `NotReady` (and no request sent) while the push channel is down or
    /// another recording command is outstanding. The returned command is still pending:
    /// it resolves when the service's status broadcast arrives. Request failures resolve
    /// it as failed and raise a notice rather than returning an error.
    pub async fn start_or_stop_recording(&self) -> Result<PendingCommand, CommandError> {
        let correlation_key = Uuid::new_v4();
        let applied = self.store.dispatch(ViewUpdate::RecordingRequested {
            correlation_key,
            submitted_at: Utc::now(),
        })?;
        let Applied::Issued(command) = applied else {
            return Err(CommandError::NotReady(
                "recording command was not registered".to_string(),
            ));
        };

        tracing::info!(kind = %command.kind, key = %correlation_key, "Issuing recording command");
        self.arm_timeout(correlation_key);

        let result = if command.kind == CommandKind::StartRecording {
            self.backend.start_recording().await
        } else {
            self.backend.stop_recording().await
        };

        match result {
            Ok(ack) => {
                tracing::debug!(
                    key = %correlation_key,
                    status = ?ack.status,
                    message = ack.message.as_deref().unwrap_or(""),
                    "Recording command acknowledged"
                );
                let _ = self.store.dispatch(ViewUpdate::CommandAcknowledged {
                    correlation_key,
                    recording: ack.settled_state(),
                });
            }
            Err(e) => {
                tracing::warn!(key = %correlation_key, error = %e, "Recording command failed");
                let _ = self.store.dispatch(ViewUpdate::CommandFailed {
                    correlation_key,
                    reason: e.reason(),
                });
            }
        }

        Ok(command)
    }

    /// Uploads one audio file for analysis and waits for the outcome.
    ///
    /// The file is checked locally first; a rejected file never sets `is_analyzing`.
    /// Once started, the upload runs to completion even if the caller stops waiting.
    /// Either outcome triggers exactly one snapshot refresh.
    pub async fn analyze_file(&self, path: &Path) -> Result<FileAnalysis, CommandError> {
        let format = AudioFormat::from_path(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if self.store.read(|s| s.is_analyzing) {
            return Err(CommandError::Busy);
        }

        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| CommandError::Io(format!("{}: {}", path.display(), e)))?
            .len();
        if size == 0 {
            return Err(CommandError::EmptyFile(file_name));
        }
        if size > self.config.max_upload_bytes {
            return Err(CommandError::FileTooLarge {
                size,
                limit: self.config.max_upload_bytes,
            });
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CommandError::Io(format!("{}: {}", path.display(), e)))?;
        if bytes.is_empty() {
            return Err(CommandError::EmptyFile(file_name));
        }

        let correlation_key = Uuid::new_v4();
        self.store.dispatch(ViewUpdate::AnalysisStarted {
            correlation_key,
            file_name: file_name.clone(),
            submitted_at: Utc::now(),
        })?;
        tracing::info!(file = %file_name, size, key = %correlation_key, "Analyzing file");

        let upload = AudioUpload {
            mime: format.mime(path),
            file_name: file_name.clone(),
            bytes,
        };
        let backend = Arc::clone(&self.backend);
        let store = self.store.clone();
        let refresh = self.refresh.clone();

        let task = tokio::spawn(async move {
            let started = Instant::now();
            let outcome = match backend.upload_file(upload).await {
                Ok(response) => interpret_upload(&file_name, response),
                Err(e) => FileAnalysis::Failed {
                    file_name: file_name.clone(),
                    error: e.reason(),
                },
            };
            metrics::histogram!("wildguard_upload_duration_seconds")
                .record(started.elapsed().as_secs_f64());

            match &outcome {
                FileAnalysis::Completed {
                    best_prediction, ..
                } => tracing::info!(
                    file = %file_name,
                    prediction = %best_prediction.prediction,
                    confidence = best_prediction.confidence,
                    "File analysis completed"
                ),
                FileAnalysis::Failed { error, .. } => {
                    tracing::warn!(file = %file_name, error = %error, "File analysis failed")
                }
            }

            let _ = store.dispatch(ViewUpdate::AnalysisFinished {
                correlation_key,
                outcome: outcome.clone(),
            });
            refresh.request(RefreshReason::AnalysisCompleted);
            outcome
        });

        task.await
            .map_err(|e| CommandError::Io(format!("analysis task failed: {}", e)))
    }

    /// Clears the current notice.
    pub fn dismiss_notice(&self) {
        let _ = self.store.dispatch(ViewUpdate::DismissNotice);
    }

    fn arm_timeout(&self, correlation_key: Uuid) {
        let Some(timeout) = self.config.pending_timeout() else {
            return;
        };
        let store = self.store.clone();
        let cancel_token = self.cancel_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel_token.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    if let Ok(Applied::Changed) =
                        store.dispatch(ViewUpdate::CommandTimedOut { correlation_key })
                    {
                        tracing::warn!(key = %correlation_key, "Recording command timed out");
                    }
                }
            }
        });
    }
}
