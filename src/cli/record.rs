//! Record command implementation

use crate::cli::setup::load_config_with_overrides;
use crate::cli::{RecordAction, RecordArgs};
use crate::commands::{CommandKind, CommandStatus};
use crate::session::MonitoringSession;
use colored::Colorize;
use std::time::Duration;

/// Handle `wildguard record start|stop` command
pub async fn handle_record(args: &RecordArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args.session)?;
    let session = MonitoringSession::from_config(config)?;

    session.activate();
    let result = record(&session, args.action, Duration::from_secs(args.wait)).await;
    session.deactivate().await;
    result
}

/// Drives one recording directive to a terminal status on an active session.
pub async fn record(
    session: &MonitoringSession,
    action: RecordAction,
    wait: Duration,
) -> Result<String, Box<dyn std::error::Error>> {
    let want_recording = action == RecordAction::Start;
    let mut view = session.view();

    tokio::time::timeout(wait, view.wait_for(|s| s.is_connected()))
        .await
        .map_err(|_| format!("Push channel did not connect within {}s", wait.as_secs()))??;

    // Directives toggle, so the current flag has to be known first.
    let report = session.refresh_now().await;
    if !report.is_complete() {
        tracing::debug!(failed = report.failed.len(), "Pre-command refresh incomplete");
    }
    if session.snapshot().is_recording == want_recording {
        return Ok(if want_recording {
            "Recording is already active".to_string()
        } else {
            "Recording is not active".to_string()
        });
    }

    let command = session.start_or_stop_recording().await?;
    let expected = if want_recording {
        CommandKind::StartRecording
    } else {
        CommandKind::StopRecording
    };
    if command.kind != expected {
        tracing::warn!(kind = %command.kind, "Recording state changed before the command was sent");
    }

    let key = command.correlation_key;
    let resolved = tokio::time::timeout(wait, view.wait_for(|s| s.pending.find(key).is_none()))
        .await
        .map_err(|_| format!("No confirmation received within {}s", wait.as_secs()))??
        .clone();

    match resolved.pending.last_resolved() {
        Some(last) if last.correlation_key == key && last.status == CommandStatus::Confirmed => {
            let verb = if resolved.is_recording {
                "started"
            } else {
                "stopped"
            };
            Ok(format!("{} Recording {}", "✓".green(), verb))
        }
        _ => {
            let reason = resolved
                .notice
                .map(|n| n.message)
                .unwrap_or_else(|| format!("{} failed", command.kind));
            Err(reason.into())
        }
    }
}
