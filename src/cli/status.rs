//! Status command implementation

use crate::cli::output::{format_status, format_status_json};
use crate::cli::setup::load_config_with_overrides;
use crate::cli::StatusArgs;
use crate::refresh::RefreshSlice;
use crate::session::MonitoringSession;

/// Handle `wildguard status` command
pub async fn handle_status(args: &StatusArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args.session)?;
    let session = MonitoringSession::from_config(config)?;
    status_report(&session, args.json).await
}

/// One refresh round against the service, rendered for the terminal.
///
/// Partial failures still print what was fetched; a round where nothing succeeded is
/// an error.
pub async fn status_report(
    session: &MonitoringSession,
    json: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let report = session.refresh_now().await;

    if report.updated.is_empty() {
        let reason = report
            .failed
            .first()
            .map(|(_, e)| e.to_string())
            .unwrap_or_else(|| "no data returned".to_string());
        return Err(format!(
            "Detection service unavailable at {}: {}",
            session.config().backend.base_url(),
            reason
        )
        .into());
    }

    for (slice, error) in &report.failed {
        tracing::warn!(slice = %slice, error = %error, "Status slice unavailable");
    }

    let state = session.snapshot();
    if json {
        return Ok(format_status_json(&state));
    }

    let mut output = format_status(&state);
    let missing: Vec<&str> = report
        .failed
        .iter()
        .map(|(slice, _)| slice.as_str())
        .collect();
    if !missing.is_empty() {
        output.push_str(&format!("\nUnavailable: {}\n", missing.join(", ")));
    }
    if !report.updated(RefreshSlice::Stats) {
        output.push_str("Statistics are stale\n");
    }
    Ok(output)
}
