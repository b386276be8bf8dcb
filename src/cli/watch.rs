//! Watch command implementation
//!
//! Redraws the live view on every state change and reads one-letter commands from
//! stdin. Commands run as background tasks so the view keeps updating while they wait
//! for confirmation.

use crate::cli::output::render_view;
use crate::cli::setup::load_config_with_overrides;
use crate::cli::WatchArgs;
use crate::session::MonitoringSession;
use crate::view::{Notice, ViewState};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// A line typed into the watch view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    ToggleRecording,
    Analyze(PathBuf),
    Dismiss,
    Refresh,
    Quit,
}

/// Parses one input line. Blank lines are `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<WatchCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb {
        "r" | "record" => WatchCommand::ToggleRecording,
        "a" | "analyze" => {
            if rest.is_empty() {
                return Err("Usage: a <file>".to_string());
            }
            WatchCommand::Analyze(PathBuf::from(rest))
        }
        "d" | "dismiss" => WatchCommand::Dismiss,
        "s" | "refresh" => WatchCommand::Refresh,
        "q" | "quit" | "exit" => WatchCommand::Quit,
        other => return Err(format!("Unknown command '{}'", other)),
    };
    Ok(Some(command))
}

fn redraw(state: &ViewState) {
    let mut stdout = std::io::stdout().lock();
    let _ = write!(stdout, "\x1B[2J\x1B[H{}", render_view(state));
    let _ = stdout.flush();
}

fn run_command(session: &Arc<MonitoringSession>, command: WatchCommand) {
    match command {
        WatchCommand::ToggleRecording => {
            let session = Arc::clone(session);
            tokio::spawn(async move {
                if let Err(e) = session.start_or_stop_recording().await {
                    session.notify(Notice::warning(e.to_string()));
                }
            });
        }
        WatchCommand::Analyze(path) => {
            let session = Arc::clone(session);
            tokio::spawn(async move {
                if let Err(e) = session.analyze_file(&path).await {
                    session.notify(Notice::warning(e.to_string()));
                }
            });
        }
        WatchCommand::Dismiss => session.dismiss_notice(),
        WatchCommand::Refresh => session.request_refresh(),
        WatchCommand::Quit => {}
    }
}

/// Handle `wildguard watch` command
pub async fn handle_watch(args: &WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args.session)?;
    let session = Arc::new(MonitoringSession::from_config(config)?);

    session.activate();
    let mut view = session.view();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    redraw(&view.borrow_and_update());

    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = view.borrow_and_update().clone();
                redraw(&state);
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_command(&line) {
                    Ok(Some(WatchCommand::Quit)) => break,
                    Ok(Some(command)) => run_command(&session, command),
                    Ok(None) => {}
                    Err(message) => session.notify(Notice::info(message)),
                },
                Ok(None) => {
                    tracing::debug!("stdin closed; watching until interrupted");
                    stdin_open = false;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read stdin");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.deactivate().await;
    Ok(())
}
