//! Output formatting helpers for CLI commands

use crate::channel::ConnectionState;
use crate::commands::CommandStatus;
use crate::detection::{DetectionEvent, DetectionType, FileAnalysis, LiveChunkResult};
use crate::view::{NoticeLevel, ViewState};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// Colored connection badge
pub fn connection_badge(state: ConnectionState) -> String {
    match state {
        ConnectionState::Connected => "● Connected".green().to_string(),
        ConnectionState::Connecting => "● Connecting".yellow().to_string(),
        ConnectionState::Disconnected => "● Disconnected".red().to_string(),
    }
}

fn detection_label(event: &DetectionEvent) -> String {
    if event.is_gunshot_alert() {
        event.predicted_class.red().bold().to_string()
    } else if event.detection_type == DetectionType::Gunshot {
        event.predicted_class.yellow().to_string()
    } else {
        event.predicted_class.green().to_string()
    }
}

fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Format aggregate stats as a table
pub fn format_stats_table(state: &ViewState) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Total", "Gunshot Alerts", "Wildlife Sounds", "Avg Confidence"]);
    table.add_row(vec![
        Cell::new(state.stats.total_detections),
        Cell::new(state.stats.gunshot_alerts),
        Cell::new(state.stats.wildlife_sounds),
        Cell::new(percent(state.stats.average_confidence)),
    ]);
    table.to_string()
}

/// Format detections as a table, newest first
pub fn format_detections_table<'a>(detections: impl Iterator<Item = &'a DetectionEvent>) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Prediction", "Type", "Confidence", "Model", "Origin"]);

    for event in detections {
        table.add_row(vec![
            Cell::new(event.timestamp.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(detection_label(event)),
            Cell::new(event.detection_type),
            Cell::new(percent(event.confidence)),
            Cell::new(&event.model_name),
            Cell::new(if event.live_recording { "live" } else { "upload" }),
        ]);
    }

    table.to_string()
}

/// Format animal counts as a table
pub fn format_counts_table(state: &ViewState) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Animal", "Count", "Last Detected"]);

    for count in &state.animal_counts {
        table.add_row(vec![
            Cell::new(&count.name),
            Cell::new(count.count),
            Cell::new(
                count
                    .last_detected
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }

    table.to_string()
}

/// Format a status snapshot for humans
pub fn format_status(state: &ViewState) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Detection statistics".bold()));
    out.push_str(&format_stats_table(state));
    out.push_str(&format!("\n\n{}\n", "Recent detections".bold()));
    if state.dashboard_detections.is_empty() {
        out.push_str("No detections yet\n");
    } else {
        out.push_str(&format_detections_table(state.dashboard_detections.iter()));
        out.push('\n');
    }
    out.push_str(&format!("\n{}\n", "Animal counts".bold()));
    if state.animal_counts.is_empty() {
        out.push_str("No wildlife detected yet\n");
    } else {
        out.push_str(&format_counts_table(state));
        out.push('\n');
    }
    out.push_str(&format!(
        "\nRecording: {}\n",
        if state.is_recording {
            "active".green().to_string()
        } else {
            "idle".dimmed().to_string()
        }
    ));
    out
}

/// Format a status snapshot as JSON
pub fn format_status_json(state: &ViewState) -> String {
    serde_json::to_string_pretty(&json!({
        "is_recording": state.is_recording,
        "stats": state.stats,
        "recent_detections": state.dashboard_detections,
        "animal_counts": state.animal_counts,
        "last_refresh": state.last_refresh,
    }))
    .unwrap_or_default()
}

/// Format an analysis outcome for humans
pub fn format_analysis(outcome: &FileAnalysis) -> String {
    match outcome {
        FileAnalysis::Completed {
            file_name,
            processing_time,
            best_prediction,
            probabilities,
        } => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["File", "Prediction", "Confidence", "Model", "Time"]);
            table.add_row(vec![
                Cell::new(file_name),
                Cell::new(best_prediction.prediction.bold()),
                Cell::new(percent(best_prediction.confidence)),
                Cell::new(best_prediction.model.as_deref().unwrap_or("-")),
                Cell::new(format!("{:.2}s", processing_time)),
            ]);
            let mut out = table.to_string();

            if let Some(probabilities) = probabilities {
                let mut ranked: Vec<_> = probabilities.iter().collect();
                ranked.sort_by(|a, b| b.1.total_cmp(a.1));
                out.push_str("\nClass probabilities:\n");
                for (class, p) in ranked {
                    out.push_str(&format!("  {:<24} {}\n", class, percent(*p)));
                }
            }
            out
        }
        FileAnalysis::Failed { file_name, error } => {
            format!("{} {}: {}", "✗ Analysis failed".red(), file_name, error)
        }
    }
}

/// Format an analysis outcome as JSON
pub fn format_analysis_json(outcome: &FileAnalysis) -> String {
    serde_json::to_string_pretty(outcome).unwrap_or_default()
}

fn format_live_chunk(chunk: &LiveChunkResult) -> String {
    let best = chunk
        .best()
        .map(|e| format!("{} ({})", detection_label(e), percent(e.confidence)))
        .unwrap_or_else(|| "-".dimmed().to_string());
    format!(
        "  {}  level {:>5.1}  {}",
        chunk.chunk_timestamp.format("%H:%M:%S"),
        chunk.audio_level,
        best
    )
}

fn level_meter(level: f64, width: usize) -> String {
    let filled = ((level / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "#".repeat(filled), " ".repeat(width - filled))
}

/// Render the full live view for `watch`
pub fn render_view(state: &ViewState) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{}   Recording: {}",
        connection_badge(state.connection),
        if state.is_recording {
            "● LIVE".red().bold().to_string()
        } else {
            "idle".dimmed().to_string()
        }
    ));
    if let Some(command) = state.pending_command() {
        out.push_str(&format!("   ({} pending)", command.kind).yellow().to_string());
    }
    out.push('\n');

    if state.is_recording {
        out.push_str(&format!(
            "Level {} {:.1}\n",
            level_meter(state.live_audio_level, 40),
            state.live_audio_level
        ));
        out.push_str(&format!("\n{}\n", "Live chunks".bold()));
        if state.live_chunks.is_empty() {
            out.push_str("  waiting for audio...\n");
        }
        for chunk in state.live_chunks.iter() {
            out.push_str(&format_live_chunk(chunk));
            out.push('\n');
        }
    }

    out.push('\n');
    out.push_str(&format_stats_table(state));
    out.push_str(&format!("\n{}\n", "Recent detections".bold()));
    if state.dashboard_detections.is_empty() {
        out.push_str("No detections yet\n");
    } else {
        out.push_str(&format_detections_table(state.dashboard_detections.iter()));
        out.push('\n');
    }

    if state.is_analyzing {
        out.push_str(&format!("\n{}\n", "Analyzing file...".cyan()));
    } else if let Some(outcome) = &state.file_analysis {
        out.push('\n');
        out.push_str(&format_analysis(outcome));
        out.push('\n');
    }

    if let Some(notice) = &state.notice {
        let line = match notice.level {
            NoticeLevel::Info => notice.message.blue().to_string(),
            NoticeLevel::Warning => notice.message.yellow().to_string(),
            NoticeLevel::Error => notice.message.red().to_string(),
        };
        out.push_str(&format!("\n{}  (d to dismiss)\n", line));
    }

    if let Some(resolved) = state.pending.last_resolved() {
        if resolved.status == CommandStatus::Failed && state.notice.is_none() {
            out.push_str(&format!("\nLast command failed: {}\n", resolved.kind));
        }
    }

    if let Some(at) = state.last_refresh {
        out.push_str(&format!(
            "\n{}\n",
            format!("Last refresh {}", at.format("%H:%M:%S")).dimmed()
        ));
    }
    out.push_str(&"r toggle recording · a <file> analyze · s refresh · d dismiss · q quit".dimmed().to_string());
    out.push('\n');
    out
}
