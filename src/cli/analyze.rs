//! Analyze command implementation

use crate::cli::output::{format_analysis, format_analysis_json};
use crate::cli::setup::load_config_with_overrides;
use crate::cli::AnalyzeArgs;
use crate::detection::FileAnalysis;
use crate::session::MonitoringSession;

/// Handle `wildguard analyze <file>` command
pub async fn handle_analyze(args: &AnalyzeArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args.session)?;
    let session = MonitoringSession::from_config(config)?;

    let outcome = session.analyze_file(&args.file).await?;

    if args.json {
        return Ok(format_analysis_json(&outcome));
    }
    match outcome {
        FileAnalysis::Completed { .. } => Ok(format_analysis(&outcome)),
        FileAnalysis::Failed { file_name, error } => {
            Err(format!("Analysis of {} failed: {}", file_name, error).into())
        }
    }
}
