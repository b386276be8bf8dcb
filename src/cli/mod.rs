//! CLI module for the Wildguard monitor
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `watch` - Live monitoring view with interactive commands
//! - `status` - One-shot snapshot of stats, recent detections and animal counts
//! - `record` - Start or stop a live recording session
//! - `analyze` - Upload an audio file for analysis
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Watch a remote station
//! wildguard watch --backend-url http://10.0.0.5:8000
//!
//! # Analyze a clip and print JSON
//! wildguard analyze clip.wav --json
//! ```

pub mod analyze;
pub mod completions;
pub mod config;
pub mod output;
pub mod record;
pub mod setup;
pub mod status;
pub mod watch;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Wildguard - acoustic detection monitor
#[derive(Parser, Debug)]
#[command(
    name = "wildguard",
    version,
    about = "Live monitor for acoustic gunshot and wildlife detection"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch live detections (stdin: r = toggle recording, a <file> = analyze, d = dismiss, q = quit)
    Watch(WatchArgs),
    /// Show detection statistics, recent detections and animal counts
    Status(StatusArgs),
    /// Start or stop live recording
    Record(RecordArgs),
    /// Upload an audio file for analysis
    Analyze(AnalyzeArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by every command that talks to the detection service.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = crate::config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Override the detection service URL
    #[arg(short, long)]
    pub backend_url: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RecordAction {
    Start,
    Stop,
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Whether to start or stop recording
    #[arg(value_enum)]
    pub action: RecordAction,

    /// Seconds to wait for the connection and the confirmation
    #[arg(short, long, default_value = "15")]
    pub wait: u64,

    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Audio file (.wav, .mp3, .flac, .m4a, .ogg)
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "wildguard.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
