//! Error types for user-issued commands.

use thiserror::Error;

/// Synchronous command rejections. None of these reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Push channel down, or a recording command is already outstanding
    #[error("not ready: {0}")]
    NotReady(String),

    /// A file analysis is already in flight
    #[error("busy: a file analysis is already in progress")]
    Busy,

    #[error("unsupported audio format '{0}' (allowed: .wav, .mp3, .flac, .m4a, .ogg)")]
    UnsupportedFormat(String),

    #[error("file is empty: {0}")]
    EmptyFile(String),

    #[error("file too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("failed to read file: {0}")]
    Io(String),
}
