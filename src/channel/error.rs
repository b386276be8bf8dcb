//! Error types for the push channel.

use thiserror::Error;

/// Push channel failures. None of these are fatal; the manager reconnects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// Could not open the channel
    #[error("connection failed: {0}")]
    Connect(String),

    /// Opening the channel took longer than the connect timeout
    #[error("connect timeout after {0}s")]
    Timeout(u64),

    /// Read error on an open channel
    #[error("transport error: {0}")]
    Transport(String),

    /// Frame could not be decoded
    #[error("malformed message: {0}")]
    Malformed(String),
}
