//! Error types for the request channel.

use thiserror::Error;

/// Errors from a single request to the detection service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Request timeout
    #[error("request timeout after {0}s")]
    Timeout(u64),

    /// Connection failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Non-success status code
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("invalid response: {0}")]
    Parse(String),
}

impl BackendError {
    /// Transient failures are expected while the service restarts.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BackendError::Timeout(_) | BackendError::ConnectionFailed(_)
        )
    }

    /// Short human-readable reason for notices.
    pub fn reason(&self) -> String {
        match self {
            BackendError::Http { status, body } => {
                let detail = detail_from_body(body);
                if detail.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    format!("HTTP {}: {}", status, detail)
                }
            }
            other => other.to_string(),
        }
    }
}

/// The service wraps error messages as `{"detail": "..."}`; fall back to the raw body.
fn detail_from_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
