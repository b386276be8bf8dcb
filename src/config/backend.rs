//! Detection service endpoint configuration

use serde::{Deserialize, Serialize};

/// Where the detection service lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the HTTP interface
    pub url: String,
    /// Push channel base URL. Derived from `url` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,
    /// Timeout for commands and snapshot queries
    pub request_timeout_seconds: u64,
    /// Timeout for file uploads, which include server-side analysis
    pub upload_timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            ws_url: None,
            request_timeout_seconds: 10,
            upload_timeout_seconds: 120,
        }
    }
}

impl BackendConfig {
    /// `url` without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Full push channel endpoint, `{ws_base}/ws`.
    pub fn ws_endpoint(&self) -> String {
        let base = match &self.ws_url {
            Some(ws) => ws.trim_end_matches('/').to_string(),
            None => {
                let base = self.base_url();
                if let Some(rest) = base.strip_prefix("https://") {
                    format!("wss://{}", rest)
                } else if let Some(rest) = base.strip_prefix("http://") {
                    format!("ws://{}", rest)
                } else {
                    base.to_string()
                }
            }
        };
        format!("{}/ws", base)
    }
}
