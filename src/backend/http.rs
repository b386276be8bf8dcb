//! HTTP implementation of the request channel.

use super::types::{CountsEnvelope, RecentEnvelope, StatsEnvelope};
use super::{
    AudioUpload, BackendError, DetectionBackend, RecordingAck, RecordingStatusResponse,
    UploadResponse,
};
use crate::config::BackendConfig;
use crate::detection::{AggregateStats, AnimalCount, DetectionEvent};
use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// `reqwest`-backed client for the detection service.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    request_timeout: u64,
    upload_timeout: u64,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            request_timeout: config.request_timeout_seconds,
            upload_timeout: config.upload_timeout_seconds,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self
            .client
            .get(self.url(path))
            .timeout(Duration::from_secs(self.request_timeout))
            .send()
            .await
            .map_err(|e| classify_error(e, self.request_timeout))?;
        decode(response, self.request_timeout).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self
            .client
            .post(self.url(path))
            .timeout(Duration::from_secs(self.request_timeout))
            .send()
            .await
            .map_err(|e| classify_error(e, self.request_timeout))?;
        decode(response, self.request_timeout).await
    }
}

#[async_trait]
impl DetectionBackend for HttpBackend {
    async fn start_recording(&self) -> Result<RecordingAck, BackendError> {
        self.post_json("/live-recording/start").await
    }

    async fn stop_recording(&self) -> Result<RecordingAck, BackendError> {
        self.post_json("/live-recording/stop").await
    }

    async fn recording_status(&self) -> Result<RecordingStatusResponse, BackendError> {
        self.get_json("/live-recording/status").await
    }

    async fn upload_file(&self, upload: AudioUpload) -> Result<UploadResponse, BackendError> {
        let size = upload.bytes.len();
        let part = multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime)
            .map_err(|e| BackendError::Parse(format!("invalid MIME type: {}", e)))?;
        let form = multipart::Form::new().part("file", part);

        tracing::debug!(file = %upload.file_name, size, "Uploading file for analysis");

        let response = self
            .client
            .post(self.url("/upload/single"))
            .timeout(Duration::from_secs(self.upload_timeout))
            .multipart(form)
            .send()
            .await
            .map_err(|e| classify_error(e, self.upload_timeout))?;
        decode(response, self.upload_timeout).await
    }

    async fn stats_summary(&self) -> Result<AggregateStats, BackendError> {
        let envelope: StatsEnvelope = self.get_json("/detections/stats").await?;
        Ok(envelope.stats.normalized())
    }

    async fn recent_detections(&self, limit: usize) -> Result<Vec<DetectionEvent>, BackendError> {
        let envelope: RecentEnvelope = self
            .get_json(&format!("/detections/recent?limit={}", limit))
            .await?;
        Ok(envelope
            .detections
            .into_iter()
            .map(DetectionEvent::from)
            .collect())
    }

    async fn animal_counts(&self) -> Result<Vec<AnimalCount>, BackendError> {
        let envelope: CountsEnvelope = self.get_json("/wildlife/counts").await?;
        Ok(envelope
            .animal_counts
            .into_iter()
            .map(AnimalCount::from)
            .collect())
    }
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    timeout_seconds: u64,
) -> Result<T, BackendError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| classify_error(e, timeout_seconds))?;

    if !status.is_success() {
        return Err(BackendError::Http {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))
}

fn classify_error(e: reqwest::Error, timeout_seconds: u64) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout(timeout_seconds)
    } else {
        BackendError::ConnectionFailed(e.to_string())
    }
}
