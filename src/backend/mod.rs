//! Request channel to the detection service.
//!
//! The [`DetectionBackend`] trait covers every request/response call the session makes:
//! recording directives, file uploads and the snapshot queries. [`HttpBackend`] is the
//! production implementation; tests substitute in-memory fakes or point it at a mock
//! server.

use async_trait::async_trait;

mod error;
mod http;
mod types;

pub use error::BackendError;
pub use http::HttpBackend;
pub use types::{
    AckStatus, AudioUpload, BestResult, Classification, ModelPrediction, RecordingAck,
    RecordingStatusResponse, UploadResponse,
};

use crate::detection::{AggregateStats, AnimalCount, DetectionEvent};

/// Request/response interface of the detection service.
///
/// # Object Safety
///
/// Used as `Arc<dyn DetectionBackend>`; async methods go through `async_trait`.
#[async_trait]
pub trait DetectionBackend: Send + Sync + 'static {
    /// `POST /live-recording/start`
    async fn start_recording(&self) -> Result<RecordingAck, BackendError>;

    /// `POST /live-recording/stop`
    async fn stop_recording(&self) -> Result<RecordingAck, BackendError>;

    /// `GET /live-recording/status`
    async fn recording_status(&self) -> Result<RecordingStatusResponse, BackendError>;

    /// `POST /upload/single` with the file as the multipart `file` field.
    ///
    /// A returned response may still describe a failed analysis (`success: false`).
    async fn upload_file(&self, upload: AudioUpload) -> Result<UploadResponse, BackendError>;

    /// `GET /detections/stats`
    async fn stats_summary(&self) -> Result<AggregateStats, BackendError>;

    /// `GET /detections/recent?limit=N`, newest first.
    async fn recent_detections(&self, limit: usize) -> Result<Vec<DetectionEvent>, BackendError>;

    /// `GET /wildlife/counts`
    async fn animal_counts(&self) -> Result<Vec<AnimalCount>, BackendError>;
}
