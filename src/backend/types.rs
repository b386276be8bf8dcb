//! Wire types for the detection service's HTTP interface.

use crate::detection::{AggregateStats, AnimalCountRecord, DetectionRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status reported when a recording directive is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AckStatus {
    Started,
    Stopped,
    AlreadyRecording,
    NotRecording,
    Other(String),
}

impl From<String> for AckStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "started" => AckStatus::Started,
            "stopped" => AckStatus::Stopped,
            "already_recording" => AckStatus::AlreadyRecording,
            "not_recording" => AckStatus::NotRecording,
            _ => AckStatus::Other(s),
        }
    }
}

impl From<AckStatus> for String {
    fn from(status: AckStatus) -> Self {
        match status {
            AckStatus::Started => "started".to_string(),
            AckStatus::Stopped => "stopped".to_string(),
            AckStatus::AlreadyRecording => "already_recording".to_string(),
            AckStatus::NotRecording => "not_recording".to_string(),
            AckStatus::Other(s) => s,
        }
    }
}

/// Response to `POST /live-recording/start` and `/stop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingAck {
    pub status: AckStatus,
    #[serde(default)]
    pub message: Option<String>,
}

impl RecordingAck {
    /// Recording state the service reports without broadcasting a status change.
    ///
    /// `already_recording` and `not_recording` mean the directive was a no-op, so no
    /// push confirmation will follow.
    pub fn settled_state(&self) -> Option<bool> {
        match self.status {
            AckStatus::AlreadyRecording => Some(true),
            AckStatus::NotRecording => Some(false),
            _ => None,
        }
    }
}

/// Response to `GET /live-recording/status`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordingStatusResponse {
    pub is_recording: bool,
    #[serde(default)]
    pub current_audio_level: Option<f64>,
    #[serde(default)]
    pub connected_clients: Option<u32>,
}

/// A file ready to be uploaded for analysis.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Response to `POST /upload/single`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub filename: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub classification: Option<Classification>,
    #[serde(default)]
    pub processing_time: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Classification {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub best_result: Option<BestResult>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BestResult {
    #[serde(default)]
    pub best_prediction: Option<String>,
    #[serde(default)]
    pub best_confidence: f64,
    #[serde(default)]
    pub best_model: Option<String>,
    #[serde(default)]
    pub all_predictions: BTreeMap<String, ModelPrediction>,
}

/// One model's verdict on an uploaded file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelPrediction {
    #[serde(default)]
    pub prediction: Option<String>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub probabilities: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StatsEnvelope {
    pub stats: AggregateStats,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RecentEnvelope {
    pub detections: Vec<DetectionRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CountsEnvelope {
    pub animal_counts: Vec<AnimalCountRecord>,
}
