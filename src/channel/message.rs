//! Push message decoding.
//!
//! Frames are JSON objects tagged by `type`. Known kinds decode into a closed set of
//! variants; anything else becomes [`PushMessage::Unknown`] so a newer service never
//! breaks an older client.

use super::ChannelError;
use crate::detection::{timestamp, LiveChunkResult, LiveResultRecord};
use crate::view::ViewUpdate;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum PushMessage {
    /// Results for one analysed audio window
    LiveDetection(LiveChunkResult),
    /// Recording session started or stopped
    RecordingStatus { recording: bool, at: DateTime<Utc> },
    /// Waveform samples for the level meter
    AudioVisualization(Vec<f32>),
    /// Keepalive reply
    Pong,
    /// Informational message from the service
    Status(String),
    /// Unrecognised `type`
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct LiveDetectionData {
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    chunk_timestamp: Option<DateTime<Utc>>,
    /// Decoded one by one so a single odd result only costs that result
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    audio_level: f64,
}

#[derive(Debug, Deserialize)]
struct RecordingStatusFrame {
    status: String,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VisualizationData {
    Samples { samples: Vec<f32> },
    Bare(Vec<f32>),
}

#[derive(Debug, Default, Deserialize)]
struct StatusFrame {
    #[serde(default)]
    message: Option<String>,
}

impl PushMessage {
    /// Decodes one text frame.
    pub fn decode(text: &str) -> Result<Self, ChannelError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ChannelError::Malformed(e.to_string()))?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ChannelError::Malformed("missing message type".to_string()))?
            .to_string();

        match kind.as_str() {
            "live_detection" => {
                let data: LiveDetectionData = field(&value, "data", &kind)?;
                let chunk_timestamp = data.chunk_timestamp.unwrap_or_else(Utc::now);
                let detections = data
                    .results
                    .into_iter()
                    .filter_map(|item| match serde_json::from_value::<LiveResultRecord>(item) {
                        Ok(record) => Some(record.into_event(chunk_timestamp, data.audio_level)),
                        Err(e) => {
                            tracing::warn!(error = %e, "Skipping unreadable live result");
                            None
                        }
                    })
                    .collect();
                Ok(PushMessage::LiveDetection(LiveChunkResult::new(
                    chunk_timestamp,
                    data.audio_level,
                    detections,
                )))
            }
            "recording_status" => {
                let frame: RecordingStatusFrame = parse(value, &kind)?;
                let recording = match frame.status.as_str() {
                    "started" => true,
                    "stopped" => false,
                    other => {
                        return Err(ChannelError::Malformed(format!(
                            "unknown recording status '{}'",
                            other
                        )))
                    }
                };
                Ok(PushMessage::RecordingStatus {
                    recording,
                    at: frame.timestamp.unwrap_or_else(Utc::now),
                })
            }
            "audio_visualization" => {
                let samples = match field::<VisualizationData>(&value, "data", &kind)? {
                    VisualizationData::Samples { samples } => samples,
                    VisualizationData::Bare(samples) => samples,
                };
                Ok(PushMessage::AudioVisualization(samples))
            }
            "pong" => Ok(PushMessage::Pong),
            "status" => {
                let frame: StatusFrame = parse(value, &kind)?;
                Ok(PushMessage::Status(frame.message.unwrap_or_default()))
            }
            _ => Ok(PushMessage::Unknown(kind)),
        }
    }

    /// Kind label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PushMessage::LiveDetection(_) => "live_detection",
            PushMessage::RecordingStatus { .. } => "recording_status",
            PushMessage::AudioVisualization(_) => "audio_visualization",
            PushMessage::Pong => "pong",
            PushMessage::Status(_) => "status",
            PushMessage::Unknown(_) => "unknown",
        }
    }

    /// The view update this message carries, if any.
    pub fn into_update(self) -> Option<ViewUpdate> {
        match self {
            PushMessage::LiveDetection(chunk) => Some(ViewUpdate::LiveChunk(chunk)),
            PushMessage::RecordingStatus { recording, at } => {
                Some(ViewUpdate::RecordingStatus { recording, at })
            }
            PushMessage::AudioVisualization(samples) => Some(ViewUpdate::Visualization(samples)),
            PushMessage::Pong | PushMessage::Status(_) | PushMessage::Unknown(_) => None,
        }
    }
}

fn parse<T: DeserializeOwned>(value: Value, kind: &str) -> Result<T, ChannelError> {
    serde_json::from_value(value).map_err(|e| ChannelError::Malformed(format!("{}: {}", kind, e)))
}

fn field<T: DeserializeOwned>(value: &Value, name: &str, kind: &str) -> Result<T, ChannelError> {
    let inner = value
        .get(name)
        .cloned()
        .ok_or_else(|| ChannelError::Malformed(format!("{}: missing '{}'", kind, name)))?;
    parse(inner, kind)
}
