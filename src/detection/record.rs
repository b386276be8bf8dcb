//! Wire shapes returned by the detection service and their conversion into domain types.

use super::{next_local_id, timestamp, AnimalCount, DetectionEvent, DetectionSource, DetectionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// A persisted detection row as returned by `GET /detections/recent`.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionRecord {
    pub id: u64,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "prediction_label", alias = "predictionLabel")]
    pub prediction: String,
    pub detection_type: DetectionType,
    pub model_name: String,
    pub confidence: f64,
    /// Either a JSON object or a JSON-encoded string of one
    #[serde(default, deserialize_with = "deserialize_probabilities")]
    pub probabilities: Option<BTreeMap<String, f64>>,
    /// SQLite hands booleans back as 0/1
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_live_recording: bool,
}

impl From<DetectionRecord> for DetectionEvent {
    fn from(record: DetectionRecord) -> Self {
        let event = DetectionEvent::new(
            record.id,
            DetectionSource::History,
            record.timestamp,
            record.prediction,
            record.confidence,
            record.model_name,
            record.detection_type,
        )
        .with_live_recording(record.is_live_recording);
        match record.probabilities {
            Some(probabilities) => event.with_probabilities(probabilities),
            None => event,
        }
    }
}

/// One model result inside a `live_detection` push message.
#[derive(Debug, Clone, Deserialize)]
pub struct LiveResultRecord {
    #[serde(default)]
    pub detection_id: Option<u64>,
    pub prediction: String,
    pub confidence: f64,
    #[serde(default, deserialize_with = "deserialize_probabilities")]
    pub probabilities: Option<BTreeMap<String, f64>>,
    /// Classifier tag, e.g. `gunshot` or `wildlife_iNaturalist`
    #[serde(default, alias = "detection_type")]
    pub model_type: Option<String>,
    #[serde(default, alias = "model")]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl LiveResultRecord {
    /// Convert into a live detection, falling back to the chunk's timestamp and level.
    pub fn into_event(self, chunk_timestamp: DateTime<Utc>, audio_level: f64) -> DetectionEvent {
        let detection_type = self
            .model_type
            .as_deref()
            .and_then(DetectionType::from_model_type)
            .unwrap_or_else(|| DetectionType::infer(&self.prediction));
        let event = DetectionEvent::new(
            self.detection_id.unwrap_or_else(next_local_id),
            DetectionSource::Live,
            self.timestamp.unwrap_or(chunk_timestamp),
            self.prediction,
            self.confidence,
            self.model_name.unwrap_or_else(|| "unknown".to_string()),
            detection_type,
        )
        .with_audio_level(audio_level);
        match self.probabilities {
            Some(probabilities) => event.with_probabilities(probabilities),
            None => event,
        }
    }
}

/// A row from `GET /wildlife/counts`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnimalCountRecord {
    #[serde(alias = "name")]
    pub animal_name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub last_detected: Option<DateTime<Utc>>,
}

impl From<AnimalCountRecord> for AnimalCount {
    fn from(record: AnimalCountRecord) -> Self {
        Self {
            name: record.animal_name,
            count: record.count,
            last_detected: record.last_detected,
        }
    }
}

fn deserialize_probabilities<'de, D>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(encoded)) if encoded.is_empty() => Ok(None),
        Some(serde_json::Value::String(encoded)) => serde_json::from_str(&encoded)
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(other) => serde_json::from_value(other)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(serde_json::Value::String(s)) => matches!(s.as_str(), "1" | "true" | "True"),
        _ => false,
    })
}
