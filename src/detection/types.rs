use super::{clamp_level, clamp_unit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a detection entered the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    /// Pushed by the backend while a live recording session runs
    Live,
    /// Produced by an uploaded file analysis
    Upload,
    /// Pulled from the backend's detection history
    History,
}

/// Which classifier family produced a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionType {
    Gunshot,
    Wildlife,
}

impl DetectionType {
    /// Best-effort classification from a class label when the payload omits the type.
    pub fn infer(predicted_class: &str) -> Self {
        if predicted_class.to_ascii_lowercase().contains("gunshot") {
            DetectionType::Gunshot
        } else {
            DetectionType::Wildlife
        }
    }

    /// Maps a classifier tag such as `gunshot` or `wildlife_ESC-50` onto its family.
    pub fn from_model_type(model_type: &str) -> Option<Self> {
        let tag = model_type.trim().to_ascii_lowercase();
        if tag.starts_with("gunshot") {
            Some(DetectionType::Gunshot)
        } else if tag.starts_with("wildlife") {
            Some(DetectionType::Wildlife)
        } else {
            None
        }
    }
}

impl std::fmt::Display for DetectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionType::Gunshot => write!(f, "gunshot"),
            DetectionType::Wildlife => write!(f, "wildlife"),
        }
    }
}

/// A single classification result. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub id: u64,
    pub source: DetectionSource,
    pub timestamp: DateTime<Utc>,
    pub predicted_class: String,
    /// Always within `[0, 1]`
    pub confidence: f64,
    pub model_name: String,
    pub detection_type: DetectionType,
    /// Per-class probabilities, each within `[0, 1]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<BTreeMap<String, f64>>,
    /// Input level at detection time, within `[0, 100]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_level: Option<f64>,
    /// Captured by a live recording session rather than an uploaded file
    #[serde(default)]
    pub live_recording: bool,
}

impl DetectionEvent {
    pub fn new(
        id: u64,
        source: DetectionSource,
        timestamp: DateTime<Utc>,
        predicted_class: impl Into<String>,
        confidence: f64,
        model_name: impl Into<String>,
        detection_type: DetectionType,
    ) -> Self {
        Self {
            id,
            source,
            timestamp,
            predicted_class: predicted_class.into(),
            confidence: clamp_unit(confidence),
            model_name: model_name.into(),
            detection_type,
            probabilities: None,
            audio_level: None,
            live_recording: source == DetectionSource::Live,
        }
    }

    pub fn with_probabilities(mut self, probabilities: BTreeMap<String, f64>) -> Self {
        self.probabilities = Some(
            probabilities
                .into_iter()
                .map(|(class, p)| (class, clamp_unit(p)))
                .collect(),
        );
        self
    }

    pub fn with_live_recording(mut self, live_recording: bool) -> Self {
        self.live_recording = live_recording;
        self
    }

    pub fn with_audio_level(mut self, level: f64) -> Self {
        self.audio_level = Some(clamp_level(level));
        self
    }

    /// A gunshot-family detection whose winning class is the gunshot class itself.
    pub fn is_gunshot_alert(&self) -> bool {
        self.detection_type == DetectionType::Gunshot
            && self.predicted_class.eq_ignore_ascii_case("gunshot")
    }
}

/// One analysed audio window from a live recording session.
///
/// Stored as a single buffer entry rather than one entry per model result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveChunkResult {
    pub chunk_timestamp: DateTime<Utc>,
    /// Within `[0, 100]`
    pub audio_level: f64,
    pub detections: Vec<DetectionEvent>,
}

impl LiveChunkResult {
    pub fn new(
        chunk_timestamp: DateTime<Utc>,
        audio_level: f64,
        detections: Vec<DetectionEvent>,
    ) -> Self {
        Self {
            chunk_timestamp,
            audio_level: clamp_level(audio_level),
            detections,
        }
    }

    /// The highest-confidence result in the chunk.
    pub fn best(&self) -> Option<&DetectionEvent> {
        self.detections
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
    }
}

/// Aggregate counters as reported by the backend. Replaced wholesale per snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateStats {
    pub total_detections: u64,
    pub gunshot_alerts: u64,
    pub wildlife_sounds: u64,
    /// Within `[0, 1]`
    #[serde(alias = "avg_confidence")]
    pub average_confidence: f64,
}

impl AggregateStats {
    /// Copy with `average_confidence` clamped into range.
    pub fn normalized(mut self) -> Self {
        self.average_confidence = clamp_unit(self.average_confidence);
        self
    }
}

/// Per-class wildlife count. Replaced wholesale per snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalCount {
    pub name: String,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_detected: Option<DateTime<Utc>>,
}

/// Winning prediction across every model that ran on an uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestPrediction {
    pub prediction: String,
    /// Within `[0, 1]`
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Terminal outcome of an ad-hoc file analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileAnalysis {
    Completed {
        file_name: String,
        /// Seconds spent by the backend
        processing_time: f64,
        best_prediction: BestPrediction,
        #[serde(skip_serializing_if = "Option::is_none")]
        probabilities: Option<BTreeMap<String, f64>>,
    },
    Failed {
        file_name: String,
        error: String,
    },
}

impl FileAnalysis {
    pub fn file_name(&self) -> &str {
        match self {
            FileAnalysis::Completed { file_name, .. } | FileAnalysis::Failed { file_name, .. } => {
                file_name
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileAnalysis::Completed { .. })
    }
}
