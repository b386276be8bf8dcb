//! Upload preflight and response interpretation for ad-hoc file analysis.

use super::CommandError;
use crate::backend::UploadResponse;
use crate::detection::{clamp_unit, BestPrediction, FileAnalysis};
use std::path::Path;

/// Audio container formats the detection service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    M4a,
    Ogg,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 5] = [
        AudioFormat::Wav,
        AudioFormat::Mp3,
        AudioFormat::Flac,
        AudioFormat::M4a,
        AudioFormat::Ogg,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Flac => "flac",
            AudioFormat::M4a => "m4a",
            AudioFormat::Ogg => "ogg",
        }
    }

    /// Detects the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self, CommandError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        Self::ALL
            .into_iter()
            .find(|f| f.extension() == ext)
            .ok_or(CommandError::UnsupportedFormat(ext))
    }

    pub fn mime(self, path: &Path) -> String {
        mime_guess::from_path(path)
            .first_raw()
            .map(str::to_string)
            .unwrap_or_else(|| format!("audio/{}", self.extension()))
    }
}

/// Interpret the service's upload response as a terminal analysis outcome.
pub fn interpret_upload(file_name: &str, response: UploadResponse) -> FileAnalysis {
    let failed = |error: String| FileAnalysis::Failed {
        file_name: file_name.to_string(),
        error,
    };

    if !response.success {
        return failed(
            response
                .error
                .unwrap_or_else(|| "analysis failed".to_string()),
        );
    }

    let Some(classification) = response.classification else {
        return failed("response did not include a classification".to_string());
    };
    if !classification.success {
        return failed(
            classification
                .error
                .unwrap_or_else(|| "classification failed".to_string()),
        );
    }

    let Some(best) = classification.best_result else {
        return failed("no model produced a prediction".to_string());
    };
    let Some(prediction) = best.best_prediction else {
        return failed("no model produced a prediction".to_string());
    };

    let probabilities = best
        .best_model
        .as_ref()
        .and_then(|model| best.all_predictions.get(model))
        .and_then(|p| p.probabilities.clone())
        .map(|probs| {
            probs
                .into_iter()
                .map(|(class, p)| (class, clamp_unit(p)))
                .collect()
        });

    FileAnalysis::Completed {
        file_name: response.filename.unwrap_or_else(|| file_name.to_string()),
        processing_time: response.processing_time.unwrap_or(0.0),
        best_prediction: BestPrediction {
            prediction,
            confidence: clamp_unit(best.best_confidence),
            model: best.best_model,
        },
        probabilities,
    }
}
