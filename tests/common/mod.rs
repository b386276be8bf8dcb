//! Shared test utilities for Wildguard integration tests.
//!
//! Provides a wiremock detection service with canned snapshot responses and a push
//! connector whose frames are fed by the test.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use wildguard::backend::HttpBackend;
use wildguard::channel::{ChannelError, PushConnector, PushStream};
use wildguard::config::MonitorConfig;
use wildguard::{MonitoringSession, ViewState};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Canned service responses
// =============================================================================

pub fn stats_body() -> serde_json::Value {
    json!({
        "stats": {
            "total_detections": 12,
            "gunshot_alerts": 2,
            "wildlife_sounds": 10,
            "avg_confidence": 0.81
        }
    })
}

pub fn recent_body() -> serde_json::Value {
    json!({
        "detections": [
            {
                "id": 7,
                "timestamp": "2026-10-14 06:12:03",
                "prediction": "Gunshot",
                "detection_type": "gunshot",
                "model_name": "rf_gunshot",
                "confidence": 0.93,
                "probabilities": "{\"Gunshot\": 0.93, \"Quiet/Silent\": 0.07}",
                "is_live_recording": 1
            },
            {
                "id": 6,
                "timestamp": "2026-10-14 06:10:41",
                "prediction": "Elephant",
                "detection_type": "wildlife",
                "model_name": "xgboost_esc50",
                "confidence": 0.71,
                "is_live_recording": 0
            }
        ]
    })
}

pub fn counts_body() -> serde_json::Value {
    json!({
        "animal_counts": [
            {"animal_name": "Elephant", "count": 4, "last_detected": "2026-10-14 06:10:41"},
            {"animal_name": "Crow", "count": 1}
        ]
    })
}

pub fn recording_body(is_recording: bool) -> serde_json::Value {
    json!({"is_recording": is_recording, "current_audio_level": 0.0, "connected_clients": 1})
}

/// Mounts every snapshot endpoint with healthy responses.
pub async fn mount_snapshot_endpoints(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/detections/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_body()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/detections/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(recent_body()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wildlife/counts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(counts_body()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/live-recording/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(recording_body(false)))
        .mount(server)
        .await;
}

/// Config pointing at `server`, with a long refresh interval so only explicit
/// refreshes hit the service.
pub fn config_for(server: &MockServer) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.backend.url = server.uri();
    config.backend.request_timeout_seconds = 2;
    config.refresh.interval_seconds = 3600;
    config.reconnect.delay_ms = 50;
    config
}

// =============================================================================
// Push channel
// =============================================================================

/// Push connector whose channels are opened by the test.
///
/// Every `connect` takes the next queued receiver; when none is queued the attempt
/// fails like a refused connection.
#[derive(Default)]
pub struct FeedConnector {
    pending: Mutex<Vec<mpsc::UnboundedReceiver<String>>>,
    connects: Mutex<u32>,
}

impl FeedConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues one channel; frames sent on the returned sender arrive in order, and
    /// dropping it closes the channel.
    pub fn open_channel(&self) -> mpsc::UnboundedSender<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.pending.lock().unwrap().insert(0, rx);
        tx
    }

    pub fn connects(&self) -> u32 {
        *self.connects.lock().unwrap()
    }
}

#[async_trait]
impl PushConnector for FeedConnector {
    async fn connect(&self) -> Result<PushStream, ChannelError> {
        *self.connects.lock().unwrap() += 1;
        let next = self.pending.lock().unwrap().pop();
        match next {
            Some(rx) => Ok(futures::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|frame| (Ok(frame), rx))
            })
            .boxed()),
            None => Err(ChannelError::Connect("connection refused".to_string())),
        }
    }
}

/// Session against a wiremock service and a test-fed push channel.
pub fn session_for(server: &MockServer, connector: Arc<FeedConnector>) -> MonitoringSession {
    let config = config_for(server);
    let backend = Arc::new(HttpBackend::new(&config.backend).unwrap());
    MonitoringSession::new(config, backend, connector)
}

pub fn live_frame(chunk_ts: f64, prediction: &str, confidence: f64, level: f64) -> String {
    json!({
        "type": "live_detection",
        "data": {
            "chunk_timestamp": chunk_ts,
            "audio_level": level,
            "results": [
                {"prediction": prediction, "confidence": confidence, "model_name": "rf_wildlife",
                 "model_type": "wildlife_ESC-50"}
            ]
        }
    })
    .to_string()
}

pub fn status_frame(status: &str) -> String {
    json!({"type": "recording_status", "status": status}).to_string()
}

// =============================================================================
// Waiting
// =============================================================================

/// Waits until `predicate` holds for the published view, or panics after five seconds.
pub async fn wait_for_view(
    view: &mut watch::Receiver<ViewState>,
    what: &str,
    predicate: impl FnMut(&ViewState) -> bool,
) -> ViewState {
    match tokio::time::timeout(Duration::from_secs(5), view.wait_for(predicate)).await {
        Ok(Ok(state)) => state.clone(),
        Ok(Err(_)) => panic!("view store dropped while waiting for {}", what),
        Err(_) => panic!("timed out waiting for {}", what),
    }
}
