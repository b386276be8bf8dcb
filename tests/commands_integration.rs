//! Recording directives and file analysis through a full monitoring session.

mod common;

use common::*;
use serde_json::json;
use std::time::Duration;
use wildguard::commands::{CommandError, CommandKind, CommandStatus};
use wildguard::detection::FileAnalysis;
use wildguard::view::NoticeLevel;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn upload_body() -> serde_json::Value {
    json!({
        "filename": "clip.wav",
        "success": true,
        "processing_time": 0.42,
        "classification": {
            "success": true,
            "best_result": {
                "best_prediction": "Gunshot",
                "best_confidence": 0.91,
                "best_model": "rf_gunshot",
                "all_predictions": {
                    "rf_gunshot": {
                        "prediction": "Gunshot",
                        "confidence": 0.91,
                        "probabilities": {"Gunshot": 0.91, "Quiet/Silent": 0.09}
                    },
                    "xgboost_esc50": {"prediction": "Crow", "confidence": 0.4}
                }
            }
        }
    })
}

async fn stats_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/detections/stats")
        .count()
}

fn write_clip(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"RIFF\x24\x00\x00\x00WAVEfmt ").unwrap();
    path
}

#[tokio::test]
async fn test_upload_resolves_and_triggers_one_refresh() {
    let server = MockServer::start().await;
    mount_snapshot_endpoints(&server).await;
    Mock::given(method("POST"))
        .and(path("/upload/single"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upload_body()))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server, FeedConnector::new());
    let mut view = session.view();
    session.activate();
    let activated = wait_for_view(&mut view, "activation refresh", |s| {
        s.last_refresh.is_some()
    })
    .await;
    let stats_before = stats_requests(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let outcome = session.analyze_file(&write_clip(&dir, "clip.wav")).await.unwrap();

    match &outcome {
        FileAnalysis::Completed {
            best_prediction,
            probabilities,
            processing_time,
            ..
        } => {
            assert_eq!(best_prediction.prediction, "Gunshot");
            assert_eq!(best_prediction.model.as_deref(), Some("rf_gunshot"));
            assert_eq!(*processing_time, 0.42);
            assert_eq!(probabilities.as_ref().unwrap()["Quiet/Silent"], 0.09);
        }
        other => panic!("expected completed analysis, got {:?}", other),
    }

    let state = session.snapshot();
    assert!(!state.is_analyzing);
    assert_eq!(state.file_analysis.as_ref(), Some(&outcome));
    assert!(state.pending.get(CommandKind::AnalyzeFile).is_none());
    assert_eq!(
        state.pending.last_resolved().map(|c| c.status),
        Some(CommandStatus::Confirmed)
    );

    wait_for_view(&mut view, "post-analysis refresh", |s| {
        s.last_refresh > activated.last_refresh
    })
    .await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(stats_requests(&server).await, stats_before + 1);

    session.deactivate().await;
}

#[tokio::test]
async fn test_failed_upload_is_a_failed_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/single"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "Error processing file"})),
        )
        .mount(&server)
        .await;

    let session = session_for(&server, FeedConnector::new());
    let dir = tempfile::tempdir().unwrap();
    let outcome = session.analyze_file(&write_clip(&dir, "clip.wav")).await.unwrap();

    match outcome {
        FileAnalysis::Failed { file_name, error } => {
            assert_eq!(file_name, "clip.wav");
            assert!(error.contains("Error processing file"), "{}", error);
        }
        other => panic!("expected failed analysis, got {:?}", other),
    }
    let state = session.snapshot();
    assert!(!state.is_analyzing);
    assert_eq!(
        state.pending.last_resolved().map(|c| c.status),
        Some(CommandStatus::Failed)
    );
}

#[tokio::test]
async fn test_rejected_file_never_reaches_the_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/single"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upload_body()))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_for(&server, FeedConnector::new());
    let dir = tempfile::tempdir().unwrap();

    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "field notes").unwrap();
    assert!(matches!(
        session.analyze_file(&notes).await,
        Err(CommandError::UnsupportedFormat(_))
    ));

    let empty = dir.path().join("empty.wav");
    std::fs::write(&empty, b"").unwrap();
    assert!(matches!(
        session.analyze_file(&empty).await,
        Err(CommandError::EmptyFile(_))
    ));

    assert!(!session.snapshot().is_analyzing);
    server.verify().await;
}

#[tokio::test]
async fn test_recording_command_not_ready_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/live-recording/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "started"})))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_for(&server, FeedConnector::new());
    let result = session.start_or_stop_recording().await;

    assert!(matches!(result, Err(CommandError::NotReady(_))));
    assert!(session.snapshot().pending_command().is_none());
    server.verify().await;
}

#[tokio::test]
async fn test_start_confirmed_by_push_broadcast() {
    let server = MockServer::start().await;
    mount_snapshot_endpoints(&server).await;
    Mock::given(method("POST"))
        .and(path("/live-recording/start"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "started", "message": "Live recording started"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let connector = FeedConnector::new();
    let frames = connector.open_channel();
    let session = session_for(&server, connector);
    let mut view = session.view();
    session.activate();
    wait_for_view(&mut view, "connection and first refresh", |s| {
        s.is_connected() && s.last_refresh.is_some()
    })
    .await;

    let command = session.start_or_stop_recording().await.unwrap();
    assert_eq!(command.kind, CommandKind::StartRecording);
    assert_eq!(command.status, CommandStatus::Pending);
    assert!(session.snapshot().pending_command().is_some());
    assert!(!session.snapshot().is_recording);

    frames.send(status_frame("started")).unwrap();
    let state = wait_for_view(&mut view, "confirmation", |s| s.is_recording).await;
    assert!(state.pending_command().is_none());
    assert_eq!(
        state.pending.last_resolved().map(|c| c.correlation_key),
        Some(command.correlation_key)
    );

    frames
        .send(live_frame(1_760_000_000.0, "Crow", 0.8, 42.0))
        .unwrap();
    let state = wait_for_view(&mut view, "live chunk", |s| !s.live_chunks.is_empty()).await;
    assert_eq!(state.live_audio_level, 42.0);
    assert_eq!(state.dashboard_detections.latest().unwrap().predicted_class, "Crow");

    session.deactivate().await;
}

#[tokio::test]
async fn test_already_recording_resolves_immediately() {
    let server = MockServer::start().await;
    mount_snapshot_endpoints(&server).await;
    Mock::given(method("POST"))
        .and(path("/live-recording/start"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "already_recording"})),
        )
        .mount(&server)
        .await;

    let connector = FeedConnector::new();
    let _frames = connector.open_channel();
    let session = session_for(&server, connector);
    let mut view = session.view();
    session.activate();
    wait_for_view(&mut view, "connection and first refresh", |s| {
        s.is_connected() && s.last_refresh.is_some()
    })
    .await;

    session.start_or_stop_recording().await.unwrap();

    let state = session.snapshot();
    assert!(state.is_recording);
    assert!(state.pending_command().is_none());

    session.deactivate().await;
}

#[tokio::test]
async fn test_remote_failure_raises_error_notice() {
    let server = MockServer::start().await;
    mount_snapshot_endpoints(&server).await;
    Mock::given(method("POST"))
        .and(path("/live-recording/start"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"detail": "microphone unavailable"})),
        )
        .mount(&server)
        .await;

    let connector = FeedConnector::new();
    let _frames = connector.open_channel();
    let session = session_for(&server, connector);
    let mut view = session.view();
    session.activate();
    wait_for_view(&mut view, "connection and first refresh", |s| {
        s.is_connected() && s.last_refresh.is_some()
    })
    .await;

    session.start_or_stop_recording().await.unwrap();

    let state = session.snapshot();
    assert!(!state.is_recording);
    assert!(state.pending_command().is_none());
    let notice = state.notice.expect("failure should raise a notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("microphone unavailable"), "{}", notice.message);

    session.dismiss_notice();
    assert!(session.snapshot().notice.is_none());

    session.deactivate().await;
}
