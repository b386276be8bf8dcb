//! Benchmarks for applying view updates and decoding push frames.
//!
//! Every push message passes through decode and the reducer on the channel task, so
//! both sit on the hot path while a recording session streams.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use wildguard::channel::{ConnectionState, PushMessage};
use wildguard::detection::{DetectionEvent, DetectionSource, DetectionType, LiveChunkResult};
use wildguard::view::{BufferConfig, ViewState, ViewStore, ViewUpdate};

fn live_chunk(i: usize, results: usize) -> LiveChunkResult {
    let detections = (0..results)
        .map(|r| {
            DetectionEvent::new(
                (i * results + r) as u64,
                DetectionSource::Live,
                Utc::now(),
                if r == 0 { "Gunshot" } else { "Crow" },
                (r as f64 + 1.0) / (results as f64 + 1.0),
                format!("model-{}", r),
                if r == 0 {
                    DetectionType::Gunshot
                } else {
                    DetectionType::Wildlife
                },
            )
        })
        .collect();
    LiveChunkResult::new(Utc::now(), (i % 100) as f64, detections)
}

fn recording_state() -> ViewState {
    let mut state = ViewState::new(&BufferConfig::default());
    state
        .apply(ViewUpdate::Connection(ConnectionState::Connected))
        .unwrap();
    state
        .apply(ViewUpdate::RecordingStatus {
            recording: true,
            at: Utc::now(),
        })
        .unwrap();
    state
}

/// Reducer cost per live chunk, by number of model results in the chunk.
fn bench_apply_live_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_live_chunk");
    for results in [1usize, 4, 16] {
        let chunks: Vec<_> = (0..64).map(|i| live_chunk(i, results)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(results), &chunks, |b, chunks| {
            let mut state = recording_state();
            let mut i = 0;
            b.iter(|| {
                let chunk = chunks[i % chunks.len()].clone();
                i += 1;
                black_box(state.apply(ViewUpdate::LiveChunk(chunk)).unwrap());
            });
        });
    }
    group.finish();
}

/// Full dispatch through the store, including subscriber notification.
fn bench_store_dispatch(c: &mut Criterion) {
    let store = ViewStore::new(&BufferConfig::default());
    let _rx = store.subscribe();
    store
        .dispatch(ViewUpdate::Connection(ConnectionState::Connected))
        .unwrap();
    store
        .dispatch(ViewUpdate::RecordingStatus {
            recording: true,
            at: Utc::now(),
        })
        .unwrap();
    let chunk = live_chunk(0, 4);

    c.bench_function("store_dispatch_live_chunk", |b| {
        b.iter(|| {
            black_box(store.dispatch(ViewUpdate::LiveChunk(chunk.clone())).unwrap());
        });
    });
}

/// Decoding a typical `live_detection` frame with three model results.
fn bench_decode_live_frame(c: &mut Criterion) {
    let frame = serde_json::json!({
        "type": "live_detection",
        "data": {
            "chunk_timestamp": 1_760_000_000.25,
            "audio_level": 37.5,
            "results": [
                {"prediction": "Gunshot", "confidence": 0.91, "model_name": "rf_gunshot",
                 "detection_type": "gunshot",
                 "probabilities": {"Gunshot": 0.91, "Quiet/Silent": 0.09}},
                {"prediction": "Crow", "confidence": 0.44, "model_name": "xgboost_esc50",
                 "detection_type": "wildlife"},
                {"prediction": "Elephant", "confidence": 0.31, "model_name": "rf_wildlife"}
            ]
        }
    })
    .to_string();

    c.bench_function("decode_live_frame", |b| {
        b.iter(|| {
            black_box(PushMessage::decode(black_box(&frame)).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_apply_live_chunk,
    bench_store_dispatch,
    bench_decode_live_frame
);
criterion_main!(benches);
