//! Snapshot refresher.
//!
//! Pulls the aggregate slices of the view (stats, detection history, animal counts and
//! the recording flag) from the request channel. Each slice is fetched independently
//! and replaced wholesale on success; a failed fetch leaves the previous value in place.

mod config;
mod trigger;

pub use config::RefreshConfig;
pub use trigger::{RefreshReason, RefreshTrigger};

use crate::backend::{BackendError, DetectionBackend};
use crate::view::{ViewStore, ViewUpdate};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// One independently refreshed part of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshSlice {
    Stats,
    History,
    AnimalCounts,
    RecordingStatus,
}

impl RefreshSlice {
    pub fn as_str(self) -> &'static str {
        match self {
            RefreshSlice::Stats => "stats",
            RefreshSlice::History => "history",
            RefreshSlice::AnimalCounts => "animal_counts",
            RefreshSlice::RecordingStatus => "recording_status",
        }
    }
}

impl std::fmt::Display for RefreshSlice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which slices a refresh replaced and which kept their previous value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    pub updated: Vec<RefreshSlice>,
    pub failed: Vec<(RefreshSlice, BackendError)>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn updated(&self, slice: RefreshSlice) -> bool {
        self.updated.contains(&slice)
    }
}

/// Receiving end of a [`RefreshTrigger`], shared so the refresher can be restarted.
pub type TriggerReceiver = Arc<Mutex<mpsc::UnboundedReceiver<RefreshReason>>>;

/// Fetches aggregate slices on demand and on a fixed interval.
#[derive(Clone)]
pub struct SnapshotRefresher {
    backend: Arc<dyn DetectionBackend>,
    store: ViewStore,
    config: RefreshConfig,
}

impl SnapshotRefresher {
    pub fn new(backend: Arc<dyn DetectionBackend>, store: ViewStore, config: RefreshConfig) -> Self {
        Self {
            backend,
            store,
            config,
        }
    }

    /// Runs every fetch concurrently and applies whatever succeeded.
    pub async fn refresh_all(&self) -> RefreshReport {
        let (stats, history, counts, status) = tokio::join!(
            self.backend.stats_summary(),
            self.backend.recent_detections(self.config.history_limit),
            self.backend.animal_counts(),
            self.backend.recording_status(),
        );

        let mut report = RefreshReport::default();
        self.apply(&mut report, RefreshSlice::Stats, stats.map(ViewUpdate::StatsRefreshed));
        self.apply(
            &mut report,
            RefreshSlice::History,
            history.map(ViewUpdate::HistoryRefreshed),
        );
        self.apply(
            &mut report,
            RefreshSlice::AnimalCounts,
            counts.map(ViewUpdate::AnimalCountsRefreshed),
        );
        self.apply(
            &mut report,
            RefreshSlice::RecordingStatus,
            status.map(|s| ViewUpdate::RecordingSynced {
                recording: s.is_recording,
            }),
        );

        if !report.updated.is_empty() {
            let _ = self
                .store
                .dispatch(ViewUpdate::RefreshCompleted { at: Utc::now() });
        }

        tracing::debug!(
            updated = report.updated.len(),
            failed = report.failed.len(),
            "Snapshot refresh finished"
        );
        report
    }

    fn apply(
        &self,
        report: &mut RefreshReport,
        slice: RefreshSlice,
        result: Result<ViewUpdate, BackendError>,
    ) {
        match result {
            Ok(update) => {
                let _ = self.store.dispatch(update);
                report.updated.push(slice);
            }
            Err(e) => {
                metrics::counter!("wildguard_refresh_failures_total", "slice" => slice.as_str())
                    .increment(1);
                if e.is_transient() {
                    tracing::debug!(%slice, error = %e, "Refresh fetch failed, keeping stale data");
                } else {
                    tracing::warn!(%slice, error = %e, "Refresh fetch failed, keeping stale data");
                }
                report.failed.push((slice, e));
            }
        }
    }

    /// Spawns the refresh loop; it runs until `cancel_token` fires.
    pub fn start(self, triggers: TriggerReceiver, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut triggers = triggers.lock().await;
            self.run(&mut triggers, cancel_token).await;
        })
    }

    /// Refreshes on every trigger and every `interval_seconds`.
    pub async fn run(
        &self,
        triggers: &mut mpsc::UnboundedReceiver<RefreshReason>,
        cancel_token: CancellationToken,
    ) {
        let period = Duration::from_secs(self.config.interval_seconds.max(1));
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(interval_seconds = period.as_secs(), "Snapshot refresher started");

        loop {
            let reason = tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = interval.tick() => RefreshReason::Interval,
                reason = triggers.recv() => match reason {
                    Some(reason) => reason,
                    None => break,
                },
            };

            tracing::debug!(%reason, "Refreshing snapshots");
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = self.refresh_all() => {}
            }
        }

        tracing::info!("Snapshot refresher stopped");
    }
}
