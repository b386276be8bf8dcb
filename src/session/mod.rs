//! Monitoring session.
//!
//! Wires the view store, the push channel manager, the command correlator and the
//! snapshot refresher together. A session is created once per host and may be activated
//! and deactivated repeatedly; background tasks only run while it is active.

use crate::backend::{BackendError, DetectionBackend, HttpBackend};
use crate::channel::{ConnectionManager, PushConnector, WebSocketConnector};
use crate::commands::{CommandCorrelator, CommandError, PendingCommand};
use crate::config::MonitorConfig;
use crate::detection::FileAnalysis;
use crate::refresh::{
    RefreshReason, RefreshReport, RefreshTrigger, SnapshotRefresher, TriggerReceiver,
};
use crate::view::{Notice, ViewState, ViewStore, ViewUpdate};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct ActiveTasks {
    cancel_token: CancellationToken,
    channel: JoinHandle<()>,
    refresher: JoinHandle<()>,
}

/// One monitoring session against a detection service.
pub struct MonitoringSession {
    config: MonitorConfig,
    store: ViewStore,
    connector: Arc<dyn PushConnector>,
    correlator: CommandCorrelator,
    refresher: SnapshotRefresher,
    trigger: RefreshTrigger,
    triggers: TriggerReceiver,
    root_token: CancellationToken,
    active: Mutex<Option<ActiveTasks>>,
}

impl MonitoringSession {
    pub fn new(
        config: MonitorConfig,
        backend: Arc<dyn DetectionBackend>,
        connector: Arc<dyn PushConnector>,
    ) -> Self {
        let store = ViewStore::new(&config.buffers);
        let (trigger, receiver) = RefreshTrigger::channel();
        let root_token = CancellationToken::new();

        let correlator = CommandCorrelator::new(
            Arc::clone(&backend),
            store.clone(),
            trigger.clone(),
            config.commands.clone(),
            root_token.clone(),
        );
        let refresher = SnapshotRefresher::new(backend, store.clone(), config.refresh.clone());

        Self {
            config,
            store,
            connector,
            correlator,
            refresher,
            trigger,
            triggers: Arc::new(tokio::sync::Mutex::new(receiver)),
            root_token,
            active: Mutex::new(None),
        }
    }

    /// Session against the HTTP and websocket endpoints named in `config`.
    pub fn from_config(config: MonitorConfig) -> Result<Self, BackendError> {
        let backend = Arc::new(HttpBackend::new(&config.backend)?);
        let connector = Arc::new(WebSocketConnector::new(config.backend.ws_endpoint()));
        Ok(Self::new(config, backend, connector))
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Opens the push channel and starts periodic refreshes. A no-op if already active.
    pub fn activate(&self) {
        let mut active = self.active();
        if active.is_some() {
            return;
        }

        let cancel_token = self.root_token.child_token();
        let manager = ConnectionManager::new(
            Arc::clone(&self.connector),
            self.store.clone(),
            self.config.reconnect.clone(),
        )
        .with_refresh_trigger(self.trigger.clone());
        let channel = manager.start(cancel_token.clone());
        let refresher = self
            .refresher
            .clone()
            .start(Arc::clone(&self.triggers), cancel_token.clone());

        *active = Some(ActiveTasks {
            cancel_token,
            channel,
            refresher,
        });
        self.trigger.request(RefreshReason::Activation);
        tracing::info!(backend = %self.config.backend.base_url(), "Monitoring session activated");
    }

    /// Stops the push channel and the refresher. In-flight uploads keep running.
    pub async fn deactivate(&self) {
        let tasks = self.active().take();
        let Some(tasks) = tasks else {
            return;
        };

        tasks.cancel_token.cancel();
        if let Err(e) = tasks.channel.await {
            tracing::warn!(error = %e, "Push channel task ended abnormally");
        }
        if let Err(e) = tasks.refresher.await {
            tracing::warn!(error = %e, "Refresher task ended abnormally");
        }
        tracing::info!("Monitoring session deactivated");
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveTasks>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read-only snapshot stream for renderers.
    pub fn view(&self) -> watch::Receiver<ViewState> {
        self.store.subscribe()
    }

    pub fn snapshot(&self) -> ViewState {
        self.store.snapshot()
    }

    pub async fn start_or_stop_recording(&self) -> Result<PendingCommand, CommandError> {
        self.correlator.start_or_stop_recording().await
    }

    pub async fn analyze_file(&self, path: &Path) -> Result<FileAnalysis, CommandError> {
        self.correlator.analyze_file(path).await
    }

    pub fn dismiss_notice(&self) {
        self.correlator.dismiss_notice();
    }

    /// Shows `notice` until it is dismissed or replaced.
    pub fn notify(&self, notice: Notice) {
        let _ = self.store.dispatch(ViewUpdate::Notice(notice));
    }

    /// Refreshes every snapshot slice now and reports the outcome.
    pub async fn refresh_now(&self) -> RefreshReport {
        self.refresher.refresh_all().await
    }

    /// Asks the running refresher for an out-of-band refresh.
    pub fn request_refresh(&self) {
        self.trigger.request(RefreshReason::Manual);
    }
}

impl Drop for MonitoringSession {
    fn drop(&mut self) {
        self.root_token.cancel();
    }
}
