//! Push channel connection management.
//!
//! The [`ConnectionManager`] keeps one push channel open for the lifetime of a session:
//! it connects, feeds every decoded message into the view store, and reconnects after
//! any failure using the configured backoff. It never gives up on its own; only the
//! session's cancellation token stops it.

mod config;
mod error;
mod message;
mod state;
mod websocket;

pub use config::{BackoffStrategy, ReconnectConfig};
pub use error::ChannelError;
pub use message::PushMessage;
pub use state::ConnectionState;
pub use websocket::WebSocketConnector;

use crate::refresh::{RefreshReason, RefreshTrigger};
use crate::view::{ViewStore, ViewUpdate};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Text frames from an open push channel. The stream ends when the peer closes.
pub type PushStream = BoxStream<'static, Result<String, ChannelError>>;

/// Opens push channels.
///
/// The production implementation is [`WebSocketConnector`]; tests script frames through
/// an in-memory implementation.
#[async_trait]
pub trait PushConnector: Send + Sync + 'static {
    async fn connect(&self) -> Result<PushStream, ChannelError>;
}

/// Owns the push channel's connect/reconnect loop.
pub struct ConnectionManager {
    connector: Arc<dyn PushConnector>,
    store: ViewStore,
    config: ReconnectConfig,
    resync: Option<RefreshTrigger>,
}

impl ConnectionManager {
    pub fn new(
        connector: Arc<dyn PushConnector>,
        store: ViewStore,
        config: ReconnectConfig,
    ) -> Self {
        Self {
            connector,
            store,
            config,
            resync: None,
        }
    }

    /// Requests a snapshot refresh every time the channel comes back after a drop, so
    /// broadcasts missed while disconnected are recovered from the pull side.
    pub fn with_refresh_trigger(mut self, trigger: RefreshTrigger) -> Self {
        self.resync = Some(trigger);
        self
    }

    /// Spawns the connection loop; it runs until `cancel_token` fires.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel_token).await })
    }

    /// Connect, pump frames, back off, repeat.
    pub async fn run(&self, cancel_token: CancellationToken) {
        tracing::info!(strategy = ?self.config.strategy, "Push channel manager started");
        let mut attempt: u32 = 0;
        let mut connected_before = false;

        loop {
            self.set_state(ConnectionState::Connecting);

            let opened = tokio::select! {
                _ = cancel_token.cancelled() => break,
                opened = self.open() => opened,
            };

            match opened {
                Ok(stream) => {
                    attempt = 0;
                    self.set_state(ConnectionState::Connected);
                    tracing::info!(reconnect = connected_before, "Push channel connected");
                    if connected_before {
                        if let Some(trigger) = &self.resync {
                            trigger.request(RefreshReason::Reconnected);
                        }
                    }
                    connected_before = true;
                    self.pump(stream, &cancel_token).await;
                    if cancel_token.is_cancelled() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "Push channel connect failed");
                }
            }

            self.set_state(ConnectionState::Disconnected);
            let delay = self.config.delay_for(attempt);
            attempt = attempt.saturating_add(1);
            metrics::counter!("wildguard_reconnects_total").increment(1);
            tracing::debug!(delay_ms = delay.as_millis() as u64, attempt, "Reconnecting push channel");

            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.set_state(ConnectionState::Disconnected);
        tracing::info!("Push channel manager stopped");
    }

    async fn open(&self) -> Result<PushStream, ChannelError> {
        let timeout = self.config.connect_timeout();
        match tokio::time::timeout(timeout, self.connector.connect()).await {
            Ok(result) => result,
            Err(_) => Err(ChannelError::Timeout(self.config.connect_timeout_seconds)),
        }
    }

    /// Applies frames in arrival order until the channel ends or the session stops.
    async fn pump(&self, mut stream: PushStream, cancel_token: &CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => return,
                frame = stream.next() => match frame {
                    Some(Ok(text)) => self.handle_frame(&text),
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Push channel error");
                        return;
                    }
                    None => {
                        tracing::info!("Push channel closed");
                        return;
                    }
                },
            }
        }
    }

    /// Decodes one frame and dispatches its update. Bad frames are logged and dropped.
    pub fn handle_frame(&self, text: &str) {
        let message = match PushMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping push message");
                return;
            }
        };

        let kind = message.kind();
        metrics::counter!("wildguard_push_messages_total", "kind" => kind).increment(1);

        match &message {
            PushMessage::Unknown(other) => {
                tracing::warn!(kind = %other, "Dropping push message of unknown kind");
                return;
            }
            PushMessage::Pong => {
                tracing::debug!("Push channel keepalive");
                return;
            }
            PushMessage::Status(text) => {
                tracing::debug!(message = %text, "Push channel status");
                return;
            }
            _ => {}
        }

        if let Some(update) = message.into_update() {
            if let Err(e) = self.store.dispatch(update) {
                tracing::debug!(kind, error = %e, "Push update rejected");
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        let _ = self.store.dispatch(ViewUpdate::Connection(state));
    }
}
