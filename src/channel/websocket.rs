//! Websocket push connector.

use super::{ChannelError, PushConnector, PushStream};
use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Connects to the service's `/ws` endpoint with `tokio-tungstenite`.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: String,
}

impl WebSocketConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PushConnector for WebSocketConnector {
    async fn connect(&self) -> Result<PushStream, ChannelError> {
        let (ws, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        // Only text frames carry messages. Pings are answered by the library while the
        // stream is polled; a close frame ends the stream.
        let frames = futures::stream::unfold(ws, |mut ws| async move {
            loop {
                match ws.next().await? {
                    Ok(Message::Text(text)) => return Some((Ok(text.as_str().to_owned()), ws)),
                    Ok(Message::Close(frame)) => {
                        tracing::debug!(?frame, "Push channel closed by server");
                        return None;
                    }
                    Ok(Message::Binary(data)) => {
                        tracing::debug!(len = data.len(), "Ignoring binary push frame");
                    }
                    Ok(_) => {}
                    Err(e) => return Some((Err(ChannelError::Transport(e.to_string())), ws)),
                }
            }
        });

        Ok(frames.boxed())
    }
}
