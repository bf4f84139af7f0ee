//! tokio-tungstenite implementation of the primary channel.
//!
//! Connects to `{ws_url}/accounts/{resource_id}/live`. Ping/pong frames are
//! answered by the library; binary frames are accepted if they are UTF-8;
//! a close frame ends the stream.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::domain::foundation::ResourceId;
use crate::ports::{PrimaryChannel, PushConnection, TransportError};

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens WebSocket connections to the live-update server.
#[derive(Debug, Clone)]
pub struct WebSocketChannel {
    base_url: String,
    connect_timeout: Duration,
}

impl WebSocketChannel {
    /// `base_url` must use the `ws://` or `wss://` scheme.
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            connect_timeout,
        }
    }

    /// Full URL of the live endpoint for one resource.
    pub fn url_for(&self, resource_id: &ResourceId) -> String {
        format!("{}/accounts/{}/live", self.base_url, resource_id)
    }
}

#[async_trait]
impl PrimaryChannel for WebSocketChannel {
    async fn connect(
        &self,
        resource_id: &ResourceId,
    ) -> Result<Box<dyn PushConnection>, TransportError> {
        let url = self.url_for(resource_id);

        let (stream, _response) = tokio::time::timeout(self.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| TransportError::Connect(format!("timed out connecting to {}", url)))?
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        tracing::debug!(%resource_id, %url, "WebSocket connected");
        Ok(Box::new(WebSocketConnection { stream }))
    }
}

/// One open WebSocket.
pub struct WebSocketConnection {
    stream: Stream,
}

#[async_trait]
impl PushConnection for WebSocketConnection {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn next_message(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => {
                        tracing::warn!("Dropping non-UTF-8 binary frame");
                    }
                },
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "WebSocket closed by server");
                    return None;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Err(e) => return Some(Err(TransportError::Receive(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "WebSocket close handshake failed");
        }
    }
}
