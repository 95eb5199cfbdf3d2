//! Transport seam for realtime channels
//!
//! The channel task is generic over a [`Connector`] that produces [`Link`]s,
//! so the reconnect/dispatch logic is independent of the I/O binding. The
//! production binding is [`WsConnector`] over `tokio-tungstenite`; tests
//! inject scripted connectors.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::errors::RealtimeError;

// ----------------------------------------------------------------------------
// Link Traits
// ----------------------------------------------------------------------------

/// One live duplex connection carrying text frames.
#[async_trait]
pub trait Link: Send {
    /// Transmit one text frame
    async fn send_text(&mut self, text: String) -> Result<(), RealtimeError>;

    /// Receive the next text frame.
    ///
    /// `None` means the peer closed the connection; an error means the link
    /// failed and must be discarded.
    async fn next_text(&mut self) -> Option<Result<String, RealtimeError>>;

    /// Close the connection, best effort
    async fn close(&mut self);
}

/// Factory for [`Link`]s against a resolved endpoint.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Link: Link + 'static;

    /// Establish a fresh connection to the endpoint
    async fn connect(&self, endpoint: &Endpoint) -> Result<Self::Link, RealtimeError>;
}

// ----------------------------------------------------------------------------
// WebSocket Binding
// ----------------------------------------------------------------------------

/// Production connector: WebSocket over TCP/TLS via `tokio-tungstenite`
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WsConnector {
    type Link = WsLink;

    async fn connect(&self, endpoint: &Endpoint) -> Result<WsLink, RealtimeError> {
        let url = endpoint.url()?;
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|err| RealtimeError::connect_failed(err.to_string()))?;
        Ok(WsLink { stream })
    }
}

/// A live WebSocket connection
pub struct WsLink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Link for WsLink {
    async fn send_text(&mut self, text: String) -> Result<(), RealtimeError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|err| RealtimeError::link(err.to_string()))
    }

    async fn next_text(&mut self) -> Option<Result<String, RealtimeError>> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => debug!("ignoring non-utf8 binary frame"),
                },
                // Control frames are handled by the protocol layer
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Ok(Message::Close(_)) => return None,
                Err(err) => return Some(Err(RealtimeError::link(err.to_string()))),
            }
        }
        None
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}
