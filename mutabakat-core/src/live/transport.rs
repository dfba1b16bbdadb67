//! Transport seam for the live channel

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use url::Url;

use crate::error::LiveError;

/// Opens transports
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Transport>, LiveError>;
}

/// One open text-frame connection
#[async_trait]
pub trait Transport: Send {
    /// Send a text frame
    async fn send_text(&mut self, text: &str) -> Result<(), LiveError>;

    /// Next inbound text frame; `None` once the connection is closed
    async fn next_text(&mut self) -> Option<Result<String, LiveError>>;

    /// Whether the connection is still open
    fn is_open(&self) -> bool;

    /// Close the connection; no-op if already closed
    async fn close(&mut self);
}

/// WebSocket connector backed by tokio-tungstenite
#[derive(Debug, Default, Clone)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Transport>, LiveError> {
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| LiveError::Connect(e.to_string()))?;
        Ok(Box::new(WsTransport { stream, open: true }))
    }
}

/// An open WebSocket
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    open: bool,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send_text(&mut self, text: &str) -> Result<(), LiveError> {
        if !self.open {
            return Err(LiveError::Closed);
        }
        self.stream
            .send(Message::Text(text.to_owned().into()))
            .await
            .map_err(|e| {
                self.open = false;
                LiveError::Transport(e.to_string())
            })
    }

    async fn next_text(&mut self) -> Option<Result<String, LiveError>> {
        while self.open {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    let text: &str = &text;
                    return Some(Ok(text.to_owned()));
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!("Received close frame: {:?}", frame);
                    self.open = false;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {
                    // Pong replies are sent by tungstenite
                }
                Some(Ok(Message::Binary(_))) => {
                    debug!("Ignoring binary frame");
                }
                Some(Err(e)) => {
                    self.open = false;
                    return Some(Err(LiveError::Transport(e.to_string())));
                }
                None => {
                    self.open = false;
                }
            }
        }
        None
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn close(&mut self) {
        if self.open {
            self.open = false;
            if let Err(e) = self.stream.close(None).await {
                debug!("Error closing WebSocket: {}", e);
            }
        }
    }
}
