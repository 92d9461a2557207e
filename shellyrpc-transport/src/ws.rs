//! WebSocket transport implementation

use crate::Transport;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use shellyrpc_core::{normalize_endpoint, RpcError, RpcResult};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

/// Default bound on the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport settings
#[derive(Debug, Clone)]
pub struct WsSettings {
    pub url: String,
    pub connect_timeout: Duration,
}

impl WsSettings {
    /// Create new settings, normalizing the target scheme once.
    pub fn new(target: &str) -> Self {
        Self {
            url: normalize_endpoint(target),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Create settings with a custom handshake timeout.
    pub fn with_timeout(target: &str, connect_timeout: Duration) -> Self {
        Self {
            url: normalize_endpoint(target),
            connect_timeout,
        }
    }
}

/// WebSocket transport implementation
pub struct WsTransport {
    stream: Option<WsStream>,
    settings: WsSettings,
    closed: bool,
}

impl WsTransport {
    /// Create a new, closed WebSocket transport.
    pub fn new(settings: WsSettings) -> Self {
        Self {
            stream: None,
            settings,
            closed: true,
        }
    }

    pub fn settings(&self) -> &WsSettings {
        &self.settings
    }

    fn stream_mut(&mut self) -> RpcResult<&mut WsStream> {
        self.stream.as_mut().ok_or_else(|| {
            RpcError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "WebSocket not connected",
            ))
        })
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(&mut self) -> RpcResult<()> {
        // Dispose any prior handle before replacing it.
        if let Some(mut old) = self.stream.take() {
            let _ = old.close(None).await;
        }
        self.closed = true;

        let (stream, _response) = tokio::time::timeout(
            self.settings.connect_timeout,
            connect_async(self.settings.url.as_str()),
        )
        .await
        .map_err(|_| RpcError::Timeout)?
        .map_err(|e| RpcError::WebSocket(format!("Handshake with {} failed: {}", self.settings.url, e)))?;

        self.stream = Some(stream);
        self.closed = false;
        Ok(())
    }

    async fn send_text(&mut self, payload: &str) -> RpcResult<()> {
        let result = self.stream_mut()?.send(Message::Text(payload.to_string())).await;
        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                self.closed = true;
                self.stream = None;
                Err(RpcError::WebSocket(format!("Send failed: {}", e)))
            }
        }
    }

    async fn receive_text(&mut self) -> RpcResult<String> {
        loop {
            let msg = self.stream_mut()?.next().await;
            match msg {
                Some(Ok(Message::Text(text))) => return Ok(text),
                Some(Ok(Message::Binary(data))) => {
                    return String::from_utf8(data).map_err(|e| {
                        RpcError::InvalidData(format!("Frame is not valid UTF-8: {}", e))
                    });
                }
                // Control frames are not responses, keep waiting.
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                Some(Ok(Message::Frame(_))) => continue,
                Some(Ok(Message::Close(_))) | None => {
                    self.closed = true;
                    self.stream = None;
                    return Err(RpcError::WebSocket("Connection closed by peer".to_string()));
                }
                Some(Err(e)) => {
                    self.closed = true;
                    self.stream = None;
                    return Err(RpcError::WebSocket(format!("Receive failed: {}", e)));
                }
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> RpcResult<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.close(None).await;
        }
        self.closed = true;
        Ok(())
    }
}
