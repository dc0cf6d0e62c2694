//! WebSocket client for the level-2 feed
//!
//! Owns one connection: connect, send the signed subscription, read frames.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::protocol::Message,
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, info, warn};

use crate::error::{MarketDataError, Result};
use crate::signing::SubscribeRequest;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A received frame, reduced to what the feed loop acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Feed payload
    Text(String),
    /// Ping that must be answered with the same payload
    Ping(Vec<u8>),
    /// Pongs and raw frames
    Control,
    /// Peer closed the connection, with its reason if any
    Closed(Option<String>),
}

impl From<Message> for Inbound {
    fn from(message: Message) -> Self {
        match message {
            Message::Text(text) => Inbound::Text(text),
            Message::Binary(data) => Inbound::Text(String::from_utf8_lossy(&data).into_owned()),
            Message::Ping(payload) => Inbound::Ping(payload),
            Message::Pong(_) | Message::Frame(_) => Inbound::Control,
            Message::Close(frame) => Inbound::Closed(frame.map(|f| f.reason.to_string())),
        }
    }
}

/// WebSocket client for a single connection
pub struct WebSocketClient {
    stream: Option<WsStream>,
    endpoint: String,
}

impl WebSocketClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            stream: None,
            endpoint: endpoint.to_string(),
        }
    }

    /// Connect to the feed endpoint
    pub async fn connect(&mut self) -> Result<()> {
        info!(url = %self.endpoint, "Connecting to feed WebSocket");

        let (ws_stream, response) = connect_async(self.endpoint.as_str()).await.map_err(|e| {
            MarketDataError::WebSocketConnection(format!("Failed to connect: {}", e))
        })?;

        info!(status = ?response.status(), "WebSocket connected");
        self.stream = Some(ws_stream);

        Ok(())
    }

    /// Send the signed subscribe request
    pub async fn subscribe(&mut self, request: &SubscribeRequest) -> Result<()> {
        let payload = request.to_json()?;
        self.send(Message::Text(payload)).await?;

        info!(
            channel = %request.channel,
            products = ?request.product_ids,
            "Subscription sent"
        );
        Ok(())
    }

    /// Receive the next feed payload
    ///
    /// `Ok(None)` means a control frame was consumed and the caller should
    /// read again. Close frames, stream errors and end of stream drop the
    /// connection and return an error.
    pub async fn recv(&mut self) -> Result<Option<String>> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| MarketDataError::WebSocketConnection("Not connected".to_string()))?;

        let message = match stream.next().await {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                error!(error = %e, "WebSocket error");
                self.stream = None;
                return Err(MarketDataError::WebSocketMessage(e.to_string()));
            }
            None => {
                warn!("WebSocket stream ended");
                self.stream = None;
                return Err(MarketDataError::WebSocketConnection("Stream ended".to_string()));
            }
        };

        match Inbound::from(message) {
            Inbound::Text(text) => {
                debug!(len = text.len(), "Received text message");
                Ok(Some(text))
            }
            Inbound::Ping(payload) => {
                debug!("Received ping, sending pong");
                if let Err(e) = self.send(Message::Pong(payload)).await {
                    warn!(error = %e, "Failed to answer ping");
                }
                Ok(None)
            }
            Inbound::Control => Ok(None),
            Inbound::Closed(reason) => {
                warn!(reason = ?reason, "Received close frame");
                self.stream = None;
                Err(MarketDataError::WebSocketConnection(format!(
                    "Connection closed: {}",
                    reason.unwrap_or_default()
                )))
            }
        }
    }

    /// Keepalive ping
    pub async fn ping(&mut self) -> Result<()> {
        self.send(Message::Ping(Vec::new())).await
    }

    async fn send(&mut self, message: Message) -> Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| MarketDataError::WebSocketConnection("Not connected".to_string()))?;

        stream
            .send(message)
            .await
            .map_err(|e| MarketDataError::WebSocketMessage(e.to_string()))
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Close the connection, if any
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.close(None).await {
                debug!(error = %e, "Error while closing WebSocket");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;

    #[test]
    fn test_text_and_binary_are_payloads() {
        assert_eq!(
            Inbound::from(Message::Text("{}".to_string())),
            Inbound::Text("{}".to_string())
        );
        assert_eq!(
            Inbound::from(Message::Binary(b"{\"a\":1}".to_vec())),
            Inbound::Text("{\"a\":1}".to_string())
        );
    }

    #[test]
    fn test_control_frames() {
        assert_eq!(Inbound::from(Message::Ping(vec![1, 2])), Inbound::Ping(vec![1, 2]));
        assert_eq!(Inbound::from(Message::Pong(vec![])), Inbound::Control);
    }

    #[test]
    fn test_close_keeps_reason() {
        let frame = CloseFrame {
            code: CloseCode::Away,
            reason: "maintenance".into(),
        };
        assert_eq!(
            Inbound::from(Message::Close(Some(frame))),
            Inbound::Closed(Some("maintenance".to_string()))
        );
        assert_eq!(Inbound::from(Message::Close(None)), Inbound::Closed(None));
    }

    #[tokio::test]
    async fn test_recv_requires_connection() {
        let mut client = WebSocketClient::new("wss://example.invalid");
        assert!(!client.is_connected());
        assert!(matches!(
            client.recv().await,
            Err(MarketDataError::WebSocketConnection(_))
        ));
        assert!(client.ping().await.is_err());
    }
}
