//! Publisher module for IPC communication
//!
//! Publishes best quotes to other processes over a Unix socket.

use bytes::{BufMut, BytesMut};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{MarketDataError, Result};
use crate::orderbook::BestQuote;

/// Publisher for sending best quotes via Unix socket
pub struct Publisher {
    socket_path: String,
    stream: Mutex<Option<UnixStream>>,
}

impl Publisher {
    /// Create a new publisher
    pub async fn new(socket_path: &str) -> Result<Self> {
        let publisher = Self {
            socket_path: socket_path.to_string(),
            stream: Mutex::new(None),
        };

        // Consumers may start later; publish retries the connection
        if let Err(e) = publisher.connect().await {
            warn!(error = %e, "Initial IPC connection failed, will retry on publish");
        }

        Ok(publisher)
    }

    /// Connect to the Unix socket
    async fn connect(&self) -> Result<()> {
        let path = Path::new(&self.socket_path);

        if !path.exists() {
            return Err(MarketDataError::IpcError(format!(
                "Socket path does not exist: {}",
                self.socket_path
            )));
        }

        let stream = UnixStream::connect(path).await.map_err(|e| {
            MarketDataError::IpcError(format!("Failed to connect to {}: {}", self.socket_path, e))
        })?;

        let mut guard = self.stream.lock().await;
        *guard = Some(stream);

        info!(path = %self.socket_path, "Connected to IPC socket");
        Ok(())
    }

    /// MessagePack body behind a 4-byte big-endian length prefix
    pub fn encode(quote: &BestQuote) -> Result<BytesMut> {
        let data = rmp_serde::to_vec(quote).map_err(|e| {
            MarketDataError::SerializationError(format!("Failed to serialize: {}", e))
        })?;
        let len = u32::try_from(data.len()).map_err(|_| {
            MarketDataError::SerializationError(format!("Frame too large: {} bytes", data.len()))
        })?;

        let mut frame = BytesMut::with_capacity(4 + data.len());
        frame.put_u32(len);
        frame.put_slice(&data);
        Ok(frame)
    }

    /// Publish a best quote
    ///
    /// Socket failures are logged and swallowed; only encoding errors are returned.
    pub async fn publish(&self, quote: &BestQuote) -> Result<()> {
        let frame = Self::encode(quote)?;

        let mut guard = self.stream.lock().await;

        if guard.is_none() {
            drop(guard);
            if let Err(e) = self.connect().await {
                debug!(error = %e, "Failed to reconnect to IPC socket");
                return Ok(());
            }
            guard = self.stream.lock().await;
        }

        if let Some(stream) = guard.as_mut() {
            match stream.write_all(&frame).await {
                Ok(_) => {
                    debug!(product_id = %quote.product_id, "Published best quote");
                }
                Err(e) => {
                    warn!(error = %e, "Failed to write to IPC socket");
                    *guard = None;
                }
            }
        }

        Ok(())
    }

    pub fn socket_path(&self) -> &str {
        &self.socket_path
    }
}
