//! Error types for the feed handler

use thiserror::Error;

/// Feed handler errors
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("WebSocket connection error: {0}")]
    WebSocketConnection(String),

    #[error("WebSocket message error: {0}")]
    WebSocketMessage(String),

    #[error("Failed to parse message: {0}")]
    ParseError(String),

    #[error("IPC error: {0}")]
    IpcError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Signing error: {0}")]
    SigningError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Metrics error: {0}")]
    MetricsError(String),

    #[error("Connection timeout")]
    ConnectionTimeout,

    #[error("Max reconnection attempts exceeded")]
    MaxReconnectAttemptsExceeded,
}

impl MarketDataError {
    /// Whether the error belongs to a single message and processing can go on
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MarketDataError::ParseError(_)
                | MarketDataError::IpcError(_)
                | MarketDataError::SerializationError(_)
        )
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for MarketDataError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        MarketDataError::WebSocketConnection(err.to_string())
    }
}

impl From<serde_json::Error> for MarketDataError {
    fn from(err: serde_json::Error) -> Self {
        MarketDataError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for MarketDataError {
    fn from(err: std::io::Error) -> Self {
        MarketDataError::IpcError(err.to_string())
    }
}

impl From<prometheus::Error> for MarketDataError {
    fn from(err: prometheus::Error) -> Self {
        MarketDataError::MetricsError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MarketDataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_errors_are_parse_errors() {
        let err: MarketDataError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, MarketDataError::ParseError(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_config_errors_are_fatal() {
        let err = MarketDataError::ConfigError("Missing env var: API_KEY".to_string());
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing env var: API_KEY"
        );
    }
}
