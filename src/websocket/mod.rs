//! WebSocket module for feed connection management

mod client;
mod manager;

pub use client::WebSocketClient;
pub use manager::{backoff_delay, WebSocketManager};
