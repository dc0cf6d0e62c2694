//! Level-2 order book feed handler
//!
//! Subscribes to the venue's level-2 channel, keeps one order book per
//! instrument and prints the best bid and ask after every applied update.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use l2_book_feed::{AppState, Config, FeedMetrics, FeedProcessor, Publisher, WebSocketManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Starting level-2 order book feed handler");

    let config = Arc::new(Config::load()?);
    info!(
        products = ?config.product_ids,
        channel = %config.channel,
        endpoint = %config.ws_endpoint,
        "Configuration loaded"
    );

    let metrics = FeedMetrics::new()?;
    let feed = Arc::new(RwLock::new(FeedProcessor::new(&config.channel, metrics.clone())));

    let publisher = match &config.ipc_socket_path {
        Some(path) => Some(Arc::new(Publisher::new(path).await?)),
        None => None,
    };

    let state = Arc::new(AppState {
        feed,
        publisher,
        metrics,
        config: config.clone(),
    });

    let health_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = start_health_server(health_state).await {
            warn!(error = %e, "Health server error");
        }
    });

    let mut ws_manager = WebSocketManager::new(state);
    ws_manager.run().await?;

    Ok(())
}

/// Start HTTP server for health checks, metrics and book status
async fn start_health_server(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.health_port));

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/books", get(books))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!(addr = %addr, "Starting health check server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let feed = state.feed.read().await;
    let registry = feed.registry();
    let synced = registry
        .product_ids()
        .iter()
        .filter(|id| registry.get(id).map(|b| b.is_synced()).unwrap_or(false))
        .count();

    Json(serde_json::json!({
        "status": "healthy",
        "component": "l2-book-feed",
        "books": registry.len(),
        "synced_books": synced,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn metrics(State(state): State<Arc<AppState>>) -> (StatusCode, String) {
    match state.metrics.render() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn books(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let feed = state.feed.read().await;
    let registry = feed.registry();

    let books: Vec<serde_json::Value> = registry
        .product_ids()
        .iter()
        .filter_map(|id| registry.get(id))
        .map(|book| {
            let (bid_levels, ask_levels) = book.depth();
            serde_json::json!({
                "product_id": book.product_id(),
                "state": book.state(),
                "bid_levels": bid_levels,
                "ask_levels": ask_levels,
                "updates_applied": book.updates_applied(),
                "best_quote": book.best_quote(),
            })
        })
        .collect();

    Json(serde_json::Value::Array(books))
}
