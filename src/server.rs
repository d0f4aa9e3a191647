//! HTTP/WebSocket server pushing snapshots to live subscribers.
//!
//! This module provides an HTTP server that:
//! - Reports liveness via GET /health
//! - Returns the latest snapshot via GET /snapshot
//! - Streams every snapshot as a JSON text frame over GET /ws
//!
//! # Architecture
//!
//! ```text
//! scoring loop ──→ SnapshotHub ──→ /ws subscribers (dashboard, alerts)
//!                      └────────→ /snapshot (polling clients)
//! ```

use crate::core::Snapshot;
use crate::publish::SnapshotHub;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Bind on all interfaces instead of loopback only
    pub public: bool,
}

impl ServerConfig {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            public: false,
        }
    }
}

/// Shared server state
pub struct ServerState {
    hub: SnapshotHub,
    session_id: String,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub session_id: String,
    pub subscribers: usize,
}

/// GET /health
async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        session_id: state.session_id.clone(),
        subscribers: state.hub.subscriber_count(),
    })
}

/// GET /snapshot
///
/// 204 until the first tick has been published.
async fn latest_snapshot(State(state): State<Arc<ServerState>>) -> Response {
    match state.hub.latest() {
        Some(snapshot) => Json(snapshot).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// GET /ws
async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<ServerState>>) -> Response {
    ws.on_upgrade(move |socket| stream_snapshots(socket, state))
}

async fn stream_snapshots(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut updates = state.hub.subscribe();
    tracing::info!(subscribers = state.hub.subscriber_count(), "subscriber connected");

    // Send the current state right away so a new client has something to draw.
    if let Some(snapshot) = state.hub.latest() {
        if send_snapshot(&mut socket, &snapshot).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(snapshot) => {
                    if send_snapshot(&mut socket, &snapshot).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "subscriber lagging, skipped snapshots");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!("subscriber disconnected");
}

async fn send_snapshot(socket: &mut WebSocket, snapshot: &Snapshot) -> Result<(), axum::Error> {
    match serde_json::to_string(snapshot) {
        Ok(json) => socket.send(Message::Text(json)).await,
        Err(e) => {
            tracing::error!("Failed to serialize snapshot: {}", e);
            Ok(())
        }
    }
}

/// Build the router over a hub.
pub fn router(hub: SnapshotHub, session_id: impl Into<String>) -> Router {
    let state = Arc::new(ServerState {
        hub,
        session_id: session_id.into(),
    });

    Router::new()
        .route("/health", get(health))
        .route("/snapshot", get(latest_snapshot))
        .route("/ws", get(ws_upgrade))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
    hub: SnapshotHub,
    session_id: impl Into<String>,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let app = router(hub, session_id);

    let ip = if config.public {
        [0, 0, 0, 0]
    } else {
        [127, 0, 0, 1]
    };
    let addr = SocketAddr::from((ip, config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Snapshot server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
