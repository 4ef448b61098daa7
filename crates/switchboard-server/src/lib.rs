//! Switchboard server library logic.

pub mod api_sessions;
pub mod api_sse;
pub mod api_voice;
pub mod background;
pub mod config;
pub mod dialer;

use axum::{extract::DefaultBodyLimit, routing::get, routing::post, Extension, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use switchboard_db::DbPool;
use switchboard_flow::FlowEngine;
use switchboard_sessions::{SessionEvent, SessionPolicy};

/// Maximum request body size (64 KiB). Webhook and session payloads are
/// tiny; anything bigger is abuse.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Default capacity for the session event broadcast channel.
pub const EVENT_BROADCAST_CAPACITY: usize = 256;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// The conversation state machine.
    pub engine: FlowEngine,
    /// Broadcast channel for session events (SSE stream).
    pub events_tx: broadcast::Sender<SessionEvent>,
    /// TTL and code-draw policy for session creation.
    pub session_policy: SessionPolicy,
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(api_sessions::create_session_handler))
        .route(
            "/api/sessions/{sessionId}",
            get(api_sessions::get_session_handler),
        )
        .route(
            "/events/sessions/{sessionId}",
            get(api_sse::get_session_stream_handler),
        )
        .route("/voice/start", post(api_voice::call_start_handler))
        .route("/voice/transcript", post(api_voice::transcript_handler))
        .route("/voice/status", post(api_voice::dial_status_handler))
        .route("/voice/hangup", post(api_voice::hangup_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
