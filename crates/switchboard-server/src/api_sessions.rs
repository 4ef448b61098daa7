//! Session create and summary handlers for the web UI.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use switchboard_sessions::{
    create_session, get_session, recent_events, SessionError, SessionEvent,
};
use switchboard_types::SessionStatus;

use crate::AppState;

/// Maximum length for a browser identity token.
const MAX_BROWSER_ID_LEN: usize = 128;

/// Events returned per summary request.
const SUMMARY_EVENT_LIMIT: u32 = 50;

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub browser_id: String,
}

#[derive(Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub code: String,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_phone: Option<String>,
    pub events: Vec<EventView>,
}

/// One event in a summary response, newest first.
#[derive(Serialize)]
pub struct EventView {
    pub event_type: String,
    pub payload: Value,
    pub created_at: String,
}

impl From<SessionEvent> for EventView {
    fn from(event: SessionEvent) -> Self {
        // Fall back to the raw string if a stored payload is somehow not
        // valid JSON; the log must stay readable either way.
        let payload = serde_json::from_str(&event.payload_json)
            .unwrap_or_else(|_| Value::String(event.payload_json.clone()));
        Self {
            event_type: event.event_type,
            payload,
            created_at: event.created_at,
        }
    }
}

/// Maps a [`SessionError`] to the right HTTP status code, logging non-404
/// failures.
fn session_err_to_status(e: SessionError) -> StatusCode {
    match e {
        SessionError::NotFound(_) => StatusCode::NOT_FOUND,
        ref err => {
            tracing::error!(error = %err, "session operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// POST /api/sessions
///
/// Create-or-return: the same unexpired browser identity always gets the
/// same session and code back, so a page reload never mints a duplicate.
pub async fn create_session_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<SessionSummary>, StatusCode> {
    if payload.browser_id.is_empty() || payload.browser_id.len() > MAX_BROWSER_ID_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }

    let pool = state.pool.clone();
    let policy = state.session_policy;
    let session = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        create_session(&conn, &payload.browser_id, policy, Utc::now())
            .map_err(session_err_to_status)
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)??;

    Ok(Json(SessionSummary {
        session_id: session.id,
        code: session.code,
        status: session.status,
        caller_name: session.caller_name,
        caller_phone: session.caller_phone,
        events: Vec::new(),
    }))
}

/// GET /api/sessions/{sessionId}
///
/// Read-only summary for the watching page: status, code, captured caller
/// details, and recent events in reverse chronological order.
pub async fn get_session_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionSummary>, StatusCode> {
    let pool = state.pool.clone();
    let (session, events) = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        let session =
            get_session(&conn, &session_id, Utc::now()).map_err(session_err_to_status)?;
        let events = recent_events(&conn, &session.id, SUMMARY_EVENT_LIMIT)
            .map_err(session_err_to_status)?;
        Ok::<_, StatusCode>((session, events))
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)??;

    Ok(Json(SessionSummary {
        session_id: session.id,
        code: session.code,
        status: session.status,
        caller_name: session.caller_name,
        caller_phone: session.caller_phone,
        events: events.into_iter().map(EventView::from).collect(),
    }))
}
