//! Webhook adapter between the telephony collaborator and the flow engine.
//!
//! One adapter serves any collaborator that can POST transcripts and dial
//! statuses: the conversation logic itself lives entirely in
//! `switchboard-flow`, written once.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};

use switchboard_flow::{FlowError, FlowReply};
use switchboard_types::{ConversationStep, DialStatus};

use crate::AppState;

/// Spoken when a collaborator failure reaches the webhook boundary. The
/// caller hears an apology, never the error.
const GENERIC_APOLOGY: &str =
    "Sorry, something went wrong on our end. Please try again in a bit. Goodbye!";

#[derive(Deserialize)]
pub struct CallStartRequest {
    pub call_leg_id: String,
    pub caller_id: String,
}

#[derive(Deserialize)]
pub struct TranscriptRequest {
    pub call_leg_id: String,
    pub caller_id: String,
    /// Step the collaborator believes the call is in. Advisory: the engine
    /// trusts its own state; a mismatch is only logged.
    pub step: Option<ConversationStep>,
    pub transcript: String,
}

#[derive(Deserialize)]
pub struct DialStatusRequest {
    pub call_leg_id: String,
    pub session_id: String,
    pub status: DialStatus,
}

#[derive(Deserialize)]
pub struct HangupRequest {
    pub call_leg_id: String,
}

/// Response for status callbacks, where there may be nothing to say.
#[derive(Serialize)]
pub struct MaybeReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub say: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step: Option<ConversationStep>,
}

/// Converts an engine failure into the generic spoken apology.
///
/// Recoverable situations (bad parses, lockouts, lost races) never surface
/// as `FlowError` — they come back as ordinary replies. What lands here is
/// collaborator failure, which the caller must not hear verbatim.
fn apologize(e: FlowError) -> (StatusCode, Json<FlowReply>) {
    tracing::error!(error = %e, "conversation step failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(FlowReply {
            say: GENERIC_APOLOGY.to_string(),
            next_step: ConversationStep::Failed,
        }),
    )
}

/// POST /voice/start
pub async fn call_start_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CallStartRequest>,
) -> Json<FlowReply> {
    let reply = state
        .engine
        .start_call(&payload.call_leg_id, &payload.caller_id);
    Json(reply)
}

/// POST /voice/transcript
pub async fn transcript_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<TranscriptRequest>,
) -> Result<Json<FlowReply>, (StatusCode, Json<FlowReply>)> {
    if let Some(reported) = payload.step {
        if let Some(current) = state.engine.call_state(&payload.call_leg_id) {
            if current.step != reported {
                tracing::warn!(
                    call_leg_id = %payload.call_leg_id,
                    reported = %reported,
                    actual = %current.step,
                    "collaborator step disagrees with engine state"
                );
            }
        }
    }

    let reply = state
        .engine
        .handle_transcript(&payload.call_leg_id, &payload.caller_id, &payload.transcript)
        .await
        .map_err(apologize)?;
    Ok(Json(reply))
}

/// POST /voice/status
pub async fn dial_status_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<DialStatusRequest>,
) -> Result<Json<MaybeReply>, (StatusCode, Json<FlowReply>)> {
    let reply = state
        .engine
        .handle_dial_status(&payload.call_leg_id, &payload.session_id, payload.status)
        .await
        .map_err(apologize)?;

    Ok(Json(match reply {
        Some(r) => MaybeReply {
            say: Some(r.say),
            next_step: Some(r.next_step),
        },
        None => MaybeReply {
            say: None,
            next_step: None,
        },
    }))
}

/// POST /voice/hangup
pub async fn hangup_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<HangupRequest>,
) -> StatusCode {
    state.engine.end_call(&payload.call_leg_id);
    StatusCode::NO_CONTENT
}
