//! SSE stream of one session's live events.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::{sse::Event, Sse},
};
use futures_util::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::AppState;

/// Handler for `GET /events/sessions/{sessionId}`.
///
/// Streams this session's events as they happen. The broadcast channel
/// carries every session's events; the stream filters down to the
/// subscriber's session so each watching page sees only its own pairing.
pub async fn get_session_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events_tx.subscribe();
    let stream = BroadcastStream::new(rx);

    let mapped_stream = stream.filter_map(move |result| {
        match result {
            Ok(event) => {
                if event.session_id != session_id {
                    return None;
                }
                match serde_json::to_string(&event) {
                    Ok(data) => Some(Ok(Event::default().event(event.event_type.clone()).data(data))),
                    Err(e) => {
                        tracing::error!("failed to serialize session event: {}", e);
                        None
                    }
                }
            }
            Err(broadcast_error) => {
                tracing::warn!(
                    error = %broadcast_error,
                    "session SSE stream lagged or closed; events were dropped for this subscriber"
                );
                None
            }
        }
    });

    Sse::new(mapped_stream).keep_alive(axum::response::sse::KeepAlive::default())
}
