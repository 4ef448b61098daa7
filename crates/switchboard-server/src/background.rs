//! Background tasks for the Switchboard server.
//!
//! Includes:
//! - Sweeping expired sessions.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::{sleep, Duration};

use switchboard_sessions::sweep_expired;

use crate::AppState;

/// Starts the session expiry sweep task.
///
/// Runs indefinitely, bulk-transitioning sessions past their expiry to
/// `expired` every `interval_seconds`. Safe alongside live pairing: the
/// sweep's conditional update only touches rows already past due. Reads
/// stay truthful between runs through the store's lazy expire-on-read.
pub async fn start_sweep_task(state: Arc<AppState>, interval_seconds: u64) {
    if interval_seconds == 0 {
        tracing::warn!("expiry sweep task disabled (interval=0)");
        return;
    }

    let interval = Duration::from_secs(interval_seconds);
    tracing::info!(interval_seconds, "starting session expiry sweep task");

    loop {
        sleep(interval).await;

        let pool = state.pool.clone();
        let res = tokio::task::spawn_blocking(move || {
            let conn = pool.get().map_err(|e| e.to_string())?;
            sweep_expired(&conn, Utc::now()).map_err(|e| e.to_string())
        })
        .await;

        match res {
            Ok(Ok(count)) => {
                if count > 0 {
                    tracing::info!(count, "expired stale sessions");
                }
            }
            Ok(Err(e)) => {
                tracing::error!("failed to sweep expired sessions: {}", e);
            }
            Err(e) => {
                tracing::error!("sweep task join error: {}", e);
            }
        }
    }
}
