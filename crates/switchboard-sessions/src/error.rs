//! Error types for the session store.

use thiserror::Error;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A database operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization of an event payload failed.
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The session does not exist, is expired, or was claimed by someone
    /// else first.
    #[error("session not found: {0}")]
    NotFound(String),

    /// Every code draw collided with a live session. The 4-digit code space
    /// is effectively full; this is a capacity or configuration fault and is
    /// never surfaced to a caller as a spoken message.
    #[error("pairing code space exhausted after {attempts} draws")]
    CodeSpaceExhausted {
        /// How many draws were attempted.
        attempts: u32,
    },
}
