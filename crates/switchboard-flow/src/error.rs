//! Error types for the conversation flow engine.

use thiserror::Error;

/// Errors that can occur while driving a conversation step.
///
/// Parse failures, rate limits, and lost pairing races are *not* errors —
/// they are normal transitions handled inside the engine with a spoken
/// re-prompt or goodbye. What reaches this enum is collaborator failure:
/// the store, the pool, or the telephony API misbehaving.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A session store operation failed.
    #[error(transparent)]
    Session(#[from] switchboard_sessions::SessionError),

    /// A rate-limit store operation failed.
    #[error(transparent)]
    RateLimit(#[from] switchboard_ratelimit::RateLimitError),

    /// Could not check a connection out of the pool.
    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// The outbound call could not be placed.
    #[error("dial error: {0}")]
    Dial(#[from] crate::dialer::DialError),

    /// A blocking store task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
