//! Per-caller pairing-attempt rate limiting for the Switchboard platform.
//!
//! Tracks failed pairing attempts keyed by caller phone identity and
//! enforces temporary lockouts. The key is deliberately the caller's phone
//! number — not the session or the code — so repeated wrong-code guesses
//! from one caller cannot be reset by opening a fresh web session.
//!
//! Records are durable (SQLite) so lockouts survive a process restart.
//! There is no background sweep for this table: an elapsed lockout is reset
//! lazily on the next [`check_rate_limit`] read, and the record is deleted
//! entirely by [`clear_rate_limit`] on a successful pairing.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during rate-limit operations.
#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Lockout policy: how many failures are tolerated and how long a lockout
/// lasts once they are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Failed attempts allowed before a lockout is imposed.
    pub max_attempts: u32,
    /// Lockout duration in seconds.
    pub lockout_secs: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_secs: 600,
        }
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    /// Whether the caller may attempt a pairing right now.
    pub allowed: bool,
    /// Attempts left before a lockout, when allowed.
    pub remaining_attempts: Option<u32>,
    /// When an active lockout ends, when denied.
    pub locked_until: Option<String>,
}

/// Outcome of recording a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockoutStatus {
    /// Whether this failure tripped the lockout.
    pub locked: bool,
    /// When the lockout ends, when tripped.
    pub locked_until: Option<String>,
}

/// Formats a timestamp the way SQLite's `datetime('now')` does, so stored
/// values stay lexicographically comparable with column defaults.
pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Checks whether a caller identity may attempt a pairing.
///
/// No record means a full budget. An active lockout denies with its expiry.
/// An elapsed lockout resets the record in place (lazy reset — no sweep
/// task needed) and allows with a full budget.
pub fn check_rate_limit(
    conn: &Connection,
    caller_id: &str,
    policy: RateLimitPolicy,
    now: DateTime<Utc>,
) -> Result<RateLimitDecision, RateLimitError> {
    let row: Option<(u32, Option<String>)> = conn
        .query_row(
            "SELECT fail_count, locked_until FROM rate_limits WHERE caller_id = ?1",
            [caller_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((fail_count, locked_until)) = row else {
        return Ok(RateLimitDecision {
            allowed: true,
            remaining_attempts: Some(policy.max_attempts),
            locked_until: None,
        });
    };

    let now_ts = format_ts(now);

    if let Some(until) = locked_until {
        if until > now_ts {
            return Ok(RateLimitDecision {
                allowed: false,
                remaining_attempts: None,
                locked_until: Some(until),
            });
        }

        // Lockout elapsed: reset counters on read.
        conn.execute(
            "UPDATE rate_limits SET fail_count = 0, locked_until = NULL WHERE caller_id = ?1",
            [caller_id],
        )?;
        return Ok(RateLimitDecision {
            allowed: true,
            remaining_attempts: Some(policy.max_attempts),
            locked_until: None,
        });
    }

    Ok(RateLimitDecision {
        allowed: fail_count < policy.max_attempts,
        remaining_attempts: Some(policy.max_attempts.saturating_sub(fail_count)),
        locked_until: None,
    })
}

/// Records one failed pairing attempt for a caller identity.
///
/// Upserts the record and increments the failure counter; when the counter
/// reaches the policy maximum, stamps a lockout expiry and reports it.
pub fn record_failed_attempt(
    conn: &Connection,
    caller_id: &str,
    policy: RateLimitPolicy,
    now: DateTime<Utc>,
) -> Result<LockoutStatus, RateLimitError> {
    let now_ts = format_ts(now);

    let fail_count: u32 = conn.query_row(
        "INSERT INTO rate_limits (caller_id, fail_count, last_attempt_at)
         VALUES (?1, 1, ?2)
         ON CONFLICT (caller_id) DO UPDATE SET
             fail_count = fail_count + 1,
             last_attempt_at = excluded.last_attempt_at
         RETURNING fail_count",
        params![caller_id, now_ts],
        |row| row.get(0),
    )?;

    if fail_count < policy.max_attempts {
        return Ok(LockoutStatus {
            locked: false,
            locked_until: None,
        });
    }

    let locked_until = format_ts(now + Duration::seconds(i64::from(policy.lockout_secs)));
    conn.execute(
        "UPDATE rate_limits SET locked_until = ?2 WHERE caller_id = ?1",
        params![caller_id, locked_until],
    )?;

    tracing::warn!(caller_id, fail_count, %locked_until, "caller locked out of pairing");

    Ok(LockoutStatus {
        locked: true,
        locked_until: Some(locked_until),
    })
}

/// Deletes a caller's rate-limit record entirely.
///
/// Called exactly once, on a successful pairing.
pub fn clear_rate_limit(conn: &Connection, caller_id: &str) -> Result<(), RateLimitError> {
    conn.execute("DELETE FROM rate_limits WHERE caller_id = ?1", [caller_id])?;
    Ok(())
}
