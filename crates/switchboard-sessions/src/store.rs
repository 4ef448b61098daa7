//! Persistence operations for sessions and their event log.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use switchboard_types::SessionStatus;
use uuid::Uuid;

use crate::error::SessionError;
use crate::event::{EventPayload, SessionEvent};

/// Statuses in which a session holds its pairing code exclusively.
const LIVE_STATUSES: &str = "('created', 'paired', 'active')";

/// TTL and code-draw policy for the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Lifetime of a freshly created, unpaired session, in seconds.
    pub session_ttl_secs: u32,
    /// Lifetime granted at pairing and on every extension, in seconds.
    pub paired_ttl_secs: u32,
    /// Bound on random code draws before creation fails as exhausted.
    pub max_code_draws: u32,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            session_ttl_secs: 600,
            paired_ttl_secs: 1_800,
            max_code_draws: 25,
        }
    }
}

/// A pairing session row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque unique id (UUID v4).
    pub id: String,
    /// Identity token of the browser that created the session.
    pub browser_id: String,
    /// 4-digit pairing code.
    pub code: String,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Sanitized caller display name, once paired.
    pub caller_name: Option<String>,
    /// Caller phone number. Holds the inbound caller-ID at pairing; the
    /// captured callback number overwrites it later. One field serves both.
    pub caller_phone: Option<String>,
    /// Telephony identifier of the paired call leg.
    pub call_leg_id: Option<String>,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
    /// Hard expiry timestamp (ISO 8601).
    pub expires_at: String,
    /// Activity horizon, pushed forward on every conversation step.
    pub active_until: String,
}

/// Formats a timestamp the way SQLite's `datetime('now')` does, keeping
/// stored values lexicographically comparable with column defaults.
pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Creates a session for a browser identity, or returns the one it already
/// has.
///
/// Idempotent per browser: an unexpired session in `created`/`paired`/
/// `active` for the same identity is returned unchanged, so a page reload
/// never mints a second code. Otherwise draws random 4-digit codes until one
/// does not collide with any live session, bounded by
/// `policy.max_code_draws`.
///
/// # Errors
///
/// Returns [`SessionError::CodeSpaceExhausted`] when every draw collided —
/// a capacity fault, not caller error.
pub fn create_session(
    conn: &Connection,
    browser_id: &str,
    policy: SessionPolicy,
    now: DateTime<Utc>,
) -> Result<Session, SessionError> {
    let now_ts = format_ts(now);

    let existing = conn
        .query_row(
            &format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE browser_id = ?1 AND status IN {LIVE_STATUSES} AND expires_at > ?2
                 ORDER BY created_at DESC LIMIT 1"
            ),
            params![browser_id, now_ts],
            map_row_to_session,
        )
        .optional()?;
    if let Some(session) = existing {
        return Ok(session);
    }

    let expires_at = format_ts(now + Duration::seconds(i64::from(policy.session_ttl_secs)));

    // The draw-check-insert sequence runs inside one transaction so a
    // concurrent creator cannot slip the same code in between the collision
    // check and our insert.
    let tx = conn.unchecked_transaction()?;
    let mut rng = rand::thread_rng();

    for _ in 0..policy.max_code_draws {
        let code = format!("{:04}", rng.gen_range(0..10_000));

        let taken: bool = tx.query_row(
            &format!(
                "SELECT EXISTS(
                     SELECT 1 FROM sessions
                     WHERE code = ?1 AND status IN {LIVE_STATUSES} AND expires_at > ?2
                 )"
            ),
            params![code, now_ts],
            |row| row.get(0),
        )?;
        if taken {
            continue;
        }

        let id = Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO sessions
                (id, browser_id, code, status, created_at, expires_at, active_until)
             VALUES (?1, ?2, ?3, 'created', ?4, ?5, ?5)",
            params![id, browser_id, code, now_ts, expires_at],
        )?;
        tx.commit()?;

        tracing::info!(session_id = %id, code, "created pairing session");

        return Ok(Session {
            id,
            browser_id: browser_id.to_string(),
            code,
            status: SessionStatus::Created,
            caller_name: None,
            caller_phone: None,
            call_leg_id: None,
            created_at: now_ts.clone(),
            expires_at: expires_at.clone(),
            active_until: expires_at,
        });
    }

    Err(SessionError::CodeSpaceExhausted {
        attempts: policy.max_code_draws,
    })
}

/// Looks up the session a spoken code refers to.
///
/// Only sessions in `created` and unexpired match: a code is only askable
/// before pairing, so a third party can never reuse a claimed code.
pub fn find_session_by_code(
    conn: &Connection,
    code: &str,
    now: DateTime<Utc>,
) -> Result<Option<Session>, SessionError> {
    let session = conn
        .query_row(
            &format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE code = ?1 AND status = 'created' AND expires_at > ?2"
            ),
            params![code, format_ts(now)],
            map_row_to_session,
        )
        .optional()?;
    Ok(session)
}

/// Claims a session for a caller: the sole `created → paired` transition.
///
/// A single conditional `UPDATE` keyed on `status = 'created'` and the
/// expiry makes the claim atomic — of two callers racing on one code,
/// exactly one sees the row transition; the other gets
/// [`SessionError::NotFound`]. Stamps caller identity, extends both TTLs to
/// the longer paired TTL, and appends the `paired` event. The appended
/// event is returned so the caller can broadcast it.
pub fn pair_session(
    conn: &Connection,
    session_id: &str,
    caller_id: &str,
    caller_name: &str,
    call_leg_id: &str,
    policy: SessionPolicy,
    now: DateTime<Utc>,
) -> Result<(Session, SessionEvent), SessionError> {
    let until = format_ts(now + Duration::seconds(i64::from(policy.paired_ttl_secs)));

    let count = conn.execute(
        "UPDATE sessions SET
            status = 'paired',
            caller_phone = ?2,
            caller_name = ?3,
            call_leg_id = ?4,
            expires_at = ?5,
            active_until = ?5
         WHERE id = ?1 AND status = 'created' AND expires_at > ?6",
        params![session_id, caller_id, caller_name, call_leg_id, until, format_ts(now)],
    )?;
    if count == 0 {
        return Err(SessionError::NotFound(session_id.to_string()));
    }

    let event = append_event(
        conn,
        session_id,
        &EventPayload::Paired {
            caller_name: caller_name.to_string(),
            caller_phone: caller_id.to_string(),
            call_leg_id: call_leg_id.to_string(),
        },
        now,
    )?;

    let session = get_session(conn, session_id, now)?;
    Ok((session, event))
}

/// Pushes a session's TTLs forward by the paired TTL.
///
/// Called after every successful conversation step so a slow talker never
/// times out mid-flow.
pub fn extend_session(
    conn: &Connection,
    session_id: &str,
    policy: SessionPolicy,
    now: DateTime<Utc>,
) -> Result<(), SessionError> {
    let until = format_ts(now + Duration::seconds(i64::from(policy.paired_ttl_secs)));
    let count = conn.execute(
        "UPDATE sessions SET expires_at = ?2, active_until = ?2
         WHERE id = ?1 AND status IN ('paired', 'active')",
        params![session_id, until],
    )?;
    if count == 0 {
        return Err(SessionError::NotFound(session_id.to_string()));
    }
    Ok(())
}

/// Overwrites the stored caller phone number with a captured callback
/// number. The inbound caller-ID and the callback number share this one
/// field.
pub fn update_session_phone(
    conn: &Connection,
    session_id: &str,
    number: &str,
) -> Result<(), SessionError> {
    let count = conn.execute(
        "UPDATE sessions SET caller_phone = ?2 WHERE id = ?1",
        params![session_id, number],
    )?;
    if count == 0 {
        return Err(SessionError::NotFound(session_id.to_string()));
    }
    Ok(())
}

/// Marks a paired session `active` once its callback leg connects.
pub fn activate_session(conn: &Connection, session_id: &str) -> Result<(), SessionError> {
    let count = conn.execute(
        "UPDATE sessions SET status = 'active' WHERE id = ?1 AND status = 'paired'",
        [session_id],
    )?;
    if count == 0 {
        return Err(SessionError::NotFound(session_id.to_string()));
    }
    Ok(())
}

/// Appends one event to a session's log. Append-only: prior events are
/// never touched.
pub fn append_event(
    conn: &Connection,
    session_id: &str,
    payload: &EventPayload,
    now: DateTime<Utc>,
) -> Result<SessionEvent, SessionError> {
    let payload_json = serde_json::to_string(payload)?;

    let id = conn.query_row(
        "INSERT INTO session_events (session_id, event_type, payload_json, created_at)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING id",
        params![session_id, payload.event_type(), payload_json, format_ts(now)],
        |row| row.get::<_, i64>(0),
    )?;

    Ok(SessionEvent {
        id,
        session_id: session_id.to_string(),
        event_type: payload.event_type().to_string(),
        payload_json,
        created_at: format_ts(now),
    })
}

/// Lists a session's most recent events, newest first.
pub fn recent_events(
    conn: &Connection,
    session_id: &str,
    limit: u32,
) -> Result<Vec<SessionEvent>, SessionError> {
    let mut stmt = conn.prepare(
        "SELECT id, session_id, event_type, payload_json, created_at
         FROM session_events
         WHERE session_id = ?1
         ORDER BY id DESC
         LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![session_id, limit], |row| {
        Ok(SessionEvent {
            id: row.get(0)?,
            session_id: row.get(1)?,
            event_type: row.get(2)?,
            payload_json: row.get(3)?,
            created_at: row.get(4)?,
        })
    })?;

    let mut events = Vec::new();
    for row in rows {
        events.push(row?);
    }
    Ok(events)
}

/// Retrieves a session by id, lazily expiring it when its time has passed.
///
/// The lazy transition keeps reads truthful between sweep runs: a session
/// past `expires_at` is never observed in a live status.
pub fn get_session(
    conn: &Connection,
    session_id: &str,
    now: DateTime<Utc>,
) -> Result<Session, SessionError> {
    let mut session = conn
        .query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
            [session_id],
            map_row_to_session,
        )
        .optional()?
        .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

    if session.status != SessionStatus::Expired && session.expires_at <= format_ts(now) {
        conn.execute(
            "UPDATE sessions SET status = 'expired' WHERE id = ?1",
            [session_id],
        )?;
        session.status = SessionStatus::Expired;
    }

    Ok(session)
}

/// Bulk-expires every live session whose expiry has passed. Returns the
/// number of sessions transitioned.
///
/// Safe to run concurrently with live pairing: the conditional `WHERE`
/// only touches rows already past their expiry, never a session mid-flow.
pub fn sweep_expired(conn: &Connection, now: DateTime<Utc>) -> Result<usize, SessionError> {
    let count = conn.execute(
        &format!(
            "UPDATE sessions SET status = 'expired'
             WHERE status IN {LIVE_STATUSES} AND expires_at <= ?1"
        ),
        [format_ts(now)],
    )?;
    Ok(count)
}

const SESSION_COLUMNS: &str = "id, browser_id, code, status, caller_name, caller_phone, \
                               call_leg_id, created_at, expires_at, active_until";

fn map_row_to_session(row: &Row) -> rusqlite::Result<Session> {
    let status_str: String = row.get(3)?;
    let status: SessionStatus = status_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Session {
        id: row.get(0)?,
        browser_id: row.get(1)?,
        code: row.get(2)?,
        status,
        caller_name: row.get(4)?,
        caller_phone: row.get(5)?,
        call_leg_id: row.get(6)?,
        created_at: row.get(7)?,
        expires_at: row.get(8)?,
        active_until: row.get(9)?,
    })
}
