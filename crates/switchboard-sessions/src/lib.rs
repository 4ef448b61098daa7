//! Session store for the Switchboard platform.
//!
//! Owns the durable `Session` record and its append-only event log:
//! creation with a collision-checked random pairing code, the
//! `created → paired → active → expired` lifecycle, TTL extension while a
//! conversation is in progress, and the periodic expiry sweep.
//!
//! All operations are synchronous functions over a `&rusqlite::Connection`;
//! async callers go through `tokio::task::spawn_blocking`. Pairing is a
//! single conditional `UPDATE` keyed on the current status so that two
//! callers racing on the same code cannot both claim it — exactly one
//! observes the transition, the other sees the session as gone.

mod error;
mod event;
mod store;

pub use error::SessionError;
pub use event::{EventPayload, SessionEvent};
pub use store::{
    activate_session, append_event, create_session, extend_session, find_session_by_code,
    format_ts, get_session, pair_session, recent_events, sweep_expired, update_session_phone,
    Session, SessionPolicy,
};
