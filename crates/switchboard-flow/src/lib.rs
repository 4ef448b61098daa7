//! Pairing and conversation state machine for the Switchboard platform.
//!
//! One [`FlowEngine`] drives every call: it normalizes each caller utterance
//! (via `switchboard-speech`), consults the rate limiter, advances the
//! durable session (via `switchboard-sessions`), and answers with the next
//! thing to say. The engine speaks an abstract "transcript in, prompt out"
//! protocol: `(call_leg_id, caller_id, transcript)` in, `(say, next_step)`
//! out. Any telephony collaborator can drive it through one webhook adapter
//! instead of each integration carrying its own copy of the conversation
//! logic.
//!
//! Per-call working memory (captured name, retry counters, paired session)
//! lives in an in-memory map keyed by call-leg id. It is deliberately not
//! persisted: losing it on restart only means a caller gets asked again,
//! and the durable `Session` record is never corrupted by its loss. Once a
//! leg hangs up its entry is discarded and no further transitions happen
//! for that leg.
//!
//! Every state-advancing event is appended to the session's durable event
//! log first and then broadcast to live subscribers; the broadcast is
//! best-effort and never blocks or fails the append.

mod dialer;
mod engine;
mod error;
mod prompts;
mod schedule;

pub use dialer::{DialError, Dialer};
pub use engine::{CallState, FlowConfig, FlowEngine, FlowReply};
pub use error::FlowError;
pub use schedule::next_weekday_at;
