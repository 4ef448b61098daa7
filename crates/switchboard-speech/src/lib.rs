//! Speech-to-structured-data normalization for the Switchboard platform.
//!
//! Inbound call audio is transcribed by the telephony collaborator; what
//! arrives here is noisy text ("the code is four eight too seven"). This
//! crate turns those transcripts into validated 4-digit pairing codes, E.164
//! phone numbers, categorical selections, and display names.
//!
//! Every function is pure, deterministic, and total: malformed input never
//! panics or errors, it produces a result whose `matched` field (or `None`)
//! says no confident value could be recovered. Results keep the raw input
//! and intermediate digit strings so callers can log them and build
//! re-prompts.
//!
//! # Normalization pipeline
//!
//! Code and phone parsing share one pipeline: lowercase, strip filler
//! phrases, then up to three extraction stages —
//!
//! 1. direct digit extraction ("4827" spoken as DTMF or read back digits),
//! 2. spoken digit-word translation, including common speech-recognition
//!    mishearings ("for" → 4, "ate" → 8, "won" → 1, "niner" → 9),
//! 3. compound-number expansion ("forty eight twenty seven" → 4827).
//!
//! The two parsers differ only in how they cut an over-long digit string:
//! codes keep the **leading** 4 digits, phone numbers keep the **trailing**
//! 10. Callers read codes front-to-back, while over-captured phone numbers
//! almost always carry a leading country/carrier artifact.

mod category;
mod code;
mod name;
mod normalize;
mod phone;

pub use category::parse_category;
pub use code::{parse_code, CodeParse};
pub use name::sanitize_name;
pub use phone::{parse_phone_number, PhoneParse};
