//! Shared types, error definitions, and constants for the Switchboard
//! platform.
//!
//! This crate provides the foundational types used across all Switchboard
//! crates: session lifecycle status, conversation step identifiers, dial
//! status codes from the telephony collaborator, and the categorical keyword
//! tables the speech normalizer matches against.
//!
//! No crate in the workspace depends on anything *except* `switchboard-types`
//! for cross-cutting type definitions. This keeps the dependency graph clean
//! and prevents circular dependencies.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a pairing session.
///
/// Sessions move strictly forward: `created` → `paired` → `active` →
/// `expired`. The expiry sweep (or a lazy read past `expires_at`) may jump
/// any non-expired status straight to `expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created by the web page; waiting for a caller to speak the code.
    Created,
    /// A caller has claimed the code; the conversation is in progress.
    Paired,
    /// The callback leg has connected.
    Active,
    /// Past its expiry timestamp; the code is free for reuse.
    Expired,
}

impl SessionStatus {
    /// Returns the canonical string label for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Paired => "paired",
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "paired" => Ok(Self::Paired),
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown session status string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown session status: {0}")]
pub struct ParseStatusError(pub String);

/// One step of the scripted phone conversation.
///
/// Each call leg holds exactly one current step; the flow engine advances it
/// in response to caller utterances and dial-status callbacks. `Completed`
/// and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStep {
    /// Waiting for the caller to say their name.
    AwaitingName,
    /// Waiting for the caller to speak the 4-digit pairing code.
    AwaitingCode,
    /// Paired; waiting for the industry vertical selection.
    AwaitingVertical,
    /// Waiting for the pain-point selection.
    AwaitingPain,
    /// Waiting for the callback phone number.
    AwaitingPhone,
    /// Callback trigger scheduled; the inbound leg is about to end.
    CallbackScheduled,
    /// Callback leg connected; waiting for a yes/no on scheduling.
    AwaitingScheduleAnswer,
    /// The demo flow finished.
    Completed,
    /// Hard exit: lockout, exhausted retries, or collaborator failure.
    Failed,
}

impl ConversationStep {
    /// Returns the canonical wire label for this step.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingName => "awaiting_name",
            Self::AwaitingCode => "awaiting_code",
            Self::AwaitingVertical => "awaiting_vertical",
            Self::AwaitingPain => "awaiting_pain",
            Self::AwaitingPhone => "awaiting_phone",
            Self::CallbackScheduled => "callback_scheduled",
            Self::AwaitingScheduleAnswer => "awaiting_schedule_answer",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the conversation is over for this call leg.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for ConversationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of an outbound callback leg, as reported by the telephony
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialStatus {
    /// The callback leg is ringing.
    Ringing,
    /// The callee picked up.
    Answered,
    /// Busy signal.
    Busy,
    /// Rang out without an answer.
    NoAnswer,
    /// The carrier or API reported a failure.
    Failed,
}

impl DialStatus {
    /// Returns the kebab-case label used on the webhook wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ringing => "ringing",
            Self::Answered => "answered",
            Self::Busy => "busy",
            Self::NoAnswer => "no-answer",
            Self::Failed => "failed",
        }
    }

    /// Whether this status means the callback will not connect.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Busy | Self::NoAnswer | Self::Failed)
    }
}

impl std::fmt::Display for DialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered categorical keyword table: `(canonical key, trigger keywords)`.
///
/// Order matters — the first entry whose any keyword is a substring of the
/// transcript wins, so broader catch-all entries belong last.
pub type KeywordTable = &'static [(&'static str, &'static [&'static str])];

/// Industry vertical keyword table.
///
/// `other` is listed last so that a transcript mentioning both a concrete
/// vertical and "something else" resolves to the concrete vertical.
pub const VERTICAL_KEYWORDS: KeywordTable = &[
    (
        "real_estate",
        &[
            "real estate",
            "realestate",
            "realtor",
            "realty",
            "property",
            "properties",
            "housing",
            "broker",
        ],
    ),
    (
        "insurance",
        &["insurance", "insure", "underwriting", "policies", "policy"],
    ),
    (
        "mortgage",
        &["mortgage", "lender", "lending", "loan", "refinance", "refi"],
    ),
    (
        "other",
        &["other", "something else", "none of those", "different"],
    ),
];

/// Pain-point keyword table.
pub const PAIN_KEYWORDS: KeywordTable = &[
    (
        "spam_flags",
        &[
            "spam",
            "flag",
            "flagged",
            "scam likely",
            "blocked",
            "caller id",
        ],
    ),
    (
        "awkward_delay",
        &["delay", "awkward", "pause", "lag", "dead air", "silence"],
    ),
    (
        "low_answer_rates",
        &[
            "answer rate",
            "answer rates",
            "pick up",
            "pickup",
            "nobody answers",
            "no one answers",
            "answer",
        ],
    ),
    (
        "speed",
        &["speed", "speed to lead", "fast", "quick", "slow", "response time"],
    ),
];

/// Tokens treated as an affirmative answer at the scheduling step.
pub const AFFIRMATION_TOKENS: &[&str] = &[
    "yes",
    "yeah",
    "sure",
    "okay",
    "yep",
    "absolutely",
    "definitely",
];
