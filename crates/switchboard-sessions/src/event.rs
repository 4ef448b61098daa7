//! Event payloads and records for the per-session event log.

use serde::{Deserialize, Serialize};

/// Structured payloads for each session event type.
///
/// Payloads are serialized to JSON and stored in the `payload_json` column
/// of the `session_events` table; the same value is pushed verbatim to
/// browsers watching the session. Each variant corresponds to an
/// `event_type` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventPayload {
    /// A caller spoke the right code and claimed this session.
    Paired {
        /// Sanitized caller display name.
        caller_name: String,
        /// The inbound caller-ID.
        caller_phone: String,
        /// Telephony identifier for the inbound call leg.
        call_leg_id: String,
    },

    /// The caller picked an industry vertical.
    VerticalSelected {
        /// Canonical vertical key (e.g. `real_estate`).
        vertical: String,
    },

    /// The caller picked a pain point.
    PainSelected {
        /// Canonical pain key (e.g. `spam_flags`).
        pain: String,
        /// Whether this is the spam-flagging pain point; the watching page
        /// renders that one differently.
        is_spam_pain: bool,
    },

    /// A callback number was captured; the trigger is about to be scheduled.
    CallbackPreparing {
        /// The captured number in E.164 form.
        number: String,
    },

    /// The outbound callback is being dialed.
    CallbackDialing {
        /// The number being dialed.
        number: String,
    },

    /// The callback leg was answered.
    CallbackAnswered {
        /// Telephony identifier for the callback leg.
        call_leg_id: String,
    },

    /// The callback could not be connected. No automatic retry.
    CallbackFailed {
        /// Collaborator-reported reason (`busy`, `no-answer`, ...).
        reason: String,
    },

    /// The caller asked to schedule a follow-up appointment.
    ScheduleRequested,

    /// An appointment was synthesized for the next weekday.
    AppointmentScheduled {
        /// ISO 8601 timestamp of the appointment.
        scheduled_for: String,
    },

    /// The caller declined to schedule.
    ScheduleDeclined,

    /// The scripted demo finished.
    DemoCompleted,
}

impl EventPayload {
    /// Returns the canonical event type string for this payload.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Paired { .. } => "paired",
            Self::VerticalSelected { .. } => "vertical_selected",
            Self::PainSelected { .. } => "pain_selected",
            Self::CallbackPreparing { .. } => "callback_preparing",
            Self::CallbackDialing { .. } => "callback_dialing",
            Self::CallbackAnswered { .. } => "callback_answered",
            Self::CallbackFailed { .. } => "callback_failed",
            Self::ScheduleRequested => "schedule_requested",
            Self::AppointmentScheduled { .. } => "appointment_scheduled",
            Self::ScheduleDeclined => "schedule_declined",
            Self::DemoCompleted => "demo_completed",
        }
    }
}

/// A single row from the `session_events` table.
///
/// Also the record broadcast live to SSE subscribers, so durable history
/// and the push stream never disagree about shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Auto-incremented row ID; also the per-session ordering key.
    pub id: i64,
    /// The session this event belongs to.
    pub session_id: String,
    /// The event type tag (e.g. `vertical_selected`).
    pub event_type: String,
    /// The structured payload as a JSON string.
    pub payload_json: String,
    /// ISO 8601 timestamp of when the event was appended.
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_matches_serde_tag() {
        let payload = EventPayload::VerticalSelected {
            vertical: "real_estate".to_string(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"event\":\"vertical_selected\""));
        assert_eq!(payload.event_type(), "vertical_selected");
    }

    #[test]
    fn unit_variants_serialize_with_tag() {
        let json = serde_json::to_string(&EventPayload::DemoCompleted).unwrap();
        assert_eq!(json, "{\"event\":\"demo_completed\"}");
    }

    #[test]
    fn pain_payload_carries_spam_flag() {
        let payload = EventPayload::PainSelected {
            pain: "spam_flags".to_string(),
            is_spam_pain: true,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"is_spam_pain\":true"));
    }

    #[test]
    fn payload_round_trips() {
        let payload = EventPayload::Paired {
            caller_name: "Chris".to_string(),
            caller_phone: "+14155550100".to_string(),
            call_leg_id: "CA123".to_string(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        let back: EventPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }
}
