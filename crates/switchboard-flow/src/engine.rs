//! The conversation engine: per-call ephemeral state and transition rules.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use chrono::{NaiveDateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use tokio::sync::broadcast;

use switchboard_db::DbPool;
use switchboard_ratelimit::{
    check_rate_limit, clear_rate_limit, record_failed_attempt, RateLimitPolicy,
};
use switchboard_sessions::{
    activate_session, append_event, extend_session, find_session_by_code, get_session,
    pair_session, update_session_phone, EventPayload, Session, SessionError, SessionEvent,
    SessionPolicy,
};
use switchboard_speech::{parse_category, parse_code, parse_phone_number, sanitize_name};
use switchboard_types::{
    ConversationStep, DialStatus, KeywordTable, SessionStatus, AFFIRMATION_TOKENS, PAIN_KEYWORDS,
    VERTICAL_KEYWORDS,
};

use crate::dialer::Dialer;
use crate::error::FlowError;
use crate::prompts;
use crate::schedule::next_weekday_at;

/// Tunables for the conversation flow.
#[derive(Debug, Clone, Copy)]
pub struct FlowConfig {
    /// TTL and code-draw policy for the session store.
    pub session_policy: SessionPolicy,
    /// Lockout policy for failed pairing attempts.
    pub rate_limit_policy: RateLimitPolicy,
    /// Cumulative code failures tolerated within one call before hanging up.
    pub max_code_attempts: u32,
    /// Re-prompt ceiling for the vertical and pain steps. `None` re-prompts
    /// indefinitely.
    pub max_category_attempts: Option<u32>,
    /// Re-prompt ceiling for the phone step. `None` re-prompts indefinitely.
    pub max_phone_attempts: Option<u32>,
    /// Delay before the callback trigger fires, giving the inbound leg time
    /// to end.
    pub callback_delay_secs: u64,
    /// Hour (0-23) of synthesized appointments.
    pub appointment_hour: u32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            session_policy: SessionPolicy::default(),
            rate_limit_policy: RateLimitPolicy::default(),
            max_code_attempts: 3,
            max_category_attempts: None,
            max_phone_attempts: None,
            callback_delay_secs: 3,
            appointment_hour: 10,
        }
    }
}

/// Ephemeral working memory for one call leg.
///
/// Lives only in the engine's in-memory map; created when the leg starts,
/// discarded on hangup. Losing it (process restart) degrades to asking the
/// caller again — the durable session is never corrupted by its loss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallState {
    /// The caller's phone identity (rate-limit key).
    pub caller_id: String,
    /// Name captured at the first step.
    pub caller_name: Option<String>,
    /// The session this leg paired to, once known.
    pub session_id: Option<String>,
    /// Current conversation step.
    pub step: ConversationStep,
    /// Cumulative code failures within this call.
    pub code_attempts: u32,
    /// Re-prompts consumed at the current category step.
    pub category_attempts: u32,
    /// Re-prompts consumed at the phone step.
    pub phone_attempts: u32,
}

impl CallState {
    fn new(caller_id: &str) -> Self {
        Self {
            caller_id: caller_id.to_string(),
            caller_name: None,
            session_id: None,
            step: ConversationStep::AwaitingName,
            code_attempts: 0,
            category_attempts: 0,
            phone_attempts: 0,
        }
    }
}

/// What to say next, and the step the call is now in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowReply {
    /// Prompt for the telephony collaborator to speak.
    pub say: String,
    /// The step the call advanced (or stayed) in.
    pub next_step: ConversationStep,
}

impl FlowReply {
    fn new(say: impl Into<String>, next_step: ConversationStep) -> Self {
        Self {
            say: say.into(),
            next_step,
        }
    }
}

/// The conversation state machine.
///
/// Cheap to clone; clones share the call-state map, the pool, and the
/// broadcast channel.
#[derive(Clone)]
pub struct FlowEngine {
    pool: DbPool,
    events_tx: broadcast::Sender<SessionEvent>,
    dialer: Arc<dyn Dialer>,
    config: FlowConfig,
    /// Per-call ephemeral state.
    ///
    /// Uses `std::sync::RwLock` intentionally: all lock acquisitions are
    /// brief HashMap operations that never span `.await` points, making a
    /// synchronous lock safe and more efficient than `tokio::sync::RwLock`.
    calls: Arc<RwLock<HashMap<String, CallState>>>,
}

impl FlowEngine {
    /// Creates an engine over a database pool, an event broadcast channel,
    /// and an outbound-call collaborator.
    pub fn new(
        pool: DbPool,
        events_tx: broadcast::Sender<SessionEvent>,
        dialer: Arc<dyn Dialer>,
        config: FlowConfig,
    ) -> Self {
        Self {
            pool,
            events_tx,
            dialer,
            config,
            calls: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers a fresh inbound call leg and returns the greeting.
    pub fn start_call(&self, call_leg_id: &str, caller_id: &str) -> FlowReply {
        tracing::info!(call_leg_id, caller_id, "inbound call started");
        self.calls_write()
            .insert(call_leg_id.to_string(), CallState::new(caller_id));
        FlowReply::new(prompts::GREETING, ConversationStep::AwaitingName)
    }

    /// Advances one conversation step for a caller utterance.
    ///
    /// An unknown leg is registered on the fly at the name step, so a missed
    /// start webhook only costs the caller a greeting.
    pub async fn handle_transcript(
        &self,
        call_leg_id: &str,
        caller_id: &str,
        transcript: &str,
    ) -> Result<FlowReply, FlowError> {
        let state = {
            let mut calls = self.calls_write();
            calls
                .entry(call_leg_id.to_string())
                .or_insert_with(|| CallState::new(caller_id))
                .clone()
        };

        tracing::debug!(call_leg_id, step = %state.step, "handling transcript");

        match state.step {
            ConversationStep::AwaitingName => Ok(self.step_name(call_leg_id, transcript)),
            ConversationStep::AwaitingCode => self.step_code(call_leg_id, &state, transcript).await,
            ConversationStep::AwaitingVertical => {
                self.step_category(
                    call_leg_id,
                    &state,
                    transcript,
                    VERTICAL_KEYWORDS,
                    CategoryStep::Vertical,
                )
                .await
            }
            ConversationStep::AwaitingPain => {
                self.step_category(
                    call_leg_id,
                    &state,
                    transcript,
                    PAIN_KEYWORDS,
                    CategoryStep::Pain,
                )
                .await
            }
            ConversationStep::AwaitingPhone => {
                self.step_phone(call_leg_id, &state, transcript).await
            }
            ConversationStep::AwaitingScheduleAnswer => {
                self.step_schedule_answer(call_leg_id, &state, transcript).await
            }
            ConversationStep::CallbackScheduled
            | ConversationStep::Completed
            | ConversationStep::Failed => {
                Ok(FlowReply::new(prompts::GOODBYE, state.step))
            }
        }
    }

    /// Feeds a dial-status callback for an outbound leg into the machine.
    ///
    /// Returns a prompt to speak on the callback leg when it answers;
    /// ringing and failure statuses produce no speech.
    pub async fn handle_dial_status(
        &self,
        call_leg_id: &str,
        session_id: &str,
        status: DialStatus,
    ) -> Result<Option<FlowReply>, FlowError> {
        tracing::info!(call_leg_id, session_id, %status, "dial status");

        match status {
            // The dialing event was already recorded when the trigger fired.
            DialStatus::Ringing => Ok(None),

            DialStatus::Answered => {
                let sid = session_id.to_string();
                let leg = call_leg_id.to_string();
                let (session, event) = self
                    .with_conn(move |conn| {
                        // A second `answered` for an already-active session
                        // is not a transition; tolerate it.
                        match activate_session(conn, &sid) {
                            Ok(()) | Err(SessionError::NotFound(_)) => {}
                            Err(e) => return Err(e.into()),
                        }
                        let event = append_event(
                            conn,
                            &sid,
                            &EventPayload::CallbackAnswered {
                                call_leg_id: leg.clone(),
                            },
                            Utc::now(),
                        )?;
                        let session = get_session(conn, &sid, Utc::now())?;
                        Ok((session, event))
                    })
                    .await?;
                self.broadcast(event);

                let name = session
                    .caller_name
                    .clone()
                    .unwrap_or_else(|| "there".to_string());
                self.with_state(call_leg_id, |s| {
                    s.step = ConversationStep::AwaitingScheduleAnswer;
                });
                Ok(Some(FlowReply::new(
                    prompts::ask_schedule(&name),
                    ConversationStep::AwaitingScheduleAnswer,
                )))
            }

            DialStatus::Busy | DialStatus::NoAnswer | DialStatus::Failed => {
                self.record_event(
                    session_id,
                    EventPayload::CallbackFailed {
                        reason: status.as_str().to_string(),
                    },
                )
                .await?;
                self.remove_state(call_leg_id);
                Ok(None)
            }
        }
    }

    /// Discards a call leg's ephemeral state on hangup.
    ///
    /// After this, no transcript or deferred work for that leg id causes any
    /// further transition.
    pub fn end_call(&self, call_leg_id: &str) {
        if self.remove_state(call_leg_id).is_some() {
            tracing::info!(call_leg_id, "call ended, state discarded");
        }
    }

    /// Returns a snapshot of a leg's ephemeral state, if it is live.
    pub fn call_state(&self, call_leg_id: &str) -> Option<CallState> {
        match self.calls.read() {
            Ok(calls) => calls.get(call_leg_id).cloned(),
            Err(poisoned) => poisoned.into_inner().get(call_leg_id).cloned(),
        }
    }

    /// Fires the deferred callback trigger for a session.
    ///
    /// Normally invoked by the deferred task spawned at the phone step;
    /// public so transports with their own scheduling can drive it directly.
    /// Failures are converted into a `callback_failed` event, never
    /// propagated.
    pub async fn trigger_callback(&self, session_id: &str, number: &str, caller_name: &str) {
        if let Err(e) = self.try_trigger_callback(session_id, number, caller_name).await {
            tracing::error!(session_id, error = %e, "callback trigger failed");
            if let Err(e2) = self
                .record_event(
                    session_id,
                    EventPayload::CallbackFailed {
                        reason: e.to_string(),
                    },
                )
                .await
            {
                tracing::error!(session_id, error = %e2, "failed to record callback failure");
            }
        }
    }

    // ── Steps ────────────────────────────────────────────────────────

    fn step_name(&self, call_leg_id: &str, transcript: &str) -> FlowReply {
        let name = sanitize_name(transcript);
        self.with_state(call_leg_id, |s| {
            s.caller_name = Some(name.clone());
            s.step = ConversationStep::AwaitingCode;
        });
        FlowReply::new(prompts::ask_code(&name), ConversationStep::AwaitingCode)
    }

    async fn step_code(
        &self,
        call_leg_id: &str,
        state: &CallState,
        transcript: &str,
    ) -> Result<FlowReply, FlowError> {
        let rate_policy = self.config.rate_limit_policy;

        // Lockout check comes first: a locked caller gets the wait time and
        // a hangup, regardless of what they said.
        let caller_id = state.caller_id.clone();
        let decision = self
            .with_conn(move |conn| {
                Ok(check_rate_limit(conn, &caller_id, rate_policy, Utc::now())?)
            })
            .await?;
        if !decision.allowed {
            self.remove_state(call_leg_id);
            let minutes = wait_minutes(decision.locked_until.as_deref());
            return Ok(FlowReply::new(
                prompts::locked_out(minutes),
                ConversationStep::Failed,
            ));
        }

        let parse = parse_code(transcript);
        tracing::debug!(
            call_leg_id,
            matched = parse.matched,
            digits = parse.normalized_digits.as_deref().unwrap_or(""),
            "code parse"
        );

        let caller_id = state.caller_id.clone();
        let caller_name = state
            .caller_name
            .clone()
            .unwrap_or_else(|| "Caller".to_string());
        let leg = call_leg_id.to_string();
        let session_policy = self.config.session_policy;

        // Lookup and claim run in one blocking closure; `pair_session` is a
        // conditional update, so a racing claim on the same code surfaces
        // here as NotFound and counts as a failed attempt.
        let outcome = self
            .with_conn(move |conn| {
                let now = Utc::now();
                let Some(code) = parse.code else {
                    let status = record_failed_attempt(conn, &caller_id, rate_policy, now)?;
                    return Ok(CodeOutcome::Failed(status.locked));
                };
                let Some(session) = find_session_by_code(conn, &code, now)? else {
                    let status = record_failed_attempt(conn, &caller_id, rate_policy, now)?;
                    return Ok(CodeOutcome::Failed(status.locked));
                };
                match pair_session(
                    conn,
                    &session.id,
                    &caller_id,
                    &caller_name,
                    &leg,
                    session_policy,
                    now,
                ) {
                    Ok((session, event)) => {
                        clear_rate_limit(conn, &caller_id)?;
                        Ok(CodeOutcome::Paired {
                            session: Box::new(session),
                            event,
                        })
                    }
                    Err(SessionError::NotFound(_)) => {
                        let status = record_failed_attempt(conn, &caller_id, rate_policy, now)?;
                        Ok(CodeOutcome::Failed(status.locked))
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .await?;

        match outcome {
            CodeOutcome::Paired { session, event } => {
                self.broadcast(event);
                self.with_state(call_leg_id, |s| {
                    s.session_id = Some(session.id.clone());
                    s.step = ConversationStep::AwaitingVertical;
                });
                tracing::info!(call_leg_id, session_id = %session.id, "call paired");
                Ok(FlowReply::new(
                    prompts::ASK_VERTICAL,
                    ConversationStep::AwaitingVertical,
                ))
            }
            CodeOutcome::Failed(_locked) => {
                let attempts = self
                    .with_state(call_leg_id, |s| {
                        s.code_attempts += 1;
                        s.code_attempts
                    })
                    .unwrap_or(self.config.max_code_attempts);

                if attempts >= self.config.max_code_attempts {
                    self.remove_state(call_leg_id);
                    Ok(FlowReply::new(
                        prompts::CODE_EXHAUSTED,
                        ConversationStep::Failed,
                    ))
                } else {
                    Ok(FlowReply::new(
                        prompts::CODE_RETRY,
                        ConversationStep::AwaitingCode,
                    ))
                }
            }
        }
    }

    async fn step_category(
        &self,
        call_leg_id: &str,
        state: &CallState,
        transcript: &str,
        table: KeywordTable,
        kind: CategoryStep,
    ) -> Result<FlowReply, FlowError> {
        let Some(session_id) = state.session_id.clone() else {
            return Ok(self.reset_leg(call_leg_id, &state.caller_id));
        };

        let Some(key) = parse_category(transcript, table) else {
            let attempts = self
                .with_state(call_leg_id, |s| {
                    s.category_attempts += 1;
                    s.category_attempts
                })
                .unwrap_or(0);

            if let Some(max) = self.config.max_category_attempts {
                if attempts >= max {
                    self.remove_state(call_leg_id);
                    return Ok(FlowReply::new(
                        prompts::RETRIES_EXHAUSTED,
                        ConversationStep::Failed,
                    ));
                }
            }
            return Ok(FlowReply::new(kind.retry_prompt(), state.step));
        };

        let payload = kind.payload(key);
        let session_policy = self.config.session_policy;
        let sid = session_id.clone();
        let event = self
            .with_conn(move |conn| {
                let now = Utc::now();
                let event = append_event(conn, &sid, &payload, now)?;
                extend_session(conn, &sid, session_policy, now)?;
                Ok(event)
            })
            .await?;
        self.broadcast(event);

        let next = kind.next_step();
        self.with_state(call_leg_id, |s| {
            s.step = next;
            s.category_attempts = 0;
        });
        tracing::info!(call_leg_id, session_id, key, step = %next, "category selected");
        Ok(FlowReply::new(kind.next_prompt(), next))
    }

    async fn step_phone(
        &self,
        call_leg_id: &str,
        state: &CallState,
        transcript: &str,
    ) -> Result<FlowReply, FlowError> {
        let Some(session_id) = state.session_id.clone() else {
            return Ok(self.reset_leg(call_leg_id, &state.caller_id));
        };

        let parse = parse_phone_number(transcript);
        let Some(number) = parse.e164 else {
            let attempts = self
                .with_state(call_leg_id, |s| {
                    s.phone_attempts += 1;
                    s.phone_attempts
                })
                .unwrap_or(0);

            if let Some(max) = self.config.max_phone_attempts {
                if attempts >= max {
                    self.remove_state(call_leg_id);
                    return Ok(FlowReply::new(
                        prompts::RETRIES_EXHAUSTED,
                        ConversationStep::Failed,
                    ));
                }
            }
            return Ok(FlowReply::new(
                prompts::PHONE_RETRY,
                ConversationStep::AwaitingPhone,
            ));
        };

        let sid = session_id.clone();
        let captured = number.clone();
        let event = self
            .with_conn(move |conn| {
                update_session_phone(conn, &sid, &captured)?;
                let event = append_event(
                    conn,
                    &sid,
                    &EventPayload::CallbackPreparing {
                        number: captured.clone(),
                    },
                    Utc::now(),
                )?;
                Ok(event)
            })
            .await?;
        self.broadcast(event);

        let caller_name = state
            .caller_name
            .clone()
            .unwrap_or_else(|| "Caller".to_string());
        self.schedule_callback(session_id.clone(), number, caller_name);

        self.with_state(call_leg_id, |s| {
            s.step = ConversationStep::CallbackScheduled;
        });
        tracing::info!(call_leg_id, session_id, "callback scheduled");
        Ok(FlowReply::new(
            prompts::CALLBACK_COMING,
            ConversationStep::CallbackScheduled,
        ))
    }

    async fn step_schedule_answer(
        &self,
        call_leg_id: &str,
        state: &CallState,
        transcript: &str,
    ) -> Result<FlowReply, FlowError> {
        let Some(session_id) = state.session_id.clone() else {
            self.remove_state(call_leg_id);
            return Ok(FlowReply::new(prompts::GOODBYE, ConversationStep::Failed));
        };

        let affirmative = is_affirmative(transcript);
        let hour = self.config.appointment_hour;
        let sid = session_id.clone();

        let (events, scheduled_for) = self
            .with_conn(move |conn| {
                let now = Utc::now();
                let mut events = Vec::new();
                let mut scheduled_for = None;

                if affirmative {
                    events.push(append_event(conn, &sid, &EventPayload::ScheduleRequested, now)?);
                    let appointment = next_weekday_at(now, hour);
                    let stamp = appointment.to_rfc3339();
                    events.push(append_event(
                        conn,
                        &sid,
                        &EventPayload::AppointmentScheduled {
                            scheduled_for: stamp.clone(),
                        },
                        now,
                    )?);
                    scheduled_for = Some(appointment);
                } else {
                    events.push(append_event(conn, &sid, &EventPayload::ScheduleDeclined, now)?);
                }

                events.push(append_event(conn, &sid, &EventPayload::DemoCompleted, now)?);
                Ok((events, scheduled_for))
            })
            .await?;
        for event in events {
            self.broadcast(event);
        }

        self.remove_state(call_leg_id);
        tracing::info!(call_leg_id, session_id, affirmative, "demo completed");

        let say = match scheduled_for {
            Some(when) => prompts::schedule_confirmed(&when.format("%A at %-I:00 %p").to_string()),
            None => prompts::SCHEDULE_DECLINED.to_string(),
        };
        Ok(FlowReply::new(say, ConversationStep::Completed))
    }

    // ── Deferred callback ────────────────────────────────────────────

    /// Spawns the fire-and-forget callback trigger task.
    fn schedule_callback(&self, session_id: String, number: String, caller_name: String) {
        let engine = self.clone();
        let delay = std::time::Duration::from_secs(self.config.callback_delay_secs);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine
                .trigger_callback(&session_id, &number, &caller_name)
                .await;
        });
    }

    async fn try_trigger_callback(
        &self,
        session_id: &str,
        number: &str,
        caller_name: &str,
    ) -> Result<(), FlowError> {
        // The session may have expired while the trigger waited; a dead
        // session gets no callback.
        let sid = session_id.to_string();
        let session: Session = self
            .with_conn(move |conn| Ok(get_session(conn, &sid, Utc::now())?))
            .await?;
        if session.status == SessionStatus::Expired {
            tracing::info!(session_id, "session expired before callback fired, skipping");
            return Ok(());
        }

        self.record_event(
            session_id,
            EventPayload::CallbackDialing {
                number: number.to_string(),
            },
        )
        .await?;

        let leg = self.dialer.place_call(number, session_id, caller_name).await?;
        tracing::info!(session_id, call_leg_id = %leg, "callback dialing");

        // Register the callback leg so its answer and schedule steps are
        // recognized.
        self.calls_write().insert(
            leg,
            CallState {
                caller_id: number.to_string(),
                caller_name: Some(caller_name.to_string()),
                session_id: Some(session_id.to_string()),
                step: ConversationStep::CallbackScheduled,
                code_attempts: 0,
                category_attempts: 0,
                phone_attempts: 0,
            },
        );
        Ok(())
    }

    // ── Plumbing ─────────────────────────────────────────────────────

    /// Runs a store operation on a pooled connection in a blocking task.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, FlowError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, FlowError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await?
    }

    /// Appends an event to the durable log, then broadcasts it.
    ///
    /// The append must succeed; the broadcast is best-effort.
    async fn record_event(
        &self,
        session_id: &str,
        payload: EventPayload,
    ) -> Result<(), FlowError> {
        let sid = session_id.to_string();
        let event = self
            .with_conn(move |conn| Ok(append_event(conn, &sid, &payload, Utc::now())?))
            .await?;
        self.broadcast(event);
        Ok(())
    }

    fn broadcast(&self, event: SessionEvent) {
        if let Err(e) = self.events_tx.send(event) {
            tracing::debug!("session event broadcast has no receivers: {e}");
        }
    }

    /// Drops a leg back to the greeting after its ephemeral state turned out
    /// to be incomplete (e.g. lost on a restart mid-conversation).
    fn reset_leg(&self, call_leg_id: &str, caller_id: &str) -> FlowReply {
        tracing::warn!(call_leg_id, "call state incomplete, restarting conversation");
        self.calls_write()
            .insert(call_leg_id.to_string(), CallState::new(caller_id));
        FlowReply::new(prompts::GREETING, ConversationStep::AwaitingName)
    }

    fn calls_write(&self) -> RwLockWriteGuard<'_, HashMap<String, CallState>> {
        match self.calls.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // A panicked thread at worst left one leg's counters stale;
                // refusing all calls over that would be worse.
                tracing::error!("call state lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn with_state<R>(&self, call_leg_id: &str, f: impl FnOnce(&mut CallState) -> R) -> Option<R> {
        self.calls_write().get_mut(call_leg_id).map(f)
    }

    fn remove_state(&self, call_leg_id: &str) -> Option<CallState> {
        self.calls_write().remove(call_leg_id)
    }
}

/// Outcome of the code step's lookup-and-claim closure.
enum CodeOutcome {
    Paired {
        session: Box<Session>,
        event: SessionEvent,
    },
    Failed(bool),
}

/// The two category steps share one transition shape.
#[derive(Debug, Clone, Copy)]
enum CategoryStep {
    Vertical,
    Pain,
}

impl CategoryStep {
    fn payload(self, key: &str) -> EventPayload {
        match self {
            Self::Vertical => EventPayload::VerticalSelected {
                vertical: key.to_string(),
            },
            Self::Pain => EventPayload::PainSelected {
                pain: key.to_string(),
                is_spam_pain: key == "spam_flags",
            },
        }
    }

    fn next_step(self) -> ConversationStep {
        match self {
            Self::Vertical => ConversationStep::AwaitingPain,
            Self::Pain => ConversationStep::AwaitingPhone,
        }
    }

    fn next_prompt(self) -> &'static str {
        match self {
            Self::Vertical => prompts::ASK_PAIN,
            Self::Pain => prompts::ASK_PHONE,
        }
    }

    fn retry_prompt(self) -> &'static str {
        match self {
            Self::Vertical => prompts::VERTICAL_RETRY,
            Self::Pain => prompts::PAIN_RETRY,
        }
    }
}

/// Whether a transcript reads as a yes at the scheduling step.
fn is_affirmative(transcript: &str) -> bool {
    transcript
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| AFFIRMATION_TOKENS.contains(&token))
}

/// Minutes (rounded up, at least 1) until a lockout expiry timestamp.
fn wait_minutes(locked_until: Option<&str>) -> i64 {
    let Some(ts) = locked_until else {
        return 1;
    };
    match NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S") {
        Ok(until) => {
            let secs = (until.and_utc() - Utc::now()).num_seconds().max(0);
            ((secs + 59) / 60).max(1)
        }
        Err(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affirmation_tokens_match_word_wise() {
        assert!(is_affirmative("yes"));
        assert!(is_affirmative("Yeah, sure!"));
        assert!(is_affirmative("absolutely, let's do it"));
        assert!(!is_affirmative("no thanks"));
        // "yesterday" contains "yes" but is not an affirmation.
        assert!(!is_affirmative("yesterday was fine"));
    }

    #[test]
    fn wait_minutes_rounds_up_and_floors_at_one() {
        assert_eq!(wait_minutes(None), 1);
        assert_eq!(wait_minutes(Some("not a timestamp")), 1);

        let soon = switchboard_ratelimit::format_ts(Utc::now() + chrono::Duration::seconds(90));
        let minutes = wait_minutes(Some(&soon));
        assert!((1..=2).contains(&minutes), "got {minutes}");

        let past = switchboard_ratelimit::format_ts(Utc::now() - chrono::Duration::seconds(90));
        assert_eq!(wait_minutes(Some(&past)), 1);
    }
}
