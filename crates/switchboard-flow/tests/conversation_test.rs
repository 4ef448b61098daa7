//! End-to-end conversation tests: a scripted caller drives the engine from
//! greeting to completed demo against a real (in-memory) store and a fake
//! dialer.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;

use switchboard_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use switchboard_flow::{DialError, Dialer, FlowConfig, FlowEngine};
use switchboard_ratelimit::RateLimitPolicy;
use switchboard_sessions::{create_session, recent_events, Session, SessionEvent, SessionPolicy};
use switchboard_types::{ConversationStep, DialStatus, SessionStatus};

/// Records every placed call and hands out predictable leg ids.
#[derive(Default)]
struct FakeDialer {
    calls: Mutex<Vec<(String, String, String)>>,
}

impl Dialer for FakeDialer {
    fn place_call<'a>(
        &'a self,
        to_number: &'a str,
        session_id: &'a str,
        caller_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, DialError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push((
                to_number.to_string(),
                session_id.to_string(),
                caller_name.to_string(),
            ));
            Ok(format!("CB-{session_id}"))
        })
    }
}

/// Always fails, like a telephony API outage.
struct FailingDialer;

impl Dialer for FailingDialer {
    fn place_call<'a>(
        &'a self,
        _to_number: &'a str,
        _session_id: &'a str,
        _caller_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, DialError>> + Send + 'a>> {
        Box::pin(async move { Err(DialError::Api("simulated outage".to_string())) })
    }
}

fn test_config() -> FlowConfig {
    FlowConfig {
        session_policy: SessionPolicy::default(),
        rate_limit_policy: RateLimitPolicy {
            max_attempts: 5,
            lockout_secs: 600,
        },
        max_code_attempts: 3,
        max_category_attempts: None,
        max_phone_attempts: None,
        callback_delay_secs: 0,
        appointment_hour: 10,
    }
}

struct Harness {
    pool: DbPool,
    engine: FlowEngine,
    events_rx: broadcast::Receiver<SessionEvent>,
    dialer: Arc<FakeDialer>,
}

fn harness_with(config: FlowConfig) -> Harness {
    // A single pooled connection keeps every store call on the same
    // in-memory database.
    let pool = create_pool(
        ":memory:",
        DbRuntimeSettings {
            busy_timeout_ms: 5_000,
            pool_max_size: 1,
        },
    )
    .expect("pool");
    {
        let conn = pool.get().expect("conn");
        run_migrations(&conn).expect("migrations");
    }

    let (events_tx, events_rx) = broadcast::channel(64);
    let dialer = Arc::new(FakeDialer::default());
    let engine = FlowEngine::new(pool.clone(), events_tx, dialer.clone(), config);

    Harness {
        pool,
        engine,
        events_rx,
        dialer,
    }
}

fn harness() -> Harness {
    harness_with(test_config())
}

impl Harness {
    fn make_session(&self, browser_id: &str) -> Session {
        let conn = self.pool.get().expect("conn");
        create_session(&conn, browser_id, test_config().session_policy, Utc::now())
            .expect("create session")
    }

    fn session(&self, session_id: &str) -> Session {
        let conn = self.pool.get().expect("conn");
        switchboard_sessions::get_session(&conn, session_id, Utc::now()).expect("get session")
    }

    fn event_types(&self, session_id: &str) -> Vec<String> {
        let conn = self.pool.get().expect("conn");
        recent_events(&conn, session_id, 50)
            .expect("events")
            .into_iter()
            .map(|e| e.event_type)
            .collect()
    }

    /// Polls the durable log until `event_type` shows up (deferred tasks run
    /// on their own schedule).
    async fn wait_for_event(&self, session_id: &str, event_type: &str) {
        for _ in 0..100 {
            if self.event_types(session_id).iter().any(|t| t == event_type) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("event {event_type} never appeared for session {session_id}");
    }

    /// Polls until the deferred trigger has registered the callback leg.
    async fn wait_for_leg(&self, call_leg_id: &str) {
        for _ in 0..100 {
            if self.engine.call_state(call_leg_id).is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("callback leg {call_leg_id} never registered");
    }

    /// Walks an inbound call up to the paired state. Returns the session.
    async fn pair_call(&self, leg: &str, caller: &str, name: &str) -> Session {
        let session = self.make_session(&format!("browser-for-{leg}"));

        self.engine.start_call(leg, caller);
        let reply = self
            .engine
            .handle_transcript(leg, caller, name)
            .await
            .expect("name step");
        assert_eq!(reply.next_step, ConversationStep::AwaitingCode);

        let spoken_code = session.code.clone();
        let reply = self
            .engine
            .handle_transcript(leg, caller, &spoken_code)
            .await
            .expect("code step");
        assert_eq!(reply.next_step, ConversationStep::AwaitingVertical);

        session
    }
}

#[tokio::test]
async fn full_demo_conversation() {
    let h = harness();
    let session = h.make_session("browser-1");
    let caller = "+14155550100";
    let leg = "CA-IN-1";

    // Greeting.
    let reply = h.engine.start_call(leg, caller);
    assert_eq!(reply.next_step, ConversationStep::AwaitingName);

    // Name.
    let reply = h.engine.handle_transcript(leg, caller, "Chris").await.unwrap();
    assert_eq!(reply.next_step, ConversationStep::AwaitingCode);
    assert!(reply.say.contains("Chris"));

    // Code, spoken as words.
    let spoken: String = session
        .code
        .chars()
        .map(spoken_digit)
        .collect::<Vec<_>>()
        .join(" ");
    let reply = h.engine.handle_transcript(leg, caller, &spoken).await.unwrap();
    assert_eq!(reply.next_step, ConversationStep::AwaitingVertical);

    let paired = h.session(&session.id);
    assert_eq!(paired.status, SessionStatus::Paired);
    assert_eq!(paired.caller_name.as_deref(), Some("Chris"));
    assert_eq!(paired.caller_phone.as_deref(), Some(caller));
    assert_eq!(paired.call_leg_id.as_deref(), Some(leg));

    // Vertical.
    let reply = h
        .engine
        .handle_transcript(leg, caller, "real estate")
        .await
        .unwrap();
    assert_eq!(reply.next_step, ConversationStep::AwaitingPain);

    // Pain.
    let reply = h
        .engine
        .handle_transcript(leg, caller, "spam flags")
        .await
        .unwrap();
    assert_eq!(reply.next_step, ConversationStep::AwaitingPhone);

    // Phone.
    let reply = h
        .engine
        .handle_transcript(leg, caller, "four one five five five five one two three four")
        .await
        .unwrap();
    assert_eq!(reply.next_step, ConversationStep::CallbackScheduled);

    // The deferred trigger dials the captured number.
    h.wait_for_event(&session.id, "callback_dialing").await;
    {
        let calls = h.dialer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "+14155551234");
        assert_eq!(calls[0].2, "Chris");
    }

    // The captured callback number overwrote the inbound caller-ID.
    assert_eq!(
        h.session(&session.id).caller_phone.as_deref(),
        Some("+14155551234")
    );

    // Callback answers; the session goes active and the schedule question
    // is spoken on the new leg.
    let cb_leg = format!("CB-{}", session.id);
    h.wait_for_leg(&cb_leg).await;
    let reply = h
        .engine
        .handle_dial_status(&cb_leg, &session.id, DialStatus::Answered)
        .await
        .unwrap()
        .expect("answered should produce a prompt");
    assert!(reply.say.contains("Chris"));
    assert_eq!(h.session(&session.id).status, SessionStatus::Active);

    // Affirmative scheduling answer.
    let reply = h
        .engine
        .handle_transcript(&cb_leg, "+14155551234", "yes please")
        .await
        .unwrap();
    assert_eq!(reply.next_step, ConversationStep::Completed);
    assert!(reply.say.contains("booked"));

    let types = h.event_types(&session.id);
    // Newest first.
    assert_eq!(
        types,
        vec![
            "demo_completed",
            "appointment_scheduled",
            "schedule_requested",
            "callback_answered",
            "callback_dialing",
            "callback_preparing",
            "pain_selected",
            "vertical_selected",
            "paired",
        ]
    );
}

#[tokio::test]
async fn broadcasts_mirror_the_durable_log() {
    let mut h = harness();
    let session = h.pair_call("CA-IN-2", "+14155550101", "Dana").await;

    let event = h.events_rx.recv().await.expect("paired broadcast");
    assert_eq!(event.event_type, "paired");
    assert_eq!(event.session_id, session.id);
    assert!(event.payload_json.contains("Dana"));

    h.engine
        .handle_transcript("CA-IN-2", "+14155550101", "insurance")
        .await
        .unwrap();
    let event = h.events_rx.recv().await.expect("vertical broadcast");
    assert_eq!(event.event_type, "vertical_selected");
    assert!(event.payload_json.contains("insurance"));
}

#[tokio::test]
async fn wrong_code_reprompts_then_hangs_up() {
    let h = harness();
    let caller = "+14155550102";
    let leg = "CA-IN-3";

    h.engine.start_call(leg, caller);
    h.engine.handle_transcript(leg, caller, "Chris").await.unwrap();

    // No session holds this code: two re-prompts, then the hangup message.
    for _ in 0..2 {
        let reply = h.engine.handle_transcript(leg, caller, "0000").await.unwrap();
        assert_eq!(reply.next_step, ConversationStep::AwaitingCode);
    }
    let reply = h.engine.handle_transcript(leg, caller, "0000").await.unwrap();
    assert_eq!(reply.next_step, ConversationStep::Failed);
    assert!(reply.say.contains("webpage"));

    // The leg's ephemeral state is gone.
    assert!(h.engine.call_state(leg).is_none());
}

#[tokio::test]
async fn unparseable_code_counts_like_a_wrong_code() {
    let h = harness();
    let caller = "+14155550103";
    let leg = "CA-IN-4";

    h.engine.start_call(leg, caller);
    h.engine.handle_transcript(leg, caller, "Chris").await.unwrap();

    let reply = h
        .engine
        .handle_transcript(leg, caller, "banana banana")
        .await
        .unwrap();
    assert_eq!(reply.next_step, ConversationStep::AwaitingCode);

    // The parse failure consumed rate-limit budget too.
    let conn = h.pool.get().unwrap();
    let decision = switchboard_ratelimit::check_rate_limit(
        &conn,
        caller,
        test_config().rate_limit_policy,
        Utc::now(),
    )
    .unwrap();
    assert_eq!(decision.remaining_attempts, Some(4));
}

#[tokio::test]
async fn locked_out_caller_is_turned_away_across_calls() {
    let mut config = test_config();
    config.rate_limit_policy = RateLimitPolicy {
        max_attempts: 2,
        lockout_secs: 600,
    };
    let h = harness_with(config);
    let caller = "+14155550104";

    // First call burns the whole budget.
    h.engine.start_call("CA-A", caller);
    h.engine.handle_transcript("CA-A", caller, "Chris").await.unwrap();
    h.engine.handle_transcript("CA-A", caller, "0000").await.unwrap();
    h.engine.handle_transcript("CA-A", caller, "0000").await.unwrap();

    // A brand-new call from the same number hits the lockout at the code
    // step, even with a valid code on screen.
    let session = h.make_session("browser-lock");
    h.engine.start_call("CA-B", caller);
    h.engine.handle_transcript("CA-B", caller, "Chris").await.unwrap();
    let reply = h
        .engine
        .handle_transcript("CA-B", caller, &session.code)
        .await
        .unwrap();
    assert_eq!(reply.next_step, ConversationStep::Failed);
    assert!(reply.say.contains("wait"));

    // The session was never claimed.
    assert_eq!(h.session(&session.id).status, SessionStatus::Created);
}

#[tokio::test]
async fn successful_pairing_clears_the_rate_limit() {
    let h = harness();
    let caller = "+14155550105";
    let leg = "CA-IN-5";
    let session = h.make_session("browser-clear");

    h.engine.start_call(leg, caller);
    h.engine.handle_transcript(leg, caller, "Chris").await.unwrap();

    // One miss, then the right code.
    h.engine.handle_transcript(leg, caller, "0000").await.unwrap();
    let reply = h
        .engine
        .handle_transcript(leg, caller, &session.code)
        .await
        .unwrap();
    assert_eq!(reply.next_step, ConversationStep::AwaitingVertical);

    let conn = h.pool.get().unwrap();
    let count: u32 = conn
        .query_row(
            "SELECT COUNT(*) FROM rate_limits WHERE caller_id = ?1",
            [caller],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 0, "pairing should delete the rate-limit record");
}

#[tokio::test]
async fn category_steps_reprompt_without_limit_by_default() {
    let h = harness();
    let session = h.pair_call("CA-IN-6", "+14155550106", "Chris").await;

    for _ in 0..5 {
        let reply = h
            .engine
            .handle_transcript("CA-IN-6", "+14155550106", "mumble")
            .await
            .unwrap();
        assert_eq!(reply.next_step, ConversationStep::AwaitingVertical);
    }

    // Still advances once something matches.
    let reply = h
        .engine
        .handle_transcript("CA-IN-6", "+14155550106", "mortgage")
        .await
        .unwrap();
    assert_eq!(reply.next_step, ConversationStep::AwaitingPain);
    assert_eq!(h.event_types(&session.id)[0], "vertical_selected");
}

#[tokio::test]
async fn configured_category_ceiling_ends_the_call() {
    let mut config = test_config();
    config.max_category_attempts = Some(2);
    let h = harness_with(config);
    h.pair_call("CA-IN-7", "+14155550107", "Chris").await;

    let reply = h
        .engine
        .handle_transcript("CA-IN-7", "+14155550107", "mumble")
        .await
        .unwrap();
    assert_eq!(reply.next_step, ConversationStep::AwaitingVertical);

    let reply = h
        .engine
        .handle_transcript("CA-IN-7", "+14155550107", "mumble")
        .await
        .unwrap();
    assert_eq!(reply.next_step, ConversationStep::Failed);
    assert!(h.engine.call_state("CA-IN-7").is_none());
}

#[tokio::test]
async fn schedule_declined_still_completes_the_demo() {
    let h = harness();
    let session = h.pair_call("CA-IN-8", "+14155550108", "Chris").await;

    h.engine
        .handle_transcript("CA-IN-8", "+14155550108", "insurance")
        .await
        .unwrap();
    h.engine
        .handle_transcript("CA-IN-8", "+14155550108", "slow speed to lead")
        .await
        .unwrap();
    h.engine
        .handle_transcript("CA-IN-8", "+14155550108", "4155551234")
        .await
        .unwrap();
    h.wait_for_event(&session.id, "callback_dialing").await;

    let cb_leg = format!("CB-{}", session.id);
    h.wait_for_leg(&cb_leg).await;
    h.engine
        .handle_dial_status(&cb_leg, &session.id, DialStatus::Answered)
        .await
        .unwrap();

    let reply = h
        .engine
        .handle_transcript(&cb_leg, "+14155551234", "no thanks")
        .await
        .unwrap();
    assert_eq!(reply.next_step, ConversationStep::Completed);

    let types = h.event_types(&session.id);
    assert_eq!(types[0], "demo_completed");
    assert_eq!(types[1], "schedule_declined");
    assert!(!types.contains(&"appointment_scheduled".to_string()));
}

#[tokio::test]
async fn busy_callback_records_failure_without_retry() {
    let h = harness();
    let session = h.pair_call("CA-IN-9", "+14155550109", "Chris").await;

    h.engine
        .handle_transcript("CA-IN-9", "+14155550109", "real estate")
        .await
        .unwrap();
    h.engine
        .handle_transcript("CA-IN-9", "+14155550109", "spam")
        .await
        .unwrap();
    h.engine
        .handle_transcript("CA-IN-9", "+14155550109", "4155551234")
        .await
        .unwrap();
    h.wait_for_event(&session.id, "callback_dialing").await;

    let cb_leg = format!("CB-{}", session.id);
    h.engine
        .handle_dial_status(&cb_leg, &session.id, DialStatus::Busy)
        .await
        .unwrap();

    let types = h.event_types(&session.id);
    assert_eq!(types[0], "callback_failed");
    // One dial only — no automatic retry.
    assert_eq!(h.dialer.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn dialer_outage_becomes_a_callback_failed_event() {
    let pool = create_pool(
        ":memory:",
        DbRuntimeSettings {
            busy_timeout_ms: 5_000,
            pool_max_size: 1,
        },
    )
    .expect("pool");
    {
        let conn = pool.get().expect("conn");
        run_migrations(&conn).expect("migrations");
    }
    let (events_tx, _rx) = broadcast::channel(16);
    let engine = FlowEngine::new(
        pool.clone(),
        events_tx,
        Arc::new(FailingDialer),
        test_config(),
    );

    let conn = pool.get().unwrap();
    let session = create_session(&conn, "browser-x", SessionPolicy::default(), Utc::now()).unwrap();
    drop(conn);

    engine
        .trigger_callback(&session.id, "+14155551234", "Chris")
        .await;

    let conn = pool.get().unwrap();
    let types: Vec<String> = recent_events(&conn, &session.id, 10)
        .unwrap()
        .into_iter()
        .map(|e| e.event_type)
        .collect();
    assert_eq!(types, vec!["callback_failed", "callback_dialing"]);
}

#[tokio::test]
async fn hangup_discards_ephemeral_state() {
    let h = harness();
    let caller = "+14155550110";
    h.engine.start_call("CA-IN-10", caller);
    h.engine
        .handle_transcript("CA-IN-10", caller, "Chris")
        .await
        .unwrap();
    assert!(h.engine.call_state("CA-IN-10").is_some());

    h.engine.end_call("CA-IN-10");
    assert!(h.engine.call_state("CA-IN-10").is_none());
}

#[tokio::test]
async fn two_callers_racing_for_one_code_get_one_winner() {
    let h = harness();
    let session = h.make_session("browser-race");

    h.engine.start_call("CA-R1", "+14155550111");
    h.engine.handle_transcript("CA-R1", "+14155550111", "First").await.unwrap();
    h.engine.start_call("CA-R2", "+14155550112");
    h.engine.handle_transcript("CA-R2", "+14155550112", "Second").await.unwrap();

    let (a, b) = tokio::join!(
        h.engine.handle_transcript("CA-R1", "+14155550111", &session.code),
        h.engine.handle_transcript("CA-R2", "+14155550112", &session.code),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let winners = [&a, &b]
        .iter()
        .filter(|r| r.next_step == ConversationStep::AwaitingVertical)
        .count();
    assert_eq!(winners, 1, "exactly one caller claims the code: {a:?} {b:?}");

    let paired = h.session(&session.id);
    assert_eq!(paired.status, SessionStatus::Paired);
}

fn spoken_digit(c: char) -> &'static str {
    match c {
        '0' => "zero",
        '1' => "one",
        '2' => "two",
        '3' => "three",
        '4' => "four",
        '5' => "five",
        '6' => "six",
        '7' => "seven",
        '8' => "eight",
        '9' => "nine",
        _ => unreachable!("codes are decimal digits"),
    }
}
