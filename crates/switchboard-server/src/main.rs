//! Switchboard server binary — pairs web visitors with inbound phone calls.
//!
//! Starts an axum HTTP server with structured logging, database
//! initialization, the conversation engine, the background expiry sweep,
//! and graceful shutdown on SIGTERM/SIGINT.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use switchboard_flow::{FlowConfig, FlowEngine};
use switchboard_ratelimit::RateLimitPolicy;
use switchboard_server::{app, background, config, dialer::HttpDialer, AppState};
use switchboard_sessions::SessionPolicy;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("SWITCHBOARD_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration — the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Initialize database
    let pool = switchboard_db::create_pool(
        &config.database.path,
        switchboard_db::DbRuntimeSettings {
            busy_timeout_ms: config.database.busy_timeout_ms,
            pool_max_size: config.database.pool_max_size,
        },
    )
    .expect("failed to create database pool — check database.path in config");

    {
        let conn = pool
            .get()
            .expect("failed to get database connection for migrations");
        let applied =
            switchboard_db::run_migrations(&conn).expect("failed to run database migrations");
        if applied > 0 {
            tracing::info!(count = applied, "applied database migrations");
        }
    }

    // Assemble the conversation engine
    let session_policy = SessionPolicy {
        session_ttl_secs: config.pairing.session_ttl_secs,
        paired_ttl_secs: config.pairing.paired_ttl_secs,
        max_code_draws: config.pairing.max_code_draws,
    };
    let flow_config = FlowConfig {
        session_policy,
        rate_limit_policy: RateLimitPolicy {
            max_attempts: config.pairing.rate_limit_max_attempts,
            lockout_secs: config.pairing.rate_limit_lockout_secs,
        },
        max_code_attempts: config.pairing.max_code_attempts,
        max_category_attempts: config.pairing.max_category_attempts,
        max_phone_attempts: config.pairing.max_phone_attempts,
        callback_delay_secs: config.pairing.callback_delay_secs,
        appointment_hour: config.pairing.appointment_hour,
    };

    let http_dialer = HttpDialer::new(config.telephony.clone());
    if !http_dialer.is_enabled() {
        tracing::warn!("telephony.api_url not configured — callbacks will fail into callback_failed events");
    }

    let (events_tx, _) = broadcast::channel(switchboard_server::EVENT_BROADCAST_CAPACITY);
    let engine = FlowEngine::new(
        pool.clone(),
        events_tx.clone(),
        Arc::new(http_dialer),
        flow_config,
    );

    let state = AppState {
        pool,
        engine,
        events_tx,
        session_policy,
    };

    // Background expiry sweep
    tokio::spawn(background::start_sweep_task(
        Arc::new(state.clone()),
        config.pairing.sweep_interval_secs,
    ));

    // Build application
    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting switchboard server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address — is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("switchboard server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
