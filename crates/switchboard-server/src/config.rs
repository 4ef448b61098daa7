//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Pairing and conversation flow settings.
    #[serde(default)]
    pub pairing: PairingConfig,

    /// Outbound telephony settings.
    #[serde(default)]
    pub telephony: TelephonyConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Busy timeout for SQLite connections, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "switchboard_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Pairing, rate-limit, and conversation flow tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct PairingConfig {
    /// Lifetime of a freshly created, unpaired session, in seconds.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u32,

    /// Lifetime granted at pairing and on every extension, in seconds.
    #[serde(default = "default_paired_ttl_secs")]
    pub paired_ttl_secs: u32,

    /// Bound on random code draws before session creation fails.
    #[serde(default = "default_max_code_draws")]
    pub max_code_draws: u32,

    /// Cumulative code failures tolerated within one call.
    #[serde(default = "default_max_code_attempts")]
    pub max_code_attempts: u32,

    /// Re-prompt ceiling for the vertical/pain steps. Absent means
    /// re-prompt indefinitely.
    #[serde(default)]
    pub max_category_attempts: Option<u32>,

    /// Re-prompt ceiling for the phone step. Absent means re-prompt
    /// indefinitely.
    #[serde(default)]
    pub max_phone_attempts: Option<u32>,

    /// Failed pairing attempts per caller before a lockout.
    #[serde(default = "default_rate_limit_max_attempts")]
    pub rate_limit_max_attempts: u32,

    /// Lockout duration, in seconds.
    #[serde(default = "default_rate_limit_lockout_secs")]
    pub rate_limit_lockout_secs: u32,

    /// Delay before the callback trigger fires, in seconds.
    #[serde(default = "default_callback_delay_secs")]
    pub callback_delay_secs: u64,

    /// Hour (0-23) of synthesized appointments.
    #[serde(default = "default_appointment_hour")]
    pub appointment_hour: u32,

    /// Interval between expiry sweep runs, in seconds. 0 disables the
    /// sweep.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Outbound telephony API configuration.
///
/// An empty `api_url` disables outbound dialing; callback triggers then
/// fail into `callback_failed` events instead of reaching a dead endpoint.
#[derive(Clone, Default, Deserialize)]
pub struct TelephonyConfig {
    /// Base URL of the telephony REST API.
    #[serde(default)]
    pub api_url: String,

    /// API key sent as a bearer token.
    #[serde(default)]
    pub api_key: String,

    /// Caller-ID used for outbound callbacks.
    #[serde(default)]
    pub from_number: String,
}

impl fmt::Debug for TelephonyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelephonyConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("from_number", &self.from_number)
            .finish()
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "switchboard.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_ttl_secs() -> u32 {
    600
}

fn default_paired_ttl_secs() -> u32 {
    1_800
}

fn default_max_code_draws() -> u32 {
    25
}

fn default_max_code_attempts() -> u32 {
    3
}

fn default_rate_limit_max_attempts() -> u32 {
    5
}

fn default_rate_limit_lockout_secs() -> u32 {
    600
}

fn default_callback_delay_secs() -> u64 {
    3
}

fn default_appointment_hour() -> u32 {
    10
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl_secs(),
            paired_ttl_secs: default_paired_ttl_secs(),
            max_code_draws: default_max_code_draws(),
            max_code_attempts: default_max_code_attempts(),
            max_category_attempts: None,
            max_phone_attempts: None,
            rate_limit_max_attempts: default_rate_limit_max_attempts(),
            rate_limit_lockout_secs: default_rate_limit_lockout_secs(),
            callback_delay_secs: default_callback_delay_secs(),
            appointment_hour: default_appointment_hour(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `SWITCHBOARD_HOST` overrides `server.host`
/// - `SWITCHBOARD_PORT` overrides `server.port`
/// - `SWITCHBOARD_DB_PATH` overrides `database.path`
/// - `SWITCHBOARD_LOG_LEVEL` overrides `logging.level`
/// - `SWITCHBOARD_LOG_JSON` overrides `logging.json` (set to "true")
/// - `SWITCHBOARD_TELEPHONY_URL` overrides `telephony.api_url`
/// - `SWITCHBOARD_TELEPHONY_KEY` overrides `telephony.api_key`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("SWITCHBOARD_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("SWITCHBOARD_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(db_path) = std::env::var("SWITCHBOARD_DB_PATH") {
        config.database.path = db_path;
    }
    if let Ok(level) = std::env::var("SWITCHBOARD_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("SWITCHBOARD_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(url) = std::env::var("SWITCHBOARD_TELEPHONY_URL") {
        config.telephony.api_url = url;
    }
    if let Ok(key) = std::env::var("SWITCHBOARD_TELEPHONY_KEY") {
        config.telephony.api_key = key;
    }

    Ok(config)
}
