use herald_core::delay::{DEFAULT_MAX_DELAY_SECS, DEFAULT_MIN_DELAY_SECS};
use herald_core::extraction::DEFAULT_MAX_EXTRACTION_COUNT;
use herald_core::job::{DEFAULT_MAX_RECIPIENTS, MAX_RECIPIENTS_LIMIT};

use crate::sessions::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE_TTL_SECS};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on each post-shutdown cleanup step, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Idle time before an operator session is dropped (default: `3600`).
    pub session_idle_ttl_secs: u64,
    /// Most operator sessions held at once (default: `10000`).
    pub max_sessions: usize,
    /// Dispatch defaults and caps.
    pub dispatch: DispatchConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `SESSION_IDLE_TTL_SECS`| `3600`                     |
    /// | `MAX_SESSIONS`         | `10000`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let session_idle_ttl_secs: u64 = std::env::var("SESSION_IDLE_TTL_SECS")
            .map(|v| v.parse().expect("SESSION_IDLE_TTL_SECS must be a valid u64"))
            .unwrap_or(DEFAULT_SESSION_IDLE_TTL_SECS);

        let max_sessions: usize = std::env::var("MAX_SESSIONS")
            .map(|v| v.parse().expect("MAX_SESSIONS must be a valid usize"))
            .unwrap_or(DEFAULT_MAX_SESSIONS);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            session_idle_ttl_secs,
            max_sessions,
            dispatch: DispatchConfig::from_env(),
        }
    }
}

/// Defaults applied to dispatch requests and the caps they are clamped to.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    /// Lower delay bound when a request omits `min_delay`.
    pub default_min_delay_secs: f64,
    /// Upper delay bound when a request omits `max_delay`.
    pub default_max_delay_secs: f64,
    /// Hard cap on recipients per job; `max_dms` is clamped to it. Never
    /// above [`MAX_RECIPIENTS_LIMIT`] (`u32::MAX`), since job counters are
    /// 32-bit.
    pub max_recipients_per_job: usize,
    /// Hard cap on a single extraction.
    pub max_extraction_count: usize,
}

impl DispatchConfig {
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `DEFAULT_MIN_DELAY_SECS` | `30`    |
    /// | `DEFAULT_MAX_DELAY_SECS` | `60`    |
    /// | `MAX_RECIPIENTS_PER_JOB` | `1000`  |
    /// | `MAX_EXTRACTION_COUNT`   | `1000`  |
    ///
    /// `MAX_RECIPIENTS_PER_JOB` is clamped to `u32::MAX`.
    pub fn from_env() -> Self {
        let default_min_delay_secs: f64 = std::env::var("DEFAULT_MIN_DELAY_SECS")
            .map(|v| v.parse().expect("DEFAULT_MIN_DELAY_SECS must be a number"))
            .unwrap_or(DEFAULT_MIN_DELAY_SECS);

        let default_max_delay_secs: f64 = std::env::var("DEFAULT_MAX_DELAY_SECS")
            .map(|v| v.parse().expect("DEFAULT_MAX_DELAY_SECS must be a number"))
            .unwrap_or(DEFAULT_MAX_DELAY_SECS);

        assert!(
            default_min_delay_secs <= default_max_delay_secs,
            "DEFAULT_MIN_DELAY_SECS must not exceed DEFAULT_MAX_DELAY_SECS"
        );

        let max_recipients_per_job: usize = std::env::var("MAX_RECIPIENTS_PER_JOB")
            .map(|v| v.parse().expect("MAX_RECIPIENTS_PER_JOB must be a valid usize"))
            .ok()
            .map_or(DEFAULT_MAX_RECIPIENTS, clamp_recipient_cap);

        let max_extraction_count: usize = std::env::var("MAX_EXTRACTION_COUNT")
            .map(|v| v.parse().expect("MAX_EXTRACTION_COUNT must be a valid usize"))
            .unwrap_or(DEFAULT_MAX_EXTRACTION_COUNT);

        Self {
            default_min_delay_secs,
            default_max_delay_secs,
            max_recipients_per_job,
            max_extraction_count,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_min_delay_secs: DEFAULT_MIN_DELAY_SECS,
            default_max_delay_secs: DEFAULT_MAX_DELAY_SECS,
            max_recipients_per_job: DEFAULT_MAX_RECIPIENTS,
            max_extraction_count: DEFAULT_MAX_EXTRACTION_COUNT,
        }
    }
}

/// Keep a configured per-job cap within what the job counters can hold.
fn clamp_recipient_cap(configured: usize) -> usize {
    if configured > MAX_RECIPIENTS_LIMIT {
        tracing::warn!(
            configured,
            limit = MAX_RECIPIENTS_LIMIT,
            "MAX_RECIPIENTS_PER_JOB above limit, clamping"
        );
    }
    configured.min(MAX_RECIPIENTS_LIMIT)
}
