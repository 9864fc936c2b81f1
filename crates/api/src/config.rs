use std::time::Duration;

use dailyspend_core::evaluator::{
    InvalidLimitSettings, LimitSettings, DEFAULT_LOCK_ATTEMPTS, DEFAULT_LOCK_WAIT,
    DEFAULT_NOTIFY_TIMEOUT, DEFAULT_OPERATOR_EMAIL,
};
use dailyspend_events::queue::DEFAULT_QUEUE_CAPACITY;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
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
    /// How long shutdown waits for the limit-check worker to drain (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration.
    pub jwt: JwtConfig,
    /// Daily-limit evaluation settings.
    pub limits: LimitConfig,
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

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            limits: LimitConfig::from_env(),
        }
    }
}

/// Daily-limit evaluation settings.
#[derive(Debug, Clone)]
pub struct LimitConfig {
    /// Operator address copied on every notification.
    pub operator_email: String,
    /// Upper bound on one notifier call.
    pub notify_timeout: Duration,
    /// Wait per attempt for a user's evaluation lock.
    pub lock_wait: Duration,
    /// Lock attempts before a check is skipped.
    pub lock_attempts: u32,
    /// Capacity of the limit-check queue.
    pub queue_capacity: usize,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            operator_email: DEFAULT_OPERATOR_EMAIL.to_string(),
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
            lock_wait: DEFAULT_LOCK_WAIT,
            lock_attempts: DEFAULT_LOCK_ATTEMPTS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl LimitConfig {
    /// Load limit settings from environment variables with defaults.
    ///
    /// | Env Var                | Default                     |
    /// |------------------------|-----------------------------|
    /// | `LIMIT_OPERATOR_EMAIL` | `operator@dailyspend.local` |
    /// | `NOTIFY_TIMEOUT_SECS`  | `10`                        |
    /// | `LIMIT_LOCK_WAIT_MS`   | `5000`                      |
    /// | `LIMIT_LOCK_ATTEMPTS`  | `3`                         |
    /// | `LIMIT_QUEUE_CAPACITY` | `1024`                      |
    ///
    /// Panics if `LIMIT_LOCK_WAIT_MS * LIMIT_LOCK_ATTEMPTS` does not exceed
    /// `NOTIFY_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let operator_email =
            std::env::var("LIMIT_OPERATOR_EMAIL").unwrap_or(defaults.operator_email);

        let notify_timeout = std::env::var("NOTIFY_TIMEOUT_SECS")
            .ok()
            .map(|v| {
                Duration::from_secs(v.parse().expect("NOTIFY_TIMEOUT_SECS must be a valid u64"))
            })
            .unwrap_or(defaults.notify_timeout);

        let lock_wait = std::env::var("LIMIT_LOCK_WAIT_MS")
            .ok()
            .map(|v| {
                Duration::from_millis(v.parse().expect("LIMIT_LOCK_WAIT_MS must be a valid u64"))
            })
            .unwrap_or(defaults.lock_wait);

        let lock_attempts: u32 = std::env::var("LIMIT_LOCK_ATTEMPTS")
            .ok()
            .map(|v| v.parse().expect("LIMIT_LOCK_ATTEMPTS must be a valid u32"))
            .unwrap_or(defaults.lock_attempts);

        let queue_capacity: usize = std::env::var("LIMIT_QUEUE_CAPACITY")
            .ok()
            .map(|v| v.parse().expect("LIMIT_QUEUE_CAPACITY must be a valid usize"))
            .unwrap_or(defaults.queue_capacity);

        let config = Self {
            operator_email,
            notify_timeout,
            lock_wait,
            lock_attempts,
            queue_capacity,
        };
        if let Err(e) = config.validate() {
            panic!("Invalid limit settings: {e}");
        }
        config
    }

    /// Check that a queued limit check can outwait one notifier call.
    pub fn validate(&self) -> Result<(), InvalidLimitSettings> {
        self.evaluator_settings().validate()
    }

    /// Evaluator settings derived from this config.
    pub fn evaluator_settings(&self) -> LimitSettings {
        LimitSettings {
            operator_email: self.operator_email.clone(),
            notify_timeout: self.notify_timeout,
            lock_wait: self.lock_wait,
            lock_attempts: self.lock_attempts,
        }
    }
}
