use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::api::ApiError;
use crate::validation::ValidationError;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Delay before the single stats retry issued after a not-found response.
pub const DEFAULT_STATS_RETRY_DELAY: Duration = Duration::from_millis(1500);
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Client configuration, read from the environment with fallbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub stats_retry_delay: Duration,
    pub refresh_interval: Duration,
    /// When set, the active session id survives process restarts in this file.
    pub session_store_path: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stats_retry_delay: DEFAULT_STATS_RETRY_DELAY,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            session_store_path: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("MATHGAME_API_URL")
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.base_url);

        Self {
            base_url,
            request_timeout: millis_or(
                &lookup,
                "MATHGAME_REQUEST_TIMEOUT_MS",
                defaults.request_timeout,
            ),
            stats_retry_delay: millis_or(
                &lookup,
                "MATHGAME_STATS_RETRY_DELAY_MS",
                defaults.stats_retry_delay,
            ),
            refresh_interval: millis_or(
                &lookup,
                "MATHGAME_REFRESH_INTERVAL_MS",
                defaults.refresh_interval,
            ),
            session_store_path: lookup("MATHGAME_SESSION_FILE").filter(|p| !p.trim().is_empty()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

fn millis_or<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(key = %key, value = %raw, "Ignoring unparseable duration, using default");
                default
            }
        },
        None => default,
    }
}

/// Errors surfaced by the controllers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Precondition(String),

    #[error("Another operation is already in progress")]
    Busy,

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn precondition(message: impl Into<String>) -> Self {
        ClientError::Precondition(message.into())
    }
}

/// Scope flag shared between a controller and the work it has in flight.
///
/// Once closed, pending work must not write back into the controller's state.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn close(&self) {
        self.0.store(false, Ordering::Release);
    }
}
