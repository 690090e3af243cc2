// Library crate for the math game client
// This file exposes the public API for the binary and integration tests

pub mod api;
pub mod format;
pub mod leaderboard;
pub mod metrics;
pub mod notifications;
pub mod refresh;
pub mod session;
pub mod shared;
pub mod stats;
pub mod validation;

// Re-export commonly used types for easier access in tests
pub use api::{ApiError, HttpScoringApi, ScoringApi};
pub use leaderboard::LeaderboardController;
pub use metrics::MetricsController;
pub use notifications::ErrorFeed;
pub use refresh::AutoRefresh;
pub use session::{FileSessionStore, GameSessionController, InMemorySessionStore, SessionStore};
pub use shared::{ClientConfig, ClientError};
pub use stats::{StatsController, StatsLoad};
