// Public API - what the controllers and the binary use
pub use error::{ApiError, ApiResult, NETWORK_ERROR, NOT_FOUND, UNKNOWN_ERROR};
pub use http::HttpScoringApi;
pub use models::*;

mod error;
mod http;
pub mod models;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;

/// One method per remote operation of the scoring service.
///
/// Implementations never retry; retry policy belongs to the caller.
#[async_trait]
pub trait ScoringApi: Send + Sync {
    async fn create_session(
        &self,
        player_name: &str,
        mode: Option<GameMode>,
        difficulty: Option<Difficulty>,
    ) -> ApiResult<SessionCreated>;

    async fn end_session(&self, session_id: SessionId) -> ApiResult<SessionEnded>;

    async fn session_summary(&self, session_id: SessionId) -> ApiResult<serde_json::Value>;

    async fn generate_question(
        &self,
        session_id: SessionId,
        mode: GameMode,
        difficulty: Difficulty,
    ) -> ApiResult<Question>;

    async fn submit_answer(&self, request: &SubmitAnswerRequest) -> ApiResult<AnswerResult>;

    async fn leaderboard(&self, query: &LeaderboardQuery) -> ApiResult<LeaderboardResponse>;

    async fn player_stats(&self, player_name: &str) -> ApiResult<PlayerStats>;

    async fn player_metrics(&self, player_name: &str) -> ApiResult<PlayerMetrics>;

    async fn analytics_overview(
        &self,
        level: Option<Difficulty>,
    ) -> ApiResult<serde_json::Value>;

    async fn metrics(&self, admin_api_key: &str) -> ApiResult<MetricsSnapshot>;

    async fn reset_metrics(&self, admin_api_key: &str) -> ApiResult<MetricsResetResponse>;
}
