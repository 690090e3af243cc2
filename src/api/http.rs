use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::error::{ApiError, ApiResult, ErrorEnvelope};
use super::models::*;
use super::ScoringApi;
use crate::shared::{ClientConfig, ClientError};

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";
pub const ADMIN_API_KEY_HEADER: &str = "X-Admin-API-Key";

/// reqwest-backed gateway to the scoring service.
#[derive(Debug, Clone)]
pub struct HttpScoringApi {
    client: Client,
    base_url: Url,
}

impl HttpScoringApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ClientError::Config(format!("invalid base URL '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "base URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> (RequestBuilder, String) {
        let request_id = Uuid::new_v4().to_string();
        let builder = self
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, &request_id);
        (builder, request_id)
    }

    /// Sends the request and folds every outcome into `ApiResult`.
    async fn dispatch<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        request_id: String,
    ) -> ApiResult<T> {
        let response = builder.send().await.map_err(|e| {
            warn!(request_id = %request_id, error = %e, "Request failed before a response arrived");
            ApiError::network(e.to_string()).with_request_id(request_id.clone())
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            warn!(request_id = %request_id, error = %e, "Failed to read response body");
            ApiError::network(e.to_string()).with_request_id(request_id.clone())
        })?;

        let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(request_id = %request_id, status = %status, error = %e, "Response body is not JSON");
            ApiError::network(format!("Malformed response body: {}", e))
                .with_request_id(request_id.clone())
        })?;

        if !status.is_success() {
            let mut error = serde_json::from_value::<ErrorEnvelope>(body)
                .ok()
                .and_then(|envelope| envelope.error)
                .unwrap_or_else(ApiError::unknown);
            if error.request_id.is_none() {
                error.request_id = Some(request_id.clone());
            }
            warn!(
                request_id = %request_id,
                status = %status,
                code = %error.code,
                message = %error.message,
                "Scoring service returned an error"
            );
            return Err(error);
        }

        debug!(request_id = %request_id, status = %status, "Scoring service responded");
        serde_json::from_value::<T>(body).map_err(|e| {
            warn!(request_id = %request_id, error = %e, "Response body has an unexpected shape");
            ApiError::network(format!("Malformed response body: {}", e)).with_request_id(request_id)
        })
    }
}

#[async_trait]
impl ScoringApi for HttpScoringApi {
    #[instrument(skip(self))]
    async fn create_session(
        &self,
        player_name: &str,
        mode: Option<GameMode>,
        difficulty: Option<Difficulty>,
    ) -> ApiResult<SessionCreated> {
        let body = CreateSessionRequest {
            player_name: player_name.to_string(),
            mode,
            difficulty,
        };
        let (builder, request_id) = self.request(Method::POST, self.endpoint(&["sessions"]));
        self.dispatch(builder.json(&body), request_id).await
    }

    #[instrument(skip(self))]
    async fn end_session(&self, session_id: SessionId) -> ApiResult<SessionEnded> {
        let id = session_id.to_string();
        let url = self.endpoint(&["sessions", &id, "end"]);
        let (builder, request_id) = self.request(Method::PATCH, url);
        self.dispatch(builder, request_id).await
    }

    #[instrument(skip(self))]
    async fn session_summary(&self, session_id: SessionId) -> ApiResult<Value> {
        let id = session_id.to_string();
        let url = self.endpoint(&["sessions", &id, "summary"]);
        let (builder, request_id) = self.request(Method::GET, url);
        self.dispatch(builder, request_id).await
    }

    #[instrument(skip(self))]
    async fn generate_question(
        &self,
        session_id: SessionId,
        mode: GameMode,
        difficulty: Difficulty,
    ) -> ApiResult<Question> {
        let body = GenerateQuestionRequest {
            session_id,
            mode,
            difficulty,
        };
        let url = self.endpoint(&["questions", "generate"]);
        let (builder, request_id) = self.request(Method::POST, url);
        self.dispatch(builder.json(&body), request_id).await
    }

    #[instrument(skip(self, request), fields(session_id = request.session_id))]
    async fn submit_answer(&self, request: &SubmitAnswerRequest) -> ApiResult<AnswerResult> {
        let url = self.endpoint(&["answers", "submit"]);
        let (builder, request_id) = self.request(Method::POST, url);
        self.dispatch(builder.json(request), request_id).await
    }

    #[instrument(skip(self))]
    async fn leaderboard(&self, query: &LeaderboardQuery) -> ApiResult<LeaderboardResponse> {
        let mut url = self.endpoint(&["leaderboard"]);
        let pairs = query.to_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        let (builder, request_id) = self.request(Method::GET, url);
        self.dispatch(builder, request_id).await
    }

    #[instrument(skip(self))]
    async fn player_stats(&self, player_name: &str) -> ApiResult<PlayerStats> {
        let url = self.endpoint(&["players", player_name, "stats"]);
        let (builder, request_id) = self.request(Method::GET, url);
        self.dispatch(builder, request_id).await
    }

    #[instrument(skip(self))]
    async fn player_metrics(&self, player_name: &str) -> ApiResult<PlayerMetrics> {
        let url = self.endpoint(&["players", player_name, "metrics"]);
        let (builder, request_id) = self.request(Method::GET, url);
        self.dispatch(builder, request_id).await
    }

    #[instrument(skip(self))]
    async fn analytics_overview(&self, level: Option<Difficulty>) -> ApiResult<Value> {
        let mut url = self.endpoint(&["analytics", "overview"]);
        if let Some(level) = level {
            url.query_pairs_mut().append_pair("level", level.as_ref());
        }
        let (builder, request_id) = self.request(Method::GET, url);
        self.dispatch(builder, request_id).await
    }

    #[instrument(skip(self, admin_api_key))]
    async fn metrics(&self, admin_api_key: &str) -> ApiResult<MetricsSnapshot> {
        let (builder, request_id) = self.request(Method::GET, self.endpoint(&["metrics"]));
        self.dispatch(builder.header(ADMIN_API_KEY_HEADER, admin_api_key), request_id)
            .await
    }

    #[instrument(skip(self, admin_api_key))]
    async fn reset_metrics(&self, admin_api_key: &str) -> ApiResult<MetricsResetResponse> {
        let url = self.endpoint(&["metrics", "reset"]);
        let (builder, request_id) = self.request(Method::POST, url);
        self.dispatch(builder.header(ADMIN_API_KEY_HEADER, admin_api_key), request_id)
            .await
    }
}
