use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::*;

/// A recorded call against the mock, with its arguments as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub operation: &'static str,
    pub args: Value,
}

/// Scripted stand-in for the scoring service.
///
/// Responses are queued per operation and consumed in order; an operation
/// with nothing queued answers with `UNKNOWN_ERROR`.
#[derive(Default)]
pub struct MockScoringApi {
    responses: Mutex<HashMap<&'static str, VecDeque<ApiResult<Value>>>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockScoringApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_ok(&self, operation: &'static str, body: Value) -> &Self {
        self.push(operation, Ok(body))
    }

    pub fn respond_err(&self, operation: &'static str, error: ApiError) -> &Self {
        self.push(operation, Err(error))
    }

    fn push(&self, operation: &'static str, response: ApiResult<Value>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, operation: &str) -> Vec<MockCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.operation == operation)
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn answer<T: DeserializeOwned>(&self, operation: &'static str, args: Value) -> ApiResult<T> {
        self.calls
            .lock()
            .unwrap()
            .push(MockCall { operation, args });

        let response = self
            .responses
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(ApiError::unknown()));

        response.map(|body| {
            serde_json::from_value(body)
                .unwrap_or_else(|e| panic!("scripted {} response has wrong shape: {}", operation, e))
        })
    }
}

#[async_trait]
impl ScoringApi for MockScoringApi {
    async fn create_session(
        &self,
        player_name: &str,
        mode: Option<GameMode>,
        difficulty: Option<Difficulty>,
    ) -> ApiResult<SessionCreated> {
        self.answer(
            "create_session",
            json!({"playerName": player_name, "mode": mode, "difficulty": difficulty}),
        )
    }

    async fn end_session(&self, session_id: SessionId) -> ApiResult<SessionEnded> {
        self.answer("end_session", json!({"sessionId": session_id}))
    }

    async fn session_summary(&self, session_id: SessionId) -> ApiResult<Value> {
        self.answer("session_summary", json!({"sessionId": session_id}))
    }

    async fn generate_question(
        &self,
        session_id: SessionId,
        mode: GameMode,
        difficulty: Difficulty,
    ) -> ApiResult<Question> {
        self.answer(
            "generate_question",
            json!({"sessionId": session_id, "mode": mode, "difficulty": difficulty}),
        )
    }

    async fn submit_answer(&self, request: &SubmitAnswerRequest) -> ApiResult<AnswerResult> {
        self.answer("submit_answer", json!(request))
    }

    async fn leaderboard(&self, query: &LeaderboardQuery) -> ApiResult<LeaderboardResponse> {
        self.answer(
            "leaderboard",
            json!({
                "scope": query.scope,
                "limit": query.limit,
                "page": query.page,
                "offset": query.offset,
            }),
        )
    }

    async fn player_stats(&self, player_name: &str) -> ApiResult<PlayerStats> {
        self.answer("player_stats", json!({"playerName": player_name}))
    }

    async fn player_metrics(&self, player_name: &str) -> ApiResult<PlayerMetrics> {
        self.answer("player_metrics", json!({"playerName": player_name}))
    }

    async fn analytics_overview(&self, level: Option<Difficulty>) -> ApiResult<Value> {
        self.answer("analytics_overview", json!({"level": level}))
    }

    async fn metrics(&self, admin_api_key: &str) -> ApiResult<MetricsSnapshot> {
        self.answer("metrics", json!({"adminApiKey": admin_api_key}))
    }

    async fn reset_metrics(&self, admin_api_key: &str) -> ApiResult<MetricsResetResponse> {
        self.answer("reset_metrics", json!({"adminApiKey": admin_api_key}))
    }
}

/// JSON fixtures shaped like real scoring-service responses.
pub mod fixtures {
    use serde_json::{json, Value};

    pub fn session_created(session_id: u64, player_name: &str) -> Value {
        json!({
            "sessionId": session_id,
            "playerName": player_name,
            "startedAt": "2026-10-16T09:00:00Z"
        })
    }

    pub fn session_ended(session_id: u64) -> Value {
        json!({
            "sessionId": session_id,
            "finishedAt": "2026-10-16T09:05:00Z",
            "summary": {"totalQuestions": 3, "totalCorrect": 2, "totalScore": 20}
        })
    }

    pub fn arithmetic_question(question_id: &str) -> Value {
        json!({
            "questionId": question_id,
            "mode": "arithmetic",
            "difficulty": "easy",
            "type": "arithmetic",
            "questionText": "40 + 2",
            "payload": {"operands": [40, 2], "operators": ["+"], "result": 42},
            "maxTimeMs": 20000
        })
    }

    pub fn answer_result(is_correct: bool, score_delta: i64, total_score: i64) -> Value {
        json!({
            "isCorrect": is_correct,
            "correctAnswer": "42",
            "scoreDelta": score_delta,
            "totalScore": total_score,
            "stats": {
                "totalQuestions": 1,
                "totalCorrect": if is_correct { 1 } else { 0 },
                "totalWrong": if is_correct { 0 } else { 1 },
                "accuracy": if is_correct { 1.0 } else { 0.0 },
                "avgTimeMs": 1200.0
            }
        })
    }

    pub fn player_stats(player_name: &str) -> Value {
        json!({
            "playerName": player_name,
            "totalSessions": 2,
            "totalQuestions": 10,
            "totalCorrect": 8,
            "totalWrong": 2,
            "accuracy": 0.8,
            "avgTimeMs": 2100.5,
            "totalScore": 80,
            "bestScore": 50,
            "byDifficulty": [
                {"level": "easy", "totalQuestions": 6, "accuracy": 1.0, "avgTimeMs": 1500.0},
                {"level": "hard", "totalQuestions": 4, "accuracy": 0.5, "avgTimeMs": null}
            ]
        })
    }

    pub fn leaderboard_page(scope: &str, page: u32, limit: u32, total: u64) -> Value {
        let offset = (page.saturating_sub(1)) * limit;
        let has_more = u64::from(offset + limit) < total;
        json!({
            "scope": scope,
            "updatedAt": "2026-10-16T09:00:00Z",
            "entries": [{
                "rank": offset + 1,
                "playerName": format!("player-{}", offset + 1),
                "totalScore": 500,
                "totalQuestions": 40,
                "accuracy": 0.9,
                "avgTimeMs": 1800.0
            }],
            "pagination": {
                "limit": limit,
                "offset": offset,
                "page": page,
                "total": total,
                "hasMore": has_more
            }
        })
    }

    pub fn metrics_snapshot(total_requests: u64) -> Value {
        json!({
            "totalRequests": total_requests,
            "totalErrors": 1,
            "averageResponseTime": 12.5,
            "minResponseTime": 2.0,
            "maxResponseTime": 80.0,
            "requestsPerSecond": 1.7,
            "statusCodes": {"200": total_requests - 1, "404": 1},
            "endpoints": {"POST /api/answers/submit": {"count": 10, "avgResponseTime": 9.1, "errors": 0}},
            "responseTimePercentiles": {"p50": 10.0, "p95": 40.0, "p99": 75.0},
            "uptime": 3600.0,
            "timestamp": 1_760_600_000_000i64
        })
    }
}
