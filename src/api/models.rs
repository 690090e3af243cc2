use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Server-assigned session identifier.
pub type SessionId = u64;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum GameMode {
    Arithmetic,
    Equation,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Time window a leaderboard ranking is computed over.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaderboardScope {
    #[default]
    All,
    Weekly,
    Daily,
}

// Inbound enum values are matched case-insensitively ("EASY", "Weekly");
// outbound values are always lowercase.
macro_rules! parse_wire_enum {
    ($($ty:ty),+) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = strum::ParseError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    value.trim().parse()
                }
            }
        )+
    };
}

parse_wire_enum!(GameMode, Difficulty, LeaderboardScope);

// ----------------------------------------------------------------------------
// Sessions
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub player_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<GameMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: SessionId,
    pub player_name: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEnded {
    pub session_id: SessionId,
    pub finished_at: DateTime<Utc>,
    #[serde(default)]
    pub summary: serde_json::Value,
}

/// One play-through as the client knows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: SessionId,
    pub player_name: String,
    pub mode: Option<GameMode>,
    pub difficulty: Option<Difficulty>,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn from_created(
        created: SessionCreated,
        mode: Option<GameMode>,
        difficulty: Option<Difficulty>,
    ) -> Self {
        Self {
            session_id: created.session_id,
            player_name: created.player_name,
            mode,
            difficulty,
            started_at: created.started_at,
        }
    }
}

// ----------------------------------------------------------------------------
// Questions and answers
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionRequest {
    pub session_id: SessionId,
    pub mode: GameMode,
    pub difficulty: Difficulty,
}

/// Mode-specific question data. Arithmetic questions fill the operand
/// fields, equations fill coefficient/constant/solution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operands: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coefficient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_id: String,
    pub mode: GameMode,
    pub difficulty: Difficulty,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<GameMode>,
    pub question_text: String,
    #[serde(default)]
    pub payload: QuestionPayload,
    /// Soft time budget for answering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_time_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub user_answer: String,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

impl SubmitAnswerRequest {
    pub fn for_question(
        session_id: SessionId,
        question: &Question,
        user_answer: impl Into<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            session_id,
            question_id: Some(question.question_id.clone()),
            mode: question.mode,
            difficulty: question.difficulty,
            question_text: question.question_text.clone(),
            user_answer: user_answer.into(),
            elapsed_ms,
            correct_answer: None,
        }
    }
}

/// Running totals for the current session, as returned with each answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerStats {
    pub total_questions: u32,
    pub total_correct: u32,
    pub total_wrong: u32,
    pub accuracy: f64,
    pub avg_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub is_correct: bool,
    pub correct_answer: String,
    pub score_delta: i64,
    pub total_score: i64,
    pub stats: AnswerStats,
}

// ----------------------------------------------------------------------------
// Leaderboard
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaderboardQuery {
    pub scope: Option<LeaderboardScope>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub offset: Option<u32>,
}

impl LeaderboardQuery {
    /// Query-string pairs; unset and zero values are left out.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(scope) = self.scope {
            pairs.push(("scope", scope.to_string()));
        }
        for (key, value) in [
            ("limit", self.limit),
            ("page", self.page),
            ("offset", self.offset),
        ] {
            if let Some(value) = value.filter(|v| *v > 0) {
                pairs.push((key, value.to_string()));
            }
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub player_name: String,
    pub total_score: i64,
    pub total_questions: u32,
    pub accuracy: f64,
    #[serde(default)]
    pub avg_time_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
    #[serde(default)]
    pub page: Option<u32>,
    pub total: u64,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub scope: LeaderboardScope,
    pub updated_at: DateTime<Utc>,
    pub entries: Vec<LeaderboardEntry>,
    pub pagination: Pagination,
}

// ----------------------------------------------------------------------------
// Player stats
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyBreakdown {
    pub level: Difficulty,
    pub total_questions: u32,
    pub accuracy: f64,
    #[serde(default)]
    pub avg_time_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub player_name: String,
    pub total_sessions: u32,
    pub total_questions: u32,
    pub total_correct: u32,
    pub total_wrong: u32,
    pub accuracy: f64,
    #[serde(default)]
    pub avg_time_ms: Option<f64>,
    pub total_score: i64,
    pub best_score: i64,
    #[serde(default)]
    pub by_difficulty: Vec<DifficultyBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMetrics {
    pub player_name: String,
    pub total_sessions: u32,
    pub total_questions: u32,
    pub total_correct: u32,
    pub total_wrong: u32,
    pub accuracy: f64,
    #[serde(default)]
    pub average_response_time: Option<f64>,
    pub total_score: i64,
    pub best_score: i64,
    #[serde(default)]
    pub by_difficulty: Vec<DifficultyBreakdown>,
    pub timestamp: DateTime<Utc>,
}

// ----------------------------------------------------------------------------
// Admin metrics
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointMetrics {
    pub count: u64,
    pub avg_response_time: f64,
    pub errors: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseTimePercentiles {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Service-wide performance snapshot (60 second window) plus optional analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub average_response_time: f64,
    pub min_response_time: f64,
    pub max_response_time: f64,
    pub requests_per_second: f64,
    #[serde(default)]
    pub status_codes: HashMap<String, u64>,
    #[serde(default)]
    pub endpoints: HashMap<String, EndpointMetrics>,
    pub response_time_percentiles: ResponseTimePercentiles,
    pub uptime: f64,
    pub timestamp: i64,
    #[serde(default)]
    pub analytics: Option<Analytics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAnalytics {
    pub total: u64,
    pub today: u64,
    pub this_month: u64,
    pub active_today: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAnalytics {
    pub total: u64,
    pub active: u64,
    pub completed: u64,
    pub today: u64,
    pub this_month: u64,
    #[serde(default)]
    pub avg_duration: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnalytics {
    pub total: u64,
    pub today: u64,
    pub this_month: u64,
    pub total_correct: u64,
    pub total_wrong: u64,
    pub overall_accuracy: f64,
    pub today_accuracy: f64,
    pub this_month_accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeBreakdown {
    pub mode: GameMode,
    pub count: u64,
    pub accuracy: f64,
    #[serde(default)]
    pub avg_time_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyUsage {
    pub difficulty: Difficulty,
    pub count: u64,
    pub accuracy: f64,
    #[serde(default)]
    pub avg_time_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeDifficultyUsage {
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub count: u64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MostPlayed {
    #[serde(default)]
    pub mode: Option<GameMode>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicAnalytics {
    pub most_played: MostPlayed,
    #[serde(default)]
    pub by_mode: Vec<ModeBreakdown>,
    #[serde(default)]
    pub by_difficulty: Vec<DifficultyUsage>,
    #[serde(default)]
    pub by_mode_and_difficulty: Vec<ModeDifficultyUsage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyCount {
    pub hour: u8,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityAnalytics {
    #[serde(default)]
    pub peak_hour: Option<u8>,
    #[serde(default)]
    pub questions_per_hour: Vec<HourlyCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreAnalytics {
    pub total_score: i64,
    #[serde(default)]
    pub avg_score_per_session: Option<f64>,
    pub highest_score: i64,
    #[serde(default)]
    pub avg_score_per_question: Option<f64>,
}

/// All-time and time-bucketed analytics attached to the metrics snapshot.
///
/// The performance block is kept as raw JSON; nothing in the client reads it
/// beyond passing it to the display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub players: PlayerAnalytics,
    pub sessions: SessionAnalytics,
    pub questions: QuestionAnalytics,
    #[serde(default)]
    pub topics: TopicAnalytics,
    #[serde(default)]
    pub performance: serde_json::Value,
    #[serde(default)]
    pub activity: ActivityAnalytics,
    pub scores: ScoreAnalytics,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResetResponse {
    pub message: String,
}
