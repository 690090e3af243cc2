use serde_json::{json, Value};

// ============================================================================
// Response bodies shaped like the scoring service's
// ============================================================================

pub fn session_created(session_id: u64, player_name: &str) -> Value {
    json!({
        "sessionId": session_id,
        "playerName": player_name,
        "startedAt": "2026-10-16T09:00:00.000Z"
    })
}

pub fn session_ended(session_id: u64, total_score: i64) -> Value {
    json!({
        "sessionId": session_id,
        "finishedAt": "2026-10-16T09:04:30.000Z",
        "summary": {
            "totalQuestions": 1,
            "totalCorrect": 1,
            "totalScore": total_score
        }
    })
}

pub fn arithmetic_question(question_id: &str, text: &str) -> Value {
    json!({
        "questionId": question_id,
        "mode": "arithmetic",
        "difficulty": "easy",
        "type": "arithmetic",
        "questionText": text,
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

pub fn player_stats(player_name: &str, total_score: i64) -> Value {
    json!({
        "playerName": player_name,
        "totalSessions": 1,
        "totalQuestions": 1,
        "totalCorrect": 1,
        "totalWrong": 0,
        "accuracy": 1.0,
        "avgTimeMs": 1200.0,
        "totalScore": total_score,
        "bestScore": total_score,
        "byDifficulty": [
            {"level": "easy", "totalQuestions": 1, "accuracy": 1.0, "avgTimeMs": 1200.0}
        ]
    })
}

/// One page of a leaderboard, filled with as many rows as `total` leaves for it.
pub fn leaderboard_page(scope: &str, page: u32, limit: u32, total: u64) -> Value {
    let offset = (page - 1) * limit;
    let remaining = total.saturating_sub(u64::from(offset));
    let entries_on_page = remaining.min(u64::from(limit)) as u32;
    let entries: Vec<Value> = (0..entries_on_page)
        .map(|i| {
            let rank = offset + i + 1;
            json!({
                "rank": rank,
                "playerName": format!("player-{}", rank),
                "totalScore": 1000 - i64::from(rank),
                "totalQuestions": 50,
                "accuracy": 0.9,
                "avgTimeMs": 2000.0
            })
        })
        .collect();

    json!({
        "scope": scope,
        "updatedAt": "2026-10-16T09:00:00.000Z",
        "entries": entries,
        "pagination": {
            "limit": limit,
            "offset": offset,
            "page": page,
            "total": total,
            "hasMore": u64::from(offset + limit) < total
        }
    })
}

pub fn metrics_snapshot(total_requests: u64) -> Value {
    json!({
        "totalRequests": total_requests,
        "totalErrors": 0,
        "averageResponseTime": 8.0,
        "minResponseTime": 1.0,
        "maxResponseTime": 30.0,
        "requestsPerSecond": 0.5,
        "statusCodes": {"200": total_requests},
        "endpoints": {},
        "responseTimePercentiles": {"p50": 7.0, "p95": 20.0, "p99": 29.0},
        "uptime": 120.0,
        "timestamp": 1_760_600_000_000i64
    })
}
