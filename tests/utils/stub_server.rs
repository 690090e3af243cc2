use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

const API_PREFIX: &str = "/api";

// ============================================================================
// Scripted replies and recorded requests
// ============================================================================

#[derive(Debug, Clone)]
pub enum StubBody {
    Json(Value),
    Raw(String),
}

#[derive(Debug, Clone)]
pub struct StubReply {
    pub status: StatusCode,
    pub body: StubBody,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path below the API prefix, still percent-encoded.
    pub path: String,
    pub query: HashMap<String, String>,
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[derive(Default)]
struct StubState {
    replies: Mutex<HashMap<String, VecDeque<StubReply>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubState {
    /// Queued replies are used in order; the last one repeats.
    fn next_reply(&self, route: &str) -> Option<StubReply> {
        let mut replies = self.replies.lock().unwrap();
        let queue = replies.get_mut(route)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

// ============================================================================
// Stub scoring service
// ============================================================================

/// Scoring service stand-in on an ephemeral local port.
///
/// Routes are keyed as `"METHOD /path"` relative to `/api`, e.g.
/// `"PATCH /sessions/7/end"`. Unscripted routes answer 404 with a
/// `NOT_FOUND` error body.
pub struct StubServer {
    pub addr: SocketAddr,
    state: Arc<StubState>,
    _handle: JoinHandle<()>,
}

impl StubServer {
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            _handle: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, API_PREFIX)
    }

    pub fn reply(&self, route: &str, status: u16, body: StubBody) -> &Self {
        let reply = StubReply {
            status: StatusCode::from_u16(status).unwrap(),
            body,
        };
        self.state
            .replies
            .lock()
            .unwrap()
            .entry(route.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn reply_json(&self, route: &str, status: u16, body: Value) -> &Self {
        self.reply(route, status, StubBody::Json(body))
    }

    pub fn reply_ok(&self, route: &str, body: Value) -> &Self {
        self.reply_json(route, 200, body)
    }

    pub fn reply_error(&self, route: &str, status: u16, code: &str, message: &str) -> &Self {
        self.reply_json(
            route,
            status,
            json!({"error": {"code": code, "message": message}}),
        )
    }

    pub fn reply_raw(&self, route: &str, status: u16, body: &str) -> &Self {
        self.reply(route, status, StubBody::Raw(body.to_string()))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, route: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.route() == route)
            .collect()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("no request reached the stub")
    }
}

async fn handle(
    State(state): State<Arc<StubState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix(API_PREFIX)
        .unwrap_or(uri.path())
        .to_string();
    let recorded = RecordedRequest {
        method: method.to_string(),
        path,
        query: parse_query(uri.query()),
        headers: headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect(),
        body: serde_json::from_slice(&body).ok(),
    };
    let route = recorded.route();
    state.requests.lock().unwrap().push(recorded);

    let reply = state.next_reply(&route).unwrap_or_else(|| StubReply {
        status: StatusCode::NOT_FOUND,
        body: StubBody::Json(json!({
            "error": {"code": "NOT_FOUND", "message": format!("No stub for {}", route)}
        })),
    });

    let body = match reply.body {
        StubBody::Json(value) => value.to_string(),
        StubBody::Raw(text) => text,
    };
    (
        reply.status,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}
