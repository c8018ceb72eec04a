//! Stub LINE and Gemini servers for integration tests. Each binds 127.0.0.1:0 and records what
//! it receives.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    routing::post,
    Json, Router,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One request seen by a stub.
#[derive(Debug, Clone)]
pub struct Captured {
    pub path: String,
    pub authorization: Option<String>,
    pub api_key: Option<String>,
    pub body: String,
}

#[derive(Clone, Default)]
pub struct Recorder {
    inner: Arc<Mutex<Vec<Captured>>>,
}

impl Recorder {
    pub fn requests(&self) -> Vec<Captured> {
        self.inner.lock().unwrap().clone()
    }

    fn push(&self, uri: &Uri, headers: &HeaderMap, body: &Bytes) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.inner.lock().unwrap().push(Captured {
            path: uri.path().to_string(),
            authorization: header("authorization"),
            api_key: header("x-goog-api-key"),
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }

    /// Poll until at least `n` requests arrived (or ~5s passed).
    pub async fn wait_for(&self, n: usize) -> Vec<Captured> {
        for _ in 0..100 {
            let got = self.requests();
            if got.len() >= n {
                return got;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.requests()
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

#[derive(Clone)]
struct LineStub {
    recorder: Recorder,
    status: StatusCode,
}

async fn line_message(
    State(stub): State<LineStub>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<serde_json::Value>) {
    stub.recorder.push(&uri, &headers, &body);
    if stub.status.is_success() {
        (stub.status, Json(serde_json::json!({})))
    } else {
        (stub.status, Json(serde_json::json!({ "message": "Invalid reply token" })))
    }
}

/// Stub LINE Messaging API answering `status` on reply and push. Returns (base url, recorder).
pub async fn line_stub(status: StatusCode) -> (String, Recorder) {
    let recorder = Recorder::default();
    let app = Router::new()
        .route("/v2/bot/message/reply", post(line_message))
        .route("/v2/bot/message/push", post(line_message))
        .with_state(LineStub {
            recorder: recorder.clone(),
            status,
        });
    (serve(app).await, recorder)
}

#[derive(Clone)]
struct GeminiStub {
    recorder: Recorder,
    answer: Option<String>,
    delay: Duration,
}

async fn generate_content(
    State(stub): State<GeminiStub>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<serde_json::Value>) {
    stub.recorder.push(&uri, &headers, &body);
    if !stub.delay.is_zero() {
        tokio::time::sleep(stub.delay).await;
    }
    match stub.answer {
        Some(ref text) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": text }] },
                    "finishReason": "STOP"
                }]
            })),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": { "code": 503, "message": "overloaded" } })),
        ),
    }
}

/// Stub Gemini API. `answer: None` makes every call fail with 503.
pub async fn gemini_stub(answer: Option<&str>) -> (String, Recorder) {
    slow_gemini_stub(answer, Duration::ZERO).await
}

/// Stub Gemini API that waits `delay` before answering.
pub async fn slow_gemini_stub(answer: Option<&str>, delay: Duration) -> (String, Recorder) {
    let recorder = Recorder::default();
    let app = Router::new()
        .route(
            "/v1beta/models/:model_action",
            post(generate_content),
        )
        .with_state(GeminiStub {
            recorder: recorder.clone(),
            answer: answer.map(str::to_string),
            delay,
        });
    (serve(app).await, recorder)
}

/// A local address nothing listens on.
pub fn closed_base() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind closed port");
    let addr = listener.local_addr().expect("local_addr");
    drop(listener);
    format!("http://{}", addr)
}
