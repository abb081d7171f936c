//! Shared test utilities: a mock siteverify server and a protected router
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    middleware,
    routing::post,
    Extension, Json, Router,
};
use http_body_util::BodyExt;
use recaptcha_v3::{verify_recaptcha, RecaptchaGuard, RecaptchaScore, RECAPTCHA_TOKEN_HEADER};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;
use tracing_subscriber::EnvFilter;

type RecordedRequests = Arc<Mutex<Vec<HashMap<String, String>>>>;

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    response: Value,
    requests: RecordedRequests,
}

/// Handle to a mock siteverify server listening on an ephemeral port
pub struct SiteverifyMock {
    /// Endpoint URL to point a `Verifier` at
    pub endpoint: String,
    requests: RecordedRequests,
}

impl SiteverifyMock {
    /// Query parameters of every request the mock has received
    pub fn recorded_requests(&self) -> Vec<HashMap<String, String>> {
        self.requests.lock().unwrap().clone()
    }
}

/// Spawn a mock siteverify server answering 200 with the given JSON body
pub async fn spawn_siteverify(response: Value) -> SiteverifyMock {
    spawn_siteverify_with_status(StatusCode::OK, response).await
}

/// Spawn a mock siteverify server answering with the given status and body
pub async fn spawn_siteverify_with_status(status: StatusCode, response: Value) -> SiteverifyMock {
    let requests: RecordedRequests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status,
        response,
        requests: requests.clone(),
    };

    let app = Router::new()
        .route("/siteverify", post(siteverify_handler))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock listener");
    let addr = listener.local_addr().expect("Failed to read mock address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock server failed");
    });

    SiteverifyMock {
        endpoint: format!("http://{addr}/siteverify"),
        requests,
    }
}

async fn siteverify_handler(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    state.requests.lock().unwrap().push(params);
    (state.status, Json(state.response.clone()))
}

/// Router with a single protected route that reports the attached score
/// and echoes the JSON body it received downstream
pub fn protected_router(guard: RecaptchaGuard) -> Router {
    Router::new()
        .route("/protected", post(protected_handler))
        .layer(middleware::from_fn(verify_recaptcha))
        .layer(Extension(guard))
}

async fn protected_handler(
    RecaptchaScore(score): RecaptchaScore,
    body: axum::body::Bytes,
) -> Json<Value> {
    let echo: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    Json(json!({ "score": score, "echo": echo }))
}

/// Send a POST to `/protected` with an optional JSON body and an optional
/// header token, returning the response status and parsed JSON body
pub async fn send_protected(
    router: Router,
    body: Option<Value>,
    header_token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("POST").uri("/protected");
    if body.is_some() {
        builder = builder.header(CONTENT_TYPE, "application/json");
    }
    if let Some(token) = header_token {
        builder = builder.header(RECAPTCHA_TOKEN_HEADER, token);
    }

    let request = builder
        .body(body.map_or_else(Body::empty, |value| Body::from(value.to_string())))
        .expect("Failed to build request");

    let response = router.oneshot(request).await.expect("Failed to send request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, body)
}

/// Initialize test logging once; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
