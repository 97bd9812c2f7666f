#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use tts_studio::config::SessionConfig;
use tts_studio::gateway::{GatewaySettings, SynthesisGateway};
use tts_studio::queries::users as user_queries;
use tts_studio::regenerate::Regenerator;
use tts_studio::serve::{build_router, AppState};

pub const TEST_API_KEY: &str = "test-key";
/// 16000 bytes is exactly one second at 128 kbps
pub const AUDIO_LEN: usize = 16_000;

/// Recorded synthesis request as the provider saw it
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub voice_id: String,
    pub output_format: Option<String>,
    pub body: Value,
}

/// Shared switches and counters of the fake provider
#[derive(Default)]
pub struct ProviderState {
    pub synth_calls: AtomicUsize,
    pub voice_calls: AtomicUsize,
    pub fail: AtomicBool,
    pub slow: AtomicBool,
    pub requests: Mutex<Vec<SeenRequest>>,
    /// Raw request targets (path and query) of every call, routed or not
    pub uris: Mutex<Vec<String>>,
}

pub struct MockProvider {
    pub base_url: String,
    pub state: Arc<ProviderState>,
}

impl MockProvider {
    pub fn synth_calls(&self) -> usize {
        self.state.synth_calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.state.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_slow(&self, slow: bool) {
        self.state.slow.store(slow, Ordering::SeqCst);
    }

    pub fn last_request(&self) -> Option<SeenRequest> {
        self.state.requests.lock().unwrap().last().cloned()
    }

    pub fn seen_uris(&self) -> Vec<String> {
        self.state.uris.lock().unwrap().clone()
    }
}

fn record_uri(state: &ProviderState, uri: &Uri) {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    state.uris.lock().unwrap().push(target);
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("xi-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|k| k == TEST_API_KEY)
        .unwrap_or(false)
}

async fn synthesize(
    State(state): State<Arc<ProviderState>>,
    Path(voice_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    state.synth_calls.fetch_add(1, Ordering::SeqCst);
    record_uri(&state, &uri);

    if state.slow.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "bad key").into_response();
    }
    if state.fail.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "provider exploded").into_response();
    }

    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.requests.lock().unwrap().push(SeenRequest {
        voice_id,
        output_format: query.get("output_format").cloned(),
        body,
    });

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        vec![0xFFu8; AUDIO_LEN],
    )
        .into_response()
}

async fn list_voices(State(state): State<Arc<ProviderState>>, headers: HeaderMap) -> impl IntoResponse {
    state.voice_calls.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "bad key").into_response();
    }
    if state.fail.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "down").into_response();
    }
    Json(json!({
        "voices": [
            {
                "voice_id": "v1",
                "name": "Rachel",
                "description": "calm narration",
                "category": "premade",
                "labels": {"accent": "american", "gender": "female", "age": "young"}
            },
            {
                "voice_id": "v2",
                "name": "Adam",
                "category": "premium",
                "labels": {"language": "German", "use_case": "narration"}
            }
        ]
    }))
    .into_response()
}

async fn unrouted(State(state): State<Arc<ProviderState>>, uri: Uri) -> impl IntoResponse {
    record_uri(&state, &uri);
    (StatusCode::NOT_FOUND, "no such endpoint")
}

/// Start a fake provider on a random local port
pub async fn start_mock_provider() -> MockProvider {
    let state = Arc::new(ProviderState::default());
    let app = Router::new()
        .route("/v1/text-to-speech/{voice_id}", post(synthesize))
        .route("/v1/voices", get(list_voices))
        .fallback(unrouted)
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockProvider {
        base_url: format!("http://{}/v1", addr),
        state,
    }
}

pub fn gateway_for(mock: &MockProvider, timeout: Duration) -> SynthesisGateway {
    SynthesisGateway::new(GatewaySettings {
        base_url: mock.base_url.clone(),
        api_key: TEST_API_KEY.to_string(),
        model_id: "eleven_monolingual_v1".to_string(),
        output_format: "mp3_44100_128".to_string(),
        timeout,
    })
    .unwrap()
}

pub struct TestEnv {
    pub pool: SqlitePool,
    pub mock: MockProvider,
    pub regenerator: Regenerator,
    _dir: tempfile::TempDir,
}

/// Fresh database plus fake provider wired into a regenerator
pub async fn test_env() -> TestEnv {
    let (pool, dir) = tts_studio::db::create_test_connection_in_temporary_file().await;
    let mock = start_mock_provider().await;
    let regenerator = Regenerator::new(pool.clone(), gateway_for(&mock, Duration::from_secs(2)));
    TestEnv {
        pool,
        mock,
        regenerator,
        _dir: dir,
    }
}

/// Insert a user row directly (no password hashing)
pub async fn insert_user(pool: &SqlitePool, username: &str) -> i64 {
    let sql = user_queries::insert(
        username,
        &format!("{}@example.com", username),
        "00.00",
        None,
        100,
        0,
    );
    sqlx::query(&sql)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub env: TestEnv,
}

/// Full HTTP server on a random local port
pub async fn start_app() -> TestApp {
    let env = test_env().await;
    let state = Arc::new(AppState::new(
        env.regenerator.clone(),
        SessionConfig::default(),
        100,
    ));
    let app = build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
        env,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register an account and return its `sid=...` cookie pair
    pub async fn register(&self, username: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/register"))
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "password123",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        session_cookie(&resp).expect("register should set a session cookie")
    }
}

/// First Set-Cookie header of a response, parsed
pub fn set_cookie(resp: &reqwest::Response) -> Option<cookie::Cookie<'static>> {
    resp.headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| cookie::Cookie::parse(v.to_string()).ok())
}

/// `name=value` pair of the session cookie, ready for a Cookie request header
pub fn session_cookie(resp: &reqwest::Response) -> Option<String> {
    set_cookie(resp).map(|c| c.stripped().to_string())
}
