// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process fake FitTrack backend and OAuth token endpoint.

use axum::{
    extract::{Form, Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fittrack_client::config::Config;
use fittrack_client::models::Credential;
use fittrack_client::services::{ApiClient, CredentialStore, SessionController};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const GOOD_CODE: &str = "good-code";
pub const LOGIN_USER: &str = "u1";
pub const LOGIN_REFRESH_TOKEN: &str = "refresh-1";
pub const EXPIRED_REFRESH_TOKEN: &str = "refresh-expired";
pub const REFRESHED_ACCESS_TOKEN: &str = "refreshed-token";

/// Identity headers seen on one backend request.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Default)]
pub struct BackendState {
    pub activities: Mutex<Vec<Value>>,
    pub recommendations: Mutex<HashMap<String, Value>>,
    pub requests: Mutex<Vec<RecordedRequest>>,
    pub token_requests: Mutex<Vec<HashMap<String, String>>>,
    pub logout_requests: Mutex<Vec<HashMap<String, String>>>,
    pub create_returns_empty: AtomicBool,
    pub require_auth: AtomicBool,
    /// Delay before the token endpoint answers, in milliseconds
    pub token_delay_ms: AtomicU64,
    next_id: AtomicUsize,
}

#[allow(dead_code)]
impl BackendState {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().last().cloned().expect("no request recorded")
    }

    pub fn token_requests(&self) -> Vec<HashMap<String, String>> {
        self.token_requests.lock().unwrap().clone()
    }

    pub fn add_recommendation(&self, activity_id: &str, body: Value) {
        self.recommendations
            .lock()
            .unwrap()
            .insert(activity_id.to_string(), body);
    }
}

pub struct FakeBackend {
    pub base_url: String,
    pub state: Arc<BackendState>,
}

#[allow(dead_code)]
impl FakeBackend {
    /// Client config pointed at this backend for both API and OAuth endpoints.
    pub fn config(&self) -> Config {
        Config {
            authorization_endpoint: format!("{}/oauth/authorize", self.base_url),
            token_endpoint: format!("{}/oauth/token", self.base_url),
            end_session_endpoint: Some(format!("{}/oauth/logout", self.base_url)),
            ..Config::default()
        }
        .with_api_url(self.base_url.clone())
    }

    pub fn api(&self, store: &CredentialStore) -> ApiClient {
        ApiClient::new(&self.config(), store.clone()).expect("client should build")
    }

    pub fn session(&self, store: &CredentialStore) -> SessionController {
        SessionController::new(&self.config(), store.clone()).expect("session should build")
    }
}

/// Start the fake backend on an ephemeral port.
pub async fn spawn_backend() -> FakeBackend {
    let state = Arc::new(BackendState::default());

    let app = Router::new()
        .route("/activities", get(list_activities).post(create_activity))
        .route("/activities/{id}", get(get_activity))
        .route("/recommendations/activity/{id}", get(get_recommendation))
        .route("/recommendations/user/{id}", get(user_recommendations))
        .route("/oauth/token", post(token))
        .route("/oauth/logout", post(logout))
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake backend");
    let addr = listener.local_addr().expect("fake backend address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake backend crashed");
    });

    FakeBackend {
        base_url: format!("http://{}", addr),
        state,
    }
}

/// Mint an HS256 JWT carrying `sub`; the client never checks the signature.
pub fn mint_jwt(sub: &str) -> String {
    #[derive(Serialize)]
    struct Claims<'a> {
        sub: &'a str,
        exp: usize,
        iat: usize,
    }

    let now = chrono::Utc::now().timestamp() as usize;
    encode(
        &Header::new(Algorithm::HS256),
        &Claims {
            sub,
            exp: now + 300,
            iat: now,
        },
        &EncodingKey::from_secret(b"fake-backend-key"),
    )
    .unwrap()
}

/// Credential as if issued by a login that happened earlier.
#[allow(dead_code)]
pub fn signed_in(token: &str, user_id: &str, expires_in: chrono::Duration, refresh: &str) -> Credential {
    Credential::authenticated(
        token,
        Some(user_id.to_string()),
        Some(chrono::Utc::now() + expires_in),
    )
    .unwrap()
    .with_refresh_token(Some(refresh.to_string()))
}

async fn record_request(
    State(state): State<Arc<BackendState>>,
    request: Request,
    next: Next,
) -> Response {
    let recorded = {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        RecordedRequest {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            authorization: header("authorization"),
            user_id: header("x-user-id"),
        }
    };

    let is_api = !recorded.path.starts_with("/oauth");
    let anonymous = recorded.authorization.is_none();
    state.requests.lock().unwrap().push(recorded);

    if is_api && anonymous && state.require_auth.load(Ordering::SeqCst) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    next.run(request).await
}

async fn list_activities(State(state): State<Arc<BackendState>>) -> Json<Vec<Value>> {
    Json(state.activities.lock().unwrap().clone())
}

async fn get_activity(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
) -> Response {
    let activities = state.activities.lock().unwrap();
    match activities.iter().find(|a| a["id"] == json!(id)) {
        Some(activity) => Json(activity.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "Activity not found").into_response(),
    }
}

async fn create_activity(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> Response {
    let calories = body["caloriesBurnt"].as_i64().unwrap_or(-1);
    if calories > 100_000 {
        return (StatusCode::BAD_REQUEST, "caloriesBurnt out of range").into_response();
    }

    let n = state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    let record = json!({
        "id": format!("act-{}", n),
        "userId": LOGIN_USER,
        "type": body["type"],
        "duration": body["duration"],
        "caloriesBurnt": body["caloriesBurnt"],
        "startTime": body.get("startTime").cloned().unwrap_or(Value::Null),
        "additionalMetrics": body["additionalMetrics"],
        // Zone-less local time, as the real backend emits it
        "createdAt": "2025-03-01T07:30:00.123",
        "updatedAt": "2025-03-01T07:30:00.123"
    });
    state.activities.lock().unwrap().push(record.clone());

    if state.create_returns_empty.load(Ordering::SeqCst) {
        StatusCode::OK.into_response()
    } else {
        (StatusCode::CREATED, Json(record)).into_response()
    }
}

async fn get_recommendation(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
) -> Response {
    match state.recommendations.lock().unwrap().get(&id) {
        Some(rec) => Json(rec.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "No recommendation found"})),
        )
            .into_response(),
    }
}

async fn user_recommendations(
    State(state): State<Arc<BackendState>>,
    Path(user_id): Path<String>,
) -> Json<Vec<Value>> {
    let recs = state.recommendations.lock().unwrap();
    Json(
        recs.values()
            .filter(|rec| rec["userId"] == json!(user_id))
            .cloned()
            .collect(),
    )
}

async fn token(
    State(state): State<Arc<BackendState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.token_requests.lock().unwrap().push(form.clone());

    let delay = state.token_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }

    let invalid_grant = || {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Token is not active"})),
        )
            .into_response()
    };

    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") => {
            let verifier_ok = form
                .get("code_verifier")
                .is_some_and(|v| v.len() >= 43);
            if form.get("code").map(String::as_str) != Some(GOOD_CODE) || !verifier_ok {
                return invalid_grant();
            }
            Json(json!({
                "access_token": mint_jwt(LOGIN_USER),
                "refresh_token": LOGIN_REFRESH_TOKEN,
                "expires_in": 300,
                "id_token": mint_jwt(LOGIN_USER),
                "token_type": "Bearer"
            }))
            .into_response()
        }
        Some("refresh_token") => {
            if form.get("refresh_token").map(String::as_str) == Some(EXPIRED_REFRESH_TOKEN) {
                return invalid_grant();
            }
            Json(json!({
                "access_token": REFRESHED_ACCESS_TOKEN,
                "expires_in": 3600,
                "token_type": "Bearer"
            }))
            .into_response()
        }
        _ => (StatusCode::BAD_REQUEST, Json(json!({"error": "unsupported_grant_type"}))).into_response(),
    }
}

async fn logout(
    State(state): State<Arc<BackendState>>,
    Form(form): Form<HashMap<String, String>>,
) -> StatusCode {
    state.logout_requests.lock().unwrap().push(form);
    StatusCode::NO_CONTENT
}
