// This file contains the login flow: the in-process session registry, the
// client for the external login gateway and the guard on the catalog API.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{extract::State, Json};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ApiError, AppState};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "hub_session";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("could not reach the login gateway: {0}")]
    Gateway(#[from] reqwest::Error),
    #[error("unexpected response from the login gateway: {0}")]
    BadGatewayResponse(String),
    #[error("{0}")]
    Rejected(String),
}

/// An authenticated session held in process memory.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    /// Token issued by the login gateway at authentication time.
    pub gateway_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Session registry shared across requests. Sessions live in process
/// memory, so a restart logs everyone out.
#[derive(Debug, Clone)]
pub struct Sessions {
    ttl: Duration,
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl Sessions {
    pub fn new(ttl_days: i64) -> Sessions {
        Sessions {
            ttl: Duration::days(ttl_days),
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Opens a session and returns its token. Sessions that have expired
    /// in the meantime are swept out of the registry.
    pub async fn open(&self, username: String, gateway_token: String) -> Uuid {
        let token = Uuid::new_v4();
        let now = Utc::now();
        let session = Session {
            username,
            gateway_token,
            expires_at: now + self.ttl,
        };
        let mut sessions = self.inner.write().await;
        sessions.retain(|_, session| session.expires_at > now);
        sessions.insert(token, session);
        token
    }

    /// Returns the session for `token` unless it is missing or expired.
    /// An expired entry is removed from the registry on the way out.
    pub async fn get(&self, token: &Uuid) -> Option<Session> {
        let session = self.inner.read().await.get(token)?.clone();
        if session.expires_at > Utc::now() {
            Some(session)
        } else {
            self.inner.write().await.remove(token);
            None
        }
    }

    pub async fn close(&self, token: &Uuid) {
        self.inner.write().await.remove(token);
    }

    pub fn max_age_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }
}

/// Client for the external gateway that validates credentials.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    url: String,
}

impl GatewayClient {
    pub fn new(url: String) -> GatewayClient {
        GatewayClient {
            http: reqwest::Client::new(),
            url,
        }
    }

    /// Sends the LOGON envelope to the gateway and extracts the token from
    /// its reply. A reply without a token counts as a rejection.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let envelope = json!({
            "module": "LOGON",
            "operation": "LOGON",
            "parameters": {
                "username": username,
                "password": password,
            },
        });
        let response = self.http.post(&self.url).json(&envelope).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body: Value = if text.is_empty() {
            json!({})
        } else {
            serde_json::from_str(&text)
                .map_err(|err| AuthError::BadGatewayResponse(err.to_string()))?
        };

        let rejected = !status.is_success()
            || body.get("success").and_then(Value::as_bool) == Some(false);
        if rejected {
            let message = body
                .pointer("/result/message")
                .and_then(Value::as_str)
                .unwrap_or("invalid credentials")
                .to_string();
            return Err(AuthError::Rejected(message));
        }

        match body.pointer("/result/token").and_then(Value::as_str) {
            Some(token) => Ok(token.to_string()),
            None => Err(AuthError::Rejected(
                "no token received from the authentication service".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let gateway = state.gateway.as_ref().ok_or(ApiError::AuthUnavailable)?;
    if credentials.username.is_empty() || credentials.password.is_empty() {
        return Err(ApiError::Unauthorized(
            "username and password are required".to_string(),
        ));
    }

    let gateway_token = gateway
        .authenticate(&credentials.username, &credentials.password)
        .await?;
    let token = state
        .sessions
        .open(credentials.username.clone(), gateway_token)
        .await;
    tracing::info!(username = %credentials.username, "login accepted");

    let cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; Max-Age={}",
        state.sessions.max_age_secs()
    );
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "success": true, "user": { "username": credentials.username } })),
    ))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = session_token(&headers) {
        state.sessions.close(&token).await;
    }
    let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0");
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "success": true, "message": "logout successful" })),
    )
}

/// GET /api/auth/status
pub async fn status(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    let session = match session_token(&headers) {
        Some(token) => state.sessions.get(&token).await,
        None => None,
    };
    match session {
        Some(session) => Json(json!({
            "isAuthenticated": true,
            "user": { "username": session.username },
        })),
        None => Json(json!({ "isAuthenticated": false })),
    }
}

/// Middleware protecting the catalog API. Requests without a live session
/// are rejected with 401 before they reach a handler.
pub async fn require_session<B>(
    State(state): State<AppState>,
    request: Request<B>,
    next: Next<B>,
) -> Result<Response, ApiError> {
    let token = session_token(request.headers()).ok_or_else(|| {
        ApiError::Unauthorized("not authorized, please log in".to_string())
    })?;
    if state.sessions.get(&token).await.is_none() {
        return Err(ApiError::Unauthorized(
            "session expired, please log in again".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

fn session_token(headers: &HeaderMap) -> Option<Uuid> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE {
            Uuid::parse_str(value).ok()
        } else {
            None
        }
    })
}
