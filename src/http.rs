// This file contains the HTTP surface of the hub: the shared application
// state, the error type handlers return and the router tying it together.

pub mod api;
pub mod auth;
pub mod docs;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::catalog::{CatalogStore, StoreError};
use crate::config::Config;
use crate::merge::MergeError;

pub use self::auth::{GatewayClient, Sessions, SESSION_COOKIE};

/// Upper bound on accepted request bodies; spec uploads are the only
/// sizable payload.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Error returned by every handler. Serializes as
/// `{ "error": "...", "details": "..." }` with `details` only present when
/// an underlying cause exists.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("could not generate the OpenAPI specification")]
    SpecGeneration(#[source] MergeError),

    #[error("could not process the stored spec document")]
    SpecUnreadable(#[source] serde_yaml::Error),

    #[error("login is not available, no gateway is configured")]
    AuthUnavailable,

    #[error(transparent)]
    Auth(#[from] auth::AuthError),

    #[error("catalog store failure")]
    Store(#[source] StoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::SpecGeneration(_) | ApiError::SpecUnreadable(_) | ApiError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::AuthUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Auth(auth::AuthError::Rejected(_)) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::SpecGeneration(err) => Some(err.to_string()),
            ApiError::SpecUnreadable(err) => Some(err.to_string()),
            ApiError::Store(err) => Some(err.to_string()),
            _ => None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> ApiError {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        }
        let mut body = json!({ "error": self.to_string() });
        if let Some(details) = self.details() {
            body["details"] = Value::String(details);
        }
        (status, Json(body)).into_response()
    }
}

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub sessions: Sessions,
    /// `None` disables the login guard and leaves `/api` open.
    pub gateway: Option<GatewayClient>,
}

impl AppState {
    pub fn new(store: Arc<dyn CatalogStore>, config: &Config) -> AppState {
        AppState {
            store,
            sessions: Sessions::new(config.session_ttl_days),
            gateway: config.login_gateway_url.clone().map(GatewayClient::new),
        }
    }
}

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/status", get(auth::status));

    let mut catalog = Router::new()
        .route("/projects", get(api::list_projects).post(api::create_project))
        .route(
            "/projects/:id",
            put(api::update_project).delete(api::delete_project),
        )
        .route(
            "/projects/:id/versions",
            get(api::list_versions).post(api::create_version),
        )
        .route("/specs", get(api::list_specs).post(api::create_spec))
        .route(
            "/specs/:id",
            get(api::get_spec).put(api::update_spec).delete(api::delete_spec),
        )
        .route("/specs/:id/endpoints", get(api::spec_endpoints))
        .route("/versions/:id", delete(api::delete_version))
        .route(
            "/versions/:id/associations",
            get(api::list_associations).post(api::replace_associations),
        );
    if state.gateway.is_some() {
        catalog = catalog.route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));
    }

    // The login routes stay outside the guard so a session can be opened.
    let api_routes = Router::new().nest("/auth", auth_routes).merge(catalog);

    let documentation = Router::new()
        .route("/versions/:id", get(docs::version_document))
        .route("/:slug", get(docs::project_page));

    Router::new()
        .route("/health", get(api::health))
        .nest("/api", api_routes)
        .nest("/docs", documentation)
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
