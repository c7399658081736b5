mod geocode;
mod locations;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use waypoint_core::{HistoryError, LocationHistoryStore};
use waypoint_geocode::{GeocodeError, ProviderFallbackResolver, SuggestionSource};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
    REQUEST_ID_HEADER, USER_ID_HEADER,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LocationHistoryStore>,
    pub geocoder: ProviderFallbackResolver,
    pub suggestions: Arc<dyn SuggestionSource>,
    /// Default and cap for `?limit=` on the recents endpoint.
    pub recents_limit: usize,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    storage: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "validation_error" | "invalid_name" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_unavailable" => StatusCode::BAD_GATEWAY,
            "storage_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Defaults a `?limit=` to `cap` and clamps it into `1..=cap`.
pub(super) fn normalize_limit(limit: Option<usize>, cap: usize) -> usize {
    let cap = cap.max(1);
    limit.unwrap_or(cap).clamp(1, cap)
}

pub(super) fn map_history_error(request_id: String, error: &HistoryError) -> ApiError {
    match error {
        HistoryError::DuplicateName(_) => ApiError::new(request_id, "conflict", error.to_string()),
        HistoryError::InvalidName => ApiError::new(request_id, "invalid_name", error.to_string()),
        HistoryError::InvalidLocation => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        HistoryError::NotFound => ApiError::new(request_id, "not_found", error.to_string()),
        HistoryError::StorageUnavailable(reason) => {
            tracing::error!(%reason, "history storage unavailable");
            ApiError::new(
                request_id,
                "storage_unavailable",
                "history storage unavailable",
            )
        }
    }
}

/// Query, path and body extractor rejections go through the same envelope as
/// handler errors.
pub(super) fn map_rejection(request_id: String, rejection: &impl std::fmt::Display) -> ApiError {
    ApiError::new(request_id, "validation_error", rejection.to_string())
}

pub(super) fn map_geocode_error(request_id: String, error: &GeocodeError) -> ApiError {
    match error {
        GeocodeError::InvalidQuery | GeocodeError::InvalidCoordinates { .. } => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        GeocodeError::ProviderUnavailable { .. } | GeocodeError::NoResults { .. } => {
            tracing::warn!(error = %error, "geocoding upstream failed");
            ApiError::new(
                request_id,
                "upstream_unavailable",
                "geocoding providers unavailable",
            )
        }
        GeocodeError::MissingCredential { .. } | GeocodeError::InvalidBaseUrl { .. } => {
            tracing::error!(error = %error, "geocoding misconfigured");
            ApiError::new(request_id, "internal_error", "geocoding misconfigured")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderName::from_static(USER_ID_HEADER),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/locations/recent",
            get(locations::list_recent).post(locations::record_recent),
        )
        .route(
            "/api/v1/locations/favorites",
            get(locations::list_favorites).post(locations::create_favorite),
        )
        .route(
            "/api/v1/locations/favorites/{id}",
            delete(locations::delete_favorite),
        )
        .route("/api/v1/locations/search", get(locations::search))
        .route("/api/v1/geocode/forward", get(geocode::forward))
        .route("/api/v1/geocode/reverse", get(geocode::reverse))
        .route("/api/v1/geocode/suggest", get(geocode::suggest))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(build_cors()),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::new(
                HealthData {
                    status: "ok",
                    storage: "ok",
                },
                req_id.0,
            )),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: history storage unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::new(
                    HealthData {
                        status: "degraded",
                        storage: "unavailable",
                    },
                    req_id.0,
                )),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
