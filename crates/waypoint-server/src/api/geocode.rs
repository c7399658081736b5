use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use waypoint_core::{ResolvedLocation, SearchSuggestion};
use waypoint_geocode::GeocodeError;

use crate::middleware::RequestId;

use super::{map_geocode_error, map_rejection, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct TextQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PointQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Forward geocoding through the fallback chain. Exhaustion answers `200`
/// with `verified: false`.
pub(super) async fn forward(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    params: Result<Query<TextQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ResolvedLocation>>, ApiError> {
    let Query(params) = params.map_err(|e| map_rejection(req_id.0.clone(), &e))?;
    let text = params.q.unwrap_or_default();
    let resolved = state
        .geocoder
        .forward(&text)
        .await
        .map_err(|e| map_geocode_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(resolved, req_id.0)))
}

pub(super) async fn reverse(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    params: Result<Query<PointQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ResolvedLocation>>, ApiError> {
    let Query(params) = params.map_err(|e| map_rejection(req_id.0.clone(), &e))?;
    let (Some(lat), Some(lng)) = (params.lat, params.lng) else {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "lat and lng are required",
        ));
    };
    let resolved = state
        .geocoder
        .reverse(lat, lng)
        .await
        .map_err(|e| map_geocode_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(resolved, req_id.0)))
}

/// Live autocomplete candidates from the configured suggestion chain.
pub(super) async fn suggest(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    params: Result<Query<TextQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<SearchSuggestion>>>, ApiError> {
    let Query(params) = params.map_err(|e| map_rejection(req_id.0.clone(), &e))?;
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(map_geocode_error(req_id.0, &GeocodeError::InvalidQuery));
    }
    let suggestions = state
        .suggestions
        .suggest(query.trim())
        .await
        .map_err(|e| map_geocode_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(suggestions, req_id.0)))
}
