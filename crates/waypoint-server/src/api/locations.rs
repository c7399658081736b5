use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use waypoint_core::{
    FavoriteLocationEntry, FavoritePayload, HistorySearch, Location, LocationPayload,
    RecentLocationEntry,
};

use crate::middleware::{CurrentUser, RequestId};

use super::{
    map_history_error, map_rejection, normalize_limit, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    pub q: Option<String>,
}

fn parse_location(request_id: &str, payload: LocationPayload) -> Result<Location, ApiError> {
    Location::try_from(payload)
        .map_err(|e| ApiError::new(request_id, "validation_error", e.to_string()))
}

pub(super) async fn list_recent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    CurrentUser(user): CurrentUser,
    params: Result<Query<RecentQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<RecentLocationEntry>>>, ApiError> {
    let Query(params) = params.map_err(|e| map_rejection(req_id.0.clone(), &e))?;
    let limit = normalize_limit(params.limit, state.recents_limit);
    let recents = state
        .store
        .get_recents(user, limit)
        .await
        .map_err(|e| map_history_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(recents, req_id.0)))
}

pub(super) async fn record_recent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<LocationPayload>, JsonRejection>,
) -> Result<Json<ApiResponse<RecentLocationEntry>>, ApiError> {
    let Json(payload) = payload.map_err(|e| map_rejection(req_id.0.clone(), &e))?;
    let location = parse_location(&req_id.0, payload)?;
    let entry = state
        .store
        .record_usage(user, &location)
        .await
        .map_err(|e| map_history_error(req_id.0.clone(), &e))?;
    tracing::debug!(%user, usage_count = entry.usage_count, "recorded location usage");
    Ok(Json(ApiResponse::new(entry, req_id.0)))
}

pub(super) async fn list_favorites(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<Vec<FavoriteLocationEntry>>>, ApiError> {
    let favorites = state
        .store
        .get_favorites(user)
        .await
        .map_err(|e| map_history_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(favorites, req_id.0)))
}

/// The icon is always derived from the name; a client-sent `icon` is ignored.
pub(super) async fn create_favorite(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<FavoritePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<FavoriteLocationEntry>>), ApiError> {
    let Json(payload) = payload.map_err(|e| map_rejection(req_id.0.clone(), &e))?;
    let location = parse_location(&req_id.0, payload.location)?;
    let favorite = state
        .store
        .add_favorite(user, &payload.name, &location)
        .await
        .map_err(|e| map_history_error(req_id.0.clone(), &e))?;
    tracing::info!(%user, name = %favorite.name, "favorite created");
    Ok((StatusCode::CREATED, Json(ApiResponse::new(favorite, req_id.0))))
}

pub(super) async fn delete_favorite(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    CurrentUser(user): CurrentUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id.map_err(|e| map_rejection(req_id.0.clone(), &e))?;
    state
        .store
        .remove_favorite(user, id)
        .await
        .map_err(|e| map_history_error(req_id.0, &e))?;
    tracing::info!(%user, %id, "favorite removed");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    CurrentUser(user): CurrentUser,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<HistorySearch>>, ApiError> {
    let Query(params) = params.map_err(|e| map_rejection(req_id.0.clone(), &e))?;
    let query = params.q.unwrap_or_default();
    let found = state
        .store
        .search_by_text(user, &query)
        .await
        .map_err(|e| map_history_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(found, req_id.0)))
}
