//! Read operations for the location history tables.

use sqlx::PgPool;
use uuid::Uuid;

use super::types::{FavoriteLocationRow, RecentLocationRow};

/// Most-used recents first; ties go to the most recently used.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_recent_locations(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<RecentLocationRow>, sqlx::Error> {
    sqlx::query_as::<_, RecentLocationRow>(
        "SELECT public_id, address, street_address, city, state, zip_code, \
                latitude, longitude, place_id, usage_count, last_used_at \
         FROM recent_locations \
         WHERE user_id = $1 \
         ORDER BY usage_count DESC, last_used_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Favorites in insertion order.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_favorite_locations(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<FavoriteLocationRow>, sqlx::Error> {
    sqlx::query_as::<_, FavoriteLocationRow>(
        "SELECT public_id, name, icon, address, street_address, city, state, zip_code, \
                latitude, longitude, place_id, created_at \
         FROM favorite_locations \
         WHERE user_id = $1 \
         ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Recents whose normalized address contains `needle`.
///
/// `needle` must already be normalized. `strpos` is used instead of `LIKE`
/// so `%` and `_` in user input match literally.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn search_recent_locations(
    pool: &PgPool,
    user_id: Uuid,
    needle: &str,
) -> Result<Vec<RecentLocationRow>, sqlx::Error> {
    sqlx::query_as::<_, RecentLocationRow>(
        "SELECT public_id, address, street_address, city, state, zip_code, \
                latitude, longitude, place_id, usage_count, last_used_at \
         FROM recent_locations \
         WHERE user_id = $1 AND strpos(normalized_address, $2) > 0 \
         ORDER BY usage_count DESC, last_used_at DESC, id DESC",
    )
    .bind(user_id)
    .bind(needle)
    .fetch_all(pool)
    .await
}

/// Favorites whose name or normalized address contains `needle`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn search_favorite_locations(
    pool: &PgPool,
    user_id: Uuid,
    needle: &str,
) -> Result<Vec<FavoriteLocationRow>, sqlx::Error> {
    sqlx::query_as::<_, FavoriteLocationRow>(
        "SELECT public_id, name, icon, address, street_address, city, state, zip_code, \
                latitude, longitude, place_id, created_at \
         FROM favorite_locations \
         WHERE user_id = $1 \
           AND (strpos(lower(name), $2) > 0 OR strpos(normalized_address, $2) > 0) \
         ORDER BY id",
    )
    .bind(user_id)
    .bind(needle)
    .fetch_all(pool)
    .await
}
