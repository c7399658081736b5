//! Write operations for the location history tables.

use sqlx::PgPool;
use uuid::Uuid;

use super::types::{FavoriteLocationRow, LocationColumns, RecentLocationRow};

/// Insert a recent location or bump the usage count of the existing row.
///
/// A single `INSERT … ON CONFLICT DO UPDATE` keeps concurrent calls for the
/// same address from losing increments. Detail and coordinate columns are
/// only overwritten when the new location provides them.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn upsert_recent_location(
    pool: &PgPool,
    user_id: Uuid,
    columns: &LocationColumns,
) -> Result<RecentLocationRow, sqlx::Error> {
    sqlx::query_as::<_, RecentLocationRow>(
        "INSERT INTO recent_locations \
             (user_id, normalized_address, address, street_address, city, state, zip_code, \
              latitude, longitude, place_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (user_id, normalized_address) DO UPDATE SET \
             usage_count    = recent_locations.usage_count + 1, \
             last_used_at   = NOW(), \
             address        = EXCLUDED.address, \
             street_address = COALESCE(EXCLUDED.street_address, recent_locations.street_address), \
             city           = COALESCE(EXCLUDED.city, recent_locations.city), \
             state          = COALESCE(EXCLUDED.state, recent_locations.state), \
             zip_code       = COALESCE(EXCLUDED.zip_code, recent_locations.zip_code), \
             latitude       = COALESCE(EXCLUDED.latitude, recent_locations.latitude), \
             longitude      = COALESCE(EXCLUDED.longitude, recent_locations.longitude), \
             place_id       = COALESCE(EXCLUDED.place_id, recent_locations.place_id) \
         RETURNING public_id, address, street_address, city, state, zip_code, \
                   latitude, longitude, place_id, usage_count, last_used_at",
    )
    .bind(user_id)
    .bind(&columns.normalized_address)
    .bind(&columns.address)
    .bind(&columns.street_address)
    .bind(&columns.city)
    .bind(&columns.state)
    .bind(&columns.zip_code)
    .bind(columns.latitude)
    .bind(columns.longitude)
    .bind(&columns.place_id)
    .fetch_one(pool)
    .await
}

/// Insert a favorite.
///
/// A name already used by this user (ignoring case) fails with a unique
/// violation on `favorite_locations_user_name_key`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn insert_favorite_location(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    icon: &str,
    columns: &LocationColumns,
) -> Result<FavoriteLocationRow, sqlx::Error> {
    sqlx::query_as::<_, FavoriteLocationRow>(
        "INSERT INTO favorite_locations \
             (user_id, name, icon, normalized_address, address, street_address, city, state, \
              zip_code, latitude, longitude, place_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING public_id, name, icon, address, street_address, city, state, zip_code, \
                   latitude, longitude, place_id, created_at",
    )
    .bind(user_id)
    .bind(name)
    .bind(icon)
    .bind(&columns.normalized_address)
    .bind(&columns.address)
    .bind(&columns.street_address)
    .bind(&columns.city)
    .bind(&columns.state)
    .bind(&columns.zip_code)
    .bind(columns.latitude)
    .bind(columns.longitude)
    .bind(&columns.place_id)
    .fetch_one(pool)
    .await
}

/// Delete a favorite by public id. Returns `false` if no row matched.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn delete_favorite_location(
    pool: &PgPool,
    user_id: Uuid,
    public_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM favorite_locations WHERE user_id = $1 AND public_id = $2")
            .bind(user_id)
            .bind(public_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}
