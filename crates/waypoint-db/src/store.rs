//! [`LocationHistoryStore`] backed by Postgres.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use waypoint_core::{
    is_searchable_query, normalize_address, validate_favorite_name, validate_location,
    FavoriteIcon, FavoriteLocationEntry, HistoryError, HistorySearch, Location,
    LocationHistoryStore, RecentLocationEntry, UserId,
};

use crate::locations::{
    delete_favorite_location, insert_favorite_location, list_favorite_locations,
    list_recent_locations, search_favorite_locations, search_recent_locations,
    upsert_recent_location, LocationColumns,
};

#[derive(Debug, Clone)]
pub struct PgHistoryStore {
    pool: PgPool,
}

impl PgHistoryStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage_error(operation: &'static str, error: &dyn std::fmt::Display) -> HistoryError {
    tracing::error!(operation, error = %error, "history query failed");
    HistoryError::StorageUnavailable(format!("{operation} failed"))
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl LocationHistoryStore for PgHistoryStore {
    async fn get_recents(
        &self,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<RecentLocationEntry>, HistoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = list_recent_locations(&self.pool, user.0, limit)
            .await
            .map_err(|e| storage_error("get_recents", &e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn record_usage(
        &self,
        user: UserId,
        location: &Location,
    ) -> Result<RecentLocationEntry, HistoryError> {
        validate_location(location)?;
        let row = upsert_recent_location(&self.pool, user.0, &LocationColumns::from(location))
            .await
            .map_err(|e| storage_error("record_usage", &e))?;
        Ok(row.into())
    }

    async fn get_favorites(&self, user: UserId) -> Result<Vec<FavoriteLocationEntry>, HistoryError> {
        let rows = list_favorite_locations(&self.pool, user.0)
            .await
            .map_err(|e| storage_error("get_favorites", &e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn add_favorite(
        &self,
        user: UserId,
        name: &str,
        location: &Location,
    ) -> Result<FavoriteLocationEntry, HistoryError> {
        let name = validate_favorite_name(name)?;
        validate_location(location)?;
        let icon = FavoriteIcon::from_name(name);

        match insert_favorite_location(
            &self.pool,
            user.0,
            name,
            icon.as_str(),
            &LocationColumns::from(location),
        )
        .await
        {
            Ok(row) => Ok(row.into()),
            Err(e) if is_unique_violation(&e) => Err(HistoryError::DuplicateName(name.to_owned())),
            Err(e) => Err(storage_error("add_favorite", &e)),
        }
    }

    async fn remove_favorite(&self, user: UserId, id: Uuid) -> Result<(), HistoryError> {
        let deleted = delete_favorite_location(&self.pool, user.0, id)
            .await
            .map_err(|e| storage_error("remove_favorite", &e))?;
        if deleted {
            Ok(())
        } else {
            Err(HistoryError::NotFound)
        }
    }

    async fn search_by_text(
        &self,
        user: UserId,
        query: &str,
    ) -> Result<HistorySearch, HistoryError> {
        if !is_searchable_query(query) {
            return Ok(HistorySearch::default());
        }
        let needle = normalize_address(query);

        let (recent, favorite) = tokio::try_join!(
            search_recent_locations(&self.pool, user.0, &needle),
            search_favorite_locations(&self.pool, user.0, &needle),
        )
        .map_err(|e| storage_error("search_by_text", &e))?;

        Ok(HistorySearch {
            recent: recent.into_iter().map(Into::into).collect(),
            favorite: favorite.into_iter().map(Into::into).collect(),
        })
    }

    async fn ping(&self) -> Result<(), HistoryError> {
        crate::health_check(&self.pool)
            .await
            .map_err(|e| storage_error("ping", &e))
    }
}
