//! Contract for persisting recently used and favorite locations.
//!
//! The resolver only talks to [`LocationHistoryStore`]; concrete stores live
//! next to their backends (in-memory here, Postgres in `waypoint-db`, the
//! REST client in `waypoint-resolver`).

mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::location::{FavoriteLocationEntry, Location, RecentLocationEntry, UserId};

pub use memory::InMemoryHistoryStore;

/// Queries shorter than this (after trimming) never reach storage.
pub const MIN_QUERY_LEN: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("a favorite named \"{0}\" already exists")]
    DuplicateName(String),

    #[error("favorite name must not be empty")]
    InvalidName,

    #[error("location address must not be empty")]
    InvalidLocation,

    #[error("history entry not found")]
    NotFound,

    #[error("history storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// Recents and favorites matching a text query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySearch {
    pub recent: Vec<RecentLocationEntry>,
    pub favorite: Vec<FavoriteLocationEntry>,
}

impl HistorySearch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recent.is_empty() && self.favorite.is_empty()
    }
}

/// Returns `true` if `query` is long enough to be searched.
#[must_use]
pub fn is_searchable_query(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_LEN
}

/// Storage collaborator for recents and favorites.
///
/// Implementations must treat [`record_usage`](Self::record_usage) as an
/// atomic upsert: concurrent calls for the same normalized address never
/// lose an increment.
#[async_trait]
pub trait LocationHistoryStore: Send + Sync {
    /// Recents ordered by usage count, then most recent use, capped at `limit`.
    async fn get_recents(
        &self,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<RecentLocationEntry>, HistoryError>;

    /// Inserts a recent entry or bumps the usage count of the existing one.
    async fn record_usage(
        &self,
        user: UserId,
        location: &Location,
    ) -> Result<RecentLocationEntry, HistoryError>;

    /// Favorites in insertion order.
    async fn get_favorites(&self, user: UserId) -> Result<Vec<FavoriteLocationEntry>, HistoryError>;

    /// Saves a named favorite. Names are unique per user, ignoring case.
    async fn add_favorite(
        &self,
        user: UserId,
        name: &str,
        location: &Location,
    ) -> Result<FavoriteLocationEntry, HistoryError>;

    async fn remove_favorite(&self, user: UserId, id: Uuid) -> Result<(), HistoryError>;

    /// Substring match over recent addresses and favorite names/addresses.
    async fn search_by_text(&self, user: UserId, query: &str)
        -> Result<HistorySearch, HistoryError>;

    /// Liveness check used by the health endpoint.
    async fn ping(&self) -> Result<(), HistoryError> {
        Ok(())
    }
}

/// Validates and trims a favorite name.
///
/// # Errors
///
/// Returns [`HistoryError::InvalidName`] for a blank name.
pub fn validate_favorite_name(name: &str) -> Result<&str, HistoryError> {
    let name = name.trim();
    if name.is_empty() {
        Err(HistoryError::InvalidName)
    } else {
        Ok(name)
    }
}

/// Rejects locations that must not be persisted.
///
/// # Errors
///
/// Returns [`HistoryError::InvalidLocation`] for a blank address.
pub fn validate_location(location: &Location) -> Result<(), HistoryError> {
    if location.address.trim().is_empty() {
        Err(HistoryError::InvalidLocation)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_queries_are_not_searchable() {
        assert!(!is_searchable_query(""));
        assert!(!is_searchable_query("  ab  "));
        assert!(is_searchable_query("abc"));
        assert!(is_searchable_query(" Main "));
    }

    #[test]
    fn favorite_names_are_trimmed() {
        assert_eq!(validate_favorite_name("  Home "), Ok("Home"));
        assert_eq!(validate_favorite_name(" \t"), Err(HistoryError::InvalidName));
    }
}
