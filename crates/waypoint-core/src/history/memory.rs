//! Process-local history store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    is_searchable_query, validate_favorite_name, validate_location, HistoryError, HistorySearch,
    LocationHistoryStore,
};
use crate::location::{
    normalize_address, FavoriteIcon, FavoriteLocationEntry, Location, RecentLocationEntry, UserId,
};

#[derive(Debug, Default)]
struct UserHistory {
    /// Keyed by normalized address.
    recents: HashMap<String, RecentLocationEntry>,
    /// Insertion order is display order.
    favorites: Vec<FavoriteLocationEntry>,
}

/// [`LocationHistoryStore`] backed by a mutex-guarded map.
///
/// Every operation holds the lock for its whole read-modify-write, so
/// concurrent `record_usage` calls serialize instead of racing.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    users: Mutex<HashMap<UserId, UserHistory>>,
}

impl InMemoryHistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_recents(recents: &mut [RecentLocationEntry]) {
    recents.sort_by(|a, b| {
        b.usage_count
            .cmp(&a.usage_count)
            .then_with(|| b.last_used_at.cmp(&a.last_used_at))
    });
}

#[async_trait]
impl LocationHistoryStore for InMemoryHistoryStore {
    async fn get_recents(
        &self,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<RecentLocationEntry>, HistoryError> {
        let users = self.users.lock().await;
        let mut recents: Vec<RecentLocationEntry> = users
            .get(&user)
            .map(|h| h.recents.values().cloned().collect())
            .unwrap_or_default();
        sort_recents(&mut recents);
        recents.truncate(limit);
        Ok(recents)
    }

    async fn record_usage(
        &self,
        user: UserId,
        location: &Location,
    ) -> Result<RecentLocationEntry, HistoryError> {
        validate_location(location)?;
        let key = normalize_address(&location.address);

        let mut users = self.users.lock().await;
        let history = users.entry(user).or_default();
        let now = Utc::now();

        let entry = history
            .recents
            .entry(key)
            .and_modify(|entry| {
                entry.usage_count = entry.usage_count.saturating_add(1);
                entry.last_used_at = now;
                entry.location.address = location.address.trim().to_owned();
                if location.coordinates.is_some() {
                    entry.location.coordinates = location.coordinates;
                }
                entry.location.detailed_address = location
                    .detailed_address
                    .clone()
                    .or(entry.location.detailed_address.clone());
                if location.place_id.is_some() {
                    entry.location.place_id.clone_from(&location.place_id);
                }
            })
            .or_insert_with(|| {
                let mut stored = location.clone();
                stored.address = location.address.trim().to_owned();
                RecentLocationEntry {
                    id: Uuid::new_v4(),
                    location: stored,
                    usage_count: 1,
                    last_used_at: now,
                }
            });

        Ok(entry.clone())
    }

    async fn get_favorites(&self, user: UserId) -> Result<Vec<FavoriteLocationEntry>, HistoryError> {
        let users = self.users.lock().await;
        Ok(users
            .get(&user)
            .map(|h| h.favorites.clone())
            .unwrap_or_default())
    }

    async fn add_favorite(
        &self,
        user: UserId,
        name: &str,
        location: &Location,
    ) -> Result<FavoriteLocationEntry, HistoryError> {
        let name = validate_favorite_name(name)?;
        validate_location(location)?;

        let mut users = self.users.lock().await;
        let history = users.entry(user).or_default();

        let folded = name.to_lowercase();
        if history
            .favorites
            .iter()
            .any(|f| f.name.to_lowercase() == folded)
        {
            return Err(HistoryError::DuplicateName(name.to_owned()));
        }

        let favorite = FavoriteLocationEntry {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            icon: FavoriteIcon::from_name(name),
            location: location.clone(),
            created_at: Utc::now(),
        };
        history.favorites.push(favorite.clone());
        Ok(favorite)
    }

    async fn remove_favorite(&self, user: UserId, id: Uuid) -> Result<(), HistoryError> {
        let mut users = self.users.lock().await;
        let history = users.get_mut(&user).ok_or(HistoryError::NotFound)?;
        let before = history.favorites.len();
        history.favorites.retain(|f| f.id != id);
        if history.favorites.len() == before {
            return Err(HistoryError::NotFound);
        }
        Ok(())
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

        let users = self.users.lock().await;
        let Some(history) = users.get(&user) else {
            return Ok(HistorySearch::default());
        };

        let mut recent: Vec<RecentLocationEntry> = history
            .recents
            .iter()
            .filter(|(key, _)| key.contains(&needle))
            .map(|(_, entry)| entry.clone())
            .collect();
        sort_recents(&mut recent);

        let favorite = history
            .favorites
            .iter()
            .filter(|f| {
                f.name.to_lowercase().contains(&needle)
                    || normalize_address(&f.location.address).contains(&needle)
            })
            .cloned()
            .collect();

        Ok(HistorySearch { recent, favorite })
    }
}
