//! Ranking and de-duplication of history and live suggestions.

use std::collections::HashSet;

use waypoint_core::{
    normalize_address, CoreError, FavoriteLocationEntry, HistorySearch, Location,
    RecentLocationEntry, SearchSuggestion,
};

/// One row of the result list.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultItem {
    Favorite(FavoriteLocationEntry),
    Recent(RecentLocationEntry),
    Suggestion(SearchSuggestion),
}

impl ResultItem {
    /// `"{name} ({address})"` for favorites, the address otherwise.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            ResultItem::Favorite(f) => f.label(),
            ResultItem::Recent(r) => r.location.address.clone(),
            ResultItem::Suggestion(s) => s.address.clone(),
        }
    }

    #[must_use]
    pub fn address(&self) -> &str {
        match self {
            ResultItem::Favorite(f) => &f.location.address,
            ResultItem::Recent(r) => &r.location.address,
            ResultItem::Suggestion(s) => &s.address,
        }
    }

    /// # Errors
    ///
    /// Returns [`CoreError::EmptyAddress`] for a suggestion with blank text.
    pub fn to_location(&self) -> Result<Location, CoreError> {
        match self {
            ResultItem::Favorite(f) => Ok(f.location.clone()),
            ResultItem::Recent(r) => Ok(r.location.clone()),
            ResultItem::Suggestion(s) => s.to_location(),
        }
    }

    /// Provider that produced the item, for live suggestions.
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        match self {
            ResultItem::Suggestion(s) => Some(&s.provider),
            _ => None,
        }
    }
}

struct Dedup {
    seen: HashSet<String>,
    items: Vec<ResultItem>,
}

impl Dedup {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, item: ResultItem) {
        let key = normalize_address(item.address());
        if !key.is_empty() && self.seen.insert(key) {
            self.items.push(item);
        }
    }
}

/// Favorites, then recents, then live suggestions, skipping any address
/// already shown above.
#[must_use]
pub fn merge_results(history: &HistorySearch, suggestions: &[SearchSuggestion]) -> Vec<ResultItem> {
    let mut merged = Dedup::new();
    for favorite in &history.favorite {
        merged.push(ResultItem::Favorite(favorite.clone()));
    }
    for recent in &history.recent {
        merged.push(ResultItem::Recent(recent.clone()));
    }
    for suggestion in suggestions {
        merged.push(ResultItem::Suggestion(suggestion.clone()));
    }
    merged.items
}

/// All favorites followed by at most `recents_limit` recents.
#[must_use]
pub fn history_items(
    favorites: &[FavoriteLocationEntry],
    recents: &[RecentLocationEntry],
    recents_limit: usize,
) -> Vec<ResultItem> {
    let mut merged = Dedup::new();
    for favorite in favorites {
        merged.push(ResultItem::Favorite(favorite.clone()));
    }
    let mut shown = 0;
    for recent in recents {
        if shown == recents_limit {
            break;
        }
        let before = merged.items.len();
        merged.push(ResultItem::Recent(recent.clone()));
        shown += merged.items.len() - before;
    }
    merged.items
}
