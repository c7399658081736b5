//! What the host renders.

use waypoint_core::ResolvedLocation;

use crate::merge::ResultItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverState {
    /// No query yet, or cleared.
    #[default]
    Idle,
    /// Query empty or below the search threshold; favorites and recents.
    ShowingHistory,
    /// A search is pending (debouncing) or in flight.
    Searching,
    ShowingResults,
    Selected,
}

/// A finalized location handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub resolved: ResolvedLocation,
    /// Set when the location could not be verified by any provider.
    pub warning: Option<String>,
}

impl Selection {
    pub(crate) fn new(resolved: ResolvedLocation) -> Self {
        let warning = (!resolved.verified).then(|| {
            "location could not be verified; pickup and pricing may be approximate".to_string()
        });
        Self { resolved, warning }
    }
}

/// Snapshot of resolver state published on every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverView {
    pub state: ResolverState,
    pub query: String,
    pub items: Vec<ResultItem>,
    pub loading: bool,
    /// Non-fatal problem worth surfacing (a failed data source, an
    /// unverified selection).
    pub warning: Option<String>,
    pub selection: Option<Selection>,
}

impl ResolverView {
    /// Display labels of the current items, in order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.items.iter().map(ResultItem::label).collect()
    }
}
