//! The resolver task and the handle hosts use to drive it.
//!
//! All mutable state lives in one tokio task. Hosts send commands over an
//! `mpsc` channel and watch a [`ResolverView`]. Every keystroke bumps a
//! sequence number; a search response is applied only if its ticket still
//! matches, so the last request always wins.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use uuid::Uuid;
use waypoint_core::{
    FavoriteLocationEntry, HistoryError, HistorySearch, Location, LocationHistoryStore,
    RecentLocationEntry, ResolvedLocation, SearchSuggestion, UserId,
};
use waypoint_geocode::{GeocodeError, ProviderFallbackResolver, SuggestionSource};

use crate::cache::SuggestionCache;
use crate::config::AutocompleteConfig;
use crate::error::ResolverError;
use crate::merge::{history_items, merge_results};
use crate::selection::{record_selection, resolve_item, resolve_position};
use crate::view::{ResolverState, ResolverView, Selection};

const COMMAND_BUFFER: usize = 64;

type Reply<T> = oneshot::Sender<Result<T, ResolverError>>;

enum Command {
    Input(String),
    Select {
        index: usize,
        reply: Reply<Selection>,
    },
    SelectPosition {
        lat: f64,
        lng: f64,
        reply: Reply<Selection>,
    },
    AddFavorite {
        name: String,
        reply: Reply<FavoriteLocationEntry>,
    },
    RemoveFavorite {
        id: Uuid,
        reply: Reply<()>,
    },
    Clear,
}

/// Live suggestions for one search, fresh from a source or from the cache.
enum LiveOutcome {
    Cached(Vec<SearchSuggestion>),
    Fetched(Result<Vec<SearchSuggestion>, GeocodeError>),
}

struct SearchOutcome {
    ticket: u64,
    query: String,
    history: Result<HistorySearch, HistoryError>,
    live: LiveOutcome,
}

/// Favorites plus top recents, kept in memory so short queries never wait
/// on storage.
#[derive(Default)]
struct HistorySnapshot {
    favorites: Vec<FavoriteLocationEntry>,
    recents: Vec<RecentLocationEntry>,
    warning: Option<String>,
}

/// Cloneable handle to a running resolver. The task stops once every handle
/// has been dropped.
#[derive(Clone)]
pub struct ResolverHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<ResolverView>,
}

impl ResolverHandle {
    /// Feeds the current contents of the input field.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Closed`] if the resolver task has stopped.
    pub async fn input(&self, text: impl Into<String>) -> Result<(), ResolverError> {
        self.send(Command::Input(text.into())).await
    }

    /// Picks the item at `index` of the current view.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::IndexOutOfRange`] for an index past the
    /// shown items, or [`ResolverError::InvalidInput`] when the item cannot
    /// be geocoded at all.
    pub async fn select(&self, index: usize) -> Result<Selection, ResolverError> {
        self.request(|reply| Command::Select { index, reply }).await
    }

    /// Uses the device position as the location.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::InvalidInput`] for out-of-range coordinates.
    pub async fn select_position(&self, lat: f64, lng: f64) -> Result<Selection, ResolverError> {
        self.request(|reply| Command::SelectPosition { lat, lng, reply })
            .await
    }

    /// Saves the last selected location as a named favorite.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::NothingSelected`] outside the `Selected`
    /// state, [`ResolverError::EmptyFavoriteName`] for a blank name, or
    /// [`ResolverError::History`] (e.g. a duplicate name) from storage.
    pub async fn add_favorite(
        &self,
        name: impl Into<String>,
    ) -> Result<FavoriteLocationEntry, ResolverError> {
        let name = name.into();
        self.request(|reply| Command::AddFavorite { name, reply })
            .await
    }

    /// # Errors
    ///
    /// Returns [`ResolverError::History`] if the favorite does not exist or
    /// storage fails.
    pub async fn remove_favorite(&self, id: Uuid) -> Result<(), ResolverError> {
        self.request(|reply| Command::RemoveFavorite { id, reply })
            .await
    }

    /// Resets to `Idle`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Closed`] if the resolver task has stopped.
    pub async fn clear(&self) -> Result<(), ResolverError> {
        self.send(Command::Clear).await
    }

    /// The latest published view.
    #[must_use]
    pub fn view(&self) -> ResolverView {
        self.view.borrow().clone()
    }

    /// A receiver notified on every view change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResolverView> {
        self.view.clone()
    }

    async fn send(&self, command: Command) -> Result<(), ResolverError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ResolverError::Closed)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, ResolverError> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply)).await?;
        response.await.map_err(|_| ResolverError::Closed)?
    }
}

/// Starts a resolver task for `user` and returns its handle.
///
/// The history snapshot is loaded before the first command is handled.
/// Must be called from within a tokio runtime.
pub fn spawn_resolver(
    user: UserId,
    store: Arc<dyn LocationHistoryStore>,
    suggestions: Arc<dyn SuggestionSource>,
    geocoder: ProviderFallbackResolver,
    config: AutocompleteConfig,
) -> ResolverHandle {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (view_tx, view_rx) = watch::channel(ResolverView::default());
    let (results_tx, results_rx) = mpsc::unbounded_channel();

    let actor = Actor {
        user,
        store,
        suggestions,
        geocoder,
        cache: SuggestionCache::new(config.cache_capacity),
        config,
        commands: command_rx,
        results_tx,
        results_rx,
        view_tx,
        view: ResolverView::default(),
        seq: 0,
        deadline: None,
        pending_query: String::new(),
        snapshot: HistorySnapshot::default(),
        last_selected: None,
    };
    tokio::spawn(actor.run());

    ResolverHandle {
        commands: command_tx,
        view: view_rx,
    }
}

struct Actor {
    user: UserId,
    store: Arc<dyn LocationHistoryStore>,
    suggestions: Arc<dyn SuggestionSource>,
    geocoder: ProviderFallbackResolver,
    config: AutocompleteConfig,
    cache: SuggestionCache,
    commands: mpsc::Receiver<Command>,
    results_tx: mpsc::UnboundedSender<SearchOutcome>,
    results_rx: mpsc::UnboundedReceiver<SearchOutcome>,
    view_tx: watch::Sender<ResolverView>,
    view: ResolverView,
    /// Bumped by every command that invalidates in-flight searches.
    seq: u64,
    /// When the pending debounced search fires.
    deadline: Option<Instant>,
    pending_query: String,
    snapshot: HistorySnapshot,
    last_selected: Option<Location>,
}

impl Actor {
    async fn run(mut self) {
        self.refresh_snapshot().await;
        tracing::debug!(user = %self.user, "location resolver started");

        loop {
            let deadline = self.deadline;
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                () = async {
                    match deadline {
                        Some(at) => sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                } => {
                    self.deadline = None;
                    self.launch_search();
                }
                Some(outcome) = self.results_rx.recv() => self.apply_search(outcome),
            }
        }

        tracing::debug!(user = %self.user, "location resolver stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Input(text) => self.on_input(text),
            Command::Select { index, reply } => {
                let result = self.on_select(index).await;
                let _ = reply.send(result);
            }
            Command::SelectPosition { lat, lng, reply } => {
                let result = self.on_select_position(lat, lng).await;
                let _ = reply.send(result);
            }
            Command::AddFavorite { name, reply } => {
                let result = self.on_add_favorite(&name).await;
                let _ = reply.send(result);
            }
            Command::RemoveFavorite { id, reply } => {
                let result = self.on_remove_favorite(id).await;
                let _ = reply.send(result);
            }
            Command::Clear => self.on_clear(),
        }
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view.clone());
    }

    fn invalidate(&mut self) {
        self.seq += 1;
        self.deadline = None;
    }

    fn on_input(&mut self, text: String) {
        self.invalidate();
        self.view.query = text;
        self.view.selection = None;

        if self.config.is_search_query(&self.view.query) {
            self.pending_query = self.view.query.trim().to_owned();
            self.deadline = Some(Instant::now() + self.config.debounce);
            self.view.state = ResolverState::Searching;
            self.view.loading = true;
        } else {
            self.show_history();
        }
        self.publish();
    }

    fn show_history(&mut self) {
        self.view.state = ResolverState::ShowingHistory;
        self.view.items = history_items(
            &self.snapshot.favorites,
            &self.snapshot.recents,
            self.config.recents_limit,
        );
        self.view.loading = false;
        self.view.warning.clone_from(&self.snapshot.warning);
    }

    fn launch_search(&mut self) {
        let ticket = self.seq;
        let query = self.pending_query.clone();
        let cached = self.cache.get(&query).cloned();
        let store = Arc::clone(&self.store);
        let source = Arc::clone(&self.suggestions);
        let results = self.results_tx.clone();
        let user = self.user;

        tracing::debug!(ticket, query = %query, cached = cached.is_some(), "launching search");
        tokio::spawn(async move {
            let live = async {
                match cached {
                    Some(suggestions) => LiveOutcome::Cached(suggestions),
                    None => LiveOutcome::Fetched(source.suggest(&query).await),
                }
            };
            let (history, live) = tokio::join!(store.search_by_text(user, &query), live);
            // The resolver may have stopped; the outcome is then irrelevant.
            let _ = results.send(SearchOutcome {
                ticket,
                query,
                history,
                live,
            });
        });
    }

    fn apply_search(&mut self, outcome: SearchOutcome) {
        let mut warnings = Vec::new();

        let suggestions = match outcome.live {
            LiveOutcome::Cached(suggestions) => suggestions,
            LiveOutcome::Fetched(Ok(suggestions)) => {
                self.cache.insert(&outcome.query, suggestions.clone());
                suggestions
            }
            LiveOutcome::Fetched(Err(e)) => {
                tracing::warn!(query = %outcome.query, error = %e, "live suggestions failed");
                warnings.push("live suggestions unavailable");
                Vec::new()
            }
        };

        if outcome.ticket != self.seq {
            tracing::debug!(
                ticket = outcome.ticket,
                current = self.seq,
                query = %outcome.query,
                "discarding stale search response"
            );
            return;
        }

        let history = outcome.history.unwrap_or_else(|e| {
            tracing::warn!(query = %outcome.query, error = %e, "history search failed");
            warnings.push("history unavailable");
            HistorySearch::default()
        });

        self.view.items = merge_results(&history, &suggestions);
        self.view.state = ResolverState::ShowingResults;
        self.view.loading = false;
        self.view.warning = (!warnings.is_empty()).then(|| warnings.join("; "));
        self.publish();
    }

    async fn on_select(&mut self, index: usize) -> Result<Selection, ResolverError> {
        let item = self
            .view
            .items
            .get(index)
            .cloned()
            .ok_or(ResolverError::IndexOutOfRange {
                index,
                len: self.view.items.len(),
            })?;

        self.begin_resolution();
        match resolve_item(&item, &self.geocoder).await {
            Ok(resolved) => Ok(self.finalize(resolved).await),
            Err(e) => Err(self.abort_resolution(e)),
        }
    }

    async fn on_select_position(&mut self, lat: f64, lng: f64) -> Result<Selection, ResolverError> {
        self.begin_resolution();
        match resolve_position(lat, lng, &self.geocoder).await {
            Ok(resolved) => Ok(self.finalize(resolved).await),
            Err(e) => Err(self.abort_resolution(e)),
        }
    }

    fn begin_resolution(&mut self) {
        self.invalidate();
        self.view.loading = true;
        self.publish();
    }

    fn abort_resolution(&mut self, error: ResolverError) -> ResolverError {
        self.view.loading = false;
        self.publish();
        error
    }

    async fn finalize(&mut self, resolved: ResolvedLocation) -> Selection {
        record_selection(self.store.as_ref(), self.user, &resolved.location).await;
        self.refresh_snapshot().await;

        let selection = Selection::new(resolved);
        if let Some(warning) = &selection.warning {
            tracing::warn!(
                user = %self.user,
                address = %selection.resolved.location.address,
                "{warning}"
            );
        }

        self.last_selected = Some(selection.resolved.location.clone());
        self.view.state = ResolverState::Selected;
        self.view.query.clone_from(&selection.resolved.location.address);
        self.view.items.clear();
        self.view.loading = false;
        self.view.warning.clone_from(&selection.warning);
        self.view.selection = Some(selection.clone());
        self.publish();
        selection
    }

    async fn on_add_favorite(&mut self, name: &str) -> Result<FavoriteLocationEntry, ResolverError> {
        let location = match (&self.view.state, &self.last_selected) {
            (ResolverState::Selected, Some(location)) => location.clone(),
            _ => return Err(ResolverError::NothingSelected),
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(ResolverError::EmptyFavoriteName);
        }

        let favorite = self.store.add_favorite(self.user, name, &location).await?;
        tracing::info!(user = %self.user, name = %favorite.name, "favorite added");
        self.refresh_snapshot().await;
        Ok(favorite)
    }

    async fn on_remove_favorite(&mut self, id: Uuid) -> Result<(), ResolverError> {
        self.store.remove_favorite(self.user, id).await?;
        self.refresh_snapshot().await;
        if self.view.state == ResolverState::ShowingHistory {
            self.show_history();
            self.publish();
        }
        Ok(())
    }

    fn on_clear(&mut self) {
        self.invalidate();
        self.last_selected = None;
        self.view = ResolverView::default();
        self.publish();
    }

    async fn refresh_snapshot(&mut self) {
        let (favorites, recents) = tokio::join!(
            self.store.get_favorites(self.user),
            self.store.get_recents(self.user, self.config.recents_limit),
        );
        let mut snapshot = HistorySnapshot::default();
        match favorites {
            Ok(favorites) => snapshot.favorites = favorites,
            Err(e) => {
                tracing::warn!(user = %self.user, error = %e, "failed to load favorites");
                snapshot.warning = Some("history unavailable".to_string());
            }
        }
        match recents {
            Ok(recents) => snapshot.recents = recents,
            Err(e) => {
                tracing::warn!(user = %self.user, error = %e, "failed to load recents");
                snapshot.warning = Some("history unavailable".to_string());
            }
        }
        self.snapshot = snapshot;
    }
}
