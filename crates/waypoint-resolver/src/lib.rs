//! Smart location input: history for short queries, debounced live search
//! for longer ones, and selection through the geocoding fallback chain.

pub mod autocomplete;
pub mod cache;
pub mod config;
pub mod error;
pub mod merge;
pub mod remote;
pub mod selection;
pub mod view;

pub use autocomplete::{spawn_resolver, ResolverHandle};
pub use config::AutocompleteConfig;
pub use error::ResolverError;
pub use merge::{history_items, merge_results, ResultItem};
pub use remote::HttpHistoryStore;
pub use view::{ResolverState, ResolverView, Selection};
