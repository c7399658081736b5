//! Database operations for the `recent_locations` and `favorite_locations` tables.

mod read;
mod types;
mod write;

pub use read::{
    list_favorite_locations, list_recent_locations, search_favorite_locations,
    search_recent_locations,
};
pub use types::{FavoriteLocationRow, LocationColumns, RecentLocationRow};
pub use write::{delete_favorite_location, insert_favorite_location, upsert_recent_location};
