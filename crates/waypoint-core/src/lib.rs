pub mod address;
pub mod app_config;
pub mod config;
pub mod history;
pub mod location;
pub mod payload;

pub use address::DetailedAddress;
pub use app_config::{AppConfig, Environment, ProviderKind};
pub use config::{load_app_config, load_app_config_from_env};
pub use history::{
    is_searchable_query, validate_favorite_name, validate_location, HistoryError, HistorySearch,
    InMemoryHistoryStore, LocationHistoryStore, MIN_QUERY_LEN,
};
pub use location::{
    normalize_address, Coordinates, FavoriteIcon, FavoriteLocationEntry, Location,
    RecentLocationEntry, ResolvedLocation, SearchSuggestion, UserId,
};
pub use payload::{FavoritePayload, LocationPayload};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("address must not be empty")]
    EmptyAddress,
    #[error("coordinates out of range: lat={lat}, lng={lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
