//! Geocoding adapters and the ordered fallback chain built on top of them.

pub mod error;
pub mod fallback;
pub mod google;
pub mod mapbox;
pub mod provider;
pub mod registry;
pub mod transport;

pub use error::GeocodeError;
pub use fallback::{FallbackSuggestionSource, ProviderFallbackResolver};
pub use google::GoogleGeocoder;
pub use mapbox::MapboxGeocoder;
pub use provider::{validate_coordinates, validate_query, GeocodingProvider, SuggestionSource};
pub use registry::{build_providers, Providers};
pub use transport::ClientSettings;
