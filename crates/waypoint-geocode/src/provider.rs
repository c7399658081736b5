//! Provider-agnostic geocoding contract.

use async_trait::async_trait;
use waypoint_core::{Coordinates, Location, SearchSuggestion};

use crate::error::GeocodeError;

/// A single geocoding backend.
///
/// Adapters hold no mutable state and have no side effects beyond the
/// network call. Input is validated locally before any request goes out.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Stable short name used in logs and on verified results.
    fn name(&self) -> &'static str;

    /// Resolves free-form address text to a location with coordinates.
    async fn forward_geocode(&self, address: &str) -> Result<Location, GeocodeError>;

    /// Resolves a point to the nearest address.
    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Location, GeocodeError>;
}

/// Live autocomplete candidates for a partial query.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns candidates in provider relevance order. An empty list is a
    /// valid answer.
    async fn suggest(&self, query: &str) -> Result<Vec<SearchSuggestion>, GeocodeError>;
}

/// Trims `address` and rejects blank input.
///
/// # Errors
///
/// Returns [`GeocodeError::InvalidQuery`] for empty or whitespace-only text.
pub fn validate_query(address: &str) -> Result<&str, GeocodeError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        Err(GeocodeError::InvalidQuery)
    } else {
        Ok(trimmed)
    }
}

/// # Errors
///
/// Returns [`GeocodeError::InvalidCoordinates`] when the point is outside
/// WGS84 bounds or not finite.
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<Coordinates, GeocodeError> {
    Coordinates::new(lat, lng).map_err(|_| GeocodeError::InvalidCoordinates { lat, lng })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_query_is_invalid() {
        assert_eq!(validate_query(""), Err(GeocodeError::InvalidQuery));
        assert_eq!(validate_query(" \n\t"), Err(GeocodeError::InvalidQuery));
        assert_eq!(validate_query("  1 Elm Rd "), Ok("1 Elm Rd"));
    }

    #[test]
    fn out_of_range_coordinates_are_invalid() {
        assert!(validate_coordinates(45.0, 120.0).is_ok());
        assert_eq!(
            validate_coordinates(-91.0, 0.0),
            Err(GeocodeError::InvalidCoordinates { lat: -91.0, lng: 0.0 })
        );
        assert!(validate_coordinates(0.0, 180.5).is_err());
    }
}
