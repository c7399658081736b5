//! Mapbox Geocoding v5 adapter.
//!
//! Forward and reverse lookups both hit
//! `geocoding/v5/mapbox.places/{query}.json`; reverse passes `"{lng},{lat}"`
//! as the query. Autocomplete uses the same endpoint with
//! `autocomplete=true`.

use async_trait::async_trait;
use serde::Deserialize;
use waypoint_core::{Coordinates, DetailedAddress, Location, SearchSuggestion};

use crate::error::GeocodeError;
use crate::provider::{validate_coordinates, validate_query, GeocodingProvider, SuggestionSource};
use crate::transport::{ClientSettings, HttpTransport};

const DEFAULT_BASE_URL: &str = "https://api.mapbox.com/";
const PROVIDER: &str = "mapbox";
const SUGGESTION_LIMIT: &str = "5";

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: Option<String>,
    place_name: String,
    /// `[lng, lat]`
    center: Option<[f64; 2]>,
    text: Option<String>,
    /// House number, present on `address` features.
    address: Option<String>,
    #[serde(default)]
    context: Vec<ContextEntry>,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
    id: String,
    text: String,
    short_code: Option<String>,
}

impl Feature {
    fn coordinates(&self) -> Option<Coordinates> {
        self.center
            .and_then(|[lng, lat]| Coordinates::new(lat, lng).ok())
    }

    fn details(&self) -> DetailedAddress {
        let mut details = DetailedAddress {
            street: match (&self.address, &self.text) {
                (Some(number), Some(street)) => Some(format!("{number} {street}")),
                _ => None,
            },
            ..DetailedAddress::default()
        };

        for entry in &self.context {
            let kind = entry.id.split('.').next().unwrap_or_default();
            match kind {
                "place" => details.city = Some(entry.text.clone()),
                "region" => {
                    // "US-IL" -> "IL"; fall back to the full region name.
                    let state = entry
                        .short_code
                        .as_deref()
                        .and_then(|code| code.rsplit('-').next())
                        .filter(|code| !code.is_empty())
                        .map_or_else(|| entry.text.clone(), str::to_uppercase);
                    details.state = Some(state);
                }
                "postcode" => details.zip_code = Some(entry.text.clone()),
                _ => {}
            }
        }

        details.or(DetailedAddress::parse_formatted(&self.place_name))
    }

    fn into_location(self) -> Result<Location, GeocodeError> {
        let details = self.details();
        let coordinates = self.coordinates();
        let mut location = Location::new(&self.place_name)
            .map_err(|_| GeocodeError::unavailable(PROVIDER, "feature without place_name"))?
            .with_details(details)
            .with_place_id(self.id);
        location.coordinates = coordinates;
        Ok(location)
    }

    fn into_suggestion(self) -> SearchSuggestion {
        SearchSuggestion {
            coordinates: self.coordinates(),
            detailed_address: self.details(),
            address: self.place_name,
            place_id: self.id,
            provider: PROVIDER.to_string(),
        }
    }
}

/// Client for the Mapbox Geocoding v5 API.
pub struct MapboxGeocoder {
    http: HttpTransport,
    access_token: String,
}

impl MapboxGeocoder {
    /// # Errors
    ///
    /// Returns [`GeocodeError::MissingCredential`] for a blank token.
    pub fn new(access_token: &str, settings: &ClientSettings) -> Result<Self, GeocodeError> {
        Self::with_base_url(access_token, settings, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::MissingCredential`] for a blank token or
    /// [`GeocodeError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        access_token: &str,
        settings: &ClientSettings,
        base_url: &str,
    ) -> Result<Self, GeocodeError> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(GeocodeError::MissingCredential {
                provider: PROVIDER.to_string(),
            });
        }
        Ok(Self {
            http: HttpTransport::new(PROVIDER, settings, base_url)?,
            access_token: access_token.to_owned(),
        })
    }

    async fn places(
        &self,
        query: &str,
        extra: &[(&str, &str)],
    ) -> Result<Vec<Feature>, GeocodeError> {
        let file = format!("{query}.json");
        let mut params = vec![("access_token", self.access_token.as_str())];
        params.extend_from_slice(extra);
        let url = self
            .http
            .endpoint(&["geocoding", "v5", "mapbox.places", file.as_str()], &params);
        let collection: FeatureCollection = self.http.get_json(url).await?;
        Ok(collection.features)
    }

    async fn first_location(
        &self,
        query: &str,
        extra: &[(&str, &str)],
    ) -> Result<Location, GeocodeError> {
        self.places(query, extra)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::no_results(PROVIDER))?
            .into_location()
    }
}

#[async_trait]
impl GeocodingProvider for MapboxGeocoder {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn forward_geocode(&self, address: &str) -> Result<Location, GeocodeError> {
        let address = validate_query(address)?;
        self.first_location(address, &[("limit", "1")]).await
    }

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Location, GeocodeError> {
        let point = validate_coordinates(lat, lng)?;
        // Mapbox rejects `limit` on reverse lookups without a single `types`
        // filter, so take the first (most specific) feature instead.
        let query = format!("{},{}", point.lng, point.lat);
        let mut location = self.first_location(&query, &[]).await?;
        location.coordinates.get_or_insert(point);
        Ok(location)
    }
}

#[async_trait]
impl SuggestionSource for MapboxGeocoder {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn suggest(&self, query: &str) -> Result<Vec<SearchSuggestion>, GeocodeError> {
        let query = validate_query(query)?;
        let features = self
            .places(query, &[("autocomplete", "true"), ("limit", SUGGESTION_LIMIT)])
            .await?;
        Ok(features.into_iter().map(Feature::into_suggestion).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(json: serde_json::Value) -> Feature {
        serde_json::from_value(json).expect("feature should deserialize")
    }

    #[test]
    fn address_feature_maps_context_into_details() {
        let f = feature(serde_json::json!({
            "id": "address.123",
            "place_name": "100 Main St, Springfield, Illinois 62701, United States",
            "center": [-89.65, 39.78],
            "text": "Main St",
            "address": "100",
            "context": [
                { "id": "postcode.1", "text": "62701" },
                { "id": "place.2", "text": "Springfield" },
                { "id": "region.3", "text": "Illinois", "short_code": "US-IL" },
                { "id": "country.4", "text": "United States", "short_code": "us" }
            ]
        }));
        let location = f.into_location().unwrap();
        assert_eq!(location.place_id.as_deref(), Some("address.123"));
        let coords = location.coordinates.unwrap();
        assert!((coords.lat - 39.78).abs() < f64::EPSILON);
        assert!((coords.lng + 89.65).abs() < f64::EPSILON);
        let d = &location.detailed_address;
        assert_eq!(d.street.as_deref(), Some("100 Main St"));
        assert_eq!(d.city.as_deref(), Some("Springfield"));
        assert_eq!(d.state.as_deref(), Some("IL"));
        assert_eq!(d.zip_code.as_deref(), Some("62701"));
    }

    #[test]
    fn region_without_short_code_uses_name() {
        let f = feature(serde_json::json!({
            "place_name": "Somewhere",
            "context": [{ "id": "region.9", "text": "Bavaria" }]
        }));
        assert_eq!(f.details().state.as_deref(), Some("Bavaria"));
    }

    #[test]
    fn out_of_range_center_is_dropped() {
        let f = feature(serde_json::json!({
            "place_name": "Nowhere",
            "center": [200.0, 10.0]
        }));
        assert!(f.coordinates().is_none());
    }

    #[test]
    fn blank_token_is_missing_credential() {
        let err = MapboxGeocoder::new("  ", &ClientSettings::default())
            .err()
            .expect("blank token must fail");
        assert_eq!(
            err,
            GeocodeError::MissingCredential {
                provider: "mapbox".to_string()
            }
        );
    }
}
