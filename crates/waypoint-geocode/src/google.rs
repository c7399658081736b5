//! Google Geocoding API and Places Autocomplete adapter.
//!
//! Google answers HTTP 200 for most failures and reports them in the
//! `status` field, so every response goes through [`check_status`].

use async_trait::async_trait;
use serde::Deserialize;
use waypoint_core::{Coordinates, DetailedAddress, Location, SearchSuggestion};

use crate::error::GeocodeError;
use crate::provider::{validate_coordinates, validate_query, GeocodingProvider, SuggestionSource};
use crate::transport::{ClientSettings, HttpTransport};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/";
const PROVIDER: &str = "google";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: Geometry,
    place_id: Option<String>,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl AddressComponent {
    fn is(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<Prediction>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    description: String,
    place_id: Option<String>,
}

/// Maps a Google `status` onto the adapter's error kinds.
///
/// `invalid` is what `INVALID_REQUEST` means for the calling operation.
fn check_status(
    status: &str,
    error_message: Option<&str>,
    invalid: GeocodeError,
) -> Result<(), GeocodeError> {
    match status {
        "OK" => Ok(()),
        "ZERO_RESULTS" => Err(GeocodeError::no_results(PROVIDER)),
        "INVALID_REQUEST" => Err(invalid),
        other => {
            let reason = match error_message {
                Some(message) => format!("{other}: {message}"),
                None => other.to_string(),
            };
            Err(GeocodeError::unavailable(PROVIDER, reason))
        }
    }
}

fn details_from_components(components: &[AddressComponent]) -> DetailedAddress {
    let find = |kind: &str| components.iter().find(|c| c.is(kind));

    let street = match (find("street_number"), find("route")) {
        (Some(number), Some(route)) => Some(format!("{} {}", number.long_name, route.long_name)),
        (None, Some(route)) => Some(route.long_name.clone()),
        _ => None,
    };

    DetailedAddress {
        street,
        city: find("locality")
            .or_else(|| find("postal_town"))
            .map(|c| c.long_name.clone()),
        state: find("administrative_area_level_1").map(|c| c.short_name.clone()),
        zip_code: find("postal_code").map(|c| c.long_name.clone()),
    }
}

impl GeocodeResult {
    fn into_location(self) -> Result<Location, GeocodeError> {
        let LatLng { lat, lng } = self.geometry.location;
        let coordinates = Coordinates::new(lat, lng).map_err(|_| {
            GeocodeError::unavailable(PROVIDER, format!("result outside WGS84: {lat},{lng}"))
        })?;
        let details = details_from_components(&self.address_components)
            .or(DetailedAddress::parse_formatted(&self.formatted_address));
        Ok(Location::new(&self.formatted_address)
            .map_err(|_| GeocodeError::unavailable(PROVIDER, "result without formatted_address"))?
            .with_coordinates(coordinates)
            .with_details(details)
            .with_place_id(self.place_id))
    }
}

/// Client for the Google Maps web services.
pub struct GoogleGeocoder {
    http: HttpTransport,
    api_key: String,
}

impl GoogleGeocoder {
    /// # Errors
    ///
    /// Returns [`GeocodeError::MissingCredential`] for a blank key.
    pub fn new(api_key: &str, settings: &ClientSettings) -> Result<Self, GeocodeError> {
        Self::with_base_url(api_key, settings, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::MissingCredential`] for a blank key or
    /// [`GeocodeError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        settings: &ClientSettings,
        base_url: &str,
    ) -> Result<Self, GeocodeError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(GeocodeError::MissingCredential {
                provider: PROVIDER.to_string(),
            });
        }
        Ok(Self {
            http: HttpTransport::new(PROVIDER, settings, base_url)?,
            api_key: api_key.to_owned(),
        })
    }

    async fn geocode(
        &self,
        param: (&str, &str),
        invalid: GeocodeError,
    ) -> Result<Location, GeocodeError> {
        let url = self.http.endpoint(
            &["maps", "api", "geocode", "json"],
            &[param, ("key", self.api_key.as_str())],
        );
        let response: GeocodeResponse = self.http.get_json(url).await?;
        check_status(&response.status, response.error_message.as_deref(), invalid)?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::no_results(PROVIDER))?
            .into_location()
    }
}

#[async_trait]
impl GeocodingProvider for GoogleGeocoder {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn forward_geocode(&self, address: &str) -> Result<Location, GeocodeError> {
        let address = validate_query(address)?;
        self.geocode(("address", address), GeocodeError::InvalidQuery)
            .await
    }

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Location, GeocodeError> {
        let point = validate_coordinates(lat, lng)?;
        let latlng = format!("{},{}", point.lat, point.lng);
        self.geocode(
            ("latlng", latlng.as_str()),
            GeocodeError::InvalidCoordinates { lat, lng },
        )
        .await
    }
}

#[async_trait]
impl SuggestionSource for GoogleGeocoder {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    /// Place predictions carry no coordinates; they are geocoded on selection.
    async fn suggest(&self, query: &str) -> Result<Vec<SearchSuggestion>, GeocodeError> {
        let query = validate_query(query)?;
        let url = self.http.endpoint(
            &["maps", "api", "place", "autocomplete", "json"],
            &[("input", query), ("key", self.api_key.as_str())],
        );
        let response: AutocompleteResponse = self.http.get_json(url).await?;
        match check_status(
            &response.status,
            response.error_message.as_deref(),
            GeocodeError::InvalidQuery,
        ) {
            Ok(()) => {}
            Err(GeocodeError::NoResults { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        }

        Ok(response
            .predictions
            .into_iter()
            .map(|p| SearchSuggestion {
                detailed_address: DetailedAddress::parse_formatted(&p.description),
                address: p.description,
                place_id: p.place_id,
                coordinates: None,
                provider: PROVIDER.to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(check_status("OK", None, GeocodeError::InvalidQuery).is_ok());
        assert_eq!(
            check_status("ZERO_RESULTS", None, GeocodeError::InvalidQuery),
            Err(GeocodeError::no_results("google"))
        );
        assert_eq!(
            check_status("INVALID_REQUEST", None, GeocodeError::InvalidQuery),
            Err(GeocodeError::InvalidQuery)
        );
        assert_eq!(
            check_status(
                "OVER_QUERY_LIMIT",
                Some("You have exceeded your daily request quota"),
                GeocodeError::InvalidQuery
            ),
            Err(GeocodeError::unavailable(
                "google",
                "OVER_QUERY_LIMIT: You have exceeded your daily request quota"
            ))
        );
        assert!(check_status("REQUEST_DENIED", None, GeocodeError::InvalidQuery)
            .unwrap_err()
            .is_recoverable());
    }

    #[test]
    fn components_map_into_details() {
        let components: Vec<AddressComponent> = serde_json::from_value(serde_json::json!([
            { "long_name": "1600", "short_name": "1600", "types": ["street_number"] },
            { "long_name": "Amphitheatre Parkway", "short_name": "Amphitheatre Pkwy", "types": ["route"] },
            { "long_name": "Mountain View", "short_name": "Mountain View", "types": ["locality", "political"] },
            { "long_name": "California", "short_name": "CA", "types": ["administrative_area_level_1", "political"] },
            { "long_name": "94043", "short_name": "94043", "types": ["postal_code"] }
        ]))
        .unwrap();
        let details = details_from_components(&components);
        assert_eq!(details.street.as_deref(), Some("1600 Amphitheatre Parkway"));
        assert_eq!(details.city.as_deref(), Some("Mountain View"));
        assert_eq!(details.state.as_deref(), Some("CA"));
        assert_eq!(details.zip_code.as_deref(), Some("94043"));
    }

    #[test]
    fn postal_town_stands_in_for_locality() {
        let components: Vec<AddressComponent> = serde_json::from_value(serde_json::json!([
            { "long_name": "London", "short_name": "London", "types": ["postal_town"] }
        ]))
        .unwrap();
        assert_eq!(
            details_from_components(&components).city.as_deref(),
            Some("London")
        );
    }
}
