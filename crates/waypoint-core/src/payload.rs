//! Flat JSON bodies exchanged with the history REST endpoints.

use serde::{Deserialize, Serialize};

use crate::address::DetailedAddress;
use crate::location::{Coordinates, Location};
use crate::CoreError;

/// `{address, streetAddress?, city?, state?, zipCode?, lat?, lng?, placeId?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPayload {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}

impl From<&Location> for LocationPayload {
    fn from(location: &Location) -> Self {
        let details = &location.detailed_address;
        Self {
            address: location.address.clone(),
            street_address: details.street.clone(),
            city: details.city.clone(),
            state: details.state.clone(),
            zip_code: details.zip_code.clone(),
            lat: location.coordinates.map(|c| c.lat),
            lng: location.coordinates.map(|c| c.lng),
            place_id: location.place_id.clone(),
        }
    }
}

impl TryFrom<LocationPayload> for Location {
    type Error = CoreError;

    /// Fails on a blank address, a lone `lat`/`lng`, or an out-of-range point.
    fn try_from(payload: LocationPayload) -> Result<Self, Self::Error> {
        let coordinates = match (payload.lat, payload.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)?),
            (None, None) => None,
            (lat, lng) => {
                return Err(CoreError::InvalidCoordinates {
                    lat: lat.unwrap_or(f64::NAN),
                    lng: lng.unwrap_or(f64::NAN),
                })
            }
        };
        let mut location = Location::new(&payload.address)?
            .with_details(DetailedAddress {
                street: payload.street_address,
                city: payload.city,
                state: payload.state,
                zip_code: payload.zip_code,
            })
            .with_place_id(payload.place_id);
        location.coordinates = coordinates;
        Ok(location)
    }
}

/// Body of `POST /api/v1/locations/favorites`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoritePayload {
    pub name: String,
    #[serde(flatten)]
    pub location: LocationPayload,
}
