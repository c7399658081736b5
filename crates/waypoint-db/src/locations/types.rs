//! Row types for the location history tables.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use waypoint_core::{
    normalize_address, Coordinates, DetailedAddress, FavoriteIcon, FavoriteLocationEntry,
    Location, RecentLocationEntry,
};

/// Address columns shared by both tables, flattened from a [`Location`].
#[derive(Debug, Clone, PartialEq)]
pub struct LocationColumns {
    pub normalized_address: String,
    pub address: String,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub place_id: Option<String>,
}

impl From<&Location> for LocationColumns {
    fn from(location: &Location) -> Self {
        let details = &location.detailed_address;
        Self {
            normalized_address: normalize_address(&location.address),
            address: location.address.trim().to_owned(),
            street_address: details.street.clone(),
            city: details.city.clone(),
            state: details.state.clone(),
            zip_code: details.zip_code.clone(),
            latitude: location.coordinates.map(|c| c.lat),
            longitude: location.coordinates.map(|c| c.lng),
            place_id: location.place_id.clone(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn location_from_columns(
    address: String,
    street_address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    place_id: Option<String>,
) -> Location {
    let coordinates = match (latitude, longitude) {
        (Some(lat), Some(lng)) => Coordinates::new(lat, lng).ok(),
        _ => None,
    };
    Location {
        address,
        coordinates,
        detailed_address: DetailedAddress {
            street: street_address,
            city,
            state,
            zip_code,
        },
        place_id,
    }
}

/// A row from the `recent_locations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecentLocationRow {
    pub public_id: Uuid,
    pub address: String,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub place_id: Option<String>,
    pub usage_count: i32,
    pub last_used_at: DateTime<Utc>,
}

impl From<RecentLocationRow> for RecentLocationEntry {
    fn from(row: RecentLocationRow) -> Self {
        RecentLocationEntry {
            id: row.public_id,
            location: location_from_columns(
                row.address,
                row.street_address,
                row.city,
                row.state,
                row.zip_code,
                row.latitude,
                row.longitude,
                row.place_id,
            ),
            usage_count: row.usage_count.unsigned_abs(),
            last_used_at: row.last_used_at,
        }
    }
}

/// A row from the `favorite_locations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FavoriteLocationRow {
    pub public_id: Uuid,
    pub name: String,
    pub icon: String,
    pub address: String,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub place_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<FavoriteLocationRow> for FavoriteLocationEntry {
    fn from(row: FavoriteLocationRow) -> Self {
        FavoriteLocationEntry {
            id: row.public_id,
            icon: FavoriteIcon::from_tag(&row.icon),
            name: row.name,
            location: location_from_columns(
                row.address,
                row.street_address,
                row.city,
                row.state,
                row.zip_code,
                row.latitude,
                row.longitude,
                row.place_id,
            ),
            created_at: row.created_at,
        }
    }
}
