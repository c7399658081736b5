//! The location value type and the history entries that wrap it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::DetailedAddress;
use crate::CoreError;

/// Identifier of the account that owns history and favorites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Case-folded, trimmed form of an address used as the de-duplication key.
#[must_use]
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Builds a validated point.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinates`] if `lat` is outside
    /// `[-90, 90]`, `lng` is outside `[-180, 180]`, or either is not finite.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoreError> {
        if Self::in_range(lat, lng) {
            Ok(Self { lat, lng })
        } else {
            Err(CoreError::InvalidCoordinates { lat, lng })
        }
    }

    #[must_use]
    pub fn in_range(lat: f64, lng: f64) -> bool {
        lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

/// A resolved point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: String,
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub detailed_address: DetailedAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}

impl Location {
    /// Creates a location without coordinates; the address is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyAddress`] for a blank address.
    pub fn new(address: &str) -> Result<Self, CoreError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(CoreError::EmptyAddress);
        }
        Ok(Self {
            address: address.to_owned(),
            coordinates: None,
            detailed_address: DetailedAddress::default(),
            place_id: None,
        })
    }

    #[must_use]
    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: DetailedAddress) -> Self {
        self.detailed_address = details;
        self
    }

    #[must_use]
    pub fn with_place_id(mut self, place_id: Option<String>) -> Self {
        self.place_id = place_id;
        self
    }

    #[must_use]
    pub fn normalized_address(&self) -> String {
        normalize_address(&self.address)
    }

    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.coordinates.is_some()
    }
}

/// Outcome of resolving a location through the geocoding chain.
///
/// `verified == false` marks a degraded result whose coordinates (if any)
/// did not come from a provider and must not be trusted for routing or
/// pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub location: Location,
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ResolvedLocation {
    #[must_use]
    pub fn verified(location: Location, provider: Option<String>) -> Self {
        Self {
            location,
            verified: true,
            provider,
        }
    }

    #[must_use]
    pub fn degraded(location: Location) -> Self {
        Self {
            location,
            verified: false,
            provider: None,
        }
    }
}

/// A previously selected address with usage statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentLocationEntry {
    pub id: Uuid,
    pub location: Location,
    pub usage_count: u32,
    pub last_used_at: DateTime<Utc>,
}

/// Icon tag shown next to a favorite, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteIcon {
    Home,
    Office,
    Gym,
    Store,
    Pin,
}

impl FavoriteIcon {
    /// Keyword heuristic: "home", "work"/"office", "gym", "store"/"shop",
    /// otherwise a generic pin.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("home") {
            FavoriteIcon::Home
        } else if name.contains("work") || name.contains("office") {
            FavoriteIcon::Office
        } else if name.contains("gym") {
            FavoriteIcon::Gym
        } else if name.contains("store") || name.contains("shop") {
            FavoriteIcon::Store
        } else {
            FavoriteIcon::Pin
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FavoriteIcon::Home => "home",
            FavoriteIcon::Office => "office",
            FavoriteIcon::Gym => "gym",
            FavoriteIcon::Store => "store",
            FavoriteIcon::Pin => "pin",
        }
    }

    /// Inverse of [`FavoriteIcon::as_str`]; unknown tags fall back to `Pin`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "home" => FavoriteIcon::Home,
            "office" => FavoriteIcon::Office,
            "gym" => FavoriteIcon::Gym,
            "store" => FavoriteIcon::Store,
            _ => FavoriteIcon::Pin,
        }
    }
}

/// A user-named saved location ("Home", "Work", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteLocationEntry {
    pub id: Uuid,
    pub name: String,
    pub icon: FavoriteIcon,
    pub location: Location,
    pub created_at: DateTime<Utc>,
}

impl FavoriteLocationEntry {
    /// Display label, e.g. `"Work (100 Main St)"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.location.address)
    }
}

/// Ephemeral live-autocomplete candidate. Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSuggestion {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub detailed_address: DetailedAddress,
    pub provider: String,
}

impl SearchSuggestion {
    /// Converts the suggestion into a location.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyAddress`] if the suggestion text is blank.
    pub fn to_location(&self) -> Result<Location, CoreError> {
        let mut location = Location::new(&self.address)?
            .with_details(self.detailed_address.clone())
            .with_place_id(self.place_id.clone());
        location.coordinates = self.coordinates;
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_folds_case() {
        assert_eq!(normalize_address("  100 MAIN St \n"), "100 main st");
        assert_eq!(
            normalize_address("100 Main St"),
            normalize_address("100 main st ")
        );
    }

    #[test]
    fn coordinates_reject_out_of_range_values() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
        assert_eq!(
            Coordinates::new(90.5, 0.0),
            Err(CoreError::InvalidCoordinates { lat: 90.5, lng: 0.0 })
        );
        assert!(Coordinates::new(0.0, -180.1).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn coordinates_display_as_lat_lng_pair() {
        let point = Coordinates::new(40.7128, -74.006).unwrap();
        assert_eq!(point.to_string(), "40.712800,-74.006000");
    }

    #[test]
    fn location_requires_non_blank_address() {
        assert_eq!(Location::new("   "), Err(CoreError::EmptyAddress));
        let location = Location::new("  1 Elm Rd ").unwrap();
        assert_eq!(location.address, "1 Elm Rd");
        assert!(!location.has_coordinates());
    }

    #[test]
    fn favorite_icon_heuristic() {
        assert_eq!(FavoriteIcon::from_name("Home"), FavoriteIcon::Home);
        assert_eq!(FavoriteIcon::from_name("Mom's home"), FavoriteIcon::Home);
        assert_eq!(FavoriteIcon::from_name("Work"), FavoriteIcon::Office);
        assert_eq!(FavoriteIcon::from_name("Main office"), FavoriteIcon::Office);
        assert_eq!(FavoriteIcon::from_name("GYM"), FavoriteIcon::Gym);
        assert_eq!(FavoriteIcon::from_name("Grocery store"), FavoriteIcon::Store);
        assert_eq!(FavoriteIcon::from_name("Barber shop"), FavoriteIcon::Store);
        assert_eq!(FavoriteIcon::from_name("Grandma"), FavoriteIcon::Pin);
    }

    #[test]
    fn favorite_icon_tag_round_trip() {
        for icon in [
            FavoriteIcon::Home,
            FavoriteIcon::Office,
            FavoriteIcon::Gym,
            FavoriteIcon::Store,
            FavoriteIcon::Pin,
        ] {
            assert_eq!(FavoriteIcon::from_tag(icon.as_str()), icon);
        }
        assert_eq!(FavoriteIcon::from_tag("rocket"), FavoriteIcon::Pin);
    }

    #[test]
    fn favorite_label_includes_name_and_address() {
        let favorite = FavoriteLocationEntry {
            id: Uuid::new_v4(),
            name: "Work".to_string(),
            icon: FavoriteIcon::Office,
            location: Location::new("100 Main St").unwrap(),
            created_at: Utc::now(),
        };
        assert_eq!(favorite.label(), "Work (100 Main St)");
    }

    #[test]
    fn suggestion_converts_to_location() {
        let suggestion = SearchSuggestion {
            address: "300 Main Blvd".to_string(),
            place_id: Some("abc".to_string()),
            coordinates: None,
            detailed_address: DetailedAddress::default(),
            provider: "google".to_string(),
        };
        let location = suggestion.to_location().unwrap();
        assert_eq!(location.address, "300 Main Blvd");
        assert_eq!(location.place_id.as_deref(), Some("abc"));
        assert!(location.coordinates.is_none());
    }

    #[test]
    fn location_serializes_camel_case() {
        let location = Location::new("1 Elm Rd")
            .unwrap()
            .with_coordinates(Coordinates::new(1.0, 2.0).unwrap());
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["address"], "1 Elm Rd");
        assert_eq!(json["coordinates"]["lat"], 1.0);
        assert!(json.get("detailedAddress").is_some());
    }
}
