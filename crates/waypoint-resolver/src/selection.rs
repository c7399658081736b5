//! Turning a picked item or a device position into a finalized location.

use waypoint_core::{Location, LocationHistoryStore, ResolvedLocation, UserId};
use waypoint_geocode::{GeocodeError, ProviderFallbackResolver};

use crate::error::ResolverError;
use crate::merge::ResultItem;

/// Resolves an item to a location.
///
/// Items that already carry coordinates are used as-is; anything else goes
/// through the fallback chain, which may hand back an unverified location.
///
/// # Errors
///
/// Returns [`ResolverError::InvalidInput`] when the item text is unusable.
pub async fn resolve_item(
    item: &ResultItem,
    geocoder: &ProviderFallbackResolver,
) -> Result<ResolvedLocation, ResolverError> {
    let location = item
        .to_location()
        .map_err(|_| ResolverError::InvalidInput(GeocodeError::InvalidQuery))?;

    if location.has_coordinates() {
        return Ok(ResolvedLocation::verified(
            location,
            item.provider().map(ToOwned::to_owned),
        ));
    }

    let mut resolved = geocoder
        .forward(&location.address)
        .await
        .map_err(ResolverError::InvalidInput)?;
    if !resolved.verified {
        // Keep what the item already knew (place id, parsed details).
        resolved.location = keep_known_fields(resolved.location, location);
    }
    Ok(resolved)
}

fn keep_known_fields(degraded: Location, known: Location) -> Location {
    Location {
        address: known.address,
        coordinates: degraded.coordinates.or(known.coordinates),
        detailed_address: known.detailed_address.or(degraded.detailed_address),
        place_id: known.place_id.or(degraded.place_id),
    }
}

/// Reverse-geocodes a device position.
///
/// # Errors
///
/// Returns [`ResolverError::InvalidInput`] for out-of-range coordinates.
pub async fn resolve_position(
    lat: f64,
    lng: f64,
    geocoder: &ProviderFallbackResolver,
) -> Result<ResolvedLocation, ResolverError> {
    geocoder
        .reverse(lat, lng)
        .await
        .map_err(ResolverError::InvalidInput)
}

/// Records the selection in history. Failures are logged, never returned:
/// a storage outage must not block the ride request.
pub async fn record_selection(store: &dyn LocationHistoryStore, user: UserId, location: &Location) {
    match store.record_usage(user, location).await {
        Ok(entry) => tracing::debug!(
            %user,
            usage_count = entry.usage_count,
            "recorded location usage"
        ),
        Err(e) => tracing::warn!(%user, error = %e, "failed to record location usage"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;
    use waypoint_core::{
        Coordinates, DetailedAddress, FavoriteIcon, FavoriteLocationEntry, InMemoryHistoryStore,
        SearchSuggestion,
    };
    use waypoint_geocode::GeocodingProvider;

    use super::*;

    struct Down;

    #[async_trait]
    impl GeocodingProvider for Down {
        fn name(&self) -> &'static str {
            "down"
        }

        async fn forward_geocode(&self, _address: &str) -> Result<Location, GeocodeError> {
            Err(GeocodeError::ProviderUnavailable {
                provider: "down".to_string(),
                reason: "HTTP 503".to_string(),
            })
        }

        async fn reverse_geocode(&self, _lat: f64, _lng: f64) -> Result<Location, GeocodeError> {
            self.forward_geocode("").await
        }
    }

    fn suggestion(address: &str, coordinates: Option<Coordinates>) -> ResultItem {
        ResultItem::Suggestion(SearchSuggestion {
            address: address.to_string(),
            place_id: Some("place-1".to_string()),
            coordinates,
            detailed_address: DetailedAddress::default(),
            provider: "mapbox".to_string(),
        })
    }

    fn down_chain() -> ProviderFallbackResolver {
        ProviderFallbackResolver::new(vec![Arc::new(Down)])
    }

    #[tokio::test]
    async fn item_with_coordinates_skips_geocoding() {
        let point = Coordinates::new(30.0, -97.0).unwrap();
        let resolved = resolve_item(&suggestion("300 Main Blvd", Some(point)), &down_chain())
            .await
            .unwrap();
        assert!(resolved.verified);
        assert_eq!(resolved.provider.as_deref(), Some("mapbox"));
        assert_eq!(resolved.location.coordinates, Some(point));
    }

    #[tokio::test]
    async fn favorite_with_coordinates_is_verified_without_provider() {
        let item = ResultItem::Favorite(FavoriteLocationEntry {
            id: Uuid::new_v4(),
            name: "Home".to_string(),
            icon: FavoriteIcon::Home,
            location: Location::new("1 Elm Rd")
                .unwrap()
                .with_coordinates(Coordinates::new(1.0, 1.0).unwrap()),
            created_at: Utc::now(),
        });
        let resolved = resolve_item(&item, &down_chain()).await.unwrap();
        assert!(resolved.verified);
        assert!(resolved.provider.is_none());
    }

    #[tokio::test]
    async fn bare_suggestion_degrades_when_all_providers_fail() {
        let resolved = resolve_item(&suggestion("300 Main Blvd", None), &down_chain())
            .await
            .unwrap();
        assert!(!resolved.verified);
        assert_eq!(resolved.location.address, "300 Main Blvd");
        assert!(resolved.location.coordinates.is_none());
        assert_eq!(resolved.location.place_id.as_deref(), Some("place-1"));
    }

    #[tokio::test]
    async fn invalid_position_is_rejected() {
        assert_eq!(
            resolve_position(120.0, 0.0, &down_chain()).await,
            Err(ResolverError::InvalidInput(GeocodeError::InvalidCoordinates {
                lat: 120.0,
                lng: 0.0
            }))
        );
    }

    #[tokio::test]
    async fn record_selection_upserts_history() {
        let store = InMemoryHistoryStore::new();
        let user = UserId(Uuid::new_v4());
        let location = Location::new("1 Elm Rd").unwrap();
        record_selection(&store, user, &location).await;
        record_selection(&store, user, &location).await;
        let recents = store.get_recents(user, 5).await.unwrap();
        assert_eq!(recents[0].usage_count, 2);
    }
}
