//! Composes the provider chain from configuration.

use std::sync::Arc;

use waypoint_core::{AppConfig, ProviderKind};

use crate::error::GeocodeError;
use crate::fallback::{FallbackSuggestionSource, ProviderFallbackResolver};
use crate::google::GoogleGeocoder;
use crate::mapbox::MapboxGeocoder;
use crate::provider::{GeocodingProvider, SuggestionSource};
use crate::transport::ClientSettings;

/// Configured adapters in fallback priority order.
#[derive(Clone, Default)]
pub struct Providers {
    pub geocoders: Vec<Arc<dyn GeocodingProvider>>,
    pub suggestions: Vec<Arc<dyn SuggestionSource>>,
}

impl Providers {
    #[must_use]
    pub fn fallback_resolver(&self) -> ProviderFallbackResolver {
        ProviderFallbackResolver::new(self.geocoders.clone())
    }

    #[must_use]
    pub fn suggestion_source(&self) -> FallbackSuggestionSource {
        FallbackSuggestionSource::new(self.suggestions.clone())
    }
}

fn credential<'a>(value: Option<&'a str>, kind: ProviderKind) -> Result<&'a str, GeocodeError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GeocodeError::MissingCredential {
            provider: kind.to_string(),
        })
}

/// Builds every provider listed in `config.geocoder_providers`, in order.
///
/// # Errors
///
/// Returns [`GeocodeError::MissingCredential`] when a listed provider has no
/// credential configured.
pub fn build_providers(config: &AppConfig) -> Result<Providers, GeocodeError> {
    let settings = ClientSettings::from_app_config(config);
    let mut providers = Providers::default();

    for kind in &config.geocoder_providers {
        match kind {
            ProviderKind::Mapbox => {
                let token = credential(config.mapbox_access_token.as_deref(), *kind)?;
                let mapbox = Arc::new(MapboxGeocoder::new(token, &settings)?);
                providers.geocoders.push(mapbox.clone());
                providers.suggestions.push(mapbox);
            }
            ProviderKind::Google => {
                let key = credential(config.google_maps_api_key.as_deref(), *kind)?;
                let google = Arc::new(GoogleGeocoder::new(key, &settings)?);
                providers.geocoders.push(google.clone());
                providers.suggestions.push(google);
            }
        }
    }

    tracing::info!(
        providers = ?config.geocoder_providers.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        "geocoding providers configured"
    );
    Ok(providers)
}

#[cfg(test)]
mod tests {
    use waypoint_core::Environment;

    use super::*;

    fn config(providers: Vec<ProviderKind>) -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/waypoint".to_string(),
            env: Environment::Test,
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            log_level: "info".to_string(),
            api_keys: None,
            db_max_connections: 10,
            db_min_connections: 1,
            db_acquire_timeout_secs: 10,
            geocoder_providers: providers,
            mapbox_access_token: Some("pk.test".to_string()),
            google_maps_api_key: None,
            geocoder_timeout_secs: 5,
            geocoder_user_agent: "waypoint-test".to_string(),
            autocomplete_debounce_ms: 250,
            autocomplete_min_query_len: 3,
            recents_display_limit: 5,
        }
    }

    #[test]
    fn builds_in_configured_order() {
        let mut config = config(vec![ProviderKind::Google, ProviderKind::Mapbox]);
        config.google_maps_api_key = Some("g-key".to_string());
        let providers = build_providers(&config).unwrap();
        assert_eq!(
            providers.fallback_resolver().provider_names(),
            ["google", "mapbox"]
        );
        assert_eq!(providers.suggestions.len(), 2);
    }

    #[test]
    fn listed_provider_without_credential_fails() {
        let config = config(vec![ProviderKind::Mapbox, ProviderKind::Google]);
        let err = build_providers(&config).err().expect("google has no key");
        assert_eq!(
            err,
            GeocodeError::MissingCredential {
                provider: "google".to_string()
            }
        );
    }

    #[test]
    fn unlisted_provider_needs_no_credential() {
        let providers = build_providers(&config(vec![ProviderKind::Mapbox])).unwrap();
        assert_eq!(providers.fallback_resolver().provider_names(), ["mapbox"]);
    }

    #[test]
    fn empty_list_builds_empty_chain() {
        let providers = build_providers(&config(Vec::new())).unwrap();
        assert!(providers.geocoders.is_empty());
        assert!(providers.suggestions.is_empty());
    }
}
