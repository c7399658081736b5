//! Ordered fallback across geocoding providers.
//!
//! Each provider gets exactly one attempt per call. Provider-side failures
//! move on to the next provider; malformed input stops the chain. When every
//! provider has failed the caller still gets a location, flagged as
//! unverified.

use std::sync::Arc;

use async_trait::async_trait;
use waypoint_core::{Coordinates, DetailedAddress, Location, ResolvedLocation, SearchSuggestion};

use crate::error::GeocodeError;
use crate::provider::{validate_coordinates, validate_query, GeocodingProvider, SuggestionSource};

#[derive(Debug, Clone, Copy)]
enum Request<'a> {
    Forward(&'a str),
    Reverse(Coordinates),
}

/// Outcome of one provider attempt.
#[derive(Debug)]
enum Attempt {
    Found(Location),
    Recoverable(GeocodeError),
    Fatal(GeocodeError),
}

impl Attempt {
    fn classify(result: Result<Location, GeocodeError>) -> Self {
        match result {
            Ok(location) => Attempt::Found(location),
            Err(e) if e.is_recoverable() => Attempt::Recoverable(e),
            Err(e) => Attempt::Fatal(e),
        }
    }
}

/// Resolves addresses and points through an ordered provider list.
#[derive(Clone, Default)]
pub struct ProviderFallbackResolver {
    providers: Vec<Arc<dyn GeocodingProvider>>,
}

impl ProviderFallbackResolver {
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn GeocodingProvider>>) -> Self {
        Self { providers }
    }

    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Forward-geocodes `text`.
    ///
    /// On exhaustion returns an unverified location whose address is the
    /// trimmed input and whose coordinates are unknown.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::InvalidQuery`] for blank text, or any other
    /// non-recoverable error a provider reports.
    pub async fn forward(&self, text: &str) -> Result<ResolvedLocation, GeocodeError> {
        let text = validate_query(text)?;
        if let Some(resolved) = self.run(Request::Forward(text)).await? {
            return Ok(resolved);
        }
        let location = Location::new(text)
            .map_err(|_| GeocodeError::InvalidQuery)?
            .with_details(DetailedAddress::parse_formatted(text));
        Ok(ResolvedLocation::degraded(location))
    }

    /// Reverse-geocodes a point.
    ///
    /// On exhaustion returns an unverified location addressed as
    /// `"lat,lng"` that keeps the input point.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::InvalidCoordinates`] for an out-of-range
    /// point, or any other non-recoverable error a provider reports.
    pub async fn reverse(&self, lat: f64, lng: f64) -> Result<ResolvedLocation, GeocodeError> {
        let point = validate_coordinates(lat, lng)?;
        if let Some(resolved) = self.run(Request::Reverse(point)).await? {
            return Ok(resolved);
        }
        let location = Location::new(&point.to_string())
            .map_err(|_| GeocodeError::InvalidCoordinates { lat, lng })?
            .with_coordinates(point);
        Ok(ResolvedLocation::degraded(location))
    }

    /// `Ok(None)` means every provider failed recoverably.
    async fn run(&self, request: Request<'_>) -> Result<Option<ResolvedLocation>, GeocodeError> {
        for provider in &self.providers {
            let result = match request {
                Request::Forward(text) => provider.forward_geocode(text).await,
                Request::Reverse(point) => provider.reverse_geocode(point.lat, point.lng).await,
            };
            match Attempt::classify(result) {
                Attempt::Found(location) => {
                    tracing::debug!(provider = provider.name(), "geocoding succeeded");
                    return Ok(Some(ResolvedLocation::verified(
                        location,
                        Some(provider.name().to_string()),
                    )));
                }
                Attempt::Recoverable(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "geocoding provider failed, trying next"
                    );
                }
                Attempt::Fatal(e) => return Err(e),
            }
        }

        tracing::warn!(
            providers = self.providers.len(),
            "all geocoding providers failed, returning unverified location"
        );
        Ok(None)
    }
}

/// Tries suggestion sources in order until one answers.
///
/// An empty list still moves on to the next source. Once any source has
/// answered, exhausting the chain yields an empty list rather than an error,
/// whatever order the failures and empty answers came in.
#[derive(Clone, Default)]
pub struct FallbackSuggestionSource {
    sources: Vec<Arc<dyn SuggestionSource>>,
}

impl FallbackSuggestionSource {
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn SuggestionSource>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl SuggestionSource for FallbackSuggestionSource {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn suggest(&self, query: &str) -> Result<Vec<SearchSuggestion>, GeocodeError> {
        let mut answered = false;
        let mut last_error = None;
        for source in &self.sources {
            match source.suggest(query).await {
                Ok(suggestions) if !suggestions.is_empty() => return Ok(suggestions),
                Ok(_) => answered = true,
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(
                        provider = source.name(),
                        error = %e,
                        "suggestion source failed, trying next"
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(Vec::new()),
        }
    }
}
