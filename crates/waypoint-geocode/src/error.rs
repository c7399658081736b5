use thiserror::Error;

/// Errors returned by geocoding adapters and the fallback chain.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeocodeError {
    /// The address text was empty or whitespace-only.
    #[error("geocoding query must not be empty")]
    InvalidQuery,

    #[error("coordinates out of range: lat={lat}, lng={lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },

    /// Network failure, non-2xx status, quota, auth or malformed body.
    #[error("{provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("{provider} returned no results")]
    NoResults { provider: String },

    #[error("missing credential for geocoding provider {provider}")]
    MissingCredential { provider: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl GeocodeError {
    /// Returns `true` if the next provider in the chain should be tried.
    ///
    /// Malformed input is never recoverable: another backend would reject
    /// it just the same.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GeocodeError::ProviderUnavailable { .. } | GeocodeError::NoResults { .. }
        )
    }

    pub(crate) fn unavailable(provider: &str, reason: impl Into<String>) -> Self {
        GeocodeError::ProviderUnavailable {
            provider: provider.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn no_results(provider: &str) -> Self {
        GeocodeError::NoResults {
            provider: provider.to_owned(),
        }
    }
}
