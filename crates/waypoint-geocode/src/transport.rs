//! Shared HTTP plumbing for the provider adapters.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use waypoint_core::AppConfig;

use crate::error::GeocodeError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = "waypoint/0.1 (location-resolver)";

/// Transport settings shared by every adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.geocoder_timeout_secs,
            user_agent: config.geocoder_user_agent.clone(),
        }
    }
}

/// A `reqwest` client bound to one provider's base URL.
pub(crate) struct HttpTransport {
    provider: &'static str,
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub(crate) fn new(
        provider: &'static str,
        settings: &ClientSettings,
        base_url: &str,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(settings.timeout_secs.min(10)))
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| GeocodeError::unavailable(provider, format!("client construction: {e}")))?;

        // Exactly one trailing slash, so pushed path segments land below the
        // base path instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| GeocodeError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(GeocodeError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: "URL cannot be a base".to_string(),
            });
        }

        Ok(Self {
            provider,
            client,
            base_url: parsed,
        })
    }

    /// Appends percent-encoded path segments and query pairs to the base URL.
    pub(crate) fn endpoint(&self, segments: &[&str], params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    /// Issues a GET and decodes the JSON body.
    ///
    /// Every failure is `ProviderUnavailable`. Reasons never include the
    /// request URL, which carries the credential.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GeocodeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.unavailable(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        tracing::debug!(provider = self.provider, %status, "geocoding response");
        if !status.is_success() {
            return Err(self.unavailable(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.unavailable(format!("reading body: {}", e.without_url())))?;
        serde_json::from_str(&body)
            .map_err(|e| self.unavailable(format!("malformed response: {e}")))
    }

    pub(crate) fn unavailable(&self, reason: impl Into<String>) -> GeocodeError {
        GeocodeError::unavailable(self.provider, reason)
    }
}
