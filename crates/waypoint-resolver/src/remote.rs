//! [`LocationHistoryStore`] backed by the `waypoint-server` REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;
use waypoint_core::{
    is_searchable_query, validate_favorite_name, validate_location, FavoriteLocationEntry,
    FavoritePayload, HistoryError, HistorySearch, Location, LocationHistoryStore, LocationPayload,
    RecentLocationEntry, UserId,
};

const USER_HEADER: &str = "x-user-id";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Error code the server uses for a rejected favorite name; any other 400 is
/// a location problem.
const INVALID_NAME_CODE: &str = "invalid_name";

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// HTTP client for the history endpoints under `/api/v1/locations`.
#[derive(Debug, Clone)]
pub struct HttpHistoryStore {
    client: Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl HttpHistoryStore {
    /// # Errors
    ///
    /// Returns [`HistoryError::StorageUnavailable`] if `base_url` does not
    /// parse or the HTTP client cannot be built.
    pub fn new(base_url: &str, bearer_token: Option<String>) -> Result<Self, HistoryError> {
        Self::with_timeout(
            base_url,
            bearer_token,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// # Errors
    ///
    /// See [`HttpHistoryStore::new`].
    pub fn with_timeout(
        base_url: &str,
        bearer_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, HistoryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| unavailable(format!("client construction: {e}")))?;
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| unavailable(format!("invalid base URL {base_url}: {e}")))?;
        Ok(Self {
            client,
            base_url,
            bearer_token: bearer_token.filter(|t| !t.trim().is_empty()),
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["api", "v1"])
                .extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url, user: Option<UserId>) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(user) = user {
            builder = builder.header(USER_HEADER, user.to_string());
        }
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, HistoryError> {
        builder
            .send()
            .await
            .map_err(|e| unavailable(format!("request failed: {}", e.without_url())))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, HistoryError> {
        let body = response
            .text()
            .await
            .map_err(|e| unavailable(format!("reading body: {}", e.without_url())))?;
        serde_json::from_str::<Envelope<T>>(&body)
            .map(|envelope| envelope.data)
            .map_err(|e| unavailable(format!("malformed response: {e}")))
    }

    /// Maps a non-2xx response to the matching history error.
    async fn failure(response: Response, name: Option<&str>) -> HistoryError {
        let status = response.status();
        let error = response
            .json::<ErrorEnvelope>()
            .await
            .ok()
            .map(|envelope| envelope.error);
        tracing::debug!(
            %status,
            code = error.as_ref().map(|e| e.code.as_str()),
            message = error.as_ref().map(|e| e.message.as_str()),
            "history request rejected"
        );

        match status {
            StatusCode::CONFLICT => HistoryError::DuplicateName(name.unwrap_or_default().to_owned()),
            StatusCode::NOT_FOUND => HistoryError::NotFound,
            StatusCode::BAD_REQUEST => match error {
                Some(body) if body.code == INVALID_NAME_CODE => HistoryError::InvalidName,
                _ => HistoryError::InvalidLocation,
            },
            _ => unavailable(format!("HTTP {status}")),
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        name: Option<&str>,
    ) -> Result<T, HistoryError> {
        let response = self.send(builder).await?;
        if response.status().is_success() {
            Self::decode(response).await
        } else {
            Err(Self::failure(response, name).await)
        }
    }
}

fn unavailable(reason: impl Into<String>) -> HistoryError {
    HistoryError::StorageUnavailable(reason.into())
}

#[async_trait]
impl LocationHistoryStore for HttpHistoryStore {
    async fn get_recents(
        &self,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<RecentLocationEntry>, HistoryError> {
        let mut url = self.url(&["locations", "recent"]);
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        self.fetch(self.request(Method::GET, url, Some(user)), None)
            .await
    }

    async fn record_usage(
        &self,
        user: UserId,
        location: &Location,
    ) -> Result<RecentLocationEntry, HistoryError> {
        validate_location(location)?;
        let url = self.url(&["locations", "recent"]);
        let builder = self
            .request(Method::POST, url, Some(user))
            .json(&LocationPayload::from(location));
        self.fetch(builder, None).await
    }

    async fn get_favorites(&self, user: UserId) -> Result<Vec<FavoriteLocationEntry>, HistoryError> {
        let url = self.url(&["locations", "favorites"]);
        self.fetch(self.request(Method::GET, url, Some(user)), None)
            .await
    }

    async fn add_favorite(
        &self,
        user: UserId,
        name: &str,
        location: &Location,
    ) -> Result<FavoriteLocationEntry, HistoryError> {
        let name = validate_favorite_name(name)?;
        validate_location(location)?;
        let url = self.url(&["locations", "favorites"]);
        let body = FavoritePayload {
            name: name.to_owned(),
            location: LocationPayload::from(location),
        };
        let builder = self.request(Method::POST, url, Some(user)).json(&body);
        self.fetch(builder, Some(name)).await
    }

    async fn remove_favorite(&self, user: UserId, id: Uuid) -> Result<(), HistoryError> {
        let url = self.url(&["locations", "favorites", &id.to_string()]);
        let response = self
            .send(self.request(Method::DELETE, url, Some(user)))
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::failure(response, None).await)
        }
    }

    async fn search_by_text(
        &self,
        user: UserId,
        query: &str,
    ) -> Result<HistorySearch, HistoryError> {
        if !is_searchable_query(query) {
            return Ok(HistorySearch::default());
        }
        let mut url = self.url(&["locations", "search"]);
        url.query_pairs_mut().append_pair("q", query.trim());
        self.fetch(self.request(Method::GET, url, Some(user)), None)
            .await
    }

    async fn ping(&self) -> Result<(), HistoryError> {
        let url = self.url(&["health"]);
        let response = self.send(self.request(Method::GET, url, None)).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(unavailable(format!("HTTP {}", response.status())))
        }
    }
}
