//! `TransistorClient` - Transistor.fm API client implementation.

use std::path::Path;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use crate::api::LocalTransistorApi;
use crate::error::{ErrorResponse, Result, TransistorError};
use crate::params::DateRange;
use crate::rate_limiter::{DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW, RateLimiter};
use crate::types::Query;

/// Base URL of the Transistor API v1.
pub const DEFAULT_BASE_URL: &str = "https://api.transistor.fm/v1/";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// MIME type for JSON bodies.
const JSON_MIME: &str = "application/json";

/// Multipart field name for uploaded audio.
const UPLOAD_FIELD: &str = "audio_file";

/// Transistor.fm API client.
///
/// Every request passes through the client-side rate limiter (unless
/// disabled), carries the API key, and is classified by status code.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TransistorClient {
    /// HTTP client with default headers.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Rate limiter (`None` when disabled).
    rate_limiter: Option<Mutex<RateLimiter>>,
}

/// Builder for `TransistorClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TransistorClientBuilder {
    base_url: Option<Url>,
    api_key: Option<String>,
    user_agent: Option<String>,
    rate_limiting: bool,
    max_requests: usize,
    window: Duration,
    timeout: Duration,
}

impl TransistorClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            user_agent: None,
            rate_limiting: true,
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the User-Agent (default: `transistor-api/<version>`).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Enables or disables client-side rate limiting (default: enabled).
    #[must_use]
    pub const fn rate_limiting(mut self, enabled: bool) -> Self {
        self.rate_limiting = enabled;
        self
    }

    /// Sets the rate limit (default: 10 requests per 10s).
    #[must_use]
    pub const fn rate_limit(mut self, max_requests: usize, window: Duration) -> Self {
        self.max_requests = max_requests;
        self.window = window;
        self
    }

    /// Sets the per-request timeout (default: 30s).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_key` is not set or empty.
    /// - `api_key` is not a valid header value.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<TransistorClient> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| TransistorError::Config(String::from("api_key is required")))?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            Url::parse(DEFAULT_BASE_URL).map_err(|source| TransistorError::Url {
                path: String::from(DEFAULT_BASE_URL),
                source,
            })?
        };

        let mut key_value = HeaderValue::from_str(&api_key).map_err(|_| {
            TransistorError::Config(String::from("api_key contains invalid characters"))
        })?;
        key_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key_value);
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MIME));

        let user_agent = self.user_agent.unwrap_or_else(|| {
            String::from(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
        });

        let http_client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(self.timeout)
            .gzip(true)
            .build()?;

        let rate_limiter = self
            .rate_limiting
            .then(|| Mutex::new(RateLimiter::new(self.max_requests, self.window)));

        Ok(TransistorClient {
            http_client,
            base_url,
            rate_limiter,
        })
    }
}

impl TransistorClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TransistorClientBuilder {
        TransistorClientBuilder::new()
    }

    /// Returns the base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns `true` if client-side rate limiting is enabled.
    #[must_use]
    pub const fn rate_limiting_enabled(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Joins `path` onto the base URL.
    fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.base_url
            .join(path)
            .map_err(|source| TransistorError::Url {
                path: String::from(path),
                source,
            })
    }

    /// Blocks until the rate limiter admits one more request.
    async fn enforce_rate_limit(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.lock().await.enforce().await;
        }
    }

    /// Sends a JSON request and returns the parsed response document.
    #[instrument(skip_all, fields(method = %method, path = path))]
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.url(path)?;

        let mut builder = self
            .http_client
            .request(method, url)
            .header(CONTENT_TYPE, JSON_MIME);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        self.send(builder, path).await
    }

    /// Applies the rate limit, executes the request, and classifies it.
    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Value> {
        self.enforce_rate_limit().await;

        let request = builder.build()?;
        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            "Transistor API request"
        );

        let response = self.http_client.execute(request).await?;
        Self::classify(response, path).await
    }

    /// Maps the response status onto the error taxonomy, or parses the body.
    async fn classify(response: Response, path: &str) -> Result<Value> {
        let status = response.status();

        if !status.is_success() {
            let url = response.url().clone();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            tracing::debug!(status = %status, path = path, "Transistor API error response");
            return Err(TransistorError::from_response(ErrorResponse {
                status,
                url,
                body,
            }));
        }

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(Map::new()));
        }

        serde_json::from_slice(&body).map_err(|source| TransistorError::Decode {
            path: String::from(path),
            source,
        })
    }

    /// Shorthand for a GET request.
    async fn get(&self, path: &str, query: Query<'_>) -> Result<Value> {
        self.request(Method::GET, path, query, None).await
    }

    /// Shorthand for an analytics GET request.
    async fn get_analytics(&self, path: &str, range: &DateRange) -> Result<Value> {
        let query = range.to_query();
        self.get(path, &query).await
    }
}

impl LocalTransistorApi for TransistorClient {
    #[instrument(skip_all)]
    async fn account(&self) -> Result<Value> {
        self.get("", &[]).await
    }

    #[instrument(skip_all)]
    async fn list_shows(&self, query: Query<'_>) -> Result<Value> {
        self.get("shows", query).await
    }

    #[instrument(skip_all, fields(show_id = show_id))]
    async fn get_show(&self, show_id: &str, query: Query<'_>) -> Result<Value> {
        self.get(&format!("shows/{show_id}"), query).await
    }

    #[instrument(skip_all)]
    async fn create_show(&self, body: &Value) -> Result<Value> {
        self.request(Method::POST, "shows", &[], Some(body)).await
    }

    #[instrument(skip_all, fields(show_id = show_id))]
    async fn update_show(&self, show_id: &str, body: &Value) -> Result<Value> {
        let path = format!("shows/{show_id}");
        self.request(Method::PATCH, &path, &[], Some(body)).await
    }

    #[instrument(skip_all, fields(show_id = show_id))]
    async fn delete_show(&self, show_id: &str) -> Result<Value> {
        let path = format!("shows/{show_id}");
        self.request(Method::DELETE, &path, &[], None).await
    }

    #[instrument(skip_all)]
    async fn list_episodes(&self, show_id: Option<&str>, query: Query<'_>) -> Result<Value> {
        let mut params: Vec<(&str, String)> = query.to_vec();
        if let Some(show_id) = show_id {
            params.push(("show_id", String::from(show_id)));
        }
        self.get("episodes", &params).await
    }

    #[instrument(skip_all, fields(episode_id = episode_id))]
    async fn get_episode(&self, episode_id: &str, query: Query<'_>) -> Result<Value> {
        self.get(&format!("episodes/{episode_id}"), query).await
    }

    #[instrument(skip_all, fields(show_id = show_id))]
    async fn create_episode(&self, show_id: &str, body: &Value) -> Result<Value> {
        let path = format!("shows/{show_id}/episodes");
        self.request(Method::POST, &path, &[], Some(body)).await
    }

    #[instrument(skip_all, fields(episode_id = episode_id))]
    async fn update_episode(&self, episode_id: &str, body: &Value) -> Result<Value> {
        let path = format!("episodes/{episode_id}");
        self.request(Method::PATCH, &path, &[], Some(body)).await
    }

    #[instrument(skip_all, fields(episode_id = episode_id))]
    async fn delete_episode(&self, episode_id: &str) -> Result<Value> {
        let path = format!("episodes/{episode_id}");
        self.request(Method::DELETE, &path, &[], None).await
    }

    #[instrument(skip_all, fields(episode_id = episode_id))]
    async fn publish_episode(&self, episode_id: &str) -> Result<Value> {
        let path = format!("episodes/{episode_id}/publish");
        self.request(Method::PATCH, &path, &[], None).await
    }

    #[instrument(skip_all, fields(episode_id = episode_id))]
    async fn unpublish_episode(&self, episode_id: &str) -> Result<Value> {
        let path = format!("episodes/{episode_id}/unpublish");
        self.request(Method::PATCH, &path, &[], None).await
    }

    #[instrument(skip_all, fields(analytics_id = analytics_id))]
    async fn analytics(&self, analytics_id: &str, range: &DateRange) -> Result<Value> {
        self.get_analytics(&format!("analytics/{analytics_id}"), range)
            .await
    }

    #[instrument(skip_all, fields(show_id = show_id))]
    async fn show_analytics(&self, show_id: &str, range: &DateRange) -> Result<Value> {
        self.get_analytics(&format!("analytics/{show_id}"), range)
            .await
    }

    #[instrument(skip_all, fields(episode_id = episode_id))]
    async fn episode_analytics(&self, episode_id: &str, range: &DateRange) -> Result<Value> {
        self.get_analytics(&format!("analytics/episodes/{episode_id}"), range)
            .await
    }

    #[instrument(skip_all, fields(show_id = show_id))]
    async fn all_episodes_analytics(&self, show_id: &str, range: &DateRange) -> Result<Value> {
        self.get_analytics(&format!("analytics/{show_id}/episodes"), range)
            .await
    }

    #[instrument(skip_all, fields(show_id = show_id))]
    async fn list_subscribers(&self, show_id: &str, query: Query<'_>) -> Result<Value> {
        self.get(&format!("shows/{show_id}/private_subscribers"), query)
            .await
    }

    #[instrument(skip_all, fields(show_id = show_id))]
    async fn create_subscriber(&self, show_id: &str, body: &Value) -> Result<Value> {
        let path = format!("shows/{show_id}/private_subscribers");
        self.request(Method::POST, &path, &[], Some(body)).await
    }

    #[instrument(skip_all, fields(show_id = show_id, subscriber_id = subscriber_id))]
    async fn delete_subscriber(&self, show_id: &str, subscriber_id: &str) -> Result<Value> {
        let path = format!("shows/{show_id}/private_subscribers/{subscriber_id}");
        self.request(Method::DELETE, &path, &[], None).await
    }

    #[instrument(skip_all, fields(file = %path.display()))]
    async fn upload_audio(&self, path: &Path, query: Query<'_>) -> Result<Value> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| TransistorError::File {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path.file_name().map_or_else(
            || String::from(UPLOAD_FIELD),
            |n| n.to_string_lossy().into_owned(),
        );
        tracing::info!(file = %file_name, bytes = bytes.len(), "Uploading audio file");

        let form = Form::new().part(UPLOAD_FIELD, Part::bytes(bytes).file_name(file_name));

        // No Content-Type override: the multipart body sets its own boundary.
        let mut builder = self.http_client.post(self.url("uploads")?).multipart(form);
        if !query.is_empty() {
            builder = builder.query(query);
        }

        self.send(builder, "uploads").await
    }
}
