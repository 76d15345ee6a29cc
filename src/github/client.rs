// GitHub API HTTP client.
// Handles authentication, response caching, rate limiting, and status code mapping.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::{
    Client, Method, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cache::{DEFAULT_TTL, ResponseCache};
use crate::error::{PortfolioError, Result};

use super::types::{RateLimit, RateLimitStatus};

pub const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const DEFAULT_USER_AGENT: &str = concat!("portfolio/", env!("CARGO_PKG_VERSION"));

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Default username for user-scoped endpoints.
    pub username: Option<String>,
    /// Personal access token sent as `Authorization: token <token>`.
    pub token: Option<String>,
    pub base_url: String,
    pub cache_enabled: bool,
    pub cache_duration: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            username: None,
            token: None,
            base_url: GITHUB_API_BASE.to_string(),
            cache_enabled: true,
            cache_duration: DEFAULT_TTL,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with GITHUB_TOKEN, GITHUB_USERNAME and GITHUB_API_URL.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let mut config = Self {
            username: var("GITHUB_USERNAME"),
            token: var("GITHUB_TOKEN"),
            ..Self::default()
        };
        if let Some(base_url) = var("GITHUB_API_URL") {
            config.base_url = base_url;
        }
        config
    }
}

/// HTTP method for a raw request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

/// Per-request overrides. Serialized into the cache key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestOptions {
    pub method: HttpMethod,
    /// Extra headers, applied after the client defaults.
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// GitHub API client with response caching and rate limit tracking.
pub struct GitHubClient {
    client: Client,
    base_url: String,
    username: Option<String>,
    cache_enabled: bool,
    cache: Mutex<ResponseCache>,
    rate_limit: Mutex<RateLimit>,
}

impl GitHubClient {
    /// Create a new client, validating the credentials and base URL up front.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if let Some(username) = &config.username {
            if username.trim().is_empty() {
                return Err(PortfolioError::InvalidArgument(
                    "username must not be empty".to_string(),
                ));
            }
        }

        let base_url = url::Url::parse(&config.base_url).map_err(|e| {
            PortfolioError::InvalidArgument(format!("invalid base URL '{}': {}", config.base_url, e))
        })?;

        let mut headers = HeaderMap::new();

        if let Some(token) = &config.token {
            if token.trim().is_empty() {
                return Err(PortfolioError::InvalidArgument(
                    "token must not be empty".to_string(),
                ));
            }
            let mut value = HeaderValue::from_str(&format!("token {}", token)).map_err(|_| {
                PortfolioError::InvalidArgument("token contains invalid characters".to_string())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).map_err(|_| {
                PortfolioError::InvalidArgument(format!(
                    "invalid user agent '{}'",
                    config.user_agent
                ))
            })?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(PortfolioError::Network)?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            username: config.username,
            cache_enabled: config.cache_enabled,
            cache: Mutex::new(ResponseCache::new(config.cache_duration)),
            rate_limit: Mutex::new(RateLimit::default()),
        })
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Resolve an explicit username or fall back to the configured one.
    pub(crate) fn resolve_username<'a>(&'a self, username: Option<&'a str>) -> Result<&'a str> {
        username
            .filter(|u| !u.trim().is_empty())
            .or(self.username.as_deref())
            .ok_or_else(|| PortfolioError::InvalidArgument("username is required".to_string()))
    }

    /// Get the last observed rate limit state.
    pub fn rate_limit(&self) -> RateLimitStatus {
        RateLimitStatus::from(*self.lock_rate_limit())
    }

    /// Whether at least `count` requests remain. Unknown limits count as available.
    pub fn has_remaining_requests(&self, count: u64) -> bool {
        match self.lock_rate_limit().remaining {
            Some(remaining) => remaining >= count,
            None => true,
        }
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    /// Number of cached responses.
    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    /// Make a request to the GitHub API and decode the JSON body.
    ///
    /// Successful responses are cached under the URL plus the serialized
    /// options; a live cache entry short-circuits the network call.
    pub async fn request(&self, endpoint: &str, options: &RequestOptions) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let key = format!("{}{}", url, serde_json::to_string(options)?);

        if self.cache_enabled {
            if let Some(data) = self.lock_cache().get(&key) {
                debug!(%url, "cache hit");
                return Ok(data);
            }
        }

        debug!(%url, method = ?options.method, "sending request");
        let mut builder = self.client.request(options.method.into(), &url);
        for (name, value) in &options.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(PortfolioError::Network)?;

        self.update_rate_limit(response.headers());
        let response = self.check_response(response)?;

        let bytes = response.bytes().await.map_err(PortfolioError::Network)?;
        let data = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        if self.cache_enabled {
            self.lock_cache().insert(key, data.clone());
        }

        Ok(data)
    }

    /// GET an endpoint and deserialize the body into `T`.
    pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let value = self.request(endpoint, &RequestOptions::default()).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&self, headers: &HeaderMap) {
        let parse = |name: &str| -> Option<u64> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        };

        let mut rate_limit = self.lock_rate_limit();
        if let Some(limit) = parse("x-ratelimit-limit") {
            rate_limit.limit = Some(limit);
        }
        if let Some(remaining) = parse("x-ratelimit-remaining") {
            rate_limit.remaining = Some(remaining);
        }
        if let Some(reset) = parse("x-ratelimit-reset") {
            rate_limit.reset = Some(reset);
        }
        if let Some(used) = parse("x-ratelimit-used") {
            rate_limit.used = Some(used);
        }
    }

    /// Check response status and convert errors.
    fn check_response(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::NOT_FOUND => Err(PortfolioError::NotFound(response.url().to_string())),
            StatusCode::UNAUTHORIZED => Err(PortfolioError::Unauthorized),
            StatusCode::FORBIDDEN => {
                let rate_limit = *self.lock_rate_limit();
                if rate_limit.remaining == Some(0) {
                    Err(PortfolioError::RateLimited {
                        reset_at: rate_limit.reset_at(),
                    })
                } else {
                    Err(PortfolioError::Forbidden(response.url().to_string()))
                }
            }
            status => Err(PortfolioError::Provider {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            }),
        }
    }

    fn lock_cache(&self) -> MutexGuard<'_, ResponseCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_rate_limit(&self) -> MutexGuard<'_, RateLimit> {
        self.rate_limit.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
