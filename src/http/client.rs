//! Authenticated HTTP client
//!
//! Presents the `{get, post, put, delete, patch}` surface. Every call is
//! (a) routed through the dispatch queue, (b) stamped with the current
//! bearer token, (c) retried with backoff on HTTP 429, and (d) repaired by
//! a single-flight token refresh on HTTP 401, with the original request
//! replayed under the new token.
//!
//! Retries and refreshes are invisible to the caller on success; the
//! original future simply resolves later. On exhaustion or terminal
//! failure the original error propagates with full status and body.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use crate::auth::{
    NullObserver, RefreshGate, RefreshTicket, SessionObserver, SessionStore, TokenRefresher,
};
use crate::error::{Error, Result};
use crate::queue::{SerialQueue, DEFAULT_DISPATCH_DELAY};
use crate::types::{Method, StringMap};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Path of the token refresh endpoint
    pub refresh_path: String,
    /// Request timeout
    pub timeout: Duration,
    /// Timeout for binary downloads
    pub download_timeout: Duration,
    /// Gap the dispatch queue keeps between consecutive requests
    pub dispatch_delay: Duration,
    /// Maximum number of retries after HTTP 429
    pub max_rate_limit_retries: u32,
    /// Base delay for rate-limit backoff (doubles per retry)
    pub rate_limit_backoff: Duration,
    /// Default headers for all requests
    pub default_headers: StringMap,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            refresh_path: "/auth/refresh".to_string(),
            timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(60),
            dispatch_delay: DEFAULT_DISPATCH_DELAY,
            max_rate_limit_retries: 3,
            rate_limit_backoff: Duration::from_millis(1000),
            default_headers: StringMap::new(),
            user_agent: format!("cadence-http/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the refresh endpoint path
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.config.refresh_path = path.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the binary download timeout
    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.config.download_timeout = timeout;
        self
    }

    /// Set the gap between consecutive dispatched requests
    pub fn dispatch_delay(mut self, delay: Duration) -> Self {
        self.config.dispatch_delay = delay;
        self
    }

    /// Set rate-limit retry behavior
    pub fn rate_limit_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.config.max_rate_limit_retries = max_retries;
        self.config.rate_limit_backoff = backoff;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: StringMap,
    /// Request headers
    pub headers: StringMap,
    /// Request body (JSON)
    pub body: Option<Value>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
    /// Override max rate-limit retries for this request
    pub max_retries: Option<u32>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set max rate-limit retries
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }
}

/// Retry bookkeeping for one logical request
///
/// Allocated fresh at the top of every `request` call and mutated across
/// retries of that call only; reusing a `RequestConfig` can never leak
/// retry state between calls.
#[derive(Debug, Default)]
struct RequestAttemptState {
    /// Retries consumed on HTTP 429
    rate_limit_retries: u32,
    /// Set once this request has been replayed after a refresh; a second
    /// 401 is then terminal
    refresh_replayed: bool,
}

/// Authenticated HTTP client with serialized dispatch
pub struct HttpClient {
    transport: Client,
    queue: SerialQueue,
    session: SessionStore,
    refresher: TokenRefresher,
    gate: RefreshGate,
    observer: Arc<dyn SessionObserver>,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Self {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Self {
        Self::with_session(config, SessionStore::new())
    }

    /// Create a client sharing an existing session store
    pub fn with_session(config: HttpClientConfig, session: SessionStore) -> Self {
        let transport = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .expect("Failed to build HTTP transport");

        // Bare transport for the refresh call: no queue, no bearer header,
        // cookie store for the refresh credential.
        let refresh_transport = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .build()
            .expect("Failed to build refresh transport");

        let refresher = TokenRefresher::new(
            refresh_transport,
            join_url(config.base_url.as_deref(), &config.refresh_path)
                .unwrap_or_else(|_| config.refresh_path.clone()),
            session.clone(),
        );

        Self {
            transport,
            queue: SerialQueue::new(config.dispatch_delay),
            session,
            refresher,
            gate: RefreshGate::default(),
            observer: Arc::new(NullObserver),
            config,
        }
    }

    /// Replace the session observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The session store backing this client
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.transport
    }

    // ========================================================================
    // Verb surface
    // ========================================================================

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.request(Method::GET, url, RequestConfig::default())
            .await
    }

    /// Make a GET request with config
    pub async fn get_with_config(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::GET, url, config).await
    }

    /// Make a POST request
    pub async fn post(&self, url: &str, body: Value) -> Result<Response> {
        self.request(Method::POST, url, RequestConfig::default().json(body))
            .await
    }

    /// Make a POST request with config
    pub async fn post_with_config(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::POST, url, config).await
    }

    /// Make a PUT request
    pub async fn put(&self, url: &str, body: Value) -> Result<Response> {
        self.request(Method::PUT, url, RequestConfig::default().json(body))
            .await
    }

    /// Make a PUT request with config
    pub async fn put_with_config(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::PUT, url, config).await
    }

    /// Make a PATCH request
    pub async fn patch(&self, url: &str, body: Value) -> Result<Response> {
        self.request(Method::PATCH, url, RequestConfig::default().json(body))
            .await
    }

    /// Make a PATCH request with config
    pub async fn patch_with_config(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::PATCH, url, config).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str) -> Result<Response> {
        self.request(Method::DELETE, url, RequestConfig::default())
            .await
    }

    /// Make a DELETE request with config
    pub async fn delete_with_config(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::DELETE, url, config).await
    }

    /// Make a GET request and parse the JSON body, logging any failure
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get_json_with_config(url, RequestConfig::default())
            .await
    }

    /// Make a GET request with config and parse the JSON body
    pub async fn get_json_with_config<T: DeserializeOwned>(
        &self,
        url: &str,
        config: RequestConfig,
    ) -> Result<T> {
        let outcome = match self.request(Method::GET, url, config).await {
            Ok(response) => response.json::<T>().await.map_err(Error::Http),
            Err(err) => Err(err),
        };

        if let Err(ref err) = outcome {
            error!(url, error = %err, "GET failed");
        }
        outcome
    }

    /// Download a binary body, with the longer download timeout applied
    pub async fn download(&self, url: &str) -> Result<Bytes> {
        let config = RequestConfig::default().timeout(self.config.download_timeout);
        let response = self.request(Method::GET, url, config).await?;
        response.bytes().await.map_err(Error::Http)
    }

    // ========================================================================
    // Request state machine
    // ========================================================================

    /// Make a generic request
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<Response> {
        let full_url = self.build_url(url)?;
        let is_refresh_call = !self.config.refresh_path.is_empty()
            && full_url.ends_with(self.config.refresh_path.as_str());
        let max_retries = config.max_retries.unwrap_or(self.config.max_rate_limit_retries);

        let mut attempt = RequestAttemptState::default();

        loop {
            let response = self.dispatch(method, &full_url, &config).await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt.rate_limit_retries < max_retries {
                    attempt.rate_limit_retries += 1;
                    let delay =
                        backoff_delay(self.config.rate_limit_backoff, attempt.rate_limit_retries);
                    warn!(
                        "Rate limited (429), retry {}/{}, waiting {:?}",
                        attempt.rate_limit_retries, max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                let body = response.text().await.unwrap_or_default();
                return Err(Error::HttpStatus {
                    status: 429,
                    body,
                });
            }

            if status == StatusCode::UNAUTHORIZED && !is_refresh_call && !attempt.refresh_replayed {
                // Whichever way the refresh goes, this request replays at
                // most once.
                attempt.refresh_replayed = true;

                match self.gate.begin().await {
                    RefreshTicket::Leader => {
                        let body = response.text().await.unwrap_or_default();
                        let original = Error::http_status(401, body);

                        match self.refresher.refresh().await {
                            Ok(token) => {
                                self.gate.complete(Ok(token)).await;
                                continue;
                            }
                            Err(refresh_err) => {
                                self.gate.complete(Err((&refresh_err).into())).await;
                                self.teardown_session().await;
                                return Err(original);
                            }
                        }
                    }
                    RefreshTicket::Follower(outcome) => match outcome.await {
                        Ok(Ok(_token)) => continue,
                        Ok(Err(failure)) => return Err(failure.into()),
                        Err(_) => return Err(Error::dispatch("refresh abandoned mid-flight")),
                    },
                }
            }

            if status == StatusCode::UNAUTHORIZED {
                // Refresh endpoint rejected, or the replayed request bounced
                // again: no second refresh.
                let body = response.text().await.unwrap_or_default();
                self.teardown_session().await;
                return Err(Error::http_status(401, body));
            }

            if status.is_client_error() || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::HttpStatus {
                    status: status.as_u16(),
                    body,
                });
            }

            debug!("Request succeeded: {:?} {}", method, full_url);
            return Ok(response);
        }
    }

    /// Run one attempt through the dispatch queue
    ///
    /// The bearer token is read from the session as the request leaves, so
    /// a replay issued after a refresh automatically carries the new token.
    async fn dispatch(
        &self,
        method: Method,
        full_url: &str,
        config: &RequestConfig,
    ) -> Result<Response> {
        let request = self.prepare(method, full_url, config);
        let session = self.session.clone();

        let sent = self.queue.run(move || async move {
            let request = match session.access_token().await {
                Some(token) => request.bearer_auth(token),
                None => request,
            };
            request.send().await
        });

        let timeout = config.timeout.unwrap_or(self.config.timeout);
        sent.await?.map_err(|e| classify_transport_error(e, timeout))
    }

    /// Build one attempt's request, minus the bearer header
    fn prepare(&self, method: Method, full_url: &str, config: &RequestConfig) -> RequestBuilder {
        let mut req = self.transport.request(method.into(), full_url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        for (key, value) in &config.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if !config.query.is_empty() {
            req = req.query(&config.query);
        }
        if let Some(ref body) = config.body {
            req = req.json(body);
        }

        req.timeout(config.timeout.unwrap_or(self.config.timeout))
    }

    /// Clear the session and signal the observer, exactly once per call
    async fn teardown_session(&self) {
        warn!("session torn down, sign-in required");
        self.session.clear().await;
        self.observer.session_expired().await;
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> Result<String> {
        join_url(self.config.base_url.as_deref(), path)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

/// Join a path onto an optional base URL
///
/// Absolute URLs pass through untouched; a malformed base is rejected up
/// front rather than surfacing as a transport error later.
pub(crate) fn join_url(base: Option<&str>, path: &str) -> Result<String> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Ok(path.to_string());
    }

    match base {
        Some(base) => {
            let parsed = Url::parse(base)?;
            let trimmed = parsed.as_str().trim_end_matches('/');
            Ok(format!("{trimmed}/{}", path.trim_start_matches('/')))
        }
        None => Ok(path.to_string()),
    }
}

/// Backoff before rate-limit retry `attempt` (1-based): base * 2^(n-1)
pub(crate) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base * factor
}

/// Map a transport failure, surfacing timeouts with the configured duration
fn classify_transport_error(err: reqwest::Error, timeout: Duration) -> Error {
    if err.is_timeout() {
        Error::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        Error::Http(err)
    }
}
