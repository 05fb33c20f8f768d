//! HTTP page fetcher
//!
//! This module handles all requests to the subscription API, including:
//! - Building the HTTP client
//! - Building page URLs and attaching the API key header
//! - Retry logic for rate limits and transient failures
//! - Error classification
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 2xx with a JSON body | Return the page |
//! | HTTP 429 | Wait `Retry-After` seconds (default 5s, capped), retry; not counted |
//! | Other HTTP status | Wait 3s, retry; counted |
//! | Timeout / connect / DNS failure | Wait 3s, retry; counted |
//! | Undecodable body | Wait 3s, retry; counted |
//! | Request cannot be built | Fail immediately |
//!
//! After 3 counted failures the page fails with [`FetchError`].

use crate::config::Config;
use crate::pipeline::pause::Pause;
use crate::pulse::RawPage;
use crate::EtlError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A page could not be retrieved within the retry budget
#[derive(Debug, Clone, Error)]
#[error("Failed to retrieve page {page} after {attempts} attempts: {last_error}")]
pub struct FetchError {
    pub page: u32,
    pub attempts: u32,
    pub last_error: String,
}

/// Source of raw pages, one page per call
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, page: u32) -> Result<RawPage, FetchError>;
}

/// Everything the fetcher needs, already resolved
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub base_url: Url,
    pub api_key_header: String,
    pub api_key: String,
    pub page_size: u32,
    pub request_timeout: Duration,
    pub max_attempts: u32,
    pub transient_wait: Duration,
    pub rate_limit_wait: Duration,
    pub max_rate_limit_wait: Duration,
}

impl FetchSettings {
    /// Builds fetch settings from a validated config and a resolved API key
    pub fn from_config(config: &Config, api_key: String) -> Result<Self, EtlError> {
        Ok(Self {
            base_url: Url::parse(&config.api.base_url)?,
            api_key_header: config.api.api_key_header.clone(),
            api_key,
            page_size: config.api.page_size,
            request_timeout: Duration::from_secs(config.api.request_timeout_secs),
            max_attempts: config.retry.max_attempts,
            transient_wait: config.retry.transient_wait(),
            rate_limit_wait: config.retry.rate_limit_wait(),
            max_rate_limit_wait: config.retry.max_rate_limit_wait(),
        })
    }

    /// URL of the given page of subscribed pulses
    ///
    /// # Example
    ///
    /// With base `https://otx.alienvault.com/api/v1`, page 2 becomes
    /// `https://otx.alienvault.com/api/v1/pulses/subscribed?page=2&limit=50`.
    pub fn page_url(&self, page: u32) -> Result<Url, url::ParseError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(["pulses", "subscribed"]);
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &self.page_size.to_string());
        Ok(url)
    }
}

/// Builds an HTTP client for the subscription API
///
/// # Arguments
///
/// * `timeout` - Overall timeout for a single request attempt
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Why a single attempt did not produce a page
#[derive(Debug)]
enum AttemptError {
    /// HTTP 429; wait this long and try again without spending budget
    RateLimited { wait: Duration },

    /// Anything else worth retrying within the budget
    Transient(String),

    /// The request could not be built; retrying cannot help
    Fatal(String),
}

/// Fetches pages from the subscription API over HTTP
pub struct HttpFetcher {
    client: Client,
    settings: FetchSettings,
    pause: Arc<dyn Pause>,
}

impl HttpFetcher {
    /// Creates a fetcher with its own HTTP client
    pub fn new(settings: FetchSettings, pause: Arc<dyn Pause>) -> Result<Self, EtlError> {
        let client = build_http_client(settings.request_timeout)?;
        Ok(Self::with_client(client, settings, pause))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, settings: FetchSettings, pause: Arc<dyn Pause>) -> Self {
        Self {
            client,
            settings,
            pause,
        }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Performs exactly one request for the page
    async fn attempt(&self, url: &Url) -> Result<RawPage, AttemptError> {
        let response = self
            .client
            .get(url.clone())
            .header(
                self.settings.api_key_header.as_str(),
                self.settings.api_key.as_str(),
            )
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    AttemptError::Fatal(e.to_string())
                } else {
                    AttemptError::Transient(describe_transport_error(&e))
                }
            })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let requested =
                retry_after(response.headers()).unwrap_or(self.settings.rate_limit_wait);
            let wait = requested.min(self.settings.max_rate_limit_wait);
            if wait < requested {
                tracing::warn!(
                    "[Rate Limit] Server asked for {} seconds; capping at {}",
                    requested.as_secs(),
                    wait.as_secs()
                );
            }
            return Err(AttemptError::RateLimited { wait });
        }

        if !status.is_success() {
            return Err(AttemptError::Transient(format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AttemptError::Transient(format!("Failed to read body: {}", e)))?;

        RawPage::from_slice(&body)
            .map_err(|e| AttemptError::Transient(format!("Invalid JSON body: {}", e)))
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, page: u32) -> Result<RawPage, FetchError> {
        let url = self.settings.page_url(page).map_err(|e| FetchError {
            page,
            attempts: 0,
            last_error: format!("Invalid page URL: {}", e),
        })?;

        let mut failures = 0u32;

        loop {
            match self.attempt(&url).await {
                Ok(raw) => return Ok(raw),

                Err(AttemptError::RateLimited { wait }) => {
                    tracing::warn!(page, "[Rate Limit] Waiting {} seconds...", wait.as_secs());
                    self.pause.pause(wait).await;
                }

                Err(AttemptError::Transient(error)) => {
                    failures += 1;
                    if failures >= self.settings.max_attempts {
                        return Err(FetchError {
                            page,
                            attempts: failures,
                            last_error: error,
                        });
                    }
                    tracing::warn!(
                        page,
                        attempt = failures,
                        max_attempts = self.settings.max_attempts,
                        "Request failed: {}. Retrying...",
                        error
                    );
                    self.pause.pause(self.settings.transient_wait).await;
                }

                Err(AttemptError::Fatal(error)) => {
                    return Err(FetchError {
                        page,
                        attempts: failures + 1,
                        last_error: error,
                    });
                }
            }
        }
    }
}

/// Reads a `Retry-After` hint given in whole seconds
///
/// HTTP-date values and garbage are ignored so the caller falls back to its default.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    }
}
