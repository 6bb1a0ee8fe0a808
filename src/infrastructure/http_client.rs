//! HTTP client for product page fetching with rate limiting and retries
//!
//! Each attempt presents a randomly chosen browser user agent. Attempts are
//! repeated while the request fails or the status is an error, up to the
//! configured limit; the last failure is then surfaced to the caller.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{Quota, RateLimiter, clock::DefaultClock, state::{InMemoryState, direct::NotKeyed}};
use reqwest::{Client, header::USER_AGENT};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::infrastructure::config::defaults;

/// Source of raw product page documents
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the page body for one product
    async fn fetch_document(&self, product_id: &str) -> Result<String>;
}

/// HTTP client configuration for page fetching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Browser user agents picked at random per attempt
    pub user_agents: Vec<String>,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    /// Attempts per page, first one included
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agents: defaults::USER_AGENTS.iter().map(ToString::to_string).collect(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            max_attempts: defaults::MAX_FETCH_ATTEMPTS,
            retry_delay_ms: defaults::RETRY_DELAY_MS,
        }
    }
}

/// Rate-limited HTTP client resolving product ids against a base URL
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    base_url: Url,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig, product_base_url: &str) -> Result<Self> {
        let base_url = Url::parse(product_base_url)
            .with_context(|| format!("Invalid product base URL: {product_base_url}"))?;

        // Build reqwest client
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to create HTTP client")?;

        // Setup rate limiter
        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second).context("Rate limit must be greater than 0")?,
        );
        let rate_limiter = RateLimiter::direct(quota);

        Ok(Self {
            client,
            rate_limiter,
            base_url,
            config,
        })
    }

    /// Page URL for a product id
    pub fn product_url(&self, product_id: &str) -> Result<Url> {
        self.base_url
            .join(product_id)
            .with_context(|| format!("Cannot build product URL for '{product_id}'"))
    }

    fn pick_user_agent(&self) -> Option<&str> {
        if self.config.user_agents.is_empty() {
            return None;
        }
        let index = fastrand::usize(..self.config.user_agents.len());
        Some(self.config.user_agents[index].as_str())
    }

    /// One rate-limited GET returning the body of a successful response
    async fn try_get_text(&self, url: &Url) -> Result<String> {
        self.rate_limiter.until_ready().await;

        let mut request = self.client.get(url.clone());
        if let Some(user_agent) = self.pick_user_agent() {
            request = request.header(USER_AGENT, user_agent);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {url}"))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            anyhow::bail!("HTTP request failed with status {}: {}", status, url);
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from: {url}"))
    }

    /// Fetch URL text, retrying failed attempts
    pub async fn get_text(&self, url: &Url) -> Result<String> {
        let attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            tracing::info!("Fetching URL: {} (attempt {}/{})", url, attempt, attempts);
            match self.try_get_text(url).await {
                Ok(text) => {
                    tracing::debug!("Successfully fetched: {} ({} chars)", url, text.len());
                    return Ok(text);
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!("Attempt {} for {} failed: {:#}", attempt, url, e);
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.context(format!("Giving up on {url} after {attempts} attempts"))),
            }
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

#[async_trait]
impl DocumentSource for HttpClient {
    async fn fetch_document(&self, product_id: &str) -> Result<String> {
        let url = self.product_url(product_id)?;
        self.get_text(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::amazon;

    #[tokio::test]
    async fn test_http_client_creation() {
        let client = HttpClient::new(HttpClientConfig::default(), amazon::PRODUCT_BASE_URL);
        assert!(client.is_ok());
    }

    #[test]
    fn test_zero_rate_limit_is_rejected() {
        let config = HttpClientConfig {
            max_requests_per_second: 0,
            ..Default::default()
        };
        assert!(HttpClient::new(config, amazon::PRODUCT_BASE_URL).is_err());
    }

    #[test]
    fn test_product_url() {
        let client = HttpClient::new(HttpClientConfig::default(), amazon::PRODUCT_BASE_URL).unwrap();
        assert_eq!(
            client.product_url("8804668237").unwrap().as_str(),
            "https://www.amazon.it/dp/8804668237"
        );
    }

    #[test]
    fn test_user_agent_comes_from_config() {
        let config = HttpClientConfig {
            user_agents: vec!["agent-a".into(), "agent-b".into()],
            ..Default::default()
        };
        let client = HttpClient::new(config, amazon::PRODUCT_BASE_URL).unwrap();
        for _ in 0..20 {
            assert!(matches!(client.pick_user_agent(), Some("agent-a" | "agent-b")));
        }

        let silent = HttpClient::new(
            HttpClientConfig {
                user_agents: Vec::new(),
                ..Default::default()
            },
            amazon::PRODUCT_BASE_URL,
        )
        .unwrap();
        assert_eq!(silent.pick_user_agent(), None);
    }
}
