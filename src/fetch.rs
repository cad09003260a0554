//! HTTP fetch boundary for feed documents and article pages.
//!
//! Everything that talks to a remote server goes through [`HttpFetcher`] so
//! the crawler and extractor can be driven by in-memory fakes in tests.

use crate::config::CrawlerConfig;
use crate::error::{ConfigError, FetchError};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// `Accept` header sent when fetching a feed document.
pub const FEED_ACCEPT: &str = "application/rss+xml, application/xml, text/xml";

/// `Accept` header sent when fetching an article page.
pub const PAGE_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// A successfully fetched (2xx) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL after redirects.
    pub final_url: String,
    pub status: u16,
    /// Raw body; may not be UTF-8.
    pub body: Vec<u8>,
}

impl FetchedPage {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Async GET with a caller-chosen `Accept` header.
///
/// Implementations return [`FetchError::Status`] for any non-2xx response.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(&self, url: &str, accept: &str) -> Result<FetchedPage, FetchError>;
}

/// [`HttpFetcher`] backed by one shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Build a client with the configured timeout, user agent and proxy.
    pub fn from_config(config: &CrawlerConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| ConfigError::Invalid(format!("user_agent is not a valid header: {e}")))?;
        headers.insert(USER_AGENT, agent);

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(config.request_timeout());

        if let Some(proxy) = &config.proxy_url {
            let proxy = reqwest::Proxy::all(proxy).map_err(ConfigError::HttpClient)?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(ConfigError::HttpClient)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn get(&self, url: &str, accept: &str) -> Result<FetchedPage, FetchError> {
        let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let t0 = Instant::now();
        let response = self
            .client
            .get(parsed)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|source| {
                warn!(error = %source, "HTTP request failed");
                FetchError::Transport {
                    url: url.to_string(),
                    source,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Non-success HTTP status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let body = response.bytes().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            %final_url,
            "Fetched"
        );

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}
