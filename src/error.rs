//! Typed errors for the harvesting pipeline.
//!
//! Each stage gets its own error type so callers can decide whether a
//! failure is absorbed (item/feed scoped) or propagated (batch initiation).

use thiserror::Error;

/// Failures at the HTTP fetch boundary (feeds and article pages).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read body from {url}: {reason}")]
    Body { url: String, reason: String },
}

/// Failures turning a feed document into canonical items.
#[derive(Debug, Error)]
pub enum FeedParseError {
    #[error("feed document is empty")]
    Empty,

    #[error("malformed {format} document at byte {position}: {reason}")]
    Xml {
        format: &'static str,
        position: u64,
        reason: String,
    },
}

/// A content selector outside the supported grammar.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unsupported selector {selector:?}: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

/// Failures reported by the CMS collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CmsError {
    #[error("feed {id} not found")]
    NotFound { id: String },

    #[error("CMS request failed: {0}")]
    Request(String),
}

/// Failures reported by the content classifier collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Request(String),

    #[error("classifier returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// Errors that abort a crawl invocation before any feed is processed.
///
/// Everything that happens after a batch has started is absorbed into
/// [`crate::models::CrawlResult`] counters instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("failed to get feeds: {0}")]
    FeedList(#[source] CmsError),

    #[error("failed to get feed {feed_id}: {source}")]
    FeedLookup {
        feed_id: String,
        #[source]
        source: CmsError,
    },

    #[error("failed to poll for requests: {0}")]
    Poll(#[source] CmsError),
}

/// Errors that occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Error surfaced when a feed-level crawl fails; carried inside a result.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to fetch feed: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to parse feed: {0}")]
    Parse(#[from] FeedParseError),
}
