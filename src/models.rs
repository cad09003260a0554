//! Data models shared across the harvesting pipeline.
//!
//! This module defines the core data structures used throughout the crate:
//! - [`FeedDefinition`]: A feed as owned by the CMS, read-only here
//! - [`CanonicalFeedItem`]: A feed entry after RSS/Atom normalization
//! - [`ExtractedContent`]: Lead image and sanitized body pulled from the article page
//! - [`CandidatePost`]: The create-post payload submitted to the CMS
//! - [`CrawlResult`]: Per-feed outcome of a crawl
//! - [`QueueRequest`]: An out-of-band crawl request polled from the CMS queue
//!
//! Field names serialize in snake_case to match the CMS JSON schema.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A feed definition as listed by the CMS.
///
/// The crawler only ever holds read-only snapshots of these; the CMS owns
/// the authoritative copy and the `last_crawled_at` stamp.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedDefinition {
    /// CMS identity of the feed.
    pub id: String,
    /// Human-readable feed name, used only for logging.
    #[serde(default)]
    pub name: String,
    /// The RSS or Atom document URL.
    pub url: String,
    /// Inactive feeds are never due.
    #[serde(default)]
    pub is_active: bool,
    /// Minimum minutes between two crawls of this feed.
    #[serde(default)]
    pub crawl_interval_minutes: i64,
    /// RFC 3339 timestamp of the last completed crawl, if any.
    #[serde(default)]
    pub last_crawled_at: Option<String>,
}

impl FeedDefinition {
    /// Parse `last_crawled_at`, returning `None` when absent or unparseable.
    pub fn last_crawled(&self) -> Option<DateTime<Utc>> {
        self.last_crawled_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Whether the feed should be crawled at `now`.
    ///
    /// A feed is due when it is active and has either never been crawled or
    /// its crawl interval has elapsed. An unparseable timestamp counts as
    /// never crawled; an interval too large to represent never elapses.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        let Some(last) = self.last_crawled() else {
            return true;
        };
        TimeDelta::try_minutes(self.crawl_interval_minutes)
            .is_some_and(|interval| now - last >= interval)
    }
}

/// An image enclosure attached to an RSS item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Enclosure {
    pub url: String,
    pub mime_type: String,
}

impl Enclosure {
    /// True when the declared MIME type is an image type.
    pub fn is_image(&self) -> bool {
        self.mime_type.to_ascii_lowercase().starts_with("image/")
    }
}

/// A feed entry after format normalization, independent of RSS/Atom origin.
///
/// Produced fresh per parse and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CanonicalFeedItem {
    pub title: String,
    /// RSS `description` or Atom `summary`.
    pub summary: String,
    /// RSS `content:encoded` or Atom `content`.
    pub body: String,
    pub author: String,
    /// `None` when the date was absent or no supported format matched.
    pub published_at: Option<DateTime<Utc>>,
    /// Falls back to `link` when the document carries no GUID.
    pub guid: String,
    pub link: String,
    /// `media:thumbnail` URL.
    pub thumbnail_url: Option<String>,
    /// `media:content` URL.
    pub media_content_url: Option<String>,
    pub enclosure: Option<Enclosure>,
}

/// Content pulled from the article page linked by a feed item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedContent {
    /// Absolute URL of the lead image.
    pub image_url: Option<String>,
    /// Sanitized HTML of the main article body.
    pub full_content: Option<String>,
}

/// The create-post payload submitted to the CMS.
///
/// Built per item, classified, submitted, then dropped.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct CandidatePost {
    #[serde(rename = "inspiration_feed_id")]
    pub feed_id: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub url: String,
    pub author: Option<String>,
    /// RFC 3339, UTC.
    pub published_at: Option<String>,
    pub guid: String,
    pub image_url: Option<String>,
    pub full_content: Option<String>,
    pub is_primary_reporting: Option<bool>,
    pub original_source_name: Option<String>,
}

/// An existing CMS post; only its GUID matters to the crawler.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ExistingPost {
    #[serde(default)]
    pub guid: Option<String>,
}

/// Outcome of crawling one feed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CrawlResult {
    pub feed_id: String,
    pub success: bool,
    pub error: Option<String>,
    pub posts_found: usize,
    pub posts_added: usize,
    pub posts_skipped: usize,
}

impl CrawlResult {
    pub fn new(feed_id: impl Into<String>) -> Self {
        Self {
            feed_id: feed_id.into(),
            ..Default::default()
        }
    }

    /// Mark the result failed with a rendered error.
    pub fn failed(mut self, error: impl std::fmt::Display) -> Self {
        self.success = false;
        self.error = Some(error.to_string());
        self
    }
}

/// Aggregate counts over one batch of crawl results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchSummary {
    pub feeds: usize,
    pub successful: usize,
    pub failed: usize,
    pub posts_found: usize,
    pub posts_added: usize,
    pub posts_skipped: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[CrawlResult]) -> Self {
        results.iter().fold(
            BatchSummary {
                feeds: results.len(),
                ..Default::default()
            },
            |mut acc, r| {
                if r.success {
                    acc.successful += 1;
                } else {
                    acc.failed += 1;
                }
                acc.posts_found += r.posts_found;
                acc.posts_added += r.posts_added;
                acc.posts_skipped += r.posts_skipped;
                acc
            },
        )
    }
}

/// A queue request as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WireQueueRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub feed_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub priority: i32,
}

/// What a queue request asks the crawler to do, decided once at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Crawl one feed, bypassing the cache.
    Single { feed_id: String },
    /// Crawl every due feed.
    All,
    /// A `single` request without a feed id.
    MissingFeedId,
    /// A type this crawler does not understand.
    Unknown { kind: String },
}

/// An out-of-band crawl request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRequest {
    pub id: String,
    pub kind: RequestKind,
}

impl From<WireQueueRequest> for QueueRequest {
    fn from(wire: WireQueueRequest) -> Self {
        let kind = match wire.kind.as_str() {
            "single" => match wire.feed_id.filter(|id| !id.trim().is_empty()) {
                Some(feed_id) => RequestKind::Single { feed_id },
                None => RequestKind::MissingFeedId,
            },
            "all" => RequestKind::All,
            other => RequestKind::Unknown {
                kind: other.to_string(),
            },
        };
        QueueRequest { id: wire.id, kind }
    }
}

impl QueueRequest {
    /// Decode a queue request from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<WireQueueRequest>(json).map(Into::into)
    }
}
