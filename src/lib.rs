//! # Feed Harvester
//!
//! A feed ingestion pipeline that reads RSS 2.0 and Atom feeds, pulls the
//! main article body and lead image out of each linked page, sanitizes that
//! content for storage, and submits deduplicated posts to a CMS.
//!
//! ## Features
//!
//! - Parses RSS 2.0 (including RDF, Dublin Core and Media RSS variants) and
//!   Atom into one canonical item shape, with multi-format date parsing
//! - Extracts article bodies with per-platform selector tables, a generic
//!   selector list and a largest-text-block fallback, gated by a content
//!   quality heuristic
//! - Sanitizes extracted HTML with structural pruning and an ammonia allow-list
//! - Deduplicates by GUID against the posts the CMS already holds
//! - Optionally classifies posts as primary or referenced reporting
//! - Crawls due feeds under a concurrency ceiling, with a TTL cache of feed
//!   definitions and an out-of-band request queue
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use feed_harvester::{CmsSource, CrawlerConfig, CrawlerService};
//!
//! # async fn run(cms: Arc<dyn CmsSource>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = CrawlerConfig::load("crawler.yaml")?;
//! feed_harvester::telemetry::init_tracing(&config.log_level);
//!
//! let crawler = CrawlerService::from_config(config, cms, None)?;
//! crawler.process_queue_request().await?;
//! let results = crawler.crawl_all_due_feeds().await?;
//! println!("crawled {} feeds", results.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Feeds** ([`feeds`]): fetch and normalize feed documents
//! 2. **Extraction** ([`html`]): selector engine, quality gate, sanitizer
//! 3. **Classification** ([`classify`]): attribution verdicts and defaults
//! 4. **Orchestration** ([`crawler`]): cache, bounded batches, queue cycle

pub mod classify;
pub mod cms;
pub mod config;
pub mod crawler;
pub mod error;
pub mod feeds;
pub mod fetch;
pub mod html;
pub mod models;
pub mod telemetry;
pub mod utils;

pub use classify::{ClassifierOutcome, ContentClassifier};
pub use cms::CmsSource;
pub use config::CrawlerConfig;
pub use crawler::{CrawlerService, FeedCache};
pub use error::{CmsError, CrawlError, FeedError, FetchError};
pub use fetch::{HttpFetcher, ReqwestFetcher};
pub use models::{BatchSummary, CandidatePost, CanonicalFeedItem, CrawlResult, FeedDefinition};
