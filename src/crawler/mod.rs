//! Crawl orchestration.
//!
//! [`CrawlerService`] ties the pipeline together: due feeds come out of the
//! [`FeedCache`], each feed is fetched and normalized, every item's article
//! page goes through the extractor, candidates are deduplicated by GUID
//! against the CMS, optionally classified, and submitted.
//!
//! Failures below the batch level never escape as errors. They are
//! absorbed into the [`CrawlResult`] counters of the feed they belong to.

pub mod cache;
mod queue;

pub use cache::FeedCache;

use crate::classify::retry::RetryClassifier;
use crate::classify::rules::RuleBasedClassifier;
use crate::classify::{ContentClassifier, attribution_for, classify_post};
use crate::cms::CmsSource;
use crate::config::CrawlerConfig;
use crate::error::{ConfigError, CrawlError};
use crate::feeds::fetch_feed;
use crate::fetch::{HttpFetcher, ReqwestFetcher};
use crate::html::extractor::ContentExtractor;
use crate::html::sanitizer::Sanitizer;
use crate::models::{CandidatePost, CanonicalFeedItem, CrawlResult, FeedDefinition};
use crate::utils::{clean_text, non_empty, truncate_for_log};
use chrono::{SecondsFormat, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

const CLASSIFIER_RETRY_DELAY: Duration = Duration::from_secs(1);

/// The crawl orchestrator and queue request processor.
pub struct CrawlerService {
    cms: Arc<dyn CmsSource>,
    fetcher: Arc<dyn HttpFetcher>,
    extractor: ContentExtractor,
    classifier: Option<Arc<dyn ContentClassifier>>,
    cache: FeedCache,
    config: CrawlerConfig,
}

impl std::fmt::Debug for CrawlerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlerService")
            .field("classifier", &self.classifier.is_some())
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish()
    }
}

impl CrawlerService {
    /// Wire a crawler from its collaborators.
    ///
    /// The classifier is dropped when classification is switched off in
    /// `config`, so every post then takes the disabled default.
    pub fn new(
        config: CrawlerConfig,
        cms: Arc<dyn CmsSource>,
        fetcher: Arc<dyn HttpFetcher>,
        classifier: Option<Arc<dyn ContentClassifier>>,
    ) -> Self {
        let classifier = classifier.filter(|_| config.enable_classification);
        let extractor = ContentExtractor::new(
            Arc::clone(&fetcher),
            Sanitizer::new(config.max_content_chars),
        );
        Self {
            cms,
            fetcher,
            extractor,
            classifier,
            cache: FeedCache::new(config.feed_cache_ttl()),
            config,
        }
    }

    /// Validate `config` and build a crawler over a real HTTP client.
    ///
    /// A supplied classifier is wrapped so that rule-based shortcuts run
    /// first and failed calls are retried `classifier_retries` times.
    pub fn from_config(
        config: CrawlerConfig,
        cms: Arc<dyn CmsSource>,
        classifier: Option<Arc<dyn ContentClassifier>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let enabled = config.classification_enabled(classifier.is_some());
        let fetcher: Arc<dyn HttpFetcher> = Arc::new(ReqwestFetcher::from_config(&config)?);
        let classifier = classifier.map(|inner| {
            let retrying =
                RetryClassifier::new(inner, config.classifier_retries, CLASSIFIER_RETRY_DELAY);
            Arc::new(RuleBasedClassifier::new(retrying)) as Arc<dyn ContentClassifier>
        });
        info!(
            max_concurrent_crawls = config.max_concurrent_crawls,
            feed_cache_ttl_secs = config.feed_cache_ttl_secs,
            classification = enabled,
            "Crawler configured"
        );
        Ok(Self::new(config, cms, fetcher, classifier))
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    /// Crawl every due feed, at most `max_concurrent_crawls` at a time.
    ///
    /// Results come back in the order of the due list, whatever order the
    /// crawls finish in. Only a failure to list feeds is an error.
    #[instrument(level = "info", skip_all)]
    pub async fn crawl_all_due_feeds(&self) -> Result<Vec<CrawlResult>, CrawlError> {
        let feeds = self
            .cache
            .get_feeds(self.cms.as_ref())
            .await
            .map_err(CrawlError::FeedList)?;

        let now = Utc::now();
        let due: Vec<FeedDefinition> = feeds.into_iter().filter(|f| f.is_due(now)).collect();
        if due.is_empty() {
            info!("No feeds due for crawling");
            return Ok(Vec::new());
        }

        let concurrency = self.config.max_concurrent_crawls.max(1);
        info!(due = due.len(), concurrency, "Starting crawl batch");

        let results: Vec<CrawlResult> = stream::iter(due.iter())
            .map(|feed| self.crawl_single_feed(feed))
            .buffered(concurrency)
            .collect()
            .await;

        let failed = results.iter().filter(|r| !r.success).count();
        info!(
            feeds = results.len(),
            failed,
            added = results.iter().map(|r| r.posts_added).sum::<usize>(),
            "Completed crawl batch"
        );
        Ok(results)
    }

    /// Crawl one feed by id, bypassing the cache and the due check.
    #[instrument(level = "info", skip(self))]
    pub async fn crawl_feed(&self, feed_id: &str) -> Result<CrawlResult, CrawlError> {
        let feed = self
            .cms
            .get_feed(feed_id)
            .await
            .map_err(|source| CrawlError::FeedLookup {
                feed_id: feed_id.to_string(),
                source,
            })?;
        Ok(self.crawl_single_feed(&feed).await)
    }

    #[instrument(level = "info", skip_all, fields(feed_id = %feed.id, feed = %feed.name))]
    async fn crawl_single_feed(&self, feed: &FeedDefinition) -> CrawlResult {
        let result = CrawlResult::new(&feed.id);

        let parsed = match fetch_feed(self.fetcher.as_ref(), &feed.url).await {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(url = %feed.url, error = %e, "Feed crawl failed");
                return result.failed(e);
            }
        };

        let mut result = CrawlResult {
            posts_found: parsed.items.len(),
            success: true,
            ..result
        };
        if parsed.items.is_empty() {
            info!("Feed has no items");
            return result;
        }

        let candidates = self.build_candidates(&feed.id, &parsed.items).await;
        let existing = self.existing_guids(&feed.id).await;

        for mut post in candidates {
            if existing.contains(&post.guid) {
                debug!(guid = %post.guid, "Skipping known post");
                result.posts_skipped += 1;
                continue;
            }

            let outcome = classify_post(self.classifier.as_deref(), &post).await;
            let attribution = attribution_for(&outcome);
            post.is_primary_reporting = Some(attribution.is_primary_reporting);
            post.original_source_name = attribution.original_source_name;

            match self.cms.create_post(&post).await {
                Ok(()) => {
                    debug!(guid = %post.guid, title = %truncate_for_log(&post.title, 80), "Created post");
                    result.posts_added += 1;
                }
                Err(e) => {
                    warn!(guid = %post.guid, error = %e, "Failed to create post");
                    result.posts_skipped += 1;
                }
            }
        }

        if let Err(e) = self.cms.mark_crawled(&feed.id).await {
            warn!(error = %e, "Failed to update last crawled time");
        }

        info!(
            found = result.posts_found,
            added = result.posts_added,
            skipped = result.posts_skipped,
            "Feed crawl completed"
        );
        result
    }

    async fn existing_guids(&self, feed_id: &str) -> HashSet<String> {
        match self
            .cms
            .list_posts(feed_id, self.config.existing_posts_limit)
            .await
        {
            Ok(posts) => posts.into_iter().filter_map(|p| p.guid).collect(),
            Err(e) => {
                warn!(error = %e, "Failed to list existing posts; treating all as new");
                HashSet::new()
            }
        }
    }

    /// Turn feed items into candidate posts, in document order.
    ///
    /// Items without a title or URL are dropped. Each remaining item's
    /// article page is extracted; a failed extraction only means the post
    /// carries no full content and falls back to feed-embedded media.
    async fn build_candidates(
        &self,
        feed_id: &str,
        items: &[CanonicalFeedItem],
    ) -> Vec<CandidatePost> {
        let mut candidates = Vec::with_capacity(items.len());
        for item in items {
            let Some(mut post) = candidate_from_item(feed_id, item) else {
                debug!(guid = %item.guid, "Dropping item without title or link");
                continue;
            };

            match self.extractor.extract(&post.url).await {
                Ok(extracted) => {
                    post.image_url = extracted.image_url;
                    post.full_content = extracted.full_content;
                }
                Err(e) => {
                    warn!(url = %post.url, error = %e, "Content extraction failed");
                }
            }
            if post.image_url.is_none() {
                post.image_url = feed_media_image(item);
            }
            candidates.push(post);
        }
        candidates
    }
}

/// Map a canonical item onto a post payload, without extraction or
/// classification. `None` when the cleaned title or link is empty.
pub fn candidate_from_item(feed_id: &str, item: &CanonicalFeedItem) -> Option<CandidatePost> {
    let title = clean_text(&item.title);
    let url = clean_text(&item.link);
    if title.is_empty() || url.is_empty() {
        return None;
    }
    let guid = non_empty(&item.guid).unwrap_or_else(|| url.clone());

    Some(CandidatePost {
        feed_id: feed_id.to_string(),
        title,
        description: non_empty(&item.summary),
        content: non_empty(&item.body),
        url,
        author: non_empty(&item.author),
        published_at: item
            .published_at
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true)),
        guid,
        ..Default::default()
    })
}

/// Image carried by the feed itself: thumbnail, then media content, then
/// an enclosure declared as an image.
pub fn feed_media_image(item: &CanonicalFeedItem) -> Option<String> {
    item.thumbnail_url
        .as_deref()
        .and_then(non_empty)
        .or_else(|| item.media_content_url.as_deref().and_then(non_empty))
        .or_else(|| {
            item.enclosure
                .as_ref()
                .filter(|enclosure| enclosure.is_image())
                .and_then(|enclosure| non_empty(&enclosure.url))
        })
}
