//! TTL-bounded, single-flight read-through cache of feed definitions.

use crate::cms::CmsSource;
use crate::error::CmsError;
use crate::models::FeedDefinition;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

#[derive(Debug, Default)]
struct CachedFeedSet {
    feeds: Vec<FeedDefinition>,
    refreshed_at: Option<Instant>,
}

impl CachedFeedSet {
    /// Fresh means non-empty and refreshed less than `ttl` ago.
    fn fresh(&self, ttl: Duration) -> Option<&[FeedDefinition]> {
        let refreshed_at = self.refreshed_at?;
        (!self.feeds.is_empty() && refreshed_at.elapsed() < ttl).then_some(self.feeds.as_slice())
    }
}

/// Shared snapshot of the CMS feed list.
///
/// Readers holding a fresh snapshot never touch the network. When the
/// snapshot is stale, callers serialize on the write lock and only the first
/// one refetches; the rest see the refreshed set on re-check. A failed
/// refresh leaves the previous snapshot and its timestamp untouched.
#[derive(Debug)]
pub struct FeedCache {
    ttl: Duration,
    state: RwLock<CachedFeedSet>,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(CachedFeedSet::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[instrument(level = "debug", skip_all)]
    pub async fn get_feeds(&self, cms: &dyn CmsSource) -> Result<Vec<FeedDefinition>, CmsError> {
        {
            let state = self.state.read().await;
            if let Some(feeds) = state.fresh(self.ttl) {
                debug!(feeds = feeds.len(), "Feed cache hit");
                return Ok(feeds.to_vec());
            }
        }

        let mut state = self.state.write().await;
        if let Some(feeds) = state.fresh(self.ttl) {
            debug!(feeds = feeds.len(), "Feed cache refreshed by a concurrent caller");
            return Ok(feeds.to_vec());
        }

        let feeds = cms.list_feeds().await?;
        info!(feeds = feeds.len(), "Refreshed feed cache");
        state.feeds = feeds.clone();
        state.refreshed_at = Some(Instant::now());
        Ok(feeds)
    }

    /// Drop the snapshot so the next read refetches.
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        state.feeds.clear();
        state.refreshed_at = None;
    }
}
