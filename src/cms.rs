//! The CMS collaborator: owner of feed definitions, posts and the crawl
//! request queue.
//!
//! Only the contract lives here. Production deployments plug in their REST
//! client; tests plug in in-memory fakes.

use crate::error::CmsError;
use crate::models::{CandidatePost, ExistingPost, FeedDefinition, QueueRequest};
use async_trait::async_trait;

#[async_trait]
pub trait CmsSource: Send + Sync {
    /// Every feed definition, active or not.
    async fn list_feeds(&self) -> Result<Vec<FeedDefinition>, CmsError>;

    /// One feed definition; [`CmsError::NotFound`] when the id is unknown.
    async fn get_feed(&self, id: &str) -> Result<FeedDefinition, CmsError>;

    /// Up to `limit` most recent posts of a feed.
    async fn list_posts(&self, feed_id: &str, limit: usize) -> Result<Vec<ExistingPost>, CmsError>;

    async fn create_post(&self, post: &CandidatePost) -> Result<(), CmsError>;

    /// Stamp the feed's last-crawled time with now.
    async fn mark_crawled(&self, feed_id: &str) -> Result<(), CmsError>;

    /// At most one pending crawl request.
    async fn poll_request(&self) -> Result<Option<QueueRequest>, CmsError>;

    /// Remove a request from the queue.
    async fn ack_request(&self, id: &str) -> Result<(), CmsError>;
}
