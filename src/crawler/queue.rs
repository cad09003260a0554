//! Out-of-band crawl requests polled from the CMS queue.

use super::CrawlerService;
use crate::error::CrawlError;
use crate::models::{BatchSummary, CrawlResult, QueueRequest, RequestKind};
use tracing::{error, info, instrument, warn};

impl CrawlerService {
    /// Run one poll, dispatch and acknowledge cycle.
    ///
    /// Returns `Ok(None)` when the queue is empty or the request produced no
    /// results. A polled request is acknowledged exactly once whatever its
    /// dispatch did; dispatch and acknowledgement failures are logged only.
    /// Only a failed poll is an error.
    #[instrument(level = "info", skip_all)]
    pub async fn process_queue_request(&self) -> Result<Option<BatchSummary>, CrawlError> {
        let Some(request) = self.cms.poll_request().await.map_err(CrawlError::Poll)? else {
            return Ok(None);
        };
        info!(request_id = %request.id, kind = ?request.kind, "Processing queued crawl request");

        let results = match self.dispatch(&request).await {
            Ok(results) => results,
            Err(e) => {
                error!(request_id = %request.id, error = %e, "Queued crawl request failed");
                Vec::new()
            }
        };

        if let Err(e) = self.cms.ack_request(&request.id).await {
            warn!(request_id = %request.id, error = %e, "Failed to acknowledge request");
        }

        if results.is_empty() {
            return Ok(None);
        }
        let summary = BatchSummary::from_results(&results);
        info!(
            request_id = %request.id,
            feeds = summary.feeds,
            successful = summary.successful,
            failed = summary.failed,
            found = summary.posts_found,
            added = summary.posts_added,
            skipped = summary.posts_skipped,
            "Queued crawl request completed"
        );
        Ok(Some(summary))
    }

    async fn dispatch(&self, request: &QueueRequest) -> Result<Vec<CrawlResult>, CrawlError> {
        match &request.kind {
            RequestKind::Single { feed_id } => Ok(vec![self.crawl_feed(feed_id).await?]),
            RequestKind::All => self.crawl_all_due_feeds().await,
            RequestKind::MissingFeedId => {
                warn!(request_id = %request.id, "Single-feed request without a feed id");
                Ok(Vec::new())
            }
            RequestKind::Unknown { kind } => {
                warn!(request_id = %request.id, %kind, "Unknown request type");
                Ok(Vec::new())
            }
        }
    }
}
