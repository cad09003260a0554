//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use feed_harvester::classify::{ClassificationRequest, ClassificationVerdict, ContentClassifier};
use feed_harvester::error::{ClassifierError, CmsError, FetchError};
use feed_harvester::fetch::{FEED_ACCEPT, FetchedPage, HttpFetcher};
use feed_harvester::models::{CandidatePost, ExistingPost, FeedDefinition, QueueRequest};
use feed_harvester::{CrawlerConfig, CrawlerService};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const RSS_FIXTURE: &str = include_str!("../fixtures/rss.xml");
pub const ATOM_FIXTURE: &str = include_str!("../fixtures/atom.xml");

pub const ARTICLE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta property="og:image" content="/images/lead.jpg">
  <title>Council passes budget</title>
</head>
<body>
  <nav><a href="/">Home</a><a href="/world">World</a></nav>
  <article>
    <h1>Council passes budget</h1>
    <p>The city council approved the annual budget on Tuesday after a long debate over
    funding for parks, libraries and road repairs across every district of the city.</p>
    <p>Members voted seven to two in favour, with the two dissenting members arguing that
    the plan spent too little on public transport and housing for families.</p>
  </article>
  <footer>Copyright</footer>
</body>
</html>"#;

pub fn feed(id: &str, url: &str) -> FeedDefinition {
    FeedDefinition {
        id: id.into(),
        name: format!("Feed {id}"),
        url: url.into(),
        is_active: true,
        crawl_interval_minutes: 60,
        last_crawled_at: None,
    }
}

/// A CMS that keeps everything in memory and counts its calls.
#[derive(Default)]
pub struct FakeCms {
    pub feeds: Mutex<Vec<FeedDefinition>>,
    pub posts: Mutex<Vec<CandidatePost>>,
    pub preexisting: Mutex<HashMap<String, Vec<String>>>,
    pub marked: Mutex<Vec<String>>,
    pub queue: Mutex<VecDeque<QueueRequest>>,
    pub acked: Mutex<Vec<String>>,
    pub reject_guids: Mutex<HashSet<String>>,
    pub list_feed_calls: AtomicUsize,
    pub fail_list_feeds: AtomicBool,
    pub fail_list_posts: AtomicBool,
    pub fail_mark: AtomicBool,
    pub fail_poll: AtomicBool,
    pub fail_ack: AtomicBool,
}

impl FakeCms {
    pub fn with_feeds(feeds: Vec<FeedDefinition>) -> Arc<Self> {
        let cms = Self::default();
        *cms.feeds.lock().unwrap() = feeds;
        Arc::new(cms)
    }

    pub fn enqueue(&self, request: QueueRequest) {
        self.queue.lock().unwrap().push_back(request);
    }

    pub fn created(&self) -> Vec<CandidatePost> {
        self.posts.lock().unwrap().clone()
    }

    pub fn acked(&self) -> Vec<String> {
        self.acked.lock().unwrap().clone()
    }
}

#[async_trait]
impl feed_harvester::CmsSource for FakeCms {
    async fn list_feeds(&self) -> Result<Vec<FeedDefinition>, CmsError> {
        self.list_feed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list_feeds.load(Ordering::SeqCst) {
            return Err(CmsError::Request("feed listing unavailable".into()));
        }
        Ok(self.feeds.lock().unwrap().clone())
    }

    async fn get_feed(&self, id: &str) -> Result<FeedDefinition, CmsError> {
        self.feeds
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| CmsError::NotFound { id: id.into() })
    }

    async fn list_posts(&self, feed_id: &str, limit: usize) -> Result<Vec<ExistingPost>, CmsError> {
        if self.fail_list_posts.load(Ordering::SeqCst) {
            return Err(CmsError::Request("post listing unavailable".into()));
        }
        let mut guids: Vec<String> = self
            .preexisting
            .lock()
            .unwrap()
            .get(feed_id)
            .cloned()
            .unwrap_or_default();
        guids.extend(
            self.posts
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.feed_id == feed_id)
                .map(|p| p.guid.clone()),
        );
        Ok(guids
            .into_iter()
            .take(limit)
            .map(|guid| ExistingPost { guid: Some(guid) })
            .collect())
    }

    async fn create_post(&self, post: &CandidatePost) -> Result<(), CmsError> {
        if self.reject_guids.lock().unwrap().contains(&post.guid) {
            return Err(CmsError::Request(format!("rejected {}", post.guid)));
        }
        self.posts.lock().unwrap().push(post.clone());
        Ok(())
    }

    async fn mark_crawled(&self, feed_id: &str) -> Result<(), CmsError> {
        if self.fail_mark.load(Ordering::SeqCst) {
            return Err(CmsError::Request("timestamp update failed".into()));
        }
        self.marked.lock().unwrap().push(feed_id.to_string());
        Ok(())
    }

    async fn poll_request(&self) -> Result<Option<QueueRequest>, CmsError> {
        if self.fail_poll.load(Ordering::SeqCst) {
            return Err(CmsError::Request("queue unavailable".into()));
        }
        Ok(self.queue.lock().unwrap().pop_front())
    }

    async fn ack_request(&self, id: &str) -> Result<(), CmsError> {
        self.acked.lock().unwrap().push(id.to_string());
        if self.fail_ack.load(Ordering::SeqCst) {
            return Err(CmsError::Request("ack failed".into()));
        }
        Ok(())
    }
}

/// Serves canned bodies by URL; anything else is a 404.
///
/// Feed fetches (identified by their `Accept` header) can be delayed per
/// URL, and the number of feed fetches in flight is tracked.
#[derive(Default)]
pub struct FakeFetcher {
    pub pages: Mutex<HashMap<String, String>>,
    pub feed_delays: Mutex<HashMap<String, Duration>>,
    pub requests: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serve(&self, url: &str, body: &str) {
        self.pages.lock().unwrap().insert(url.into(), body.into());
    }

    pub fn delay_feed(&self, url: &str, delay: Duration) {
        self.feed_delays.lock().unwrap().insert(url.into(), delay);
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl HttpFetcher for FakeFetcher {
    async fn get(&self, url: &str, accept: &str) -> Result<FetchedPage, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());

        if accept == FEED_ACCEPT {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let delay = self.feed_delays.lock().unwrap().get(url).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        let body = self.pages.lock().unwrap().get(url).cloned();
        match body {
            Some(body) => Ok(FetchedPage {
                final_url: url.to_string(),
                status: 200,
                body: body.into_bytes(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Returns a fixed verdict, or fails every call.
pub struct FixedClassifier {
    pub verdict: Option<ClassificationVerdict>,
    pub calls: AtomicUsize,
}

impl FixedClassifier {
    pub fn referencing(source: &str) -> Arc<Self> {
        Arc::new(Self {
            verdict: Some(ClassificationVerdict {
                is_primary_reporting: false,
                original_source_name: Some(source.into()),
                confidence: 0.8,
                reasoning: "cites another outlet".into(),
            }),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            verdict: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ContentClassifier for FixedClassifier {
    async fn classify(
        &self,
        _request: &ClassificationRequest,
    ) -> Result<ClassificationVerdict, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict
            .clone()
            .ok_or_else(|| ClassifierError::Request("model timed out".into()))
    }
}

pub fn config() -> CrawlerConfig {
    CrawlerConfig {
        enable_classification: false,
        ..CrawlerConfig::default()
    }
}

pub fn crawler(
    config: CrawlerConfig,
    cms: &Arc<FakeCms>,
    fetcher: &Arc<FakeFetcher>,
    classifier: Option<Arc<dyn ContentClassifier>>,
) -> CrawlerService {
    CrawlerService::new(config, cms.clone(), fetcher.clone(), classifier)
}
