mod support;

use feed_harvester::error::CrawlError;
use feed_harvester::models::{QueueRequest, RequestKind};
use std::sync::atomic::Ordering;
use support::*;

const FEED_URL: &str = "https://news.example/rss.xml";

fn request(id: &str, kind: RequestKind) -> QueueRequest {
    QueueRequest { id: id.into(), kind }
}

fn setup() -> (std::sync::Arc<FakeCms>, std::sync::Arc<FakeFetcher>) {
    let cms = FakeCms::with_feeds(vec![feed("city", FEED_URL)]);
    let fetcher = FakeFetcher::new();
    fetcher.serve(FEED_URL, RSS_FIXTURE);
    (cms, fetcher)
}

#[tokio::test]
async fn test_empty_queue_is_a_noop() {
    let (cms, fetcher) = setup();
    let crawler = crawler(config(), &cms, &fetcher, None);

    assert_eq!(crawler.process_queue_request().await.unwrap(), None);
    assert!(cms.acked().is_empty());
    assert!(fetcher.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_single_request_crawls_and_acks_once() {
    let (cms, fetcher) = setup();
    cms.enqueue(request(
        "r1",
        RequestKind::Single {
            feed_id: "city".into(),
        },
    ));
    let crawler = crawler(config(), &cms, &fetcher, None);

    let summary = crawler.process_queue_request().await.unwrap().unwrap();
    assert_eq!(summary.feeds, 1);
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.posts_found, 4);
    assert_eq!(summary.posts_added, 3);
    assert_eq!(cms.acked(), ["r1"]);
    // Single-feed requests bypass the cache.
    assert_eq!(cms.list_feed_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_all_request_crawls_due_feeds() {
    let (cms, fetcher) = setup();
    cms.enqueue(request("r2", RequestKind::All));
    let crawler = crawler(config(), &cms, &fetcher, None);

    let summary = crawler.process_queue_request().await.unwrap().unwrap();
    assert_eq!(summary.feeds, 1);
    assert_eq!(cms.acked(), ["r2"]);
    assert_eq!(cms.list_feed_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_dispatch_is_still_acked_once() {
    let (cms, fetcher) = setup();
    cms.enqueue(request(
        "r3",
        RequestKind::Single {
            feed_id: "deleted".into(),
        },
    ));
    let crawler = crawler(config(), &cms, &fetcher, None);

    assert_eq!(crawler.process_queue_request().await.unwrap(), None);
    assert_eq!(cms.acked(), ["r3"]);

    // Nothing left for the next cycle.
    assert_eq!(crawler.process_queue_request().await.unwrap(), None);
    assert_eq!(cms.acked(), ["r3"]);
}

#[tokio::test]
async fn test_failed_batch_listing_is_still_acked() {
    let (cms, fetcher) = setup();
    cms.fail_list_feeds.store(true, Ordering::SeqCst);
    cms.enqueue(request("r4", RequestKind::All));
    let crawler = crawler(config(), &cms, &fetcher, None);

    assert_eq!(crawler.process_queue_request().await.unwrap(), None);
    assert_eq!(cms.acked(), ["r4"]);
}

#[tokio::test]
async fn test_malformed_requests_are_acked_and_ignored() {
    let (cms, fetcher) = setup();
    cms.enqueue(request("r5", RequestKind::MissingFeedId));
    cms.enqueue(request(
        "r6",
        RequestKind::Unknown {
            kind: "purge".into(),
        },
    ));
    let crawler = crawler(config(), &cms, &fetcher, None);

    assert_eq!(crawler.process_queue_request().await.unwrap(), None);
    assert_eq!(crawler.process_queue_request().await.unwrap(), None);
    assert_eq!(cms.acked(), ["r5", "r6"]);
    assert!(fetcher.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_wire_requests_decode_to_kinds() {
    let (cms, fetcher) = setup();
    for json in [
        r#"{"id":"w1","type":"single","feed_id":"city","priority":1}"#,
        r#"{"id":"w2","type":"single"}"#,
        r#"{"id":"w3","type":"reindex"}"#,
    ] {
        cms.enqueue(QueueRequest::from_json(json).unwrap());
    }
    let crawler = crawler(config(), &cms, &fetcher, None);

    assert!(crawler.process_queue_request().await.unwrap().is_some());
    assert_eq!(crawler.process_queue_request().await.unwrap(), None);
    assert_eq!(crawler.process_queue_request().await.unwrap(), None);
    assert_eq!(cms.acked(), ["w1", "w2", "w3"]);
}

#[tokio::test]
async fn test_ack_failure_is_not_an_error() {
    let (cms, fetcher) = setup();
    cms.fail_ack.store(true, Ordering::SeqCst);
    cms.enqueue(request("r7", RequestKind::All));
    let crawler = crawler(config(), &cms, &fetcher, None);

    assert!(crawler.process_queue_request().await.unwrap().is_some());
    assert_eq!(cms.acked(), ["r7"]);
}

#[tokio::test]
async fn test_poll_failure_propagates() {
    let (cms, fetcher) = setup();
    cms.fail_poll.store(true, Ordering::SeqCst);
    let crawler = crawler(config(), &cms, &fetcher, None);

    let err = crawler.process_queue_request().await.unwrap_err();
    assert!(matches!(err, CrawlError::Poll(_)));
}
