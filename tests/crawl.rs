mod support;

use feed_harvester::classify::ContentClassifier;
use feed_harvester::error::CrawlError;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use support::*;

const FEED_URL: &str = "https://news.example/rss.xml";

fn rss_setup() -> (Arc<FakeCms>, Arc<FakeFetcher>) {
    let cms = FakeCms::with_feeds(vec![feed("city", FEED_URL)]);
    let fetcher = FakeFetcher::new();
    fetcher.serve(FEED_URL, RSS_FIXTURE);
    fetcher.serve("https://news.example/budget", ARTICLE_PAGE);
    (cms, fetcher)
}

#[tokio::test]
async fn test_crawl_feed_creates_candidates_in_document_order() {
    let (cms, fetcher) = rss_setup();
    let crawler = crawler(config(), &cms, &fetcher, None);

    let result = crawler.crawl_feed("city").await.unwrap();
    assert!(result.success);
    assert_eq!(result.error, None);
    assert_eq!(result.posts_found, 4);
    assert_eq!(result.posts_added, 3);
    assert_eq!(result.posts_skipped, 0);

    let created = cms.created();
    let guids: Vec<&str> = created.iter().map(|p| p.guid.as_str()).collect();
    assert_eq!(guids, ["budget-1", "storm-2", "https://news.example/transit"]);
    assert!(created.iter().all(|p| p.feed_id == "city"));
    assert_eq!(cms.marked.lock().unwrap().as_slice(), ["city"]);
}

#[tokio::test]
async fn test_extracted_content_and_media_fallback() {
    let (cms, fetcher) = rss_setup();
    let crawler = crawler(config(), &cms, &fetcher, None);
    crawler.crawl_feed("city").await.unwrap();
    let created = cms.created();

    let budget = &created[0];
    assert_eq!(budget.image_url.as_deref(), Some("https://news.example/images/lead.jpg"));
    let body = budget.full_content.as_deref().unwrap();
    assert!(body.contains("approved the annual budget"));
    assert!(!body.contains("Home"));
    assert_eq!(budget.author.as_deref(), Some("Jane Reporter"));
    assert_eq!(budget.published_at.as_deref(), Some("2006-01-02T22:04:05Z"));
    assert_eq!(budget.description.as_deref(), Some("The council voted 7-2."));

    let storm = &created[1];
    assert_eq!(storm.full_content, None);
    assert_eq!(storm.image_url.as_deref(), Some("https://cdn.example/storm-thumb.jpg"));

    let transit = &created[2];
    assert_eq!(transit.image_url.as_deref(), Some("https://cdn.example/chart.png"));
    assert_eq!(transit.published_at, None);
    assert_eq!(
        transit.content.as_deref(),
        Some("Ridership rose in every quarter.")
    );
}

#[tokio::test]
async fn test_second_run_adds_nothing() {
    let (cms, fetcher) = rss_setup();
    let crawler = crawler(config(), &cms, &fetcher, None);

    let first = crawler.crawl_feed("city").await.unwrap();
    assert_eq!(first.posts_added, 3);

    let second = crawler.crawl_feed("city").await.unwrap();
    assert!(second.success);
    assert_eq!(second.posts_found, 4);
    assert_eq!(second.posts_added, 0);
    assert_eq!(second.posts_skipped, 3);
    assert_eq!(cms.created().len(), 3);
}

#[tokio::test]
async fn test_known_guids_are_never_submitted() {
    let (cms, fetcher) = rss_setup();
    cms.preexisting
        .lock()
        .unwrap()
        .insert("city".into(), vec!["storm-2".into()]);
    let crawler = crawler(config(), &cms, &fetcher, None);

    let result = crawler.crawl_feed("city").await.unwrap();
    assert_eq!(result.posts_added, 2);
    assert_eq!(result.posts_skipped, 1);
    assert!(cms.created().iter().all(|p| p.guid != "storm-2"));
}

#[tokio::test]
async fn test_failed_submission_counts_as_skipped() {
    let (cms, fetcher) = rss_setup();
    cms.reject_guids.lock().unwrap().insert("budget-1".into());
    cms.fail_mark.store(true, Ordering::SeqCst);
    let crawler = crawler(config(), &cms, &fetcher, None);

    let result = crawler.crawl_feed("city").await.unwrap();
    assert!(result.success);
    assert_eq!(result.posts_added, 2);
    assert_eq!(result.posts_skipped, 1);
}

#[tokio::test]
async fn test_post_listing_failure_treats_everything_as_new() {
    let (cms, fetcher) = rss_setup();
    cms.fail_list_posts.store(true, Ordering::SeqCst);
    let crawler = crawler(config(), &cms, &fetcher, None);

    let result = crawler.crawl_feed("city").await.unwrap();
    assert!(result.success);
    assert_eq!(result.posts_added, 3);
}

#[tokio::test]
async fn test_unreachable_feed_is_a_failed_result() {
    let cms = FakeCms::with_feeds(vec![feed("gone", "https://gone.example/rss")]);
    let fetcher = FakeFetcher::new();
    let crawler = crawler(config(), &cms, &fetcher, None);

    let result = crawler.crawl_feed("gone").await.unwrap();
    assert!(!result.success);
    let error = result.error.unwrap();
    assert!(error.starts_with("failed to fetch feed"), "{error}");
    assert!(error.contains("404"), "{error}");
    assert!(cms.marked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_feed_is_a_failed_result() {
    let cms = FakeCms::with_feeds(vec![feed("bad", "https://bad.example/rss")]);
    let fetcher = FakeFetcher::new();
    fetcher.serve("https://bad.example/rss", "   ");
    let crawler = crawler(config(), &cms, &fetcher, None);

    let result = crawler.crawl_feed("bad").await.unwrap();
    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("failed to parse feed"));
}

#[tokio::test]
async fn test_empty_feed_succeeds_without_posts() {
    let cms = FakeCms::with_feeds(vec![feed("quiet", "https://quiet.example/rss")]);
    let fetcher = FakeFetcher::new();
    fetcher.serve(
        "https://quiet.example/rss",
        "<rss version=\"2.0\"><channel><title>Quiet</title></channel></rss>",
    );
    let crawler = crawler(config(), &cms, &fetcher, None);

    let result = crawler.crawl_feed("quiet").await.unwrap();
    assert!(result.success);
    assert_eq!(result.posts_found, 0);
    assert!(cms.created().is_empty());
}

#[tokio::test]
async fn test_unknown_feed_id_is_an_error() {
    let cms = FakeCms::with_feeds(Vec::new());
    let fetcher = FakeFetcher::new();
    let crawler = crawler(config(), &cms, &fetcher, None);

    let err = crawler.crawl_feed("missing").await.unwrap_err();
    assert!(matches!(err, CrawlError::FeedLookup { ref feed_id, .. } if feed_id == "missing"));
}

#[tokio::test]
async fn test_atom_feed_is_crawled() {
    let cms = FakeCms::with_feeds(vec![feed("lab", "https://blog.example/atom.xml")]);
    let fetcher = FakeFetcher::new();
    fetcher.serve("https://blog.example/atom.xml", ATOM_FIXTURE);
    let crawler = crawler(config(), &cms, &fetcher, None);

    let result = crawler.crawl_feed("lab").await.unwrap();
    assert_eq!(result.posts_added, 3);

    let created = cms.created();
    assert_eq!(created[0].url, "https://blog.example/telescope");
    assert_eq!(created[0].guid, "tag:blog.example,2024:telescope");
    assert_eq!(created[0].published_at.as_deref(), Some("2024-03-01T12:00:00Z"));
    assert_eq!(created[0].image_url.as_deref(), Some("https://blog.example/telescope.jpg"));
    assert_eq!(created[1].title, "Lab notes");
    assert_eq!(created[1].published_at.as_deref(), Some("2024-02-28T10:30:00Z"));

    let xhtml = created[2].content.as_deref().unwrap();
    assert!(xhtml.starts_with("<div xmlns=\"http://www.w3.org/1999/xhtml\">"), "{xhtml}");
    assert!(xhtml.contains("<strong>neon &amp; argon</strong> lines."), "{xhtml}");
}

#[tokio::test]
async fn test_disabled_classification_assumes_primary() {
    let (cms, fetcher) = rss_setup();
    let classifier = FixedClassifier::referencing("Reuters");
    let crawler = crawler(
        config(),
        &cms,
        &fetcher,
        Some(classifier.clone() as Arc<dyn ContentClassifier>),
    );

    crawler.crawl_feed("city").await.unwrap();
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    for post in cms.created() {
        assert_eq!(post.is_primary_reporting, Some(true));
        assert_eq!(post.original_source_name, None);
    }
}

#[tokio::test]
async fn test_classifier_verdict_is_applied() {
    let (cms, fetcher) = rss_setup();
    let classifier = FixedClassifier::referencing("Reuters");
    let config = feed_harvester::CrawlerConfig {
        enable_classification: true,
        ..config()
    };
    let crawler = crawler(
        config,
        &cms,
        &fetcher,
        Some(classifier.clone() as Arc<dyn ContentClassifier>),
    );

    crawler.crawl_feed("city").await.unwrap();
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 3);
    for post in cms.created() {
        assert_eq!(post.is_primary_reporting, Some(false));
        assert_eq!(post.original_source_name.as_deref(), Some("Reuters"));
    }
}

#[tokio::test]
async fn test_failing_classifier_assumes_referenced() {
    let (cms, fetcher) = rss_setup();
    let config = feed_harvester::CrawlerConfig {
        enable_classification: true,
        ..config()
    };
    let crawler = crawler(
        config,
        &cms,
        &fetcher,
        Some(FixedClassifier::failing() as Arc<dyn ContentClassifier>),
    );

    let result = crawler.crawl_feed("city").await.unwrap();
    assert_eq!(result.posts_added, 3);
    for post in cms.created() {
        assert_eq!(post.is_primary_reporting, Some(false));
        assert_eq!(post.original_source_name, None);
    }
}
