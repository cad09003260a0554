//! Feed format normalization.
//!
//! RSS 2.0 and Atom documents are read into their native shapes
//! ([`rss::RssItem`], [`atom::AtomEntry`]) and converted into one
//! document-ordered sequence of [`CanonicalFeedItem`]s.

pub mod atom;
pub mod dates;
pub mod rss;
mod xml;

use crate::error::{FeedError, FeedParseError};
use crate::fetch::{FEED_ACCEPT, HttpFetcher};
use crate::models::CanonicalFeedItem;
use crate::utils::truncate_for_log;
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, info, instrument};

const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

/// The two supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    Atom,
}

/// Channel-level (RSS) or feed-level (Atom) metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedMeta {
    pub title: String,
    pub description: String,
    pub link: String,
}

/// A normalized feed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    pub format: FeedFormat,
    pub meta: FeedMeta,
    pub items: Vec<CanonicalFeedItem>,
}

/// Sniff the document format.
///
/// Atom when the document declares the Atom namespace as its default
/// namespace or its root element is `<feed>`; RSS otherwise.
pub fn detect_format(xml: &[u8]) -> FeedFormat {
    let text = String::from_utf8_lossy(xml);
    let declares_atom = [
        format!("xmlns=\"{ATOM_NAMESPACE}\""),
        format!("xmlns='{ATOM_NAMESPACE}'"),
    ]
    .iter()
    .any(|decl| text.contains(decl.as_str()));

    if declares_atom || root_element(xml).as_deref() == Some("feed") {
        FeedFormat::Atom
    } else {
        FeedFormat::Rss
    }
}

fn root_element(xml: &[u8]) -> Option<String> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
        buf.clear();
    }
}

/// Parse a feed document into canonical items, in document order.
///
/// Parsing is pure: the same bytes always yield the same items.
pub fn parse_feed(xml: &[u8]) -> Result<ParsedFeed, FeedParseError> {
    if xml.iter().all(u8::is_ascii_whitespace) {
        return Err(FeedParseError::Empty);
    }
    let format = detect_format(xml);
    debug!(?format, bytes = xml.len(), "Detected feed format");
    match format {
        FeedFormat::Atom => atom::parse(xml),
        FeedFormat::Rss => rss::parse(xml),
    }
}

/// Fetch a feed document and normalize it.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_feed<F>(fetcher: &F, url: &str) -> Result<ParsedFeed, FeedError>
where
    F: HttpFetcher + ?Sized,
{
    let page = fetcher.get(url, FEED_ACCEPT).await?;
    let feed = parse_feed(&page.body).map_err(|e| {
        debug!(
            body = %truncate_for_log(&String::from_utf8_lossy(&page.body), 200),
            "Unparseable feed body"
        );
        e
    })?;
    info!(
        format = ?feed.format,
        title = %feed.meta.title,
        items = feed.items.len(),
        "Parsed feed"
    );
    Ok(feed)
}
