//! Atom reader (`<feed><entry>`).

use super::dates::parse_feed_date;
use super::xml::{Record, Walk, walk};
use super::{FeedFormat, FeedMeta, ParsedFeed};
use crate::error::FeedParseError;
use crate::models::CanonicalFeedItem;

/// An Atom link element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomLink {
    pub href: String,
    pub rel: String,
}

/// An Atom entry in its native shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomEntry {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub links: Vec<AtomLink>,
    pub author_name: String,
    pub published: String,
    pub updated: String,
    pub id: String,
    pub thumbnail: Option<String>,
}

/// First link that is `rel="alternate"` or carries no relation.
pub fn alternate_link(links: &[AtomLink]) -> Option<&AtomLink> {
    links
        .iter()
        .find(|l| (l.rel.is_empty() || l.rel == "alternate") && !l.href.is_empty())
}

/// `type="xhtml"` content is inline markup, every other type is text.
fn content_of(record: &Record) -> String {
    match record.attr("content", "type").as_deref().map(str::trim) {
        Some("xhtml") => record.markup("content"),
        _ => record.text(&["content"]),
    }
}

fn links_of(record: &Record, path: &str) -> Vec<AtomLink> {
    record
        .elements
        .iter()
        .filter(|e| e.path == path)
        .map(|e| AtomLink {
            href: e.attr("href").unwrap_or_default().trim().to_string(),
            rel: e.attr("rel").unwrap_or_default().trim().to_string(),
        })
        .collect()
}

impl AtomEntry {
    pub(crate) fn from_record(record: &Record) -> Self {
        AtomEntry {
            title: record.text(&["title"]),
            summary: record.text(&["summary"]),
            content: content_of(record),
            links: links_of(record, "link"),
            author_name: record.text(&["author/name"]),
            published: record.text(&["published"]),
            updated: record.text(&["updated"]),
            id: record.text(&["id"]),
            thumbnail: record.attr("media:thumbnail", "url"),
        }
    }

    pub fn into_canonical(self) -> CanonicalFeedItem {
        let date = if self.published.is_empty() {
            &self.updated
        } else {
            &self.published
        };
        let published_at = parse_feed_date(date);
        let link = alternate_link(&self.links)
            .map(|l| l.href.clone())
            .unwrap_or_default();
        let guid = if self.id.is_empty() {
            link.clone()
        } else {
            self.id
        };
        CanonicalFeedItem {
            title: self.title,
            summary: self.summary,
            body: self.content,
            author: self.author_name,
            published_at,
            guid,
            link,
            thumbnail_url: self.thumbnail,
            media_content_url: None,
            enclosure: None,
        }
    }
}

pub(crate) fn parse(xml: &[u8]) -> Result<ParsedFeed, FeedParseError> {
    let Walk { root, meta, records } = walk(xml, "entry", "Atom")?;
    let root = root.unwrap_or_else(|| "feed".to_string());

    let feed_links = links_of(&meta, &format!("{root}/link"));
    let items = records
        .iter()
        .map(|r| AtomEntry::from_record(r).into_canonical())
        .collect();

    Ok(ParsedFeed {
        format: FeedFormat::Atom,
        meta: FeedMeta {
            title: meta.text(&[&format!("{root}/title")]),
            description: meta.text(&[&format!("{root}/subtitle")]),
            link: alternate_link(&feed_links)
                .map(|l| l.href.clone())
                .unwrap_or_default(),
        },
        items,
    })
}
