//! RSS 2.0 reader (`<rss><channel><item>`).

use super::dates::parse_feed_date;
use super::xml::{Record, Walk, walk};
use super::{FeedMeta, ParsedFeed, FeedFormat};
use crate::error::FeedParseError;
use crate::models::{CanonicalFeedItem, Enclosure};

/// An RSS item in its native shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RssItem {
    pub title: String,
    pub description: String,
    pub content: String,
    pub link: String,
    pub author: String,
    pub pub_date: String,
    pub guid: String,
    pub enclosure: Option<Enclosure>,
    pub media_thumbnail: Option<String>,
    pub media_content: Option<String>,
}

impl RssItem {
    pub(crate) fn from_record(record: &Record) -> Self {
        let enclosure = record.named("enclosure").find_map(|e| {
            let url = e.attr("url")?.trim();
            (!url.is_empty()).then(|| Enclosure {
                url: url.to_string(),
                mime_type: e.attr("type").unwrap_or_default().trim().to_string(),
            })
        });

        RssItem {
            title: record.text(&["title"]),
            description: record.text(&["description"]),
            content: record.text(&["content:encoded", "content"]),
            link: record.text(&["link"]),
            author: record.text(&["author", "dc:creator"]),
            pub_date: record.text(&["pubDate", "dc:date"]),
            guid: record.text(&["guid"]),
            enclosure,
            media_thumbnail: record.attr("media:thumbnail", "url"),
            media_content: record.attr("media:content", "url"),
        }
    }

    pub fn into_canonical(self) -> CanonicalFeedItem {
        let guid = if self.guid.is_empty() {
            self.link.clone()
        } else {
            self.guid
        };
        CanonicalFeedItem {
            published_at: parse_feed_date(&self.pub_date),
            title: self.title,
            summary: self.description,
            body: self.content,
            author: self.author,
            guid,
            link: self.link,
            thumbnail_url: self.media_thumbnail,
            media_content_url: self.media_content,
            enclosure: self.enclosure,
        }
    }
}

pub(crate) fn parse(xml: &[u8]) -> Result<ParsedFeed, FeedParseError> {
    let Walk { meta, records, .. } = walk(xml, "item", "RSS")?;
    let items = records
        .iter()
        .map(|r| RssItem::from_record(r).into_canonical())
        .collect();
    Ok(ParsedFeed {
        format: FeedFormat::Rss,
        meta: FeedMeta {
            title: meta.text(&["rss/channel/title", "rdf:RDF/channel/title"]),
            description: meta.text(&["rss/channel/description", "rdf:RDF/channel/description"]),
            link: meta.text(&["rss/channel/link", "rdf:RDF/channel/link"]),
        },
        items,
    })
}
