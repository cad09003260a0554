//! Article page extraction: lead image and main body.
//!
//! The body is located with the platform table first (by page host, then by
//! the document's `<base>` or canonical URL), then the generic selector list,
//! then the largest text block. Every candidate must pass the quality gate;
//! the winner is sanitized before it is returned.

use super::platforms::{GENERIC_SELECTORS, platform_selectors};
use super::quality;
use super::sanitizer::Sanitizer;
use super::selector::find_first;
use super::visible_text;
use crate::error::FetchError;
use crate::fetch::{HttpFetcher, PAGE_ACCEPT};
use crate::models::ExtractedContent;
use scraper::{ElementRef, Html};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use url::Url;

/// Containers searched, in order, for a fallback lead image.
pub const IMAGE_CONTAINERS: &[&str] = &["article", "main", ".content", ".post-content", ".entry-content"];

/// Minimum text length for the largest-block fallback.
pub const MIN_BLOCK_CHARS: usize = 100;

/// Fetches article pages and pulls out their lead image and body.
#[derive(Clone)]
pub struct ContentExtractor {
    fetcher: Arc<dyn HttpFetcher>,
    sanitizer: Sanitizer,
}

impl std::fmt::Debug for ContentExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentExtractor")
            .field("sanitizer", &self.sanitizer)
            .finish()
    }
}

impl ContentExtractor {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, sanitizer: Sanitizer) -> Self {
        Self { fetcher, sanitizer }
    }

    /// Fetch `url` and extract from the response.
    ///
    /// Fails only when the page cannot be fetched; a page with nothing
    /// usable yields an empty [`ExtractedContent`].
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn extract(&self, url: &str) -> Result<ExtractedContent, FetchError> {
        let page = self.fetcher.get(url, PAGE_ACCEPT).await?;
        let extracted = self.extract_from_html(&page.text(), &page.final_url);
        info!(
            has_image = extracted.image_url.is_some(),
            content_chars = extracted
                .full_content
                .as_deref()
                .map_or(0, |c| c.chars().count()),
            "Extracted article content"
        );
        Ok(extracted)
    }

    /// Extract from an already fetched page body.
    pub fn extract_from_html(&self, body: &str, page_url: &str) -> ExtractedContent {
        let document = Html::parse_document(body);

        let image_url = main_image(&document, page_url);
        let full_content = main_content(&document, page_url)
            .map(|raw| self.sanitizer.clean(&raw))
            .filter(|clean| !clean.is_empty());

        ExtractedContent {
            image_url,
            full_content,
        }
    }
}

fn meta_content(document: &Html, key: &str) -> Option<String> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "meta")
        .find_map(|el| {
            let meta = el.value();
            let named = meta.attr("property") == Some(key) || meta.attr("name") == Some(key);
            let content = meta.attr("content").map(str::trim).unwrap_or_default();
            (named && !content.is_empty()).then(|| content.to_string())
        })
}

fn first_image_in(root: ElementRef<'_>) -> Option<String> {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "img")
        .find_map(|img| {
            img.value()
                .attr("src")
                .map(str::trim)
                .filter(|src| !src.is_empty())
                .map(str::to_string)
        })
}

fn resolve(href: &str, page_url: &str) -> String {
    Url::parse(page_url)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Lead image: `og:image`, then `twitter:image`, then the first `<img>` in
/// the first content container that has one.
pub fn main_image(document: &Html, page_url: &str) -> Option<String> {
    let root = document.root_element();
    let raw = meta_content(document, "og:image")
        .or_else(|| meta_content(document, "twitter:image"))
        .or_else(|| {
            IMAGE_CONTAINERS
                .iter()
                .filter_map(|sel| find_first(root, sel))
                .find_map(first_image_in)
        })?;
    Some(resolve(&raw, page_url))
}

/// `<base href>` or `<link rel="canonical">`, whichever comes first.
fn document_url(document: &Html) -> Option<String> {
    let root = document.root_element();
    let base = find_first(root, "base")
        .and_then(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty());
    if let Some(base) = base {
        return Some(base.to_string());
    }
    root.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "link")
        .find_map(|el| {
            let link = el.value();
            let href = link.attr("href").map(str::trim).unwrap_or_default();
            (link.attr("rel") == Some("canonical") && !href.is_empty()).then(|| href.to_string())
        })
}

fn first_passing(root: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        let html = find_first(root, sel)?.html();
        match quality::assess(&html) {
            Ok(()) => {
                debug!(selector = sel, "Selector produced article content");
                Some(html)
            }
            Err(reason) => {
                debug!(selector = sel, %reason, "Selector content rejected");
                None
            }
        }
    })
}

fn largest_block(document: &Html) -> Option<String> {
    let mut best: Option<(usize, ElementRef<'_>)> = None;
    for el in document.root_element().descendants().filter_map(ElementRef::wrap) {
        if matches!(el.value().name(), "html" | "head" | "body") {
            continue;
        }
        let len = visible_text(el).trim().chars().count();
        if len >= MIN_BLOCK_CHARS && best.is_none_or(|(best_len, _)| len > best_len) {
            best = Some((len, el));
        }
    }
    best.map(|(_, el)| el.html())
}

/// Raw (unsanitized) HTML of the main article body.
pub fn main_content(document: &Html, page_url: &str) -> Option<String> {
    let root = document.root_element();

    if let Some(selectors) = platform_selectors(page_url) {
        if let Some(html) = first_passing(root, selectors) {
            return Some(html);
        }
    }

    if let Some(selectors) = document_url(document).and_then(|u| platform_selectors(&u)) {
        if let Some(html) = first_passing(root, selectors) {
            return Some(html);
        }
    }

    if let Some(html) = first_passing(root, GENERIC_SELECTORS) {
        return Some(html);
    }

    debug!("No selector matched; falling back to largest text block");
    largest_block(document)
}
