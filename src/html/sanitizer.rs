//! Two-stage HTML sanitizer for extracted article bodies.
//!
//! Stage one prunes boilerplate subtrees (navigation, scripts, forms, ad and
//! tracking containers) from a parsed fragment. Stage two renders what is
//! left and passes it through an `ammonia` allow-list. A short regex
//! post-process then tidies whitespace, empty shells and line breaks.

use crate::config::DEFAULT_MAX_CONTENT_CHARS;
use crate::utils::truncate_chars;
use ammonia::{Builder, UrlRelative};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use scraper::node::Element;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Tags whose whole subtree is dropped.
pub const REMOVED_TAGS: &[&str] = &[
    "nav", "aside", "footer", "header", "script", "style", "noscript", "iframe", "object",
    "embed", "form", "input", "button", "select", "textarea",
];

/// Extra substrings that mark a `class`/`id`/`role` value as boilerplate.
pub const BOILERPLATE_MARKERS: &[&str] = &[
    "social",
    "share",
    "comment",
    "related",
    "popup",
    "modal",
    "subscription",
    "newsletter",
    "cookie",
    "gdpr",
    "privacy",
    "search",
    "login",
    "signup",
    "register",
    "breadcrumb",
];

const TRUNCATION_MARKER: &str = "...";

static AD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(advertisement|ad-container|ads|sidebar|nav|navigation|menu|header|footer|comments|social|share|related|popup|overlay|banner|promo|sponsored|widget)",
    )
    .unwrap()
});

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static EMPTY_P: Lazy<Regex> = Lazy::new(|| Regex::new(r"<p[^>]*>\s*</p>").unwrap());
static EMPTY_DIV: Lazy<Regex> = Lazy::new(|| Regex::new(r"<div[^>]*>\s*</div>").unwrap());
static EMPTY_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<span[^>]*>\s*</span>").unwrap());
static BR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(<br\s*/?>\s*){3,}").unwrap());
static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

// The regex crate has no backreferences, so each wrapper tag gets its own pattern.
static FALLBACK_STRIP: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["script", "style", "nav", "aside", "footer", "header", "form"]
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).unwrap())
        .collect()
});

static ALLOW_LIST: Lazy<Builder<'static>> = Lazy::new(|| {
    let tags: HashSet<&str> = [
        "p", "br", "strong", "b", "em", "i", "u", "strike", "del", "ins", "h1", "h2", "h3", "h4",
        "h5", "h6", "ul", "ol", "li", "a", "img", "blockquote", "q", "cite", "code", "pre",
        "table", "thead", "tbody", "tr", "td", "th", "div", "span",
    ]
    .into_iter()
    .collect();
    let tag_attributes: HashMap<&str, HashSet<&str>> = HashMap::from([
        ("a", HashSet::from(["href"])),
        ("img", HashSet::from(["src", "alt", "title"])),
    ]);

    let mut builder = Builder::empty();
    builder
        .tags(tags)
        .tag_attributes(tag_attributes)
        .clean_content_tags(HashSet::from(["script", "style"]))
        .url_schemes(HashSet::from(["http", "https", "mailto"]))
        .url_relative(UrlRelative::PassThrough)
        .link_rel(None)
        .strip_comments(true);
    builder
});

/// Whether a parsed element should be pruned with its subtree.
pub fn is_boilerplate(el: &Element) -> bool {
    if REMOVED_TAGS.contains(&el.name()) {
        return true;
    }
    el.attrs().any(|(key, value)| match key {
        "class" | "id" | "role" => {
            let value = value.to_lowercase();
            AD_PATTERN.is_match(&value) || BOILERPLATE_MARKERS.iter().any(|m| value.contains(m))
        }
        key => {
            key.starts_with("data-")
                && (key.contains("track") || key.contains("analytics") || key.contains("ga-"))
        }
    })
}

/// Article body sanitizer with a configurable output cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sanitizer {
    max_chars: usize,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTENT_CHARS)
    }
}

impl Sanitizer {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Prune, allow-list and tidy `raw`.
    pub fn clean(&self, raw: &str) -> String {
        if raw.trim().is_empty() {
            return String::new();
        }
        match prune(raw) {
            Some(pruned) => self.post_process(&ALLOW_LIST.clean(&pruned).to_string()),
            None => {
                debug!(bytes = raw.len(), "Parsed fragment is empty; using regex fallback");
                self.basic_clean(raw)
            }
        }
    }

    /// Regex-only degraded path: strip scripts, styles and wrapper tags,
    /// then allow-list and tidy.
    pub fn basic_clean(&self, raw: &str) -> String {
        let stripped = FALLBACK_STRIP
            .iter()
            .fold(raw.to_string(), |acc, re| re.replace_all(&acc, "").into_owned());
        self.post_process(&ALLOW_LIST.clean(&stripped).to_string())
    }

    fn post_process(&self, html: &str) -> String {
        let s = WHITESPACE_RUN.replace_all(html, " ");
        let s = EMPTY_P.replace_all(&s, "");
        let s = EMPTY_DIV.replace_all(&s, "");
        let s = EMPTY_SPAN.replace_all(&s, "");
        let s = BR_RUN.replace_all(&s, "<br><br>");
        let s = COMMENT.replace_all(&s, "");
        truncate_chars(s.trim(), self.max_chars, TRUNCATION_MARKER)
    }
}

/// Parse `raw` as a fragment, detach boilerplate subtrees and render the rest.
///
/// Returns `None` when the parser produced no nodes at all.
fn prune(raw: &str) -> Option<String> {
    let mut fragment = Html::parse_fragment(raw);
    if !fragment.root_element().has_children() {
        return None;
    }

    let doomed: Vec<_> = fragment
        .tree
        .nodes()
        .filter(|node| node.value().as_element().is_some_and(is_boilerplate))
        .map(|node| node.id())
        .collect();
    for id in doomed {
        if let Some(mut node) = fragment.tree.get_mut(id) {
            node.detach();
        }
    }

    Some(fragment.root_element().inner_html())
}
