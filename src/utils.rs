//! Utility functions for string cleanup and logging.
//!
//! This module provides helpers used throughout the crate:
//! - Bounded previews of long strings for log fields
//! - Tag stripping and newline normalization for feed-supplied text
//! - Character-safe truncation

use once_cell::sync::Lazy;
use regex::Regex;

static BR_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").unwrap());
static MULTI_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```
/// use feed_harvester::utils::truncate_for_log;
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Truncate to at most `max` characters, appending `marker` when cut.
pub fn truncate_chars(s: &str, max: usize, marker: &str) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}{}", &s[..cut], marker),
    }
}

/// Clean a feed-supplied text field.
///
/// Converts `<br>` variants to newlines, strips remaining tags, normalizes
/// line endings and collapses runs of blank lines, then trims.
///
/// # Examples
///
/// ```
/// use feed_harvester::utils::clean_text;
/// assert_eq!(clean_text("  <b>Hello</b><br/>world "), "Hello\nworld");
/// ```
pub fn clean_text(s: &str) -> String {
    let s = s.trim();
    let s = BR_TAG.replace_all(s, "\n");
    let s = ANY_TAG.replace_all(&s, "");
    let s = s.replace("\r\n", "\n").replace('\r', "\n");
    let s = MULTI_NEWLINE.replace_all(&s, "\n\n");
    s.trim().to_string()
}

/// `Some(cleaned)` when the cleaned text is non-empty.
pub fn non_empty(s: &str) -> Option<String> {
    let cleaned = clean_text(s);
    (!cleaned.is_empty()).then_some(cleaned)
}
