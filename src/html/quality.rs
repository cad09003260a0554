//! Heuristic gate deciding whether an extracted block is article prose.

use super::fragment_text;
use std::fmt;

pub const MIN_TEXT_CHARS: usize = 100;
pub const MIN_WORDS: usize = 20;
/// Minimum visible-text to raw-markup length ratio.
pub const MIN_TEXT_RATIO: f64 = 0.1;
/// Maximum navigation phrase hits per word.
pub const MAX_NAV_DENSITY: f64 = 0.2;

pub const NAV_PHRASES: &[&str] = &[
    "menu",
    "navigation",
    "subscribe",
    "newsletter",
    "follow us",
    "social media",
    "share this",
];

/// Why a block was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    Empty,
    TooShort { chars: usize },
    TooFewWords { words: usize },
    MarkupHeavy { ratio: f64 },
    NavigationHeavy { density: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => write!(f, "empty"),
            Rejection::TooShort { chars } => write!(f, "only {chars} text characters"),
            Rejection::TooFewWords { words } => write!(f, "only {words} words"),
            Rejection::MarkupHeavy { ratio } => write!(f, "text/markup ratio {ratio:.3}"),
            Rejection::NavigationHeavy { density } => {
                write!(f, "navigation density {density:.3}")
            }
        }
    }
}

/// Score an HTML block, returning the first failed check.
pub fn assess(html: &str) -> Result<(), Rejection> {
    if html.trim().is_empty() {
        return Err(Rejection::Empty);
    }

    let text = fragment_text(html);
    let text = text.trim();

    let chars = text.chars().count();
    if chars < MIN_TEXT_CHARS {
        return Err(Rejection::TooShort { chars });
    }

    let words = text.split_whitespace().count();
    if words < MIN_WORDS {
        return Err(Rejection::TooFewWords { words });
    }

    let ratio = chars as f64 / html.chars().count() as f64;
    if ratio < MIN_TEXT_RATIO {
        return Err(Rejection::MarkupHeavy { ratio });
    }

    let lower = text.to_lowercase();
    let nav_hits: usize = NAV_PHRASES.iter().map(|p| lower.matches(p).count()).sum();
    let density = nav_hits as f64 / words as f64;
    if density > MAX_NAV_DENSITY {
        return Err(Rejection::NavigationHeavy { density });
    }

    Ok(())
}

/// Whether `html` looks like article content.
pub fn is_good_content(html: &str) -> bool {
    assess(html).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prose() -> String {
        let sentence = "The council approved the new budget after a long debate about road repairs. ";
        let text = sentence.repeat(4);
        assert!(text.chars().count() >= 300);
        assert!(text.split_whitespace().count() >= 40);
        text
    }

    #[test]
    fn test_short_snippet_rejected() {
        assert_eq!(assess("0123456789"), Err(Rejection::TooShort { chars: 10 }));
    }

    #[test]
    fn test_prose_paragraph_accepted() {
        assert!(is_good_content(&prose()));
        assert!(is_good_content(&format!("<p>{}</p>", prose())));
    }

    #[test]
    fn test_navigation_text_rejected_at_any_length() {
        for n in [30, 300] {
            let nav = "menu navigation subscribe newsletter ".repeat(n);
            assert!(matches!(
                assess(&nav),
                Err(Rejection::NavigationHeavy { .. })
            ));
        }
    }

    #[test]
    fn test_few_long_words_rejected() {
        let long_words = "supercalifragilisticexpialidocious ".repeat(5);
        assert!(matches!(assess(&long_words), Err(Rejection::TooFewWords { words: 5 })));
    }

    #[test]
    fn test_markup_heavy_block_rejected() {
        let attrs = "x".repeat(400);
        let html = format!(
            "<div data-a=\"{attrs}\" data-b=\"{attrs}\" data-c=\"{attrs}\">{}</div><span data-z=\"{}\"></span>",
            prose(),
            "y".repeat(3000)
        );
        assert!(matches!(assess(&html), Err(Rejection::MarkupHeavy { .. })));
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(assess("   "), Err(Rejection::Empty));
    }
}
