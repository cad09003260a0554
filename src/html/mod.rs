//! HTML processing: selector matching, content extraction, quality scoring
//! and sanitization of article pages.

pub mod extractor;
pub mod platforms;
pub mod quality;
pub mod sanitizer;
pub mod selector;

use scraper::{ElementRef, Html, Node};

/// Text content of `el`, skipping `script` and `style` subtrees.
pub fn visible_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(el, &mut out);
    out
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) if matches!(e.name(), "script" | "style") => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

/// Visible text of an HTML fragment.
pub fn fragment_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    visible_text(fragment.root_element())
}
