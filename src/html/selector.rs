//! A small selector engine for content lookup.
//!
//! Grammar: a whitespace-separated descendant chain of compound simple
//! selectors. Each compound is an optional tag name followed by any number of
//! `.class`, `#id`, `[attr]` and `[attr=value]` tests (values may be single or
//! double quoted). `A B C` matches a node matching `C` that has an ancestor
//! matching `A B`. Child and sibling combinators are not supported.

use crate::error::SelectorError;
use scraper::ElementRef;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrTest {
    Present(String),
    Equals(String, String),
}

/// One compound selector such as `div.post[data-id='1']`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl SimpleSelector {
    fn matches(&self, el: &ElementRef<'_>) -> bool {
        let value = el.value();
        if let Some(tag) = &self.tag {
            if !value.name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if value.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let Some(class_attr) = value.attr("class") else {
                return false;
            };
            let has_all = self
                .classes
                .iter()
                .all(|wanted| class_attr.split_whitespace().any(|c| c == wanted));
            if !has_all {
                return false;
            }
        }
        self.attrs.iter().all(|test| match test {
            AttrTest::Present(name) => value.attr(name).is_some(),
            AttrTest::Equals(name, expected) => value.attr(name) == Some(expected.as_str()),
        })
    }
}

/// A parsed descendant chain; the last part is the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSelector {
    parts: Vec<SimpleSelector>,
}

impl ContentSelector {
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        let unsupported = |reason: &str| SelectorError {
            selector: selector.to_string(),
            reason: reason.to_string(),
        };

        let tokens = split_chain(selector).ok_or_else(|| unsupported("unbalanced brackets or quotes"))?;
        if tokens.is_empty() {
            return Err(unsupported("empty selector"));
        }
        let parts = tokens
            .iter()
            .map(|t| parse_compound(t).map_err(|reason| unsupported(&reason)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { parts })
    }

    /// Whether `el` matches this selector.
    pub fn matches(&self, el: &ElementRef<'_>) -> bool {
        matches_chain(&self.parts, el)
    }

    /// First match in `root`'s subtree, `root` included, in document order.
    pub fn find_first<'a>(&self, root: ElementRef<'a>) -> Option<ElementRef<'a>> {
        root.descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| self.matches(el))
    }
}

fn matches_chain(parts: &[SimpleSelector], el: &ElementRef<'_>) -> bool {
    let Some((subject, ancestors)) = parts.split_last() else {
        return false;
    };
    if !subject.matches(el) {
        return false;
    }
    if ancestors.is_empty() {
        return true;
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| matches_chain(ancestors, &ancestor))
}

/// Does `el` match `selector`? Unsupported selectors never match.
pub fn matches(el: &ElementRef<'_>, selector: &str) -> bool {
    match ContentSelector::parse(selector) {
        Ok(parsed) => parsed.matches(el),
        Err(e) => {
            debug!(error = %e, "Skipping selector");
            false
        }
    }
}

/// First element under `root` matching `selector`.
///
/// Unsupported selectors find nothing.
pub fn find_first<'a>(root: ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    match ContentSelector::parse(selector) {
        Ok(parsed) => parsed.find_first(root),
        Err(e) => {
            debug!(error = %e, "Skipping selector");
            None
        }
    }
}

/// Split on whitespace that is outside brackets and quotes.
fn split_chain(selector: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in selector.trim().chars() {
        match (quote, c) {
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') if depth > 0 => {
                quote = Some(c);
                current.push(c);
            }
            (None, '[') => {
                depth += 1;
                current.push(c);
            }
            (None, ']') => {
                depth = depth.checked_sub(1)?;
                current.push(c);
            }
            (None, c) if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            (None, c) => current.push(c),
        }
    }
    if depth != 0 || quote.is_some() {
        return None;
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Some(tokens)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_name(chars: &[char], mut i: usize) -> (String, usize) {
    let start = i;
    while i < chars.len() && is_name_char(chars[i]) {
        i += 1;
    }
    (chars[start..i].iter().collect(), i)
}

fn parse_compound(token: &str) -> Result<SimpleSelector, String> {
    let chars: Vec<char> = token.chars().collect();
    let mut sel = SimpleSelector::default();
    let mut i = if chars.first() == Some(&'*') {
        1
    } else {
        let (tag, next) = take_name(&chars, 0);
        if !tag.is_empty() {
            sel.tag = Some(tag.to_ascii_lowercase());
        }
        next
    };

    while i < chars.len() {
        match chars[i] {
            '.' | '#' => {
                let (name, next) = take_name(&chars, i + 1);
                if name.is_empty() {
                    return Err(format!("empty name after {:?}", chars[i]));
                }
                if chars[i] == '.' {
                    sel.classes.push(name);
                } else {
                    sel.id = Some(name);
                }
                i = next;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .scan(None::<char>, |quote, &c| {
                        let closing = quote.is_none() && c == ']';
                        match (*quote, c) {
                            (Some(q), c) if c == q => *quote = None,
                            (None, '\'' | '"') => *quote = Some(c),
                            _ => {}
                        }
                        Some(closing)
                    })
                    .position(|closing| closing)
                    .map(|offset| i + offset)
                    .ok_or_else(|| "unterminated attribute test".to_string())?;
                let body: String = chars[i + 1..close].iter().collect();
                sel.attrs.push(parse_attr(&body)?);
                i = close + 1;
            }
            c => return Err(format!("unsupported character {c:?}")),
        }
    }

    if sel == SimpleSelector::default() && chars.first() != Some(&'*') {
        return Err("empty compound".into());
    }
    Ok(sel)
}

fn parse_attr(body: &str) -> Result<AttrTest, String> {
    match body.split_once('=') {
        Some((name, value)) => {
            let name = name.trim();
            if name.is_empty() || !name.chars().all(|c| is_name_char(c) || c == ':') {
                return Err(format!("bad attribute name {name:?}"));
            }
            let value = value.trim();
            let value = value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
                .unwrap_or(value);
            Ok(AttrTest::Equals(name.to_string(), value.to_string()))
        }
        None => {
            let name = body.trim();
            if name.is_empty() {
                return Err("empty attribute test".into());
            }
            Ok(AttrTest::Present(name.to_string()))
        }
    }
}
