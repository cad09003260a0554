//! Event-driven XML walk shared by the RSS and Atom readers.
//!
//! The walker flattens every `record_tag` element (RSS `item`, Atom `entry`)
//! into a [`Record`]: a document-ordered list of descendant elements keyed by
//! their slash-joined path below the record, with attributes and decoded
//! text. Record elements also keep their inner markup, so mixed content such
//! as Atom `type="xhtml"` bodies survives. Elements outside any record are
//! kept as feed-level metadata.
//! Qualified names keep their prefix (`media:thumbnail`, `content:encoded`).

use crate::error::FeedParseError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// One element below a record (or below the document root for metadata).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Element {
    pub path: String,
    pub attrs: Vec<(String, String)>,
    /// Direct text content, entity-decoded.
    pub text: String,
    /// Re-serialized children and text; only tracked inside records.
    pub inner: String,
}

impl Element {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A flattened record element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Record {
    pub elements: Vec<Element>,
}

impl Record {
    /// First non-blank text among `paths`, trying each path in order.
    pub fn text(&self, paths: &[&str]) -> String {
        paths
            .iter()
            .find_map(|path| {
                self.elements
                    .iter()
                    .filter(|e| e.path == *path)
                    .map(|e| e.text.trim())
                    .find(|t| !t.is_empty())
            })
            .unwrap_or_default()
            .to_string()
    }

    /// Inner markup of the first element at `path` with non-blank content.
    pub fn markup(&self, path: &str) -> String {
        self.elements
            .iter()
            .filter(|e| e.path == path)
            .map(|e| e.inner.trim())
            .find(|m| !m.is_empty())
            .unwrap_or_default()
            .to_string()
    }

    /// Elements whose path equals `path` or ends with `/path`, in document order.
    pub fn named<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements.iter().filter(move |e| {
            e.path == path
                || e.path
                    .strip_suffix(path)
                    .is_some_and(|head| head.ends_with('/'))
        })
    }

    /// First non-blank value of `attr` on an element matching `path`.
    pub fn attr(&self, path: &str, attr: &str) -> Option<String> {
        self.named(path)
            .filter_map(|e| e.attr(attr))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// Result of one walk: root name, feed-level metadata and records.
#[derive(Debug, Default)]
pub(crate) struct Walk {
    pub root: Option<String>,
    pub meta: Record,
    pub records: Vec<Record>,
}

#[derive(Clone, Copy)]
enum Slot {
    Meta(usize),
    Record(usize),
    Container,
}

/// Walk `xml`, flattening every `record_tag` element.
pub(crate) fn walk(
    xml: &[u8],
    record_tag: &str,
    format: &'static str,
) -> Result<Walk, FeedParseError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut out = Walk::default();
    let mut names: Vec<String> = Vec::new();
    let mut slots: Vec<Slot> = Vec::new();
    let mut record_depth: Option<usize> = None;
    let mut current: Option<Record> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| FeedParseError::Xml {
                format,
                position: reader.error_position() as u64,
                reason: e.to_string(),
            })?;

        match event {
            Event::Start(ref e) => {
                let name = qualified_name(e);
                append_markup(&slots, &mut current, &start_tag(e, &name, false));
                names.push(name.clone());
                let slot = open_element(
                    e,
                    &name,
                    record_tag,
                    &names,
                    &mut record_depth,
                    &mut current,
                    &mut out,
                );
                slots.push(slot);
            }
            Event::Empty(ref e) => {
                let name = qualified_name(e);
                append_markup(&slots, &mut current, &start_tag(e, &name, true));
                names.push(name.clone());
                open_element(
                    e,
                    &name,
                    record_tag,
                    &names,
                    &mut record_depth,
                    &mut current,
                    &mut out,
                );
                close_element(&mut names, &mut record_depth, &mut current, &mut out);
            }
            Event::End(_) => {
                slots.pop();
                if let Some(name) = names.last() {
                    append_markup(&slots, &mut current, &format!("</{name}>"));
                }
                close_element(&mut names, &mut record_depth, &mut current, &mut out);
            }
            Event::Text(ref t) => {
                append_text(&slots, &mut current, &mut out, &String::from_utf8_lossy(t));
            }
            Event::CData(ref t) => {
                append_text(&slots, &mut current, &mut out, &String::from_utf8_lossy(t));
            }
            Event::GeneralRef(ref r) => {
                let entity = resolve_entity(&String::from_utf8_lossy(r));
                append_text(&slots, &mut current, &mut out, &entity);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(record) = current.take() {
        // Unterminated trailing record in a truncated document.
        out.records.push(record);
    }
    Ok(out)
}

fn qualified_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attributes(e: &BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .map(|a| {
            (
                String::from_utf8_lossy(a.key.as_ref()).into_owned(),
                unescape(&String::from_utf8_lossy(&a.value)),
            )
        })
        .collect()
}

fn open_element(
    e: &BytesStart<'_>,
    name: &str,
    record_tag: &str,
    names: &[String],
    record_depth: &mut Option<usize>,
    current: &mut Option<Record>,
    out: &mut Walk,
) -> Slot {
    if out.root.is_none() {
        out.root = Some(name.to_string());
    }

    if let (Some(depth), Some(record)) = (*record_depth, current.as_mut()) {
        record.elements.push(Element {
            path: names[depth..].join("/"),
            attrs: attributes(e),
            ..Default::default()
        });
        return Slot::Record(record.elements.len() - 1);
    }

    if name == record_tag {
        *record_depth = Some(names.len());
        *current = Some(Record::default());
        return Slot::Container;
    }

    out.meta.elements.push(Element {
        path: names.join("/"),
        attrs: attributes(e),
        ..Default::default()
    });
    Slot::Meta(out.meta.elements.len() - 1)
}

fn close_element(
    names: &mut Vec<String>,
    record_depth: &mut Option<usize>,
    current: &mut Option<Record>,
    out: &mut Walk,
) {
    if *record_depth == Some(names.len()) {
        if let Some(record) = current.take() {
            out.records.push(record);
        }
        *record_depth = None;
    }
    names.pop();
}

fn append_text(slots: &[Slot], current: &mut Option<Record>, out: &mut Walk, text: &str) {
    append_markup(slots, current, &escape(text, false));
    match slots.last() {
        Some(Slot::Record(i)) => {
            if let Some(el) = current.as_mut().and_then(|r| r.elements.get_mut(*i)) {
                el.text.push_str(text);
            }
        }
        Some(Slot::Meta(i)) => {
            if let Some(el) = out.meta.elements.get_mut(*i) {
                el.text.push_str(text);
            }
        }
        _ => {}
    }
}

/// Append `markup` to the inner markup of every open record element.
fn append_markup(slots: &[Slot], current: &mut Option<Record>, markup: &str) {
    let Some(record) = current.as_mut() else {
        return;
    };
    for slot in slots {
        if let Slot::Record(i) = slot {
            if let Some(el) = record.elements.get_mut(*i) {
                el.inner.push_str(markup);
            }
        }
    }
}

fn start_tag(e: &BytesStart<'_>, name: &str, empty: bool) -> String {
    let mut tag = format!("<{name}");
    for (key, value) in attributes(e) {
        tag.push_str(&format!(" {key}=\"{}\"", escape(&value, true)));
    }
    tag.push_str(if empty { "/>" } else { ">" });
    tag
}

fn escape(text: &str, attribute: bool) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    if attribute {
        escaped.replace('"', "&quot;")
    } else {
        escaped
    }
}

/// Resolve an entity name (without `&` and `;`).
///
/// Covers the XML predefined entities, numeric references and the HTML
/// entities feeds most often leak; anything else is kept literally.
fn resolve_entity(name: &str) -> String {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => num.parse::<u32>().ok(),
        };
        if let Some(c) = code.and_then(char::from_u32) {
            return c.to_string();
        }
        return format!("&{name};");
    }
    let resolved = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        _ => return format!("&{name};"),
    };
    resolved.to_string()
}

/// Decode entity references inside an attribute value.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        match tail.find(';') {
            Some(semi) if semi > 0 && semi <= 10 => {
                out.push_str(&resolve_entity(&tail[..semi]));
                rest = &tail[semi + 1..];
            }
            _ => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
