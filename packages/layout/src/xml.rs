//! Minimal element walker over `quick-xml` events.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Callbacks invoked while walking a document.
///
/// Paths are the local names of the open elements, outermost first.
pub(crate) trait XmlVisitor {
    /// An element opened (or an empty element was seen).
    fn element(&mut self, _path: &[String], _attributes: &[(String, String)]) {}

    /// An element closed with the given trimmed text content.
    fn text(&mut self, _path: &[String], _text: &str) {}
}

/// Walk `xml`, reporting elements and their text to `visitor`.
///
/// # Errors
///
/// * If the document is not well-formed
pub(crate) fn walk<V: XmlVisitor>(xml: &str, visitor: &mut V) -> Result<(), quick_xml::Error> {
    let mut reader = Reader::from_str(xml);

    let mut path: Vec<String> = Vec::new();
    let mut texts: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                path.push(local_name(&start));
                visitor.element(&path, &attributes(&start));
                texts.push(String::new());
            }
            Event::Empty(start) => {
                path.push(local_name(&start));
                visitor.element(&path, &attributes(&start));
                visitor.text(&path, "");
                path.pop();
            }
            Event::Text(text) => {
                if let Some(current) = texts.last_mut() {
                    current.push_str(&unescape(&String::from_utf8_lossy(text.as_ref())));
                }
            }
            Event::CData(data) => {
                if let Some(current) = texts.last_mut() {
                    current.push_str(&String::from_utf8_lossy(data.as_ref()));
                }
            }
            Event::GeneralRef(reference) => {
                if let Some(current) = texts.last_mut() {
                    let entity = format!("&{};", String::from_utf8_lossy(reference.as_ref()));
                    current.push_str(&unescape(&entity));
                }
            }
            Event::End(_) => {
                let text = texts.pop().unwrap_or_default();
                visitor.text(&path, text.trim());
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

/// Whether `path` ends with the given element names.
pub(crate) fn ends_with(path: &[String], suffix: &[&str]) -> bool {
    path.len() >= suffix.len()
        && path[path.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(a, b)| a == b)
}

/// Whether `path` is exactly the given element names.
pub(crate) fn is(path: &[String], expected: &[&str]) -> bool {
    path.len() == expected.len() && ends_with(path, expected)
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).to_string()
}

fn attributes(start: &BytesStart<'_>) -> Vec<(String, String)> {
    start
        .attributes()
        .filter_map(Result::ok)
        .map(|attr| {
            (
                String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string(),
                unescape(&String::from_utf8_lossy(&attr.value)),
            )
        })
        .collect()
}

fn unescape(raw: &str) -> String {
    quick_xml::escape::unescape(raw).map_or_else(|_| raw.to_string(), |s| s.to_string())
}
