//! Owned XML element tree for character sheet exports.
//!
//! Built with a `quick-xml` event reader. The tree keeps text segments
//! interleaved with child elements so full-subtree text comes back in
//! document order.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use sheetforge_domain::DocumentNode;
use thiserror::Error;

/// Errors raised while building a document tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Malformed XML: {0}")]
    Malformed(String),
    #[error("Document has no root element")]
    NoRoot,
    #[error("Document has a second root element <{0}>")]
    MultipleRoots(String),
    #[error("Element <{0}> is never closed")]
    Unclosed(String),
    #[error("Text outside the root element: '{0}'")]
    TextOutsideRoot(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Child(usize),
}

/// One element of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    segments: Vec<Segment>,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, DocumentError> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| DocumentError::Malformed(format!("<{}>: {}", tag, e)))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| DocumentError::Malformed(format!("<{}> @{}: {}", tag, key, e)))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            tag,
            attributes,
            children: Vec::new(),
            segments: Vec::new(),
        })
    }

    fn push_child(&mut self, child: Element) {
        self.segments.push(Segment::Child(self.children.len()));
        self.children.push(child);
    }

    fn push_text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(Segment::Text(existing)) => existing.push_str(&text),
            _ => self.segments.push(Segment::Text(text)),
        }
    }

    /// Parse an XML document into its root element.
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        let mut close = |element: Element, stack: &mut Vec<Element>| -> Result<(), DocumentError> {
            match stack.last_mut() {
                Some(parent) => parent.push_child(element),
                None if root.is_some() => return Err(DocumentError::MultipleRoots(element.tag)),
                None => root = Some(element),
            }
            Ok(())
        };

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| DocumentError::Malformed(format!("{} (at byte {})", e, reader.buffer_position())))?;
            match event {
                Event::Start(e) => stack.push(Element::open(&e)?),
                Event::Empty(e) => close(Element::open(&e)?, &mut stack)?,
                Event::End(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    match stack.pop() {
                        Some(element) if element.tag == name => close(element, &mut stack)?,
                        Some(element) => {
                            return Err(DocumentError::Malformed(format!(
                                "expected </{}>, found </{}>",
                                element.tag, name
                            )))
                        }
                        None => return Err(DocumentError::Malformed(format!("unexpected </{}>", name))),
                    }
                }
                Event::Text(e) => {
                    let text = e
                        .unescape()
                        .map_err(|err| DocumentError::Malformed(err.to_string()))?
                        .into_owned();
                    match stack.last_mut() {
                        Some(current) => current.push_text(text),
                        None if text.trim().is_empty() => {}
                        None => return Err(DocumentError::TextOutsideRoot(text.trim().to_string())),
                    }
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    match stack.last_mut() {
                        Some(current) => current.push_text(text),
                        None => return Err(DocumentError::TextOutsideRoot(text)),
                    }
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions and doctypes carry no sheet data
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.pop() {
            return Err(DocumentError::Unclosed(open.tag));
        }
        root.ok_or(DocumentError::NoRoot)
    }

    /// Parse raw file bytes. Input that is not UTF-8 is read as Latin-1,
    /// the encoding older sheet exports declare.
    pub fn parse_bytes(bytes: Vec<u8>) -> Result<Self, DocumentError> {
        let xml = match String::from_utf8(bytes) {
            Ok(xml) => xml,
            Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
        };
        Self::parse(&xml)
    }
}

impl DocumentNode for Element {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn children(&self) -> &[Self] {
        &self.children
    }

    fn text_content(&self) -> String {
        let mut text = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(s) => text.push_str(s),
                Segment::Child(idx) => text.push_str(&self.children[*idx].text_content()),
            }
        }
        text
    }

    fn own_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Text(s) => Some(s.as_str()),
                Segment::Child(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_tree_with_attributes() {
        let root = Element::parse(
            r#"<?xml version="1.0" encoding="utf-8"?>
            <root version="4.1">
                <character>
                    <name type="string">Rook</name>
                    <notes/>
                </character>
            </root>"#,
        )
        .expect("valid xml");

        assert_eq!(root.tag(), "root");
        assert_eq!(root.attribute("version"), Some("4.1"));
        let character = &root.children()[0];
        let tags: Vec<_> = character.children().iter().map(|c| c.tag()).collect();
        assert_eq!(tags, vec!["name", "notes"]);
        assert_eq!(character.children()[0].attribute("type"), Some("string"));
        assert_eq!(character.children()[1].text_content(), "");
    }

    #[test]
    fn text_content_is_in_document_order() {
        let root = Element::parse("<p>Hello <b>brave</b> new <i>world</i>!</p>").expect("valid xml");
        assert_eq!(root.text_content(), "Hello brave new world!");
        assert_eq!(root.own_text(), "Hello  new !");
    }

    #[test]
    fn entities_unescaped_and_cdata_kept() {
        let root = Element::parse("<t>Fish &amp; Chips <![CDATA[<raw>]]></t>").expect("valid xml");
        assert_eq!(root.text_content(), "Fish & Chips <raw>");
    }

    #[test]
    fn comments_are_ignored() {
        let root = Element::parse("<!-- exported --><t>a<!-- note -->b</t>").expect("valid xml");
        assert_eq!(root.text_content(), "ab");
    }

    #[test]
    fn rejects_mismatched_tags() {
        assert!(matches!(
            Element::parse("<a><b></a></b>"),
            Err(DocumentError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_unclosed_root() {
        assert!(matches!(
            Element::parse("<a><b/>"),
            Err(DocumentError::Unclosed(_) | DocumentError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_missing_and_extra_roots() {
        assert_eq!(Element::parse("  "), Err(DocumentError::NoRoot));
        assert_eq!(
            Element::parse("<a/><b/>"),
            Err(DocumentError::MultipleRoots("b".to_string()))
        );
        assert!(matches!(
            Element::parse("<a/>trailing"),
            Err(DocumentError::TextOutsideRoot(_))
        ));
    }

    #[test]
    fn latin1_bytes_are_decoded() {
        let bytes = b"<name>Ren\xe9e</name>".to_vec();
        let root = Element::parse_bytes(bytes).expect("latin-1 xml");
        assert_eq!(root.text_content(), "Renée");
    }
}
