//! XML event source.
//!
//! The parsers in this crate never touch an XML library directly. They
//! implement [`ContentHandler`] and are driven by [`parse`], which turns a
//! namespace-aware quick-xml reader into `start_element` / `characters` /
//! `end_element` callbacks. Any other tokenizer can drive the same handlers.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use std::io::BufRead;

use crate::protocol::error::{Result, XmlRpcError};

/// A start tag as it was written: qualified name and attributes in
/// document order, values unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag<'a> {
    qname: &'a str,
    attributes: Vec<(String, String)>,
}

impl<'a> StartTag<'a> {
    pub fn new(qname: &'a str) -> Self {
        Self {
            qname,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn qname(&self) -> &'a str {
        self.qname
    }

    /// The name without its prefix.
    pub fn local_name(&self) -> &'a str {
        self.qname
            .rsplit_once(':')
            .map_or(self.qname, |(_, local)| local)
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }
}

/// Receiver of parse events.
///
/// `namespace` is the resolved namespace URI, or the empty string for
/// elements in no namespace. `name` is the local name.
pub trait ContentHandler {
    fn start_element(&mut self, namespace: &str, name: &str) -> Result<()>;

    /// Receives the full start tag. Handlers that keep markup verbatim
    /// override this; the default forwards the local name.
    fn start_tag(&mut self, namespace: &str, tag: &StartTag<'_>) -> Result<()> {
        self.start_element(namespace, tag.local_name())
    }

    fn characters(&mut self, text: &str) -> Result<()>;

    fn end_element(&mut self, namespace: &str, name: &str) -> Result<()>;
}

/// Reads a complete document from `reader`, feeding every event to `handler`.
///
/// Empty elements (`<ex:nil/>`) are delivered as a start followed by an end.
/// Declarations, comments and processing instructions are skipped. The first
/// error returned by the handler aborts the parse.
pub fn parse<R, H>(reader: R, handler: &mut H) -> Result<()>
where
    R: BufRead,
    H: ContentHandler + ?Sized,
{
    let mut reader = NsReader::from_reader(reader);
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let (resolved, event) = reader.read_resolved_event_into(&mut buf)?;
        let namespace = namespace_of(resolved)?;

        match event {
            Event::Start(e) => {
                if depth == 0 && seen_root {
                    return Err(XmlRpcError::Parse("Multiple document elements".to_string()));
                }
                handler.start_tag(&namespace, &start_tag(&e)?)?;
                depth += 1;
                seen_root = true;
            }
            Event::Empty(e) => {
                if depth == 0 && seen_root {
                    return Err(XmlRpcError::Parse("Multiple document elements".to_string()));
                }
                let tag = start_tag(&e)?;
                handler.start_tag(&namespace, &tag)?;
                handler.end_element(&namespace, tag.local_name())?;
                seen_root = true;
            }
            Event::End(e) => {
                let local = e.local_name();
                handler.end_element(&namespace, utf8(local.as_ref())?)?;
                depth = depth.saturating_sub(1);
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                if depth == 0 {
                    if !text.trim().is_empty() {
                        return Err(XmlRpcError::Parse(
                            "Character data outside the document element".to_string(),
                        ));
                    }
                } else {
                    handler.characters(&text)?;
                }
            }
            Event::CData(e) => {
                let bytes = e.into_inner();
                handler.characters(utf8(&bytes)?)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(XmlRpcError::Parse("Document contains no elements".to_string()));
    }
    if depth != 0 {
        return Err(XmlRpcError::Parse("Unexpected end of document".to_string()));
    }
    Ok(())
}

fn start_tag<'a>(e: &'a BytesStart<'_>) -> Result<StartTag<'a>> {
    let mut tag = StartTag::new(utf8(e.name().into_inner())?);
    for attribute in e.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let name = utf8(attribute.key.as_ref())?.to_string();
        let value = attribute.unescape_value()?.into_owned();
        tag = tag.with_attribute(name, value);
    }
    Ok(tag)
}

fn namespace_of(resolved: ResolveResult<'_>) -> Result<String> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(utf8(ns.as_ref())?.to_string()),
        ResolveResult::Unbound => Ok(String::new()),
        ResolveResult::Unknown(prefix) => Err(XmlRpcError::Parse(format!(
            "Unknown namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| XmlRpcError::Parse(format!("Invalid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ContentHandler for Recorder {
        fn start_element(&mut self, namespace: &str, name: &str) -> Result<()> {
            self.events.push(format!("start {}|{}", namespace, name));
            Ok(())
        }

        fn characters(&mut self, text: &str) -> Result<()> {
            self.events.push(format!("text {}", text));
            Ok(())
        }

        fn end_element(&mut self, namespace: &str, name: &str) -> Result<()> {
            self.events.push(format!("end {}|{}", namespace, name));
            Ok(())
        }
    }

    #[test]
    fn test_events_resolve_namespaces() {
        let xml = format!(
            r#"<?xml version="1.0"?><value xmlns:ex="{}"><ex:nil/></value>"#,
            crate::xml::EXTENSIONS_URI
        );
        let mut recorder = Recorder::default();
        parse(xml.as_bytes(), &mut recorder).unwrap();
        assert_eq!(
            recorder.events,
            vec![
                "start |value".to_string(),
                format!("start {}|nil", crate::xml::EXTENSIONS_URI),
                format!("end {}|nil", crate::xml::EXTENSIONS_URI),
                "end |value".to_string(),
            ]
        );
    }

    #[test]
    fn test_entities_are_unescaped() {
        let mut recorder = Recorder::default();
        parse(&b"<value>a &amp; b</value>"[..], &mut recorder).unwrap();
        assert!(recorder.events.contains(&"text a & b".to_string()));
    }

    #[derive(Default)]
    struct Tags {
        tags: Vec<(String, Vec<(String, String)>)>,
    }

    impl ContentHandler for Tags {
        fn start_element(&mut self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }

        fn start_tag(&mut self, _: &str, tag: &StartTag<'_>) -> Result<()> {
            self.tags.push((tag.qname().to_string(), tag.attributes().to_vec()));
            Ok(())
        }

        fn characters(&mut self, _: &str) -> Result<()> {
            Ok(())
        }

        fn end_element(&mut self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_start_tags_carry_qname_and_attributes() {
        let mut tags = Tags::default();
        parse(&b"<x:a xmlns:x=\"urn:x\" id=\"1 &amp; 2\"><b/></x:a>"[..], &mut tags).unwrap();
        assert_eq!(
            tags.tags,
            vec![
                (
                    "x:a".to_string(),
                    vec![
                        ("xmlns:x".to_string(), "urn:x".to_string()),
                        ("id".to_string(), "1 & 2".to_string()),
                    ]
                ),
                ("b".to_string(), Vec::new()),
            ]
        );
        assert_eq!(StartTag::new("x:a").local_name(), "a");
    }

    #[test]
    fn test_unbalanced_document_fails() {
        let mut recorder = Recorder::default();
        assert!(parse(&b"<value><int>1</value>"[..], &mut recorder).is_err());
    }

    #[test]
    fn test_empty_document_fails() {
        let mut recorder = Recorder::default();
        assert!(parse(&b"   "[..], &mut recorder).is_err());
    }
}
