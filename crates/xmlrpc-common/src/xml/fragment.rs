//! Canonical form of `ex:dom` fragments.
//!
//! A fragment is kept as text. Both directions go through [`FragmentBuilder`]
//! so that a value decoded from the wire and a value about to be written
//! look the same: qualified names and attributes as written, empty elements
//! collapsed to `<a/>`, and only `<`, `>` and `&` escaped in character data.

use quick_xml::escape::partial_escape;

use super::events::{self, ContentHandler, StartTag};
use crate::protocol::error::{Result, XmlRpcError};

const KIND: &str = "dom";

/// Rebuilds a single element tree from parse events.
#[derive(Debug, Default)]
pub struct FragmentBuilder {
    out: String,
    open: Vec<String>,
    start_pending: bool,
    has_root: bool,
}

impl FragmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an element of the fragment is still open.
    pub fn is_open(&self) -> bool {
        !self.open.is_empty()
    }

    pub fn finish(self) -> Result<String> {
        if self.is_open() {
            return Err(XmlRpcError::malformed(KIND, "Unclosed element in fragment"));
        }
        Ok(self.out)
    }

    fn close_pending(&mut self) {
        if self.start_pending {
            self.out.push('>');
            self.start_pending = false;
        }
    }
}

impl ContentHandler for FragmentBuilder {
    fn start_element(&mut self, namespace: &str, name: &str) -> Result<()> {
        self.start_tag(namespace, &StartTag::new(name))
    }

    fn start_tag(&mut self, _namespace: &str, tag: &StartTag<'_>) -> Result<()> {
        if self.open.is_empty() && self.has_root {
            return Err(XmlRpcError::malformed(KIND, "Fragment has more than one root element"));
        }
        self.close_pending();
        self.out.push('<');
        self.out.push_str(tag.qname());
        for (name, value) in tag.attributes() {
            self.out.push(' ');
            self.out.push_str(name);
            self.out.push_str("=\"");
            self.out.push_str(&partial_escape(value.as_str()).replace('"', "&quot;"));
            self.out.push('"');
        }
        self.open.push(tag.qname().to_string());
        self.start_pending = true;
        self.has_root = true;
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        if self.open.is_empty() {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(XmlRpcError::malformed(KIND, "Character data outside the fragment root"));
        }
        if text.is_empty() {
            return Ok(());
        }
        self.close_pending();
        self.out.push_str(&partial_escape(text));
        Ok(())
    }

    fn end_element(&mut self, _namespace: &str, name: &str) -> Result<()> {
        let qname = self
            .open
            .pop()
            .ok_or_else(|| XmlRpcError::malformed(KIND, format!("Unexpected end tag '{}'", name)))?;
        if self.start_pending {
            self.out.push_str("/>");
            self.start_pending = false;
        } else {
            self.out.push_str("</");
            self.out.push_str(&qname);
            self.out.push('>');
        }
        Ok(())
    }
}

/// Parses `fragment` and returns it in canonical form.
///
/// A blank fragment stays empty. Anything that is not exactly one balanced
/// element (surrounded by optional whitespace) is rejected.
pub fn canonicalize(fragment: &str) -> Result<String> {
    if fragment.trim().is_empty() {
        return Ok(String::new());
    }
    let mut builder = FragmentBuilder::new();
    events::parse(fragment.as_bytes(), &mut builder).map_err(|e| match e {
        e @ XmlRpcError::MalformedValue { .. } => e,
        other => XmlRpcError::malformed(KIND, other.to_string()),
    })?;
    builder.finish()
}
