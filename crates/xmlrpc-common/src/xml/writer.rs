use quick_xml::escape::escape;
use std::io::{self, Write};

use super::{EXTENSIONS_PREFIX, EXTENSIONS_URI};

/// Minimal streaming XML writer.
///
/// Tags are written exactly as given; character data is escaped. No
/// indentation is emitted so that character data inside `<value>` survives
/// a round trip unchanged.
pub struct XmlWriter<W: Write> {
    inner: W,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn declaration(&mut self, encoding: &str) -> io::Result<()> {
        write!(self.inner, "<?xml version=\"1.0\" encoding=\"{}\"?>", encoding)
    }

    /// Opens the document element, declaring the extensions prefix when asked.
    pub fn start_root(&mut self, name: &str, declare_extensions: bool) -> io::Result<()> {
        if declare_extensions {
            write!(
                self.inner,
                "<{} xmlns:{}=\"{}\">",
                name, EXTENSIONS_PREFIX, EXTENSIONS_URI
            )
        } else {
            self.start(name)
        }
    }

    pub fn start(&mut self, name: &str) -> io::Result<()> {
        write!(self.inner, "<{}>", name)
    }

    pub fn end(&mut self, name: &str) -> io::Result<()> {
        write!(self.inner, "</{}>", name)
    }

    pub fn empty(&mut self, name: &str) -> io::Result<()> {
        write!(self.inner, "<{}/>", name)
    }

    pub fn text(&mut self, text: &str) -> io::Result<()> {
        self.inner.write_all(escape(text).as_bytes())
    }

    /// Writes pre-formed markup without escaping.
    pub fn raw(&mut self, markup: &str) -> io::Result<()> {
        self.inner.write_all(markup.as_bytes())
    }

    /// Writes `<name>text</name>`.
    pub fn element(&mut self, name: &str, text: &str) -> io::Result<()> {
        self.start(name)?;
        self.text(text)?;
        self.end(name)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
