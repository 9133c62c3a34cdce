//! Minimal markup serializer.
//!
//! Contract:
//! - A start tag stays open until content, a child, an end tag, `flush` or
//!   `close` arrives, so attributes may follow `start_element`.
//! - Attribute values escape `&`, `<` and `"`; text escapes `&`, `<`, `>`.
//! - Void elements never get an end tag.
//!
//! This is not a complete HTML serializer; it only has to produce
//! well-formed fragments for the partial-response envelope.

use crate::error::WriteResult;
use crate::writer::{CharSink, MarkupWriter};
use core_types::ComponentRef;
use memchr::{memchr2, memchr3};
use std::borrow::Cow;
use std::fmt::Write;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Escape an attribute value for a double-quoted attribute.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    if memchr3(b'&', b'<', b'"', value.as_bytes()).is_none() {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Escape character data.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    if memchr2(b'&', b'<', bytes).is_none() && !bytes.contains(&b'>') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

#[derive(Debug)]
pub struct HtmlResponseWriter<W: Write> {
    sink: W,
    start_tag_open: Option<String>,
}

impl<W: Write> HtmlResponseWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            start_tag_open: None,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Finish a pending start tag, if any.
    pub fn close_start_tag(&mut self) -> WriteResult {
        if self.start_tag_open.take().is_some() {
            self.sink.write_char('>')?;
        }
        Ok(())
    }
}

impl<W: Write + 'static> MarkupWriter for HtmlResponseWriter<W> {
    fn start_element(&mut self, name: &str, _owner: Option<&ComponentRef>) -> WriteResult {
        self.close_start_tag()?;
        write!(self.sink, "<{name}")?;
        self.start_tag_open = Some(name.to_string());
        Ok(())
    }

    fn write_attribute(
        &mut self,
        name: &str,
        value: &str,
        _property: Option<&str>,
    ) -> WriteResult {
        if self.start_tag_open.is_none() {
            log::warn!(target: "markup.html", "attribute '{name}' written outside a start tag");
            return Ok(());
        }
        write!(self.sink, " {name}=\"{}\"", escape_attribute(value))?;
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> WriteResult {
        match self.start_tag_open.take() {
            Some(_) if is_void(name) => self.sink.write_char('>')?,
            Some(_) => write!(self.sink, "></{name}>")?,
            None if is_void(name) => {}
            None => write!(self.sink, "</{name}>")?,
        }
        Ok(())
    }

    fn write_text(&mut self, text: &str, _property: Option<&str>) -> WriteResult {
        self.close_start_tag()?;
        self.sink.write_str(&escape_text(text))?;
        Ok(())
    }

    fn write_comment(&mut self, comment: &str) -> WriteResult {
        self.close_start_tag()?;
        write!(self.sink, "<!--{comment}-->")?;
        Ok(())
    }

    fn write_raw(&mut self, raw: &str) -> WriteResult {
        self.close_start_tag()?;
        self.sink.write_str(raw)?;
        Ok(())
    }

    fn flush(&mut self) -> WriteResult {
        self.close_start_tag()
    }

    fn close(&mut self) -> WriteResult {
        self.close_start_tag()
    }

    fn clone_with_sink(&self, sink: CharSink) -> Box<dyn MarkupWriter> {
        Box::new(HtmlResponseWriter::new(sink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut HtmlResponseWriter<String>) -> WriteResult) -> String {
        let mut writer = HtmlResponseWriter::new(String::new());
        f(&mut writer).expect("render");
        writer.into_inner()
    }

    #[test]
    fn element_with_attributes_and_text() {
        let out = render(|w| {
            w.start_element("a", None)?;
            w.write_attribute("id", "x", None)?;
            w.write_attribute("title", "say \"hi\" & <bye>", None)?;
            w.write_text("1 < 2 > 0 & done", None)?;
            w.end_element("a")
        });
        assert_eq!(
            out,
            "<a id=\"x\" title=\"say &quot;hi&quot; &amp; &lt;bye>\">1 &lt; 2 &gt; 0 &amp; done</a>"
        );
    }

    #[test]
    fn empty_and_void_elements() {
        let out = render(|w| {
            w.start_element("div", None)?;
            w.end_element("div")?;
            w.start_element("br", None)?;
            w.end_element("br")
        });
        assert_eq!(out, "<div></div><br>");
    }

    #[test]
    fn raw_and_comment_close_pending_tag() {
        let out = render(|w| {
            w.start_element("span", None)?;
            w.write_raw("<b>raw</b>")?;
            w.write_comment(" c ")?;
            w.end_element("span")
        });
        assert_eq!(out, "<span><b>raw</b><!-- c --></span>");
    }

    #[test]
    fn escaping_borrows_when_clean() {
        assert!(matches!(escape_attribute("plain"), Cow::Borrowed(_)));
        assert!(matches!(escape_text("plain"), Cow::Borrowed(_)));
        assert_eq!(escape_text("a>b"), "a&gt;b");
    }
}
