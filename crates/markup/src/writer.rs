//! The markup-writing capability.

use crate::error::WriteResult;
use core_types::ComponentRef;
use std::fmt;

/// Boxed character sink handed to `MarkupWriter::clone_with_sink`.
pub struct CharSink(Box<dyn fmt::Write>);

impl CharSink {
    pub fn new(sink: impl fmt::Write + 'static) -> Self {
        CharSink(Box::new(sink))
    }
}

impl fmt::Write for CharSink {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_str(s)
    }

    fn write_char(&mut self, c: char) -> fmt::Result {
        self.0.write_char(c)
    }
}

impl fmt::Debug for CharSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CharSink")
    }
}

/// Element/attribute/text writer driven by the component tree.
///
/// Calls arrive in document order. An element's attributes are written after
/// its `start_element` and before any content or `end_element`.
pub trait MarkupWriter {
    fn start_element(&mut self, name: &str, owner: Option<&ComponentRef>) -> WriteResult;

    fn write_attribute(&mut self, name: &str, value: &str, property: Option<&str>)
    -> WriteResult;

    /// Attribute whose value is a URI. Serializers may encode it differently.
    fn write_uri_attribute(
        &mut self,
        name: &str,
        value: &str,
        property: Option<&str>,
    ) -> WriteResult {
        self.write_attribute(name, value, property)
    }

    fn end_element(&mut self, name: &str) -> WriteResult;

    fn write_text(&mut self, text: &str, property: Option<&str>) -> WriteResult;

    fn write_comment(&mut self, comment: &str) -> WriteResult;

    /// Raw characters, written without inspection or escaping.
    fn write_raw(&mut self, raw: &str) -> WriteResult;

    fn flush(&mut self) -> WriteResult;

    fn close(&mut self) -> WriteResult;

    /// A writer of the same kind over a different sink.
    fn clone_with_sink(&self, sink: CharSink) -> Box<dyn MarkupWriter>;
}

impl<M: MarkupWriter + ?Sized> MarkupWriter for Box<M> {
    fn start_element(&mut self, name: &str, owner: Option<&ComponentRef>) -> WriteResult {
        (**self).start_element(name, owner)
    }

    fn write_attribute(
        &mut self,
        name: &str,
        value: &str,
        property: Option<&str>,
    ) -> WriteResult {
        (**self).write_attribute(name, value, property)
    }

    fn write_uri_attribute(
        &mut self,
        name: &str,
        value: &str,
        property: Option<&str>,
    ) -> WriteResult {
        (**self).write_uri_attribute(name, value, property)
    }

    fn end_element(&mut self, name: &str) -> WriteResult {
        (**self).end_element(name)
    }

    fn write_text(&mut self, text: &str, property: Option<&str>) -> WriteResult {
        (**self).write_text(text, property)
    }

    fn write_comment(&mut self, comment: &str) -> WriteResult {
        (**self).write_comment(comment)
    }

    fn write_raw(&mut self, raw: &str) -> WriteResult {
        (**self).write_raw(raw)
    }

    fn flush(&mut self) -> WriteResult {
        (**self).flush()
    }

    fn close(&mut self) -> WriteResult {
        (**self).close()
    }

    fn clone_with_sink(&self, sink: CharSink) -> Box<dyn MarkupWriter> {
        (**self).clone_with_sink(sink)
    }
}
