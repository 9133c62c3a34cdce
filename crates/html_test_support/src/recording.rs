//! Writers that record what reached them.

use crate::escape_text;
use core_types::ComponentRef;
use markup::{
    CharSink, HtmlResponseWriter, MarkupWriter, PartialResponseWriter, Segment, SegmentKind,
    WriteResult,
};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Clonable in-memory sink; every clone appends to the same buffer.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer(Rc<RefCell<String>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.0.borrow().clone()
    }
}

impl fmt::Write for SharedBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.borrow_mut().push_str(s);
        Ok(())
    }
}

/// Partial-response writer that records one snapshot line per call.
///
/// Line formats:
/// - `StartElement(div)` / `StartElement(div owner=form:x)`
/// - `Attribute(name="value")`, `UriAttribute(name="value")`
/// - `Text(..)`, `Comment(..)`, `Raw(..)`, `EndElement(div)`
/// - `StartDocument`, `EndDocument`, `Flush`, `Close`
/// - `StartSegment(update target=x)`, `StartSegment(extension k=v)`,
///   `StartSegment(error name=n)`, `EndSegment(update)`
/// - `Delete(x)`, `Redirect(url)`
#[derive(Debug, Default)]
pub struct RecordingWriter {
    lines: Vec<String>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.clone()
    }

    fn record(&mut self, line: String) -> WriteResult {
        self.lines.push(line);
        Ok(())
    }
}

impl MarkupWriter for RecordingWriter {
    fn start_element(&mut self, name: &str, owner: Option<&ComponentRef>) -> WriteResult {
        match owner {
            Some(owner) => self.record(format!("StartElement({name} owner={})", owner.client_id())),
            None => self.record(format!("StartElement({name})")),
        }
    }

    fn write_attribute(
        &mut self,
        name: &str,
        value: &str,
        _property: Option<&str>,
    ) -> WriteResult {
        self.record(format!("Attribute({name}=\"{}\")", escape_text(value)))
    }

    fn write_uri_attribute(
        &mut self,
        name: &str,
        value: &str,
        _property: Option<&str>,
    ) -> WriteResult {
        self.record(format!("UriAttribute({name}=\"{}\")", escape_text(value)))
    }

    fn end_element(&mut self, name: &str) -> WriteResult {
        self.record(format!("EndElement({name})"))
    }

    fn write_text(&mut self, text: &str, _property: Option<&str>) -> WriteResult {
        self.record(format!("Text({})", escape_text(text)))
    }

    fn write_comment(&mut self, comment: &str) -> WriteResult {
        self.record(format!("Comment({})", escape_text(comment)))
    }

    fn write_raw(&mut self, raw: &str) -> WriteResult {
        self.record(format!("Raw({})", escape_text(raw)))
    }

    fn flush(&mut self) -> WriteResult {
        self.record("Flush".to_string())
    }

    fn close(&mut self) -> WriteResult {
        self.record("Close".to_string())
    }

    fn clone_with_sink(&self, sink: CharSink) -> Box<dyn MarkupWriter> {
        Box::new(HtmlResponseWriter::new(sink))
    }
}

impl PartialResponseWriter for RecordingWriter {
    fn start_document(&mut self) -> WriteResult {
        self.record("StartDocument".to_string())
    }

    fn end_document(&mut self) -> WriteResult {
        self.record("EndDocument".to_string())
    }

    fn start_segment(&mut self, segment: &Segment<'_>) -> WriteResult {
        let kind = segment.kind();
        let line = match segment {
            Segment::InsertBefore { target }
            | Segment::InsertAfter { target }
            | Segment::Update { target } => format!("StartSegment({kind} target={target})"),
            Segment::Eval => format!("StartSegment({kind})"),
            Segment::Extension { attributes } => {
                let mut line = format!("StartSegment({kind}");
                for (name, value) in attributes.iter() {
                    line.push_str(&format!(" {name}={value}"));
                }
                line.push(')');
                line
            }
            Segment::Error { name } => format!("StartSegment({kind} name={name})"),
        };
        self.record(line)
    }

    fn end_segment(&mut self, kind: SegmentKind) -> WriteResult {
        self.record(format!("EndSegment({kind})"))
    }

    fn delete(&mut self, target: &str) -> WriteResult {
        self.record(format!("Delete({target})"))
    }

    fn redirect(&mut self, url: &str) -> WriteResult {
        self.record(format!("Redirect({url})"))
    }
}
