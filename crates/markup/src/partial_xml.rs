//! Partial-response XML envelope.
//!
//! Wire shape:
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <partial-response><changes>
//!   <update id="t"><![CDATA[...]]></update>
//!   <insert><before id="t"><![CDATA[...]]></before></insert>
//!   <eval><![CDATA[...]]></eval>
//!   <extension k="v">...</extension>
//!   <error><error-name>n</error-name><error-message><![CDATA[...]]></error-message></error>
//!   <delete id="t"/>
//! </changes></partial-response>
//! ```
//! `redirect` is written outside `<changes>`. Any `]]>` inside a CDATA body is
//! split across two sections, including when it straddles write calls.

use crate::error::{ProtocolError, WriteResult};
use crate::html_writer::{HtmlResponseWriter, escape_attribute, escape_text};
use crate::protocol::{PartialResponseWriter, Segment, SegmentKind};
use crate::writer::{CharSink, MarkupWriter};
use core_types::ComponentRef;
use memchr::memchr2;
use std::fmt::{self, Write};

/// Sink adapter that keeps CDATA sections well-formed.
#[derive(Debug)]
struct CdataSink<W> {
    inner: W,
    in_cdata: bool,
    brackets: usize,
}

impl<W: Write> CdataSink<W> {
    fn framing(&mut self, s: &str) -> fmt::Result {
        self.inner.write_str(s)
    }
}

impl<W: Write> Write for CdataSink<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if !self.in_cdata {
            return self.inner.write_str(s);
        }
        let bytes = s.as_bytes();
        let mut start = 0;
        let mut pos = 0;
        while let Some(rel) = memchr2(b']', b'>', &bytes[pos..]) {
            let i = pos + rel;
            if i > pos {
                self.brackets = 0;
            }
            if bytes[i] == b']' {
                self.brackets += 1;
            } else {
                if self.brackets >= 2 {
                    self.inner.write_str(&s[start..i])?;
                    self.inner.write_str("]]><![CDATA[")?;
                    start = i;
                }
                self.brackets = 0;
            }
            pos = i + 1;
        }
        if pos < bytes.len() {
            self.brackets = 0;
        }
        self.inner.write_str(&s[start..])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Envelope {
    NotStarted,
    Open { changes: bool },
    Ended,
}

#[derive(Debug)]
pub struct XmlPartialResponseWriter<W: Write> {
    html: HtmlResponseWriter<CdataSink<W>>,
    envelope: Envelope,
    open: Option<SegmentKind>,
}

impl<W: Write> XmlPartialResponseWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            html: HtmlResponseWriter::new(CdataSink {
                inner: sink,
                in_cdata: false,
                brackets: 0,
            }),
            envelope: Envelope::NotStarted,
            open: None,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.html.get_ref().inner
    }

    pub fn into_inner(self) -> W {
        self.html.into_inner().inner
    }

    fn framing(&mut self, s: &str) -> WriteResult {
        self.html.get_mut().framing(s)?;
        Ok(())
    }

    fn begin_cdata(&mut self) -> WriteResult {
        self.framing("<![CDATA[")?;
        let sink = self.html.get_mut();
        sink.in_cdata = true;
        sink.brackets = 0;
        Ok(())
    }

    fn finish_cdata(&mut self) -> WriteResult {
        self.html.close_start_tag()?;
        self.html.get_mut().in_cdata = false;
        self.framing("]]>")
    }

    fn open_changes(&mut self) -> WriteResult {
        match self.envelope {
            Envelope::Open { changes: true } => Ok(()),
            Envelope::Open { changes: false } => {
                self.envelope = Envelope::Open { changes: true };
                self.framing("<changes>")
            }
            Envelope::NotStarted | Envelope::Ended => Err(ProtocolError::DocumentNotStarted.into()),
        }
    }

    fn close_changes(&mut self) -> WriteResult {
        if self.envelope == (Envelope::Open { changes: true }) {
            self.envelope = Envelope::Open { changes: false };
            self.framing("</changes>")?;
        }
        Ok(())
    }
}

impl<W: Write + 'static> MarkupWriter for XmlPartialResponseWriter<W> {
    fn start_element(&mut self, name: &str, owner: Option<&ComponentRef>) -> WriteResult {
        self.html.start_element(name, owner)
    }

    fn write_attribute(
        &mut self,
        name: &str,
        value: &str,
        property: Option<&str>,
    ) -> WriteResult {
        self.html.write_attribute(name, value, property)
    }

    fn end_element(&mut self, name: &str) -> WriteResult {
        self.html.end_element(name)
    }

    fn write_text(&mut self, text: &str, property: Option<&str>) -> WriteResult {
        self.html.write_text(text, property)
    }

    fn write_comment(&mut self, comment: &str) -> WriteResult {
        self.html.write_comment(comment)
    }

    fn write_raw(&mut self, raw: &str) -> WriteResult {
        self.html.write_raw(raw)
    }

    fn flush(&mut self) -> WriteResult {
        self.html.flush()
    }

    fn close(&mut self) -> WriteResult {
        self.html.close()
    }

    fn clone_with_sink(&self, sink: CharSink) -> Box<dyn MarkupWriter> {
        self.html.clone_with_sink(sink)
    }
}

impl<W: Write + 'static> PartialResponseWriter for XmlPartialResponseWriter<W> {
    fn start_document(&mut self) -> WriteResult {
        if self.envelope != Envelope::NotStarted {
            return Err(ProtocolError::DocumentAlreadyStarted.into());
        }
        self.envelope = Envelope::Open { changes: false };
        self.framing("<?xml version=\"1.0\" encoding=\"UTF-8\"?><partial-response>")
    }

    fn end_document(&mut self) -> WriteResult {
        if !matches!(self.envelope, Envelope::Open { .. }) {
            return Err(ProtocolError::DocumentNotStarted.into());
        }
        if let Some(open) = self.open {
            return Err(ProtocolError::UnclosedSegment { open }.into());
        }
        self.close_changes()?;
        self.envelope = Envelope::Ended;
        self.framing("</partial-response>")
    }

    fn start_segment(&mut self, segment: &Segment<'_>) -> WriteResult {
        if let Some(open) = self.open {
            return Err(ProtocolError::NestedSegment {
                open,
                attempted: segment.kind(),
            }
            .into());
        }
        self.open_changes()?;
        self.open = Some(segment.kind());
        match segment {
            Segment::InsertBefore { target } => {
                let frame = format!("<insert><before id=\"{}\">", escape_attribute(target));
                self.framing(&frame)?;
                self.begin_cdata()
            }
            Segment::InsertAfter { target } => {
                let frame = format!("<insert><after id=\"{}\">", escape_attribute(target));
                self.framing(&frame)?;
                self.begin_cdata()
            }
            Segment::Update { target } => {
                let frame = format!("<update id=\"{}\">", escape_attribute(target));
                self.framing(&frame)?;
                self.begin_cdata()
            }
            Segment::Eval => {
                self.framing("<eval>")?;
                self.begin_cdata()
            }
            Segment::Extension { attributes } => {
                let mut frame = String::from("<extension");
                for (name, value) in attributes.iter() {
                    write!(frame, " {name}=\"{}\"", escape_attribute(value))?;
                }
                frame.push('>');
                self.framing(&frame)
            }
            Segment::Error { name } => {
                let frame = format!(
                    "<error><error-name>{}</error-name><error-message>",
                    escape_text(name)
                );
                self.framing(&frame)?;
                self.begin_cdata()
            }
        }
    }

    fn end_segment(&mut self, kind: SegmentKind) -> WriteResult {
        if self.open != Some(kind) {
            return Err(ProtocolError::UnmatchedEnd {
                expected: self.open,
                found: kind,
            }
            .into());
        }
        self.open = None;
        match kind {
            SegmentKind::InsertBefore => {
                self.finish_cdata()?;
                self.framing("</before></insert>")
            }
            SegmentKind::InsertAfter => {
                self.finish_cdata()?;
                self.framing("</after></insert>")
            }
            SegmentKind::Update => {
                self.finish_cdata()?;
                self.framing("</update>")
            }
            SegmentKind::Eval => {
                self.finish_cdata()?;
                self.framing("</eval>")
            }
            SegmentKind::Extension => {
                self.html.close_start_tag()?;
                self.framing("</extension>")
            }
            SegmentKind::Error => {
                self.finish_cdata()?;
                self.framing("</error-message></error>")
            }
        }
    }

    fn delete(&mut self, target: &str) -> WriteResult {
        if let Some(open) = self.open {
            return Err(ProtocolError::InsideSegment {
                call: "delete",
                open,
            }
            .into());
        }
        self.open_changes()?;
        let frame = format!("<delete id=\"{}\"/>", escape_attribute(target));
        self.framing(&frame)
    }

    fn redirect(&mut self, url: &str) -> WriteResult {
        if let Some(open) = self.open {
            return Err(ProtocolError::InsideSegment {
                call: "redirect",
                open,
            }
            .into());
        }
        if !matches!(self.envelope, Envelope::Open { .. }) {
            return Err(ProtocolError::DocumentNotStarted.into());
        }
        self.close_changes()?;
        let frame = format!("<redirect url=\"{}\"/>", escape_attribute(url));
        self.framing(&frame)
    }
}
