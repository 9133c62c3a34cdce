//! Partial-response writer decorator enforcing CSP at segment granularity.
//!
//! State machine: `Idle` <-> `InSegment(kind)`, inside one document envelope.
//! - Every segment start clears the handler registry before delegating, so a
//!   segment always opens with an empty registry.
//! - Markup segments (insert-before, insert-after, update) delegate their end
//!   first, then drain the registry into one registration script at the head
//!   of the pending-scripts queue.
//! - Eval, extension and error segments only clear the registry on end.
//! - Markup outside a segment, nested segments and unmatched ends are
//!   protocol errors.

use crate::config::CspConfig;
use crate::emitter::RegistrationScriptEmitter;
use crate::response_writer::CspResponseWriter;
use crate::state::CspStateHandle;
use core_types::{ComponentRef, PendingScripts, RequestContext};
use markup::{
    CharSink, MarkupWriter, PartialResponseWriter, ProtocolError, Segment, SegmentKind,
    WriteResult, WriterError,
};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentState {
    Idle,
    InSegment(SegmentKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DocumentState {
    NotStarted,
    Open,
    Ended,
}

#[derive(Debug)]
pub struct CspPartialResponseWriter<W> {
    inner: CspResponseWriter<W>,
    scripts: PendingScripts,
    emitter: RegistrationScriptEmitter,
    segment: SegmentState,
    document: DocumentState,
}

impl<W: PartialResponseWriter + 'static> CspPartialResponseWriter<W> {
    /// Wrap `wrapped` for one response of `request`.
    pub fn new(
        wrapped: W,
        request: &RequestContext,
        state: CspStateHandle,
        config: CspConfig,
    ) -> Result<Self, WriterError> {
        config.validate()?;
        let emitter = RegistrationScriptEmitter::new(config.register_function.as_str());
        Ok(Self {
            inner: CspResponseWriter::new(wrapped, state, Rc::new(config)),
            scripts: request.scripts_to_execute.clone(),
            emitter,
            segment: SegmentState::Idle,
            document: DocumentState::NotStarted,
        })
    }

    pub fn segment_state(&self) -> SegmentState {
        self.segment
    }

    pub fn state(&self) -> &CspStateHandle {
        self.inner.state()
    }

    pub fn pending_scripts(&self) -> &PendingScripts {
        &self.scripts
    }

    pub fn get_ref(&self) -> &W {
        self.inner.get_ref()
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }

    fn require_segment(&self, call: &'static str) -> WriteResult {
        match self.segment {
            SegmentState::InSegment(_) => Ok(()),
            SegmentState::Idle => Err(ProtocolError::OutsideSegment { call }.into()),
        }
    }

    fn require_idle_document(&self, call: &'static str) -> WriteResult {
        if self.document != DocumentState::Open {
            return Err(ProtocolError::DocumentNotStarted.into());
        }
        match self.segment {
            SegmentState::Idle => Ok(()),
            SegmentState::InSegment(open) => {
                Err(ProtocolError::InsideSegment { call, open }.into())
            }
        }
    }

    fn emit_registrations(&mut self) {
        let mut state = self.inner.state().borrow_mut();
        self.emitter.emit(&mut state, &self.scripts);
    }

    fn write_pending_scripts(&mut self) -> WriteResult {
        let scripts = self.scripts.drain();
        log::debug!(target: "csp.segment", "flushing {} pending script(s) into trailing eval", scripts.len());
        self.start_segment(&Segment::Eval)?;
        for (i, script) in scripts.iter().enumerate() {
            if i > 0 {
                self.inner.write_raw("\n")?;
            }
            self.inner.write_raw(script)?;
            if !script.trim_end().ends_with(';') {
                self.inner.write_raw(";")?;
            }
        }
        self.end_segment(SegmentKind::Eval)
    }
}

impl<W: PartialResponseWriter + 'static> MarkupWriter for CspPartialResponseWriter<W> {
    fn start_element(&mut self, name: &str, owner: Option<&ComponentRef>) -> WriteResult {
        self.require_segment("start_element")?;
        self.inner.start_element(name, owner)
    }

    fn write_attribute(
        &mut self,
        name: &str,
        value: &str,
        property: Option<&str>,
    ) -> WriteResult {
        self.require_segment("write_attribute")?;
        self.inner.write_attribute(name, value, property)
    }

    fn write_uri_attribute(
        &mut self,
        name: &str,
        value: &str,
        property: Option<&str>,
    ) -> WriteResult {
        self.require_segment("write_uri_attribute")?;
        self.inner.write_uri_attribute(name, value, property)
    }

    fn end_element(&mut self, name: &str) -> WriteResult {
        self.require_segment("end_element")?;
        self.inner.end_element(name)
    }

    fn write_text(&mut self, text: &str, property: Option<&str>) -> WriteResult {
        self.require_segment("write_text")?;
        self.inner.write_text(text, property)
    }

    fn write_comment(&mut self, comment: &str) -> WriteResult {
        self.require_segment("write_comment")?;
        self.inner.write_comment(comment)
    }

    fn write_raw(&mut self, raw: &str) -> WriteResult {
        self.require_segment("write_raw")?;
        self.inner.write_raw(raw)
    }

    fn flush(&mut self) -> WriteResult {
        self.inner.flush()
    }

    fn close(&mut self) -> WriteResult {
        self.inner.close()
    }

    fn clone_with_sink(&self, sink: CharSink) -> Box<dyn MarkupWriter> {
        self.inner.clone_with_sink(sink)
    }
}

impl<W: PartialResponseWriter + 'static> PartialResponseWriter for CspPartialResponseWriter<W> {
    fn start_document(&mut self) -> WriteResult {
        if self.document != DocumentState::NotStarted {
            return Err(ProtocolError::DocumentAlreadyStarted.into());
        }
        self.inner.reset();
        self.inner.get_mut().start_document()?;
        self.document = DocumentState::Open;
        Ok(())
    }

    fn end_document(&mut self) -> WriteResult {
        if self.document != DocumentState::Open {
            return Err(ProtocolError::DocumentNotStarted.into());
        }
        if let SegmentState::InSegment(open) = self.segment {
            return Err(ProtocolError::UnclosedSegment { open }.into());
        }
        if self.inner.config().execute_scripts_on_end_document && !self.scripts.is_empty() {
            self.write_pending_scripts()?;
        }
        self.inner.get_mut().end_document()?;
        self.document = DocumentState::Ended;
        Ok(())
    }

    fn start_segment(&mut self, segment: &Segment<'_>) -> WriteResult {
        if self.document != DocumentState::Open {
            return Err(ProtocolError::DocumentNotStarted.into());
        }
        let kind = segment.kind();
        if let SegmentState::InSegment(open) = self.segment {
            return Err(ProtocolError::NestedSegment {
                open,
                attempted: kind,
            }
            .into());
        }
        self.inner.reset();
        match segment.target() {
            Some(target) => log::debug!(target: "csp.segment", "start {kind} '{target}'"),
            None => log::debug!(target: "csp.segment", "start {kind}"),
        }
        self.inner.get_mut().start_segment(segment)?;
        self.segment = SegmentState::InSegment(kind);
        Ok(())
    }

    fn end_segment(&mut self, kind: SegmentKind) -> WriteResult {
        match self.segment {
            SegmentState::InSegment(open) if open == kind => {}
            SegmentState::InSegment(open) => {
                return Err(ProtocolError::UnmatchedEnd {
                    expected: Some(open),
                    found: kind,
                }
                .into());
            }
            SegmentState::Idle => {
                return Err(ProtocolError::UnmatchedEnd {
                    expected: None,
                    found: kind,
                }
                .into());
            }
        }
        self.inner.resolve_open_element()?;
        self.inner.get_mut().end_segment(kind)?;
        self.segment = SegmentState::Idle;
        log::debug!(target: "csp.segment", "end {kind}");

        if kind.is_markup_container() {
            self.emit_registrations();
        } else {
            let dropped = self.inner.state().borrow().handler_count();
            if dropped > 0 {
                log::warn!(
                    target: "csp.segment",
                    "dropping {dropped} handler(s) collected inside non-markup {kind} segment"
                );
            }
            self.inner.reset();
        }
        Ok(())
    }

    fn delete(&mut self, target: &str) -> WriteResult {
        self.require_idle_document("delete")?;
        self.inner.get_mut().delete(target)
    }

    fn redirect(&mut self, url: &str) -> WriteResult {
        self.require_idle_document("redirect")?;
        self.inner.get_mut().redirect(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use html_test_support::RecordingWriter;

    fn writer(request: &RequestContext) -> CspPartialResponseWriter<RecordingWriter> {
        CspPartialResponseWriter::new(
            RecordingWriter::new(),
            request,
            CspStateHandle::new(),
            CspConfig::default(),
        )
        .expect("valid config")
    }

    fn button(w: &mut impl MarkupWriter, id: &str, onclick: &str) -> WriteResult {
        w.start_element("button", None)?;
        w.write_attribute("id", id, None)?;
        w.write_attribute("onclick", onclick, None)?;
        w.end_element("button")
    }

    #[test]
    fn update_emits_one_registration_script() {
        let request = RequestContext::new();
        let mut w = writer(&request);
        w.start_document().unwrap();
        w.start_update("form:btn").unwrap();
        button(&mut w, "form:btn", "doA()").unwrap();
        w.end_update().unwrap();
        assert_eq!(
            request.scripts_to_execute.snapshot(),
            vec!["csp.register('form:btn','click',function(event){doA()});"]
        );
        assert!(w.state().borrow().is_empty());
        assert_eq!(w.segment_state(), SegmentState::Idle);
    }

    #[test]
    fn empty_segment_queues_nothing() {
        let request = RequestContext::new();
        let mut w = writer(&request);
        w.start_document().unwrap();
        w.start_update("form:other").unwrap();
        w.write_text("no handlers", None).unwrap();
        w.end_update().unwrap();
        assert!(request.scripts_to_execute.is_empty());
        assert!(w.state().borrow().is_empty());
    }

    #[test]
    fn start_clears_leftover_handlers() {
        let request = RequestContext::new();
        let mut w = writer(&request);
        w.start_document().unwrap();
        w.state().borrow_mut().put("stale", "click", "old()");
        w.start_update("form").unwrap();
        assert!(w.state().borrow().is_empty());
    }

    #[test]
    fn eval_segment_never_emits() {
        let request = RequestContext::new();
        let mut w = writer(&request);
        w.start_document().unwrap();
        w.start_eval().unwrap();
        button(&mut w, "b", "x()").unwrap();
        w.end_eval().unwrap();
        assert!(request.scripts_to_execute.is_empty());
        assert!(w.state().borrow().is_empty());
    }

    #[test]
    fn markup_outside_segment_is_rejected() {
        let request = RequestContext::new();
        let mut w = writer(&request);
        w.start_document().unwrap();
        let err = w.start_element("div", None).unwrap_err();
        assert!(matches!(
            err,
            WriterError::Protocol(ProtocolError::OutsideSegment {
                call: "start_element"
            })
        ));
        assert!(w.get_ref().lines().iter().all(|l| !l.starts_with("StartElement")));
    }

    #[test]
    fn sequencing_errors() {
        let request = RequestContext::new();
        let mut w = writer(&request);
        assert!(matches!(
            w.start_update("x").unwrap_err(),
            WriterError::Protocol(ProtocolError::DocumentNotStarted)
        ));
        w.start_document().unwrap();
        assert!(matches!(
            w.end_update().unwrap_err(),
            WriterError::Protocol(ProtocolError::UnmatchedEnd { expected: None, .. })
        ));
        w.start_update("x").unwrap();
        assert!(matches!(
            w.start_eval().unwrap_err(),
            WriterError::Protocol(ProtocolError::NestedSegment {
                open: SegmentKind::Update,
                attempted: SegmentKind::Eval,
            })
        ));
        assert!(matches!(
            w.delete("y").unwrap_err(),
            WriterError::Protocol(ProtocolError::InsideSegment { call: "delete", .. })
        ));
        assert!(matches!(
            w.end_document().unwrap_err(),
            WriterError::Protocol(ProtocolError::UnclosedSegment {
                open: SegmentKind::Update
            })
        ));
    }

    #[test]
    fn trailing_eval_keeps_scripts_on_separate_lines() {
        let request = RequestContext::new();
        request.execute_script("init() // boot");
        request.execute_script("ready();");
        let mut w = writer(&request);
        w.start_document().unwrap();
        w.end_document().unwrap();
        assert!(request.scripts_to_execute.is_empty());
        assert_eq!(
            w.get_ref().lines(),
            vec![
                "StartDocument",
                "StartSegment(eval)",
                "Raw(init() // boot)",
                "Raw(;)",
                "Raw(\\n)",
                "Raw(ready();)",
                "EndSegment(eval)",
                "EndDocument",
            ]
        );
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let request = RequestContext::new();
        let config = CspConfig {
            register_function: "bad fn".to_string(),
            ..CspConfig::default()
        };
        let err = CspPartialResponseWriter::new(
            RecordingWriter::new(),
            &request,
            CspStateHandle::new(),
            config,
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }
}
