//! Markup writer decorator that strips inline event handlers.
//!
//! Handler attributes are held per open start tag and resolved when the tag
//! closes (next child, text, comment, raw write, end tag, flush or close). By
//! then the element's own `id` is known regardless of attribute order; when
//! there is none, an id is derived from the owning component and written
//! while the start tag is still open downstream.

use crate::config::CspConfig;
use crate::events::event_for_attribute;
use crate::state::CspStateHandle;
use core_types::ComponentRef;
use markup::{CharSink, ConfigurationError, MarkupWriter, WriteResult};
use std::rc::Rc;

const JAVASCRIPT_SCHEME: &str = "javascript:";

#[derive(Debug)]
struct OpenElement {
    name: String,
    owner: Option<ComponentRef>,
    id: Option<String>,
    handlers: Vec<(&'static str, String)>,
}

#[derive(Debug)]
pub struct CspResponseWriter<W> {
    wrapped: W,
    state: CspStateHandle,
    config: Rc<CspConfig>,
    open: Option<OpenElement>,
}

impl<W: MarkupWriter> CspResponseWriter<W> {
    pub fn new(wrapped: W, state: CspStateHandle, config: Rc<CspConfig>) -> Self {
        Self {
            wrapped,
            state,
            config,
            open: None,
        }
    }

    pub fn state(&self) -> &CspStateHandle {
        &self.state
    }

    pub fn config(&self) -> &CspConfig {
        &self.config
    }

    pub fn get_ref(&self) -> &W {
        &self.wrapped
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.wrapped
    }

    pub fn into_inner(self) -> W {
        self.wrapped
    }

    /// Forget collected handlers and any open start tag.
    pub fn reset(&mut self) {
        self.open = None;
        self.state.borrow_mut().clear();
    }

    /// Register the handlers collected on the current start tag.
    pub fn resolve_open_element(&mut self) -> WriteResult {
        let Some(element) = self.open.take() else {
            return Ok(());
        };
        if element.handlers.is_empty() {
            return Ok(());
        }
        let id = match element.id {
            Some(id) => id,
            None => self.generate_id(&element)?,
        };
        let mut state = self.state.borrow_mut();
        for (event, source) in &element.handlers {
            log::trace!(
                target: "csp.writer",
                "diverted on{event} of <{}> to registration for '{id}'",
                element.name
            );
            state.put(&id, event, source);
        }
        Ok(())
    }

    fn generate_id(&mut self, element: &OpenElement) -> Result<String, markup::WriterError> {
        let owner = match &element.owner {
            Some(owner) if self.config.generate_ids => owner,
            _ => {
                let event = element.handlers.first().map(|(event, _)| *event).unwrap_or("");
                return Err(ConfigurationError::MissingElementId {
                    element: element.name.clone(),
                    event: event.to_string(),
                }
                .into());
            }
        };
        let n = self.state.borrow_mut().next_generated_id();
        let id = format!("{}{}csp{}", owner.client_id(), self.config.id_separator, n);
        log::trace!(target: "csp.writer", "generated id '{id}' for <{}> owned by {owner}", element.name);
        self.wrapped.write_attribute("id", &id, None)?;
        Ok(id)
    }

    fn divert(&mut self, event: &'static str, source: &str) -> WriteResult {
        let Some(element) = self.open.as_mut() else {
            return Err(ConfigurationError::MissingElementId {
                element: String::new(),
                event: event.to_string(),
            }
            .into());
        };
        element.handlers.push((event, source.to_string()));
        Ok(())
    }
}

fn strip_javascript_scheme(value: &str) -> Option<&str> {
    let head = value.get(..JAVASCRIPT_SCHEME.len())?;
    head.eq_ignore_ascii_case(JAVASCRIPT_SCHEME)
        .then(|| &value[JAVASCRIPT_SCHEME.len()..])
}

impl<W: MarkupWriter + 'static> MarkupWriter for CspResponseWriter<W> {
    fn start_element(&mut self, name: &str, owner: Option<&ComponentRef>) -> WriteResult {
        self.resolve_open_element()?;
        self.wrapped.start_element(name, owner)?;
        self.open = Some(OpenElement {
            name: name.to_string(),
            owner: owner.cloned(),
            id: None,
            handlers: Vec::new(),
        });
        if name.eq_ignore_ascii_case("script") {
            if let Some(nonce) = self.config.nonce.as_deref() {
                log::trace!(target: "csp.writer", "stamping nonce on <{name}>");
                self.wrapped.write_attribute("nonce", nonce, None)?;
            }
        }
        Ok(())
    }

    fn write_attribute(
        &mut self,
        name: &str,
        value: &str,
        property: Option<&str>,
    ) -> WriteResult {
        if let Some(event) = event_for_attribute(name) {
            return self.divert(event, value);
        }
        if name.eq_ignore_ascii_case("id") {
            if value.is_empty() {
                log::trace!(target: "csp.writer", "dropped empty id attribute");
                return Ok(());
            }
            if let Some(element) = self.open.as_mut() {
                element.id = Some(value.to_string());
            }
        }
        self.wrapped.write_attribute(name, value, property)
    }

    fn write_uri_attribute(
        &mut self,
        name: &str,
        value: &str,
        property: Option<&str>,
    ) -> WriteResult {
        if let Some(event) = event_for_attribute(name) {
            return self.divert(event, value);
        }
        if self.config.rewrite_javascript_urls && name.eq_ignore_ascii_case("href") {
            if let Some(source) = strip_javascript_scheme(value) {
                log::debug!(target: "csp.writer", "rewriting javascript: href into a click handler");
                self.divert("click", source)?;
                return self.wrapped.write_uri_attribute(name, "#", property);
            }
        }
        self.wrapped.write_uri_attribute(name, value, property)
    }

    fn end_element(&mut self, name: &str) -> WriteResult {
        self.resolve_open_element()?;
        self.wrapped.end_element(name)
    }

    fn write_text(&mut self, text: &str, property: Option<&str>) -> WriteResult {
        self.resolve_open_element()?;
        self.wrapped.write_text(text, property)
    }

    fn write_comment(&mut self, comment: &str) -> WriteResult {
        self.resolve_open_element()?;
        self.wrapped.write_comment(comment)
    }

    fn write_raw(&mut self, raw: &str) -> WriteResult {
        self.resolve_open_element()?;
        self.wrapped.write_raw(raw)
    }

    fn flush(&mut self) -> WriteResult {
        self.resolve_open_element()?;
        self.wrapped.flush()
    }

    fn close(&mut self) -> WriteResult {
        self.resolve_open_element()?;
        self.wrapped.close()
    }

    fn clone_with_sink(&self, sink: CharSink) -> Box<dyn MarkupWriter> {
        Box::new(CspResponseWriter::new(
            self.wrapped.clone_with_sink(sink),
            self.state.clone(),
            Rc::clone(&self.config),
        ))
    }
}
