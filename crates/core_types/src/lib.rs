//! Request-scoped collaborators shared by the component tree and the writers.
//!
//! Everything here lives for one request/response cycle and is driven from the
//! single thread handling that request, so handles are `Rc`-based.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Identity of the component that owns an element being written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentRef {
    client_id: String,
    family: Option<String>,
}

impl ComponentRef {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            family: None,
        }
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    /// Client-side identifier of the component's root element.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.family {
            Some(family) => write!(f, "{}({})", family, self.client_id),
            None => f.write_str(&self.client_id),
        }
    }
}

/// Ordered queue of script sources the client executes after applying the
/// current response.
///
/// Cloning yields another handle onto the same queue.
#[derive(Clone, Debug, Default)]
pub struct PendingScripts {
    inner: Rc<RefCell<Vec<String>>>,
}

impl PendingScripts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a script behind everything already queued.
    pub fn push(&self, script: impl Into<String>) {
        self.inner.borrow_mut().push(script.into());
    }

    /// Queue a script ahead of everything already queued.
    pub fn push_front(&self, script: impl Into<String>) {
        self.inner.borrow_mut().insert(0, script.into());
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Copy of the current queue, in execution order.
    pub fn snapshot(&self) -> Vec<String> {
        self.inner.borrow().clone()
    }

    /// Remove and return every queued script, in execution order.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.inner.borrow_mut())
    }
}

/// Per-request state owned by the request handler.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub scripts_to_execute: PendingScripts,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a script for execution after this response is applied.
    pub fn execute_script(&self, script: impl Into<String>) {
        self.scripts_to_execute.push(script);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_front_jumps_the_queue() {
        let scripts = PendingScripts::new();
        scripts.push("a();");
        scripts.push("b();");
        scripts.push_front("first();");
        assert_eq!(scripts.snapshot(), vec!["first();", "a();", "b();"]);
    }

    #[test]
    fn clones_share_one_queue() {
        let ctx = RequestContext::new();
        let handle = ctx.scripts_to_execute.clone();
        ctx.execute_script("foo();");
        assert_eq!(handle.len(), 1);
        assert_eq!(handle.drain(), vec!["foo();"]);
        assert!(ctx.scripts_to_execute.is_empty());
    }

    #[test]
    fn component_ref_display() {
        let plain = ComponentRef::new("form:btn");
        let typed = ComponentRef::new("form:btn").with_family("CommandButton");
        assert_eq!(plain.to_string(), "form:btn");
        assert_eq!(typed.to_string(), "CommandButton(form:btn)");
        assert_eq!(typed.family(), Some("CommandButton"));
    }
}
