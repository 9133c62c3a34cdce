//! Request-scoped handler registry.
//!
//! Invariants:
//! - At most one handler per `(element id, event)`; a later write replaces the
//!   earlier source but keeps its position.
//! - Iteration order is insertion order: by element, then by event.
//! - Generated-id numbering is never reset within a response, so ids stay
//!   unique even though the handler map is cleared per segment.

use indexmap::IndexMap;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

pub type EventHandlers = IndexMap<String, IndexMap<String, String>>;

#[derive(Debug, Default)]
pub struct CspState {
    handlers: EventHandlers,
    generated_ids: u32,
}

impl CspState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the handler for `event` on `element_id`.
    pub fn put(&mut self, element_id: &str, event: &str, source: &str) {
        self.handlers
            .entry(element_id.to_string())
            .or_default()
            .insert(event.to_string(), source.to_string());
    }

    pub fn handlers(&self) -> &EventHandlers {
        &self.handlers
    }

    /// Flattened `(id, event, source)` view in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.handlers.iter().flat_map(|(id, events)| {
            events
                .iter()
                .map(move |(event, source)| (id.as_str(), event.as_str(), source.as_str()))
        })
    }

    pub fn get(&self, element_id: &str, event: &str) -> Option<&str> {
        self.handlers
            .get(element_id)
            .and_then(|events| events.get(event))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.values().map(IndexMap::len).sum()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub(crate) fn next_generated_id(&mut self) -> u32 {
        self.generated_ids += 1;
        self.generated_ids
    }
}

/// Shared handle onto one response's `CspState`.
///
/// Every writer of a response, including clones over other sinks, holds a
/// handle to the same state.
#[derive(Clone, Debug, Default)]
pub struct CspStateHandle(Rc<RefCell<CspState>>);

impl CspStateHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn borrow(&self) -> Ref<'_, CspState> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, CspState> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &CspStateHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins_in_first_position() {
        let mut state = CspState::new();
        state.put("a", "click", "one()");
        state.put("b", "click", "two()");
        state.put("a", "focus", "three()");
        state.put("a", "click", "four()");
        let flat: Vec<_> = state.iter().collect();
        assert_eq!(
            flat,
            vec![
                ("a", "click", "four()"),
                ("a", "focus", "three()"),
                ("b", "click", "two()"),
            ]
        );
        assert_eq!(state.handler_count(), 3);
        assert_eq!(state.get("a", "click"), Some("four()"));
    }

    #[test]
    fn clear_keeps_id_numbering() {
        let mut state = CspState::new();
        state.put("a", "click", "x()");
        assert_eq!(state.next_generated_id(), 1);
        state.clear();
        assert!(state.is_empty());
        assert_eq!(state.next_generated_id(), 2);
    }

    #[test]
    fn handles_share_state() {
        let handle = CspStateHandle::new();
        let other = handle.clone();
        handle.borrow_mut().put("a", "click", "x()");
        assert!(other.ptr_eq(&handle));
        assert_eq!(other.borrow().handler_count(), 1);
    }
}
