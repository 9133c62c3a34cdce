//! Registration-script emission.
//!
//! One script per drain, of the form
//! `f('id','event',function(event){<source>});` repeated per handler, where
//! `<source>` is the original inline handler text, unmodified.

use crate::escape::escape_for_script;
use crate::state::CspState;
use core_types::PendingScripts;
use std::fmt::Write;

/// Rough per-handler overhead of the generated call, used to size buffers.
const STATEMENT_OVERHEAD: usize = 32;

#[derive(Debug)]
pub struct RegistrationScriptEmitter {
    register_function: String,
}

impl RegistrationScriptEmitter {
    pub fn new(register_function: impl Into<String>) -> Self {
        Self {
            register_function: register_function.into(),
        }
    }

    /// Render the registration script for everything in `state`, without
    /// draining it. `None` when there is nothing to register.
    pub fn render(&self, state: &CspState) -> Option<String> {
        if state.is_empty() {
            return None;
        }
        let capacity = state
            .iter()
            .map(|(id, event, source)| {
                self.register_function.len() + id.len() + event.len() + source.len()
            })
            .sum::<usize>()
            + state.handler_count() * STATEMENT_OVERHEAD;
        let mut script = String::with_capacity(capacity);
        for (id, event, source) in state.iter() {
            let _ = write!(
                script,
                "{}('{}','{}',function(event){{{}}});",
                self.register_function,
                escape_for_script(id),
                escape_for_script(event),
                source
            );
        }
        Some(script)
    }

    /// Drain `state` into one script placed at the head of `scripts`.
    ///
    /// Returns whether a script was queued.
    pub fn emit(&self, state: &mut CspState, scripts: &PendingScripts) -> bool {
        let Some(script) = self.render(state) else {
            return false;
        };
        log::debug!(
            target: "csp.emit",
            "queueing registration script for {} handler(s) ahead of {} pending script(s)",
            state.handler_count(),
            scripts.len()
        );
        scripts.push_front(script);
        state.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_state_emits_nothing() {
        let emitter = RegistrationScriptEmitter::new("csp.register");
        let mut state = CspState::new();
        let scripts = PendingScripts::new();
        assert!(!emitter.emit(&mut state, &scripts));
        assert!(scripts.is_empty());
    }

    #[test]
    fn batches_all_handlers_into_one_script() {
        let emitter = RegistrationScriptEmitter::new("csp.register");
        let mut state = CspState::new();
        state.put("form:a", "click", "doA()");
        state.put("form:b", "change", "doB(this.value)");
        let scripts = PendingScripts::new();
        assert!(emitter.emit(&mut state, &scripts));
        assert_eq!(
            scripts.snapshot(),
            vec![
                "csp.register('form:a','click',function(event){doA()});\
                 csp.register('form:b','change',function(event){doB(this.value)});"
                    .to_string()
            ]
        );
        assert!(state.is_empty());
    }

    #[test]
    fn goes_ahead_of_queued_scripts() {
        let emitter = RegistrationScriptEmitter::new("app.on");
        let mut state = CspState::new();
        state.put("x", "click", "go()");
        let scripts = PendingScripts::new();
        scripts.push("foo();");
        emitter.emit(&mut state, &scripts);
        assert_eq!(
            scripts.snapshot(),
            vec!["app.on('x','click',function(event){go()});", "foo();"]
        );
    }

    #[test]
    fn escapes_id_but_keeps_source_verbatim() {
        let emitter = RegistrationScriptEmitter::new("csp.register");
        let mut state = CspState::new();
        state.put("it's", "click", "alert('a\\b')");
        assert_eq!(
            emitter.render(&state).as_deref(),
            Some("csp.register('it\\'s','click',function(event){alert('a\\b')});")
        );
        assert!(!state.is_empty());
    }
}
