//! Content-security-policy rewriting for incremental (partial) responses.
//!
//! Pipeline, innermost last:
//!
//! ```text
//! components -> CspPartialResponseWriter -> CspResponseWriter -> wrapped writer -> wire
//!                      |                          |
//!                      |  segment boundaries      |  on* attributes
//!                      v                          v
//!             RegistrationScriptEmitter <---- CspState
//!                      |
//!                      v
//!               PendingScripts (front)
//! ```
//!
//! Inline handler attributes never reach the wrapped writer. They are
//! collected per element into the response's `CspState` and, when a markup
//! segment closes, re-emitted as a single registration script queued ahead
//! of every other pending script.

mod config;
mod emitter;
mod escape;
mod events;
mod partial_writer;
mod response_writer;
mod state;

pub use crate::config::CspConfig;
pub use crate::emitter::RegistrationScriptEmitter;
pub use crate::escape::escape_for_script;
pub use crate::events::{EVENT_NAMES, event_for_attribute, is_event_attribute};
pub use crate::partial_writer::{CspPartialResponseWriter, SegmentState};
pub use crate::response_writer::CspResponseWriter;
pub use crate::state::{CspState, CspStateHandle, EventHandlers};
