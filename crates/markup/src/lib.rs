//! Writer interfaces shared by the component tree and the response pipeline.
//!
//! `MarkupWriter` is the element/attribute/text capability every component
//! renders through. `PartialResponseWriter` layers the segmented
//! incremental-update protocol on top of it. Decorators implement the same
//! traits as what they wrap so they can be substituted transparently.

mod error;
mod html_writer;
mod partial_xml;
mod protocol;
mod writer;

pub use crate::error::{ConfigurationError, ProtocolError, WriteResult, WriterError};
pub use crate::html_writer::{HtmlResponseWriter, escape_attribute, escape_text};
pub use crate::partial_xml::XmlPartialResponseWriter;
pub use crate::protocol::{PartialResponseWriter, Segment, SegmentKind};
pub use crate::writer::{CharSink, MarkupWriter};

pub use core_types::ComponentRef;
