//! Segmented incremental-update protocol.
//!
//! Invariants:
//! - Segments live inside one document envelope and never nest or overlap.
//! - Segments are written in emission order, which is also wire order.
//! - Every `start_segment` is closed by an `end_segment` of the same kind.

use crate::error::WriteResult;
use crate::writer::MarkupWriter;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    InsertBefore,
    InsertAfter,
    Update,
    Eval,
    Extension,
    Error,
}

impl SegmentKind {
    /// Kinds whose body is page markup that may carry event handlers.
    pub fn is_markup_container(self) -> bool {
        matches!(
            self,
            SegmentKind::InsertBefore | SegmentKind::InsertAfter | SegmentKind::Update
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SegmentKind::InsertBefore => "insert-before",
            SegmentKind::InsertAfter => "insert-after",
            SegmentKind::Update => "update",
            SegmentKind::Eval => "eval",
            SegmentKind::Extension => "extension",
            SegmentKind::Error => "error",
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opening boundary of one protocol segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    InsertBefore { target: &'a str },
    InsertAfter { target: &'a str },
    Update { target: &'a str },
    Eval,
    Extension { attributes: &'a [(&'a str, &'a str)] },
    Error { name: &'a str },
}

impl Segment<'_> {
    pub fn kind(&self) -> SegmentKind {
        match self {
            Segment::InsertBefore { .. } => SegmentKind::InsertBefore,
            Segment::InsertAfter { .. } => SegmentKind::InsertAfter,
            Segment::Update { .. } => SegmentKind::Update,
            Segment::Eval => SegmentKind::Eval,
            Segment::Extension { .. } => SegmentKind::Extension,
            Segment::Error { .. } => SegmentKind::Error,
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Segment::InsertBefore { target }
            | Segment::InsertAfter { target }
            | Segment::Update { target } => Some(*target),
            Segment::Eval | Segment::Extension { .. } | Segment::Error { .. } => None,
        }
    }
}

/// Partial-response writer: markup plus segment boundaries.
pub trait PartialResponseWriter: MarkupWriter {
    fn start_document(&mut self) -> WriteResult;

    fn end_document(&mut self) -> WriteResult;

    fn start_segment(&mut self, segment: &Segment<'_>) -> WriteResult;

    fn end_segment(&mut self, kind: SegmentKind) -> WriteResult;

    /// Remove the element with `target` id on the client.
    fn delete(&mut self, target: &str) -> WriteResult;

    fn redirect(&mut self, url: &str) -> WriteResult;

    fn start_update(&mut self, target: &str) -> WriteResult {
        self.start_segment(&Segment::Update { target })
    }

    fn end_update(&mut self) -> WriteResult {
        self.end_segment(SegmentKind::Update)
    }

    fn start_eval(&mut self) -> WriteResult {
        self.start_segment(&Segment::Eval)
    }

    fn end_eval(&mut self) -> WriteResult {
        self.end_segment(SegmentKind::Eval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_insert_and_update_carry_markup() {
        let containers: Vec<_> = [
            SegmentKind::InsertBefore,
            SegmentKind::InsertAfter,
            SegmentKind::Update,
            SegmentKind::Eval,
            SegmentKind::Extension,
            SegmentKind::Error,
        ]
        .into_iter()
        .filter(|kind| kind.is_markup_container())
        .collect();
        assert_eq!(
            containers,
            vec![
                SegmentKind::InsertBefore,
                SegmentKind::InsertAfter,
                SegmentKind::Update
            ]
        );
    }

    #[test]
    fn segment_target() {
        assert_eq!(Segment::Update { target: "form" }.target(), Some("form"));
        assert_eq!(Segment::Error { name: "boom" }.target(), None);
        assert_eq!(Segment::Eval.kind(), SegmentKind::Eval);
    }
}
