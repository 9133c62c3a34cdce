//! Error taxonomy for every writer layer.

use crate::protocol::SegmentKind;
use std::fmt;

pub type WriteResult = Result<(), WriterError>;

#[derive(Debug)]
pub enum WriterError {
    /// The page or pipeline is configured in a way that cannot honour the
    /// content-security policy.
    Configuration(ConfigurationError),
    /// A caller drove the writer out of protocol order.
    Protocol(ProtocolError),
    /// The underlying character sink rejected a write.
    Sink(fmt::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    /// An event-handler attribute was written on an element with no
    /// derivable id; the handler cannot be registered.
    MissingElementId { element: String, event: String },
    InvalidConfig { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// Markup arrived while no segment was open.
    OutsideSegment { call: &'static str },
    /// A non-segment operation arrived while a segment was open.
    InsideSegment {
        call: &'static str,
        open: SegmentKind,
    },
    NestedSegment {
        open: SegmentKind,
        attempted: SegmentKind,
    },
    UnmatchedEnd {
        expected: Option<SegmentKind>,
        found: SegmentKind,
    },
    DocumentNotStarted,
    DocumentAlreadyStarted,
    UnclosedSegment { open: SegmentKind },
}

impl WriterError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, WriterError::Configuration(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, WriterError::Protocol(_))
    }
}

impl fmt::Display for WriterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriterError::Configuration(err) => write!(f, "configuration error: {err}"),
            WriterError::Protocol(err) => write!(f, "protocol error: {err}"),
            WriterError::Sink(_) => f.write_str("response sink rejected write"),
        }
    }
}

impl std::error::Error for WriterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WriterError::Configuration(err) => Some(err),
            WriterError::Protocol(err) => Some(err),
            WriterError::Sink(err) => Some(err),
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::MissingElementId { element, event } => write!(
                f,
                "<{element}> has an inline '{event}' handler but no id to register it under"
            ),
            ConfigurationError::InvalidConfig { reason } => write!(f, "invalid config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigurationError {}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::OutsideSegment { call } => {
                write!(f, "{call} called outside of any segment")
            }
            ProtocolError::InsideSegment { call, open } => {
                write!(f, "{call} called while {open} is open")
            }
            ProtocolError::NestedSegment { open, attempted } => {
                write!(f, "cannot start {attempted} while {open} is open")
            }
            ProtocolError::UnmatchedEnd {
                expected: Some(expected),
                found,
            } => write!(f, "end of {found} does not match open {expected}"),
            ProtocolError::UnmatchedEnd {
                expected: None,
                found,
            } => write!(f, "end of {found} without a matching start"),
            ProtocolError::DocumentNotStarted => f.write_str("document not started"),
            ProtocolError::DocumentAlreadyStarted => f.write_str("document already started"),
            ProtocolError::UnclosedSegment { open } => {
                write!(f, "document ended with {open} still open")
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<fmt::Error> for WriterError {
    fn from(err: fmt::Error) -> Self {
        WriterError::Sink(err)
    }
}

impl From<ConfigurationError> for WriterError {
    fn from(err: ConfigurationError) -> Self {
        WriterError::Configuration(err)
    }
}

impl From<ProtocolError> for WriterError {
    fn from(err: ProtocolError) -> Self {
        WriterError::Protocol(err)
    }
}
