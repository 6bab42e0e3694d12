//! Error taxonomy for the router core.
//!
//! Mirrors the teacher's layered error design (one `thiserror` enum per
//! subsystem, `#[source]` chaining where an error wraps a caller-supplied
//! one): [`HandlerError`] covers the handler-invocation surface and is
//! wrapped into [`RouterError`] wherever a handler error can surface through
//! a lifecycle or validation path.

use crate::domain_types::{Direction, ElementIndex, PortNumber};
use thiserror::Error;

/// Errors raised while invoking a registered handler (`SPEC_FULL.md` §7).
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler has no read callback.
    #[error("handler {name:?} on {element} is not readable")]
    NotReadable {
        /// Element the handler was looked up on.
        element: ElementIndex,
        /// Handler name.
        name: String,
    },

    /// The handler has no write callback.
    #[error("handler {name:?} on {element} is not writable")]
    NotWritable {
        /// Element the handler was looked up on.
        element: ElementIndex,
        /// Handler name.
        name: String,
    },

    /// A parameter was supplied to a read handler that does not accept one.
    #[error("handler {name:?} on {element} takes no parameter")]
    TakesNoParam {
        /// Element the handler was looked up on.
        element: ElementIndex,
        /// Handler name.
        name: String,
    },

    /// No handler by this name exists on the element (and no `*` fallback).
    #[error("handler {name:?} not found on {element}")]
    NotFound {
        /// Element the handler was looked up on.
        element: ElementIndex,
        /// Handler name.
        name: String,
    },

    /// The handler's own callback returned an error.
    #[error("handler {name:?} on {element} failed: {source}")]
    Callback {
        /// Element the handler was looked up on.
        element: ElementIndex,
        /// Handler name.
        name: String,
        /// Underlying callback error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Distinguishes a `ProcessingConflict` found on a user-supplied connection
/// from one synthesized from an element's own `port_flow` (`SPEC_FULL.md`
/// §4.3: "error messages distinguish direct edges ... from aggregated
/// edges").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// The conflict is on a connection the caller added directly.
    Direct,
    /// The conflict is on a synthetic edge from an element's internal
    /// port-to-port flow.
    Aggregated,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "processing conflict"),
            Self::Aggregated => write!(f, "agnostic element in mixed context"),
        }
    }
}

/// Errors raised by graph construction, validation, and lifecycle operations.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The call is not permitted in the router's current state.
    #[error("router is in the wrong state for this operation")]
    WrongState,

    /// A connection or query referenced an element index that does not exist.
    #[error("bad element index: {index}")]
    BadElementIndex {
        /// The offending index.
        index: ElementIndex,
    },

    /// A connection or query referenced a negative or otherwise malformed port.
    #[error("bad port index: {element}[{port}] ({direction:?})")]
    BadPortIndex {
        /// Element the port belongs to.
        element: ElementIndex,
        /// Port direction.
        direction: Direction,
        /// The offending port number.
        port: PortNumber,
    },

    /// A connection's port exceeds the element's declared port count.
    #[error(
        "{element}[{port}] ({direction:?}) is out of range: element declares only {declared} port(s)"
    )]
    PortOutOfRange {
        /// Element the port belongs to.
        element: ElementIndex,
        /// Port direction.
        direction: Direction,
        /// The offending port number.
        port: PortNumber,
        /// Number of ports the element actually declared.
        declared: usize,
    },

    /// A push-output port was the source of more than one connection.
    #[error("can't reuse push output {element}[{port}]")]
    PushOutputReused {
        /// Element the port belongs to.
        element: ElementIndex,
        /// The reused output port.
        port: PortNumber,
    },

    /// A pull-input port was the sink of more than one connection.
    #[error("can't reuse pull input {element}[{port}]")]
    PullInputReused {
        /// Element the port belongs to.
        element: ElementIndex,
        /// The reused input port.
        port: PortNumber,
    },

    /// A port took part in no connection at all.
    #[error("unused {direction:?} port {element}[{port}]")]
    PortUnused {
        /// Element the port belongs to.
        element: ElementIndex,
        /// Port direction.
        direction: Direction,
        /// The unused port.
        port: PortNumber,
    },

    /// Two connected ports resolved to incompatible definite polarities.
    #[error("{kind}: {from_element}[{from_port}] (out) disagrees with {to_element}[{to_port}] (in)")]
    ProcessingConflict {
        /// Element on the source side of the disagreement.
        from_element: ElementIndex,
        /// Output port on the source side.
        from_port: PortNumber,
        /// Element on the sink side of the disagreement.
        to_element: ElementIndex,
        /// Input port on the sink side.
        to_port: PortNumber,
        /// Whether the conflict was found on a synthetic (`port_flow`)
        /// edge rather than a user-supplied connection.
        kind: ConflictKind,
    },

    /// `configure` ran and returned an error for this element.
    #[error("configure failed for element {element} ({name}): {message}")]
    ConfigureFailed {
        /// Element whose `configure` call failed.
        element: ElementIndex,
        /// The element's name.
        name: String,
        /// Message reported by the element.
        message: String,
    },

    /// `initialize` ran and returned an error for this element.
    #[error("initialize failed for element {element} ({name}): {message}")]
    InitializeFailed {
        /// Element whose `initialize` call failed.
        element: ElementIndex,
        /// The element's name.
        name: String,
        /// Message reported by the element.
        message: String,
    },

    /// `find` matched two elements at the same lexical scope.
    #[error("ambiguous name {name:?} in context {context:?}: multiple matches at the same scope")]
    AmbiguousName {
        /// Name searched for.
        name: String,
        /// Context the search started from.
        context: String,
    },

    /// `find` exhausted every scope without a match.
    #[error("name {name:?} not found from context {context:?}")]
    NameNotFound {
        /// Name searched for.
        name: String,
        /// Context the search started from.
        context: String,
    },

    /// The notifier signal word array has no free bits left.
    #[error("notifier signal capacity ({capacity}) exhausted")]
    NotifierCapacityExhausted {
        /// Configured capacity, in bits.
        capacity: usize,
    },

    /// `initialize` failed overall; matches the historical
    /// "Router could not be initialized!" user-visible message.
    #[error("Router could not be initialized! ({error_count} error(s) reported)")]
    InitializationFailed {
        /// Total number of errors reported to the `ErrorSink` during this attempt.
        error_count: usize,
    },

    /// A handler-invocation error surfaced through a lifecycle or
    /// validation path (e.g. a default handler called during rollback).
    #[error("handler error: {0}")]
    Handler(#[from] HandlerError),

    /// `add_requirement` was called more times than `RouterConfig::max_requirements` allows.
    #[error("too many requirements: configured maximum is {max}")]
    TooManyRequirements {
        /// The configured cap.
        max: usize,
    },
}
