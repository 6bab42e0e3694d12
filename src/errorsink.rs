//! The error-sink collaborator (`SPEC_FULL.md` §6, §4.10).
//!
//! `ErrorSink` is the polymorphic reporter the lifecycle engine writes
//! validation and configuration failures to. The router never owns a
//! concrete sink; callers supply one (a CLI's stderr writer, a test harness's
//! collector, ...). `ContextErrorSink` is the one adapter the core itself
//! provides, prefixing every message with the element it was raised while
//! handling.

use std::fmt;
use tracing::{error as trace_error, warn as trace_warn};

/// Severity of a reported message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A fatal problem; the caller should treat initialization as failed.
    Error,
    /// A non-fatal problem worth surfacing.
    Warning,
}

/// Polymorphic error reporter used throughout graph construction and
/// lifecycle operations.
///
/// Implementors decide where messages go (stderr, a log buffer, a test
/// collector); the router only ever calls the four reporting methods and
/// reads back `nerrors`.
pub trait ErrorSink {
    /// Reports a fatal problem at the given landmark.
    fn error(&mut self, landmark: &str, message: &str) {
        self.verror(ErrorKind::Error, landmark, message);
    }

    /// Reports a non-fatal problem at the given landmark.
    fn warning(&mut self, landmark: &str, message: &str) {
        self.verror(ErrorKind::Warning, landmark, message);
    }

    /// Reports an informational message with no landmark.
    fn message(&mut self, message: &str);

    /// The primitive every other reporting method funnels through.
    fn verror(&mut self, kind: ErrorKind, landmark: &str, message: &str);

    /// Total count of `ErrorKind::Error` messages reported so far.
    fn nerrors(&self) -> usize;
}

/// An `ErrorSink` that prefixes every message with `"While configuring
/// <element>:"` (or any other caller-supplied context string), matching the
/// per-element error context the lifecycle engine installs around every
/// call into an element (`SPEC_FULL.md` §6).
pub struct ContextErrorSink<'a> {
    inner: &'a mut dyn ErrorSink,
    context: String,
}

impl<'a> ContextErrorSink<'a> {
    /// Wraps `inner`, prefixing every message with `context`.
    pub fn new(inner: &'a mut dyn ErrorSink, context: impl Into<String>) -> Self {
        Self {
            inner,
            context: context.into(),
        }
    }

    /// Builds the standard `"While configuring <element>:"` context string.
    pub fn configuring(element_name: &str) -> String {
        format!("While configuring {element_name}:")
    }

    /// Builds the standard `"While initializing <element>:"` context string.
    pub fn initializing(element_name: &str) -> String {
        format!("While initializing {element_name}:")
    }

    fn prefixed(&self, message: &str) -> String {
        format!("{} {message}", self.context)
    }
}

impl ErrorSink for ContextErrorSink<'_> {
    fn message(&mut self, message: &str) {
        let prefixed = self.prefixed(message);
        self.inner.message(&prefixed);
    }

    fn verror(&mut self, kind: ErrorKind, landmark: &str, message: &str) {
        let prefixed = self.prefixed(message);
        match kind {
            ErrorKind::Error => trace_error!(landmark, message = %prefixed, "router error"),
            ErrorKind::Warning => trace_warn!(landmark, message = %prefixed, "router warning"),
        }
        self.inner.verror(kind, landmark, &prefixed);
    }

    fn nerrors(&self) -> usize {
        self.inner.nerrors()
    }
}

/// A simple in-memory `ErrorSink` that records every message, useful for
/// tests and for callers that just want to inspect what went wrong.
#[derive(Debug, Default, Clone)]
pub struct CollectingErrorSink {
    /// Every message reported, in order, alongside its landmark and kind.
    pub messages: Vec<(ErrorKind, String, String)>,
}

impl CollectingErrorSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ErrorSink for CollectingErrorSink {
    fn message(&mut self, message: &str) {
        self.messages
            .push((ErrorKind::Warning, String::new(), message.to_string()));
    }

    fn verror(&mut self, kind: ErrorKind, landmark: &str, message: &str) {
        self.messages
            .push((kind, landmark.to_string(), message.to_string()));
    }

    fn nerrors(&self) -> usize {
        self.messages
            .iter()
            .filter(|(kind, ..)| *kind == ErrorKind::Error)
            .count()
    }
}

impl fmt::Debug for dyn ErrorSink + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<dyn ErrorSink, {} error(s)>", self.nerrors())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn collecting_sink_counts_only_errors() {
        let mut sink = CollectingErrorSink::new();
        sink.error("e0", "boom");
        sink.warning("e1", "hmm");
        sink.message("fyi");
        assert_eq!(sink.nerrors(), 1);
        assert_eq!(sink.messages.len(), 3);
    }

    #[test]
    fn context_sink_prefixes_every_message_and_forwards_nerrors() {
        let mut inner = CollectingErrorSink::new();
        {
            let mut ctx = ContextErrorSink::new(&mut inner, ContextErrorSink::configuring("src"));
            ctx.error("e0", "bad config");
            ctx.message("note");
            assert_eq!(ctx.nerrors(), 1);
        }
        assert_eq!(inner.messages[0].2, "While configuring src: bad config");
        assert_eq!(inner.messages[1].2, "While configuring src: note");
    }
}
