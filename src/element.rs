//! The element contract (`SPEC_FULL.md` §6, §9).
//!
//! Every leaf element the surrounding repository would provide (IP summary
//! parsers, device drivers, an LVAP manager, ...) is an external collaborator
//! that implements this trait. The core never constructs an `Element`; it
//! only calls the methods below in the order the lifecycle engine dictates.

use crate::domain_types::{CleanupStage, ConfigurePhase, Direction, ElementIndex, Polarity, PortNumber, PortSpec};
use crate::errorsink::ErrorSink;
use crate::handler::HandlerBuilder;

/// Per-port polarity declaration an element hands back from [`Element::processing_vector`].
#[derive(Debug, Clone)]
pub struct ProcessingVector {
    /// One entry per input port, in port order.
    pub inputs: Vec<Polarity>,
    /// One entry per output port, in port order.
    pub outputs: Vec<Polarity>,
}

impl ProcessingVector {
    /// Every port declared with the same polarity.
    #[must_use]
    pub fn uniform(inputs: usize, outputs: usize, polarity: Polarity) -> Self {
        Self {
            inputs: vec![polarity; inputs],
            outputs: vec![polarity; outputs],
        }
    }
}

/// Internal fan-out of one port, reported by [`Element::port_flow`].
///
/// A bit at index `i` means "this port internally reaches opposite-direction
/// port `i`"; the resolver uses this to synthesize agnostic-propagation
/// edges (`SPEC_FULL.md` §4.3 step 2).
#[derive(Debug, Clone, Default)]
pub struct PortFlow(pub Vec<bool>);

impl PortFlow {
    /// No internal fan-out: this port only ever reaches the outside world.
    #[must_use]
    pub fn none(opposite_count: usize) -> Self {
        Self(vec![false; opposite_count])
    }

    /// Reaches every opposite-direction port (the conservative default most
    /// simple elements want).
    #[must_use]
    pub fn all(opposite_count: usize) -> Self {
        Self(vec![true; opposite_count])
    }

    /// Ports this flow reaches, as an iterator of indices.
    pub fn reached(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &reached)| reached.then_some(i))
    }
}

/// Context handed to [`Element::initialize`]: a narrow window onto the
/// router, wide enough for an element to look up a sibling, attach a value,
/// or mint a notifier signal, but never wide enough to mutate the graph.
pub trait InitContext {
    /// This element's own index.
    fn self_index(&self) -> ElementIndex;

    /// Resolves a compound path starting from this element's name, per
    /// `SPEC_FULL.md` §4.6.
    fn find(&self, name: &str) -> Option<ElementIndex>;
}

/// The capability interface every element in a [`crate::Router`] implements.
///
/// Default method bodies describe the behavior of an element with no ports,
/// no handlers, and nothing to configure, matching how `click`-derived
/// elements usually only override the handful of methods their role needs.
pub trait Element: Send + Sync {
    /// Name reported in diagnostics and the canonical unparse (`CLASS` in
    /// `NAME :: CLASS(CONFIG);`).
    fn class_name(&self) -> &str;

    /// Smaller runs earlier. Ties broken by insertion order.
    fn configure_phase(&self) -> ConfigurePhase {
        ConfigurePhase::default()
    }

    /// How many input ports this element is willing to expose.
    fn input_spec(&self) -> PortSpec {
        PortSpec::Fixed(0)
    }

    /// How many output ports this element is willing to expose.
    fn output_spec(&self) -> PortSpec {
        PortSpec::Fixed(0)
    }

    /// Declares this element's port polarities, given the port counts the
    /// router resolved from `input_spec`/`output_spec` against actual usage.
    fn processing_vector(&self, inputs: usize, outputs: usize) -> ProcessingVector {
        ProcessingVector::uniform(inputs, outputs, Polarity::Agnostic)
    }

    /// Internal fan-out of `port` in `direction`, as a bitmap over the
    /// opposite direction's ports (`SPEC_FULL.md` §4.3 step 2, §4.4).
    fn port_flow(&self, direction: Direction, port: PortNumber, opposite_count: usize) -> PortFlow {
        let _ = port;
        match direction {
            Direction::Input => PortFlow::all(opposite_count),
            Direction::Output => PortFlow::all(opposite_count),
        }
    }

    /// Parses and applies this element's configuration string (already
    /// tokenized into an argument vector by the configuration collaborator).
    ///
    /// # Errors
    /// Returns an error message on invalid configuration. The lifecycle
    /// engine reports it through the caller's [`ErrorSink`] and marks this
    /// element `CONFIGURE_FAILED` without aborting the configure pass.
    fn configure(&mut self, args: &[String], errors: &mut dyn ErrorSink) -> Result<(), String> {
        let _ = (args, errors);
        Ok(())
    }

    /// Runs after every element has configured. May look up siblings,
    /// install attachments, or mint notifier signals via `ctx`.
    ///
    /// # Errors
    /// Returns an error message on failure. The lifecycle engine stops
    /// initializing further elements and rolls the router back.
    fn initialize(&mut self, ctx: &dyn InitContext, errors: &mut dyn ErrorSink) -> Result<(), String> {
        let _ = (ctx, errors);
        Ok(())
    }

    /// Installs this port's resolved polarity and, typically, the matching
    /// push/pull vtable entry (`SPEC_FULL.md` §4.3 step 5).
    fn initialize_ports(&mut self, input_polarity: &[Polarity], output_polarity: &[Polarity]) {
        let _ = (input_polarity, output_polarity);
    }

    /// Records the peer this port was wired to. Called once per connection
    /// endpoint during hookup commit (`SPEC_FULL.md` §4.1 step 6).
    fn connect_port(&mut self, direction: Direction, port: PortNumber, peer: (ElementIndex, PortNumber)) {
        let _ = (direction, port, peer);
    }

    /// Called during rollback or router teardown with the furthest stage
    /// this element actually reached, so cleanup never assumes state that
    /// was never established.
    fn cleanup(&mut self, stage: CleanupStage) {
        let _ = stage;
    }

    /// Registers this element's named handlers.
    fn add_handlers(&self, handlers: &mut HandlerBuilder<'_>) {
        let _ = handlers;
    }

    /// If present, the name of a predecessor-router element this element
    /// can transfer state from during a hotswap (`SPEC_FULL.md` §3, §9).
    fn hotswap_element(&self) -> Option<&str> {
        None
    }

    /// Pulls whatever state `predecessor` can hand over during a hotswap.
    fn take_state(&mut self, predecessor: &dyn Element) {
        let _ = predecessor;
    }
}
