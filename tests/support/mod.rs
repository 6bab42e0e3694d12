//! Fixture elements shared across the integration tests: the `S`/`Q`/`D`/
//! `Q2` chain from the end-to-end scenarios, a phase-ordered element whose
//! configure can be told to fail, and a handler-heavy element exercising the
//! flyweight pool from the outside.

#![allow(dead_code)]

use elementgraph::{
    CleanupStage, ConfigurePhase, Element, ErrorSink, HandlerBuilder, InitContext, Polarity, PortSpec,
    ProcessingVector,
};
use std::sync::{Arc, Mutex};

/// A plain element with fixed, uniform per-direction polarity and default
/// (fully fanned-out) internal port flow — enough to build the `S`/`Q`/`D`
/// chain from the spec's end-to-end scenarios.
pub struct PolarityElement {
    pub class: &'static str,
    pub inputs: usize,
    pub outputs: usize,
    pub input_polarity: Polarity,
    pub output_polarity: Polarity,
}

impl PolarityElement {
    #[must_use]
    pub fn source(outputs: usize) -> Self {
        Self {
            class: "Source",
            inputs: 0,
            outputs,
            input_polarity: Polarity::Push,
            output_polarity: Polarity::Push,
        }
    }

    #[must_use]
    pub fn sink(inputs: usize) -> Self {
        Self {
            class: "Sink",
            inputs,
            outputs: 0,
            input_polarity: Polarity::Push,
            output_polarity: Polarity::Push,
        }
    }

    #[must_use]
    pub fn pull_sink(inputs: usize) -> Self {
        Self {
            class: "PullSink",
            inputs,
            outputs: 0,
            input_polarity: Polarity::Pull,
            output_polarity: Polarity::Pull,
        }
    }

    #[must_use]
    pub fn agnostic_passthrough() -> Self {
        Self {
            class: "Queue",
            inputs: 1,
            outputs: 1,
            input_polarity: Polarity::Push,
            output_polarity: Polarity::Agnostic,
        }
    }
}

impl Element for PolarityElement {
    fn class_name(&self) -> &str {
        self.class
    }

    fn input_spec(&self) -> PortSpec {
        PortSpec::Fixed(self.inputs)
    }

    fn output_spec(&self) -> PortSpec {
        PortSpec::Fixed(self.outputs)
    }

    fn processing_vector(&self, inputs: usize, outputs: usize) -> ProcessingVector {
        ProcessingVector {
            inputs: vec![self.input_polarity; inputs],
            outputs: vec![self.output_polarity; outputs],
        }
    }
}

/// Records, in a shared log, when `configure`/`initialize`/`cleanup` ran —
/// used to assert phase-ordering and rollback-ordering across several
/// elements sharing one router.
#[derive(Clone)]
pub struct Trace(pub Arc<Mutex<Vec<String>>>);

impl Trace {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }

    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.0.lock().expect("trace lock poisoned").clone()
    }

    fn push(&self, event: impl Into<String>) {
        self.0.lock().expect("trace lock poisoned").push(event.into());
    }
}

impl Default for Trace {
    fn default() -> Self {
        Self::new()
    }
}

/// A zero-port element with a configure phase and an optional induced
/// configure/initialize failure, tracing every lifecycle call into a shared
/// [`Trace`] (`SPEC_FULL.md` §8 scenario 4).
pub struct PhasedElement {
    pub name: &'static str,
    pub phase: ConfigurePhase,
    pub fail_configure: bool,
    pub fail_initialize: bool,
    pub trace: Trace,
}

impl PhasedElement {
    #[must_use]
    pub fn new(name: &'static str, phase: i32, trace: &Trace) -> Self {
        Self {
            name,
            phase: ConfigurePhase::from(phase),
            fail_configure: false,
            fail_initialize: false,
            trace: trace.clone(),
        }
    }

    #[must_use]
    pub fn failing_configure(mut self) -> Self {
        self.fail_configure = true;
        self
    }

    #[must_use]
    pub fn failing_initialize(mut self) -> Self {
        self.fail_initialize = true;
        self
    }
}

impl Element for PhasedElement {
    fn class_name(&self) -> &str {
        "Phased"
    }

    fn configure_phase(&self) -> ConfigurePhase {
        self.phase
    }

    fn configure(&mut self, _args: &[String], _errors: &mut dyn ErrorSink) -> Result<(), String> {
        self.trace.push(format!("configure:{}", self.name));
        if self.fail_configure {
            Err("bad param".to_string())
        } else {
            Ok(())
        }
    }

    fn initialize(&mut self, _ctx: &dyn InitContext, _errors: &mut dyn ErrorSink) -> Result<(), String> {
        self.trace.push(format!("initialize:{}", self.name));
        if self.fail_initialize {
            Err("setup failed".to_string())
        } else {
            Ok(())
        }
    }

    fn cleanup(&mut self, stage: CleanupStage) {
        self.trace.push(format!("cleanup:{}:{stage:?}", self.name));
    }
}

/// A single-port, no-op element exposing one `"count"` read/write handler
/// and one `"*"` star handler, for the handler-registry end-to-end tests
/// (`SPEC_FULL.md` §8 scenario 6, "star handler").
///
/// `count`'s state lives behind the `Arc<Mutex<usize>>` whose data pointer
/// is handed to the handler pool as the opaque `thunk`, exactly the way the
/// spec describes handler thunks (a `void*`-equivalent the callback alone
/// knows how to interpret) rather than through the element reference, which
/// the shared callback's `fn` pointer type can't downcast.
pub struct HandlerHeavyElement {
    pub count: Arc<Mutex<usize>>,
}

impl HandlerHeavyElement {
    #[must_use]
    pub fn new() -> Self {
        Self {
            count: Arc::new(Mutex::new(0)),
        }
    }

    fn thunk(&self) -> usize {
        Arc::as_ptr(&self.count) as usize
    }
}

impl Default for HandlerHeavyElement {
    fn default() -> Self {
        Self::new()
    }
}

fn read_count(_element: &dyn Element, _param: Option<&str>, thunk: usize) -> Result<String, String> {
    let count = unsafe { &*(thunk as *const Mutex<usize>) };
    Ok(count.lock().expect("count lock poisoned").to_string())
}

fn write_count(_element: &mut dyn Element, value: &str, thunk: usize) -> Result<(), String> {
    let parsed: usize = value.parse().map_err(|_| format!("not an integer: {value:?}"))?;
    let count = unsafe { &*(thunk as *const Mutex<usize>) };
    *count.lock().expect("count lock poisoned") = parsed;
    Ok(())
}

fn star_read(_element: &dyn Element, param: Option<&str>, _thunk: usize) -> Result<String, String> {
    Ok(format!("star:{}", param.unwrap_or("<none>")))
}

impl Element for HandlerHeavyElement {
    fn class_name(&self) -> &str {
        "HandlerHeavy"
    }

    fn add_handlers(&self, handlers: &mut HandlerBuilder<'_>) {
        let thunk = self.thunk();
        handlers.add_read_handler("count", read_count, thunk);
        handlers.add_write_handler("count", write_count, thunk);
        handlers.add_read_handler("*", star_read, 0);
    }
}

/// A zero-port element that pulls state across a hotswap from a
/// same-named predecessor element, recording the transfer into a shared
/// [`Trace`] (`SPEC_FULL.md` §3 "hotswap predecessor", §9).
pub struct HotswapElement {
    pub predecessor_name: &'static str,
    pub trace: Trace,
}

impl HotswapElement {
    #[must_use]
    pub fn new(predecessor_name: &'static str, trace: &Trace) -> Self {
        Self {
            predecessor_name,
            trace: trace.clone(),
        }
    }
}

impl Element for HotswapElement {
    fn class_name(&self) -> &str {
        "Hotswap"
    }

    fn hotswap_element(&self) -> Option<&str> {
        Some(self.predecessor_name)
    }

    fn take_state(&mut self, predecessor: &dyn Element) {
        self.trace.push(format!("take_state:from:{}", predecessor.class_name()));
    }
}
