//! # elementgraph - a modular packet-processing router's composition core
//!
//! `elementgraph` is the composition substrate beneath a modular,
//! push/pull packet-processing router: a declarative graph of typed,
//! capability-constrained elements is checked, globally resolved for
//! processing polarity, and brought up in dependency order with faithful
//! rollback on failure.
//!
//! This crate does not execute packets, parse a configuration language, or
//! schedule worker threads — those are external collaborators that plug in
//! at the seams this crate defines ([`Element`], [`Scheduler`],
//! [`ErrorSink`]). What it owns is the graph itself: building it, wiring
//! it, validating it, and driving it from nothing through to a live,
//! introspectable router.
//!
//! ## Core components
//!
//! - [`Router`]: the state machine that owns every other component and
//!   exposes the public API — graph construction, the lifecycle engine,
//!   name resolution, handler invocation, attachments, and notifiers.
//! - [`Element`]: the capability interface every node in the graph
//!   implements (port counts, polarity, configure/initialize/cleanup,
//!   handlers).
//! - `port_index`/`processing`/`completeness`: the port-flattening,
//!   push/pull resolution, and uniqueness/reachability machinery the
//!   lifecycle engine drives during `initialize`.
//! - `handler`: the flyweight handler pool backing the router's
//!   introspection and control-plane surface.
//! - `scheduler`: the narrow contract `activate` and `adjust_runcount`
//!   hold with the external thread pool that actually runs elements.
//!
//! ## Example
//!
//! ```
//! use elementgraph::{CollectingErrorSink, Element, PortNumber, Router, RouterConfig, RouterState};
//!
//! struct Source;
//! impl Element for Source {
//!     fn class_name(&self) -> &str { "Source" }
//!     fn output_spec(&self) -> elementgraph::PortSpec { elementgraph::PortSpec::Fixed(1) }
//!     fn processing_vector(&self, inputs: usize, outputs: usize) -> elementgraph::ProcessingVector {
//!         elementgraph::ProcessingVector::uniform(inputs, outputs, elementgraph::Polarity::Push)
//!     }
//! }
//!
//! struct Sink;
//! impl Element for Sink {
//!     fn class_name(&self) -> &str { "Sink" }
//!     fn input_spec(&self) -> elementgraph::PortSpec { elementgraph::PortSpec::Fixed(1) }
//!     fn processing_vector(&self, inputs: usize, outputs: usize) -> elementgraph::ProcessingVector {
//!         elementgraph::ProcessingVector::uniform(inputs, outputs, elementgraph::Polarity::Push)
//!     }
//! }
//!
//! let mut router = Router::new(RouterConfig::default());
//! let source = router.add_element(Box::new(Source), "src", "", "demo:1").unwrap();
//! let sink = router.add_element(Box::new(Sink), "dst", "", "demo:2").unwrap();
//! router.add_connection(source, PortNumber::new(0), sink, PortNumber::new(0)).unwrap();
//!
//! let mut errors = CollectingErrorSink::new();
//! router.initialize(&mut errors).unwrap();
//! assert_eq!(router.state(), RouterState::Live);
//! ```

pub mod attachment;
pub mod completeness;
pub mod config;
pub mod connection;
pub mod domain_types;
pub mod element;
pub mod error;
pub mod errorsink;
pub mod handler;
pub mod hotswap;
pub mod name_resolution;
pub mod notifier;
pub mod port_index;
pub mod processing;
pub mod registry;
pub mod router;
pub mod runcount;
pub mod scheduler;
pub mod unparse;

pub use crate::attachment::AttachmentStore;
pub use crate::completeness::ElementFilter;
pub use crate::config::{NotifierCapacity, ResolutionMode, RouterConfig, RouterConfigBuilder};
pub use crate::connection::{Connection, ConnectionTable, Endpoint};
pub use crate::domain_types::{
    CleanupStage, ConfigurePhase, Direction, ElementIndex, GlobalPortId, HandlerId, NotifierSignalId,
    Polarity, PortNumber, PortSpec, RouterState, RunningState,
};
pub use crate::element::{Element, InitContext, PortFlow, ProcessingVector};
pub use crate::error::{ConflictKind, HandlerError, RouterError};
pub use crate::errorsink::{CollectingErrorSink, ContextErrorSink, ErrorKind, ErrorSink};
pub use crate::handler::{HandlerBuilder, HandlerFlags, HandlerRegistry, HandlerView, ReadHandlerFn, WriteHandlerFn};
pub use crate::hotswap::{HotswapHandle, HotswapSource};
pub use crate::notifier::NotifierSignals;
pub use crate::port_index::PortIndex;
pub use crate::processing::{ProcessingResolver, ResolvedPolarity};
pub use crate::registry::{ElementEntry, ElementRegistry};
pub use crate::router::Router;
pub use crate::runcount::{Runcount, STOP_RUNCOUNT};
pub use crate::scheduler::{Scheduler, SchedulerError};

pub use ::tracing::{debug, error, info, instrument, warn};
