//! The Router Façade and Lifecycle Engine (`SPEC_FULL.md` §3, §4.1).
//!
//! [`Router`] owns the element arena, the connection graph, and every
//! collaborator the lifecycle engine composes (port index, processing
//! resolver, handler registry, notifier signals, runcount, attachments).
//! Graph construction (`add_element`/`add_connection`/`add_requirement`)
//! takes `&mut self`, since `SPEC_FULL.md` §5 treats that phase as
//! single-threaded and cooperative; once `initialize` returns `Ok`, callers
//! wrap the router in an `Arc` to hand it to a `Scheduler` and every
//! remaining method takes `&self`.

use crate::attachment::AttachmentStore;
use crate::completeness::{check_uniqueness, check_unused, reachable, ElementFilter};
use crate::config::{ResolutionMode, RouterConfig};
use crate::connection::{ConnectionTable, Endpoint};
use crate::domain_types::{
    CleanupStage, Direction, ElementIndex, NotifierSignalId, PortNumber, RouterState, RunningState,
};
use crate::element::{Element, InitContext};
use crate::error::{HandlerError, RouterError};
use crate::errorsink::{ContextErrorSink, ErrorSink};
use crate::handler::{HandlerFlags, HandlerRegistry};
use crate::hotswap::{HotswapHandle, HotswapSource};
use crate::name_resolution;
use crate::notifier::NotifierSignals;
use crate::port_index::PortIndex;
use crate::processing::{ProcessingResolver, ResolvedPolarity};
use crate::registry::ElementRegistry;
use crate::runcount::Runcount;
use crate::scheduler::{Scheduler, SchedulerError};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, RwLock};

/// The router core: an element graph plus its lifecycle state machine
/// (`SPEC_FULL.md` §3 "Invariants").
pub struct Router {
    state: RwLock<RouterState>,
    running: RwLock<RunningState>,
    elements: ElementRegistry,
    connections: ConnectionTable,
    requirements: Vec<String>,
    original_source: Option<String>,
    config: RouterConfig,
    ports: PortIndex,
    polarity: Option<ResolvedPolarity>,
    handlers: RwLock<HandlerRegistry>,
    attachments: AttachmentStore,
    notifiers: NotifierSignals,
    runcount: Runcount,
    scheduler: RwLock<Option<Arc<dyn Scheduler>>>,
    hotswap: RwLock<Option<HotswapHandle>>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("state", &self.state())
            .field("elements", &self.elements.len())
            .field("connections", &self.connections.len())
            .field("runcount", &self.runcount.get())
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Builds a fresh, empty router in `RouterState::New`.
    #[must_use]
    pub fn new(config: RouterConfig) -> Self {
        Self {
            state: RwLock::new(RouterState::New),
            running: RwLock::new(RunningState::Preparing),
            elements: ElementRegistry::new(),
            connections: ConnectionTable::new(),
            requirements: Vec::new(),
            original_source: None,
            notifiers: NotifierSignals::new(config.notifier_capacity),
            config,
            ports: PortIndex::default(),
            polarity: None,
            handlers: RwLock::new(HandlerRegistry::new()),
            attachments: AttachmentStore::new(),
            runcount: Runcount::new(),
            scheduler: RwLock::new(None),
            hotswap: RwLock::new(None),
        }
    }

    /// The router's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RouterState {
        *self.state.read().expect("state lock poisoned")
    }

    /// The router's current scheduler-facing running state.
    #[must_use]
    pub fn running_state(&self) -> RunningState {
        *self.running.read().expect("running lock poisoned")
    }

    fn set_state(&self, state: RouterState) {
        tracing::debug!(?state, "router state transition");
        *self.state.write().expect("state lock poisoned") = state;
    }

    fn require_new(&self) -> Result<(), RouterError> {
        if self.state() == RouterState::New {
            Ok(())
        } else {
            Err(RouterError::WrongState)
        }
    }

    fn landmark_for(&self, index: ElementIndex) -> String {
        self.elements
            .entry(index)
            .map(|entry| entry.landmark().to_string())
            .unwrap_or_else(|| "<router>".to_string())
    }

    // ---- Graph construction (`SPEC_FULL.md` §4.1, New state only) ----

    /// Adds an element to the graph, returning its stable index.
    ///
    /// # Errors
    /// Returns [`RouterError::WrongState`] unless the router is `New`.
    pub fn add_element(
        &mut self,
        element: Box<dyn Element>,
        name: impl Into<String>,
        configuration: impl Into<String>,
        landmark: impl Into<String>,
    ) -> Result<ElementIndex, RouterError> {
        self.require_new()?;
        Ok(self.elements.add(element, name, configuration, landmark))
    }

    /// Adds a directed connection between two element ports, collapsing an
    /// exact duplicate.
    ///
    /// # Errors
    /// Returns [`RouterError::WrongState`] unless the router is `New`, or
    /// [`RouterError::BadElementIndex`] if either endpoint's element
    /// doesn't exist.
    pub fn add_connection(
        &mut self,
        from: ElementIndex,
        from_port: PortNumber,
        to: ElementIndex,
        to_port: PortNumber,
    ) -> Result<(), RouterError> {
        self.require_new()?;
        if !self.elements.contains(from) {
            return Err(RouterError::BadElementIndex { index: from });
        }
        if !self.elements.contains(to) {
            return Err(RouterError::BadElementIndex { index: to });
        }
        self.connections.add(Endpoint::new(from, from_port), Endpoint::new(to, to_port));
        Ok(())
    }

    /// Records a `require(...)` word for the canonical unparse.
    ///
    /// # Errors
    /// Returns [`RouterError::WrongState`] unless the router is `New`, or
    /// [`RouterError::TooManyRequirements`] if `RouterConfig::max_requirements`
    /// would be exceeded.
    pub fn add_requirement(&mut self, word: impl Into<String>) -> Result<(), RouterError> {
        self.require_new()?;
        if let Some(max) = self.config.max_requirements {
            if self.requirements.len() >= max {
                return Err(RouterError::TooManyRequirements { max });
            }
        }
        self.requirements.push(word.into());
        Ok(())
    }

    /// Records the original configuration-language source text, returned
    /// verbatim by the `config` introspection handler (`SPEC_FULL.md` §6).
    ///
    /// # Errors
    /// Returns [`RouterError::WrongState`] unless the router is `New`.
    pub fn set_original_source(&mut self, text: impl Into<String>) -> Result<(), RouterError> {
        self.require_new()?;
        self.original_source = Some(text.into());
        Ok(())
    }

    // ---- Lifecycle engine (`SPEC_FULL.md` §4.1) ----

    /// Runs the full validation, configure, and initialize pipeline.
    ///
    /// # Errors
    /// Returns [`RouterError::WrongState`] if the router isn't `New`, or
    /// [`RouterError::InitializationFailed`] if validation or any element's
    /// `configure`/`initialize` call failed; the router is left `Dead` and
    /// every configured element has had `cleanup` called in reverse
    /// configure order.
    #[tracing::instrument(skip(self, errors))]
    pub fn initialize(&mut self, errors: &mut dyn ErrorSink) -> Result<(), RouterError> {
        self.require_new()?;
        self.set_state(RouterState::Preconfigure);
        let baseline = errors.nerrors();

        // 1. Hookup-element check.
        let mut bad_index = HashSet::new();
        for (i, connection) in self.connections.edges().iter().enumerate() {
            if !self.elements.contains(connection.from.element) {
                bad_index.insert(i);
                errors.error(
                    &self.landmark_for(connection.from.element),
                    &RouterError::BadElementIndex { index: connection.from.element }.to_string(),
                );
            } else if !self.elements.contains(connection.to.element) {
                bad_index.insert(i);
                errors.error(
                    &self.landmark_for(connection.to.element),
                    &RouterError::BadElementIndex { index: connection.to.element }.to_string(),
                );
            }
        }
        self.connections.retain_indices_not_in(&bad_index);

        // 2. Port-count notification.
        let mut max_input_used = vec![0usize; self.elements.len()];
        let mut max_output_used = vec![0usize; self.elements.len()];
        for connection in self.connections.edges() {
            let out_used = &mut max_output_used[connection.from.element.as_usize()];
            *out_used = (*out_used).max(connection.from.port.as_usize() + 1);
            let in_used = &mut max_input_used[connection.to.element.as_usize()];
            *in_used = (*in_used).max(connection.to.port.as_usize() + 1);
        }
        let counts: Vec<(usize, usize)> = self
            .elements
            .iter()
            .map(|(idx, entry)| {
                let element = entry.read();
                let in_count = element.input_spec().resolve(max_input_used[idx.as_usize()]);
                let out_count = element.output_spec().resolve(max_output_used[idx.as_usize()]);
                (in_count, out_count)
            })
            .collect();

        // 3. Range check.
        let mut out_of_range = HashSet::new();
        for (i, connection) in self.connections.edges().iter().enumerate() {
            let (_, out_count) = counts[connection.from.element.as_usize()];
            if connection.from.port.as_usize() >= out_count {
                out_of_range.insert(i);
                errors.error(
                    &self.landmark_for(connection.from.element),
                    &RouterError::PortOutOfRange {
                        element: connection.from.element,
                        direction: Direction::Output,
                        port: connection.from.port,
                        declared: out_count,
                    }
                    .to_string(),
                );
                continue;
            }
            let (in_count, _) = counts[connection.to.element.as_usize()];
            if connection.to.port.as_usize() >= in_count {
                out_of_range.insert(i);
                errors.error(
                    &self.landmark_for(connection.to.element),
                    &RouterError::PortOutOfRange {
                        element: connection.to.element,
                        direction: Direction::Input,
                        port: connection.to.port,
                        declared: in_count,
                    }
                    .to_string(),
                );
            }
        }
        self.connections.retain_indices_not_in(&out_of_range);

        // 4. Build port index.
        let ports = PortIndex::build(&counts);

        // 5. Push/pull resolution and completeness.
        let (polarity, outcome) = ProcessingResolver::resolve(&ports, &self.connections, &self.elements);
        for err in &outcome.errors {
            errors.error("<router>", &err.to_string());
        }
        self.connections.retain_indices_not_in(&outcome.dead_connections);

        for (idx, entry) in self.elements.iter() {
            let inputs = polarity.element_inputs(&ports, idx);
            let outputs = polarity.element_outputs(&ports, idx);
            entry.write().initialize_ports(&inputs, &outputs);
        }

        let (dup_dropped, dup_errors) = check_uniqueness(&ports, &self.connections, &polarity);
        let strict = matches!(self.config.resolution_mode, ResolutionMode::Strict);
        for err in &dup_errors {
            if strict {
                errors.error("<router>", &err.to_string());
            } else {
                errors.warning("<router>", &err.to_string());
            }
        }
        self.connections.retain_indices_not_in(&dup_dropped);

        let unused_errors = check_unused(&ports, &self.connections, &self.elements);
        for err in &unused_errors {
            errors.error("<router>", &err.to_string());
        }

        // 6. Commit connections.
        for connection in self.connections.edges() {
            if let Some(entry) = self.elements.entry(connection.from.element) {
                entry
                    .write()
                    .connect_port(Direction::Output, connection.from.port, (connection.to.element, connection.to.port));
            }
            if let Some(entry) = self.elements.entry(connection.to.element) {
                entry
                    .write()
                    .connect_port(Direction::Input, connection.to.port, (connection.from.element, connection.from.port));
            }
        }

        // 7. Configure elements in phase order. Runs regardless of any
        // validation error collected above; configuration never depends on
        // port wiring.
        let configure_order = self.elements.configure_order();
        for &idx in &configure_order {
            let entry = self.elements.entry(idx).expect("configure_order indices are valid");
            let args = tokenize_configuration(entry.configuration());
            let mut sink = ContextErrorSink::new(errors, ContextErrorSink::configuring(entry.name()));
            match entry.write().configure(&args, &mut sink) {
                Ok(()) => entry.set_stage(CleanupStage::Configured),
                Err(message) => {
                    entry.set_stage(CleanupStage::ConfigureFailed);
                    let reported = RouterError::ConfigureFailed {
                        element: idx,
                        name: entry.name().to_string(),
                        message,
                    };
                    sink.error(entry.landmark(), &reported.to_string());
                }
            }
        }

        // 8. Abort if anything above failed; otherwise install handlers.
        if errors.nerrors() > baseline {
            self.rollback(&configure_order);
            return Err(RouterError::InitializationFailed {
                error_count: errors.nerrors() - baseline,
            });
        }

        {
            let mut handlers = self.handlers.write().expect("handlers lock poisoned");
            for (idx, entry) in self.elements.iter() {
                let mut builder = handlers.builder(idx);
                entry.read().add_handlers(&mut builder);
            }
        }

        // 9. Initialize elements in configure order, stopping at the first failure.
        self.set_state(RouterState::Preinitialize);
        let mut failed = false;
        for &idx in &configure_order {
            if failed {
                break;
            }
            let entry = self.elements.entry(idx).expect("configure_order indices are valid");
            let mut sink = ContextErrorSink::new(errors, ContextErrorSink::initializing(entry.name()));
            let ctx = RouterInitContext { router: self, index: idx };
            match entry.write().initialize(&ctx, &mut sink) {
                Ok(()) => entry.set_stage(CleanupStage::Initialized),
                Err(message) => {
                    entry.set_stage(CleanupStage::InitializeFailed);
                    let reported = RouterError::InitializeFailed {
                        element: idx,
                        name: entry.name().to_string(),
                        message,
                    };
                    sink.error(entry.landmark(), &reported.to_string());
                    failed = true;
                }
            }
        }

        if failed {
            self.rollback(&configure_order);
            return Err(RouterError::InitializationFailed {
                error_count: errors.nerrors() - baseline,
            });
        }

        // 10. Success.
        self.ports = ports;
        self.polarity = Some(polarity);
        self.set_state(RouterState::Live);
        self.runcount.reset_live();
        Ok(())
    }

    /// 11. Failure rollback: reverse-configure-order `cleanup`, drop
    /// per-element handlers, zero the runcount, transition to `Dead`.
    fn rollback(&mut self, configure_order: &[ElementIndex]) {
        self.set_state(RouterState::Dead);
        for &idx in configure_order.iter().rev() {
            if let Some(entry) = self.elements.entry(idx) {
                let stage = entry.stage();
                entry.write().cleanup(stage);
            }
        }
        let mut handlers = self.handlers.write().expect("handlers lock poisoned");
        for &idx in configure_order {
            handlers.remove_element_handlers(idx);
        }
        self.runcount.set(0);
    }

    // ---- Running (`SPEC_FULL.md` §4.1, §4.7, §6) ----

    /// Hands the router to a scheduler, transitioning `running_state` from
    /// `Preparing` to `Background` or `Active`.
    ///
    /// # Errors
    /// Returns [`SchedulerError::Rejected`] if the router isn't `Live`, or
    /// whatever the scheduler itself returns from `prepare_router`/`run_router`.
    pub fn activate(self: &Arc<Self>, foreground: bool, scheduler: Arc<dyn Scheduler>) -> Result<(), SchedulerError> {
        if self.state() != RouterState::Live {
            return Err(SchedulerError::Rejected {
                reason: "router is not LIVE".to_string(),
            });
        }
        scheduler.prepare_router(self)?;
        *self.running.write().expect("running lock poisoned") = if foreground {
            RunningState::Active
        } else {
            RunningState::Background
        };
        scheduler.run_router(Arc::clone(self), foreground)?;
        *self.scheduler.write().expect("scheduler lock poisoned") = Some(scheduler);
        Ok(())
    }

    /// Adjusts the runcount by `delta`, waking the scheduler if this call
    /// crosses to `<= 0`.
    pub fn adjust_runcount(&self, delta: i32) {
        let (_, crossed) = self.runcount.adjust(delta);
        self.handle_runcount_transition(crossed);
    }

    /// Sets the runcount directly, waking the scheduler if this call
    /// crosses to `<= 0`.
    pub fn set_runcount(&self, value: i32) {
        let (_, crossed) = self.runcount.set(value);
        self.handle_runcount_transition(crossed);
    }

    fn handle_runcount_transition(&self, crossed: bool) {
        if !crossed {
            return;
        }
        *self.running.write().expect("running lock poisoned") = RunningState::Stopped;
        if let Some(scheduler) = self.scheduler.read().expect("scheduler lock poisoned").as_ref() {
            scheduler.wake_one();
        }
    }

    /// The current runcount value.
    #[must_use]
    pub fn runcount(&self) -> i32 {
        self.runcount.get()
    }

    // ---- Name resolution, handlers, attachments, notifiers (§4.5-§4.9) ----

    /// Resolves `name` starting from lexical scope `context` (`SPEC_FULL.md` §4.6).
    ///
    /// # Errors
    /// Returns [`RouterError::AmbiguousName`] or [`RouterError::NameNotFound`].
    pub fn find(&self, name: &str, context: &str) -> Result<ElementIndex, RouterError> {
        name_resolution::find(&self.elements.names(), name, context)
    }

    /// Invokes the read handler `name` on `element` (or the router-global
    /// introspection handlers if `element` is [`ElementIndex::ROOT`]).
    ///
    /// # Errors
    /// Returns [`RouterError::BadElementIndex`] or a wrapped [`HandlerError`].
    pub fn call_read(&self, element: ElementIndex, name: &str, param: Option<&str>) -> Result<String, RouterError> {
        if element.is_root() {
            return self.call_root_read(name, param).map_err(RouterError::from);
        }
        let entry = self.elements.entry(element).ok_or(RouterError::BadElementIndex { index: element })?;
        let guard = entry.read();
        let handlers = self.handlers.read().expect("handlers lock poisoned");
        handlers.call_read(&**guard, element, name, param).map_err(RouterError::from)
    }

    /// Invokes the write handler `name` on `element` (or the router-global
    /// introspection handlers if `element` is [`ElementIndex::ROOT`]).
    ///
    /// # Errors
    /// Returns [`RouterError::BadElementIndex`] or a wrapped [`HandlerError`].
    pub fn call_write(&self, element: ElementIndex, name: &str, value: &str) -> Result<(), RouterError> {
        if element.is_root() {
            return self.call_root_write(name, value).map_err(RouterError::from);
        }
        let entry = self.elements.entry(element).ok_or(RouterError::BadElementIndex { index: element })?;
        let mut guard = entry.write();
        let handlers = self.handlers.read().expect("handlers lock poisoned");
        handlers.call_write(&mut **guard, element, name, value).map_err(RouterError::from)
    }

    /// Masks and sets clearable handler flags (`SPEC_FULL.md` §4.5).
    pub fn change_handler_flags(&self, element: ElementIndex, name: &str, mask: HandlerFlags, set: HandlerFlags) -> bool {
        self.handlers.write().expect("handlers lock poisoned").change_handler_flags(element, name, mask, set)
    }

    fn call_root_read(&self, name: &str, param: Option<&str>) -> Result<String, HandlerError> {
        let _ = param;
        match name {
            "version" => Ok(self.version()),
            "config" => Ok(self.config_text().to_string()),
            "flatconfig" => Ok(self.flatconfig()),
            "list" => Ok(self.list()),
            "requirements" => Ok(self.requirements_text()),
            _ => Err(HandlerError::NotFound {
                element: ElementIndex::ROOT,
                name: name.to_string(),
            }),
        }
    }

    fn call_root_write(&self, name: &str, value: &str) -> Result<(), HandlerError> {
        match name {
            "stop" => {
                let trimmed = value.trim();
                let delta = if trimmed.is_empty() {
                    1
                } else {
                    trimmed.parse::<i32>().map_err(|_| HandlerError::Callback {
                        element: ElementIndex::ROOT,
                        name: "stop".to_string(),
                        source: Box::<dyn std::error::Error + Send + Sync>::from(format!("invalid integer {trimmed:?}")),
                    })?
                };
                self.adjust_runcount(-delta);
                Ok(())
            }
            _ => Err(HandlerError::NotFound {
                element: ElementIndex::ROOT,
                name: name.to_string(),
            }),
        }
    }

    /// The `version` introspection handler: this crate's build version.
    #[must_use]
    pub fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    /// The `config` introspection handler: the original configuration-language
    /// source text, if recorded via [`Router::set_original_source`].
    #[must_use]
    pub fn config_text(&self) -> &str {
        self.original_source.as_deref().unwrap_or("")
    }

    /// The `flatconfig` introspection handler: the canonical unparse.
    #[must_use]
    pub fn flatconfig(&self) -> String {
        self.unparse()
    }

    /// The `list` introspection handler: element count, then one name per line.
    #[must_use]
    pub fn list(&self) -> String {
        let names = self.elements.names();
        let mut out = format!("{}\n", names.len());
        for (_, name) in names {
            out.push_str(&name);
            out.push('\n');
        }
        out
    }

    /// The `requirements` introspection handler: one `require()` word per line.
    #[must_use]
    pub fn requirements_text(&self) -> String {
        self.requirements.join("\n")
    }

    /// Renders the canonical unparse form (`SPEC_FULL.md` §6).
    #[must_use]
    pub fn unparse(&self) -> String {
        crate::unparse::unparse(&self.requirements, &self.elements, self.connections.edges())
    }

    /// Attaches `value` under `name` (`SPEC_FULL.md` §4.9).
    pub fn attach<T: std::any::Any + Send + Sync>(&self, name: impl Into<String>, value: T) {
        self.attachments.insert(name, value);
    }

    /// Reads the value attached under `name`, if present and of type `T`.
    #[must_use]
    pub fn attachment<T: std::any::Any + Send + Sync + Clone>(&self, name: &str) -> Option<T> {
        self.attachments.get(name)
    }

    /// Removes and returns the value attached under `name`.
    pub fn remove_attachment<T: std::any::Any + Send + Sync + Clone>(&self, name: &str) -> Option<T> {
        self.attachments.remove(name)
    }

    /// Allocates a new notifier signal, active by default.
    ///
    /// # Errors
    /// Returns [`RouterError::NotifierCapacityExhausted`] once capacity runs out.
    pub fn new_notifier_signal(&self) -> Result<NotifierSignalId, RouterError> {
        self.notifiers.new_notifier_signal().map_err(Into::into)
    }

    /// Sets a notifier signal active.
    pub fn notifier_set(&self, id: NotifierSignalId) {
        self.notifiers.set(id);
    }

    /// Clears a notifier signal.
    pub fn notifier_clear(&self, id: NotifierSignalId) {
        self.notifiers.clear(id);
    }

    /// Reads whether a notifier signal is active.
    #[must_use]
    pub fn notifier_is_active(&self, id: NotifierSignalId) -> bool {
        self.notifiers.is_active(id)
    }

    // ---- Transitive queries (`SPEC_FULL.md` §4.4) ----

    /// Elements reachable downstream of `(element, port)`'s output,
    /// expanding across connections and each element's internal `port_flow`.
    #[must_use]
    pub fn downstream_elements(&self, element: ElementIndex, port: PortNumber, stop: ElementFilter<'_>) -> HashSet<ElementIndex> {
        reachable(&self.ports, &self.connections, &self.elements, (element, port), Direction::Output, stop)
    }

    /// Elements reachable upstream of `(element, port)`'s input.
    #[must_use]
    pub fn upstream_elements(&self, element: ElementIndex, port: PortNumber, stop: ElementFilter<'_>) -> HashSet<ElementIndex> {
        reachable(&self.ports, &self.connections, &self.elements, (element, port), Direction::Input, stop)
    }

    // ---- Hotswap (`SPEC_FULL.md` §3, §9) ----

    /// Transfers per-element state from `predecessor`, for every element
    /// that declares a [`Element::hotswap_element`] peer.
    ///
    /// # Errors
    /// Returns [`RouterError::WrongState`] unless this router is `Live`.
    pub fn hotswap_from(&self, predecessor: Arc<dyn HotswapSource>) -> Result<(), RouterError> {
        if self.state() != RouterState::Live {
            return Err(RouterError::WrongState);
        }
        *self.hotswap.write().expect("hotswap lock poisoned") = Some(HotswapHandle::new(Arc::clone(&predecessor)));

        for (_, entry) in self.elements.iter() {
            let Some(predecessor_name) = entry.read().hotswap_element().map(str::to_string) else {
                continue;
            };
            let Some(predecessor_index) = predecessor.find_predecessor(&predecessor_name) else {
                continue;
            };
            predecessor.with_predecessor_element(predecessor_index, &mut |predecessor_element| {
                entry.write().take_state(predecessor_element);
            });
        }

        *self.hotswap.write().expect("hotswap lock poisoned") = None;
        Ok(())
    }
}

impl HotswapSource for Router {
    fn find_predecessor(&self, name: &str) -> Option<ElementIndex> {
        self.elements.names().into_iter().find(|(_, n)| n == name).map(|(idx, _)| idx)
    }

    fn with_predecessor_element(&self, index: ElementIndex, with: &mut dyn FnMut(&dyn Element)) {
        if let Some(entry) = self.elements.entry(index) {
            with(&**entry.read());
        }
    }
}

struct RouterInitContext<'a> {
    router: &'a Router,
    index: ElementIndex,
}

impl InitContext for RouterInitContext<'_> {
    fn self_index(&self) -> ElementIndex {
        self.index
    }

    fn find(&self, name: &str) -> Option<ElementIndex> {
        let context = self
            .router
            .elements
            .entry(self.index)
            .map(crate::registry::ElementEntry::name)
            .unwrap_or("");
        name_resolution::find(&self.router.elements.names(), name, context).ok()
    }
}

/// Splits a raw configuration string into an argument vector. A plain
/// comma-split: richer configuration-language tokenizing (quoting, nested
/// parens) is a collaborator's job, not the core's.
fn tokenize_configuration(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{PortFlow, ProcessingVector};
    use crate::domain_types::{Polarity, PortSpec};
    use crate::errorsink::CollectingErrorSink;
    use test_log::test;

    struct Source;
    impl Element for Source {
        fn class_name(&self) -> &str {
            "Source"
        }
        fn output_spec(&self) -> PortSpec {
            PortSpec::Fixed(1)
        }
        fn processing_vector(&self, _inputs: usize, outputs: usize) -> ProcessingVector {
            ProcessingVector::uniform(0, outputs, Polarity::Push)
        }
    }

    struct Sink;
    impl Element for Sink {
        fn class_name(&self) -> &str {
            "Sink"
        }
        fn input_spec(&self) -> PortSpec {
            PortSpec::Fixed(1)
        }
        fn processing_vector(&self, inputs: usize, _outputs: usize) -> ProcessingVector {
            ProcessingVector::uniform(inputs, 0, Polarity::Push)
        }
        fn port_flow(&self, _direction: Direction, _port: PortNumber, opposite_count: usize) -> PortFlow {
            PortFlow::none(opposite_count)
        }
    }

    #[test]
    fn trivial_chain_goes_live() {
        let mut router = Router::new(RouterConfig::default());
        let source = router.add_element(Box::new(Source), "s", "", "s:1").unwrap();
        let sink = router.add_element(Box::new(Sink), "d", "", "d:1").unwrap();
        router.add_connection(source, PortNumber::new(0), sink, PortNumber::new(0)).unwrap();

        let mut sink_errors = CollectingErrorSink::new();
        router.initialize(&mut sink_errors).unwrap();
        assert_eq!(router.state(), RouterState::Live);
        assert_eq!(router.runcount(), 1);
    }

    #[test]
    fn unused_port_aborts_initialization() {
        let mut router = Router::new(RouterConfig::default());
        router.add_element(Box::new(Source), "s", "", "s:1").unwrap();

        let mut sink_errors = CollectingErrorSink::new();
        let result = router.initialize(&mut sink_errors);
        assert!(result.is_err());
        assert_eq!(router.state(), RouterState::Dead);
    }

    #[test]
    fn add_element_rejected_outside_new_state() {
        let mut router = Router::new(RouterConfig::default());
        let source = router.add_element(Box::new(Source), "s", "", "").unwrap();
        let sink = router.add_element(Box::new(Sink), "d", "", "").unwrap();
        router.add_connection(source, PortNumber::new(0), sink, PortNumber::new(0)).unwrap();
        let mut sink_errors = CollectingErrorSink::new();
        router.initialize(&mut sink_errors).unwrap();

        let err = router.add_element(Box::new(Sink), "late", "", "").unwrap_err();
        assert!(matches!(err, RouterError::WrongState));
    }

    #[test]
    fn root_introspection_handlers_answer() {
        let mut router = Router::new(RouterConfig::default());
        let source = router.add_element(Box::new(Source), "s", "", "").unwrap();
        let sink = router.add_element(Box::new(Sink), "d", "", "").unwrap();
        router.add_connection(source, PortNumber::new(0), sink, PortNumber::new(0)).unwrap();
        let mut sink_errors = CollectingErrorSink::new();
        router.initialize(&mut sink_errors).unwrap();

        let list = router.call_read(ElementIndex::ROOT, "list", None).unwrap();
        assert!(list.starts_with("2\n"));

        router.call_write(ElementIndex::ROOT, "stop", "1").unwrap();
        assert_eq!(router.runcount(), 0);
    }
}
