//! Router Configuration (`SPEC_FULL.md` §4.9): the small set of tunables
//! the router core owns about itself, builder-constructed the way the
//! teacher's environment-flavored `RouterConfig` is, but scoped to what
//! this core actually needs.

pub use crate::domain_types::NotifierCapacity;
use serde::{Deserialize, Serialize};

/// How strictly `initialize` treats a dropped or conflicting connection
/// (`SPEC_FULL.md` §4.9, §8 scenario 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionMode {
    /// Any dropped or conflicting connection aborts `initialize`.
    Strict,
    /// A duplicate push-output (or pull-input) connection is dropped and
    /// reported but does not by itself abort initialization, matching the
    /// historical behavior described in §8 scenario 3.
    Lenient,
}

impl Default for ResolutionMode {
    fn default() -> Self {
        ResolutionMode::Lenient
    }
}

/// Router-owned configuration (`SPEC_FULL.md` §4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Notifier signal word-array capacity, in bits.
    pub notifier_capacity: NotifierCapacity,
    /// Strict vs lenient validation-failure handling.
    pub resolution_mode: ResolutionMode,
    /// Defensive cap on the number of `add_requirement` words accepted.
    pub max_requirements: Option<usize>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            notifier_capacity: NotifierCapacity::default(),
            resolution_mode: ResolutionMode::default(),
            max_requirements: None,
        }
    }
}

impl RouterConfig {
    /// Starts a fluent builder from defaults.
    #[must_use]
    pub fn builder() -> RouterConfigBuilder {
        RouterConfigBuilder::default()
    }

    /// Fail-fast preset for iterating on a graph under development:
    /// `resolution_mode: Strict`.
    #[must_use]
    pub fn development() -> Self {
        Self {
            resolution_mode: ResolutionMode::Strict,
            ..Self::default()
        }
    }

    /// Preset for already-deployed graphs that should not suddenly refuse
    /// to start: `resolution_mode: Lenient`.
    #[must_use]
    pub fn production() -> Self {
        Self {
            resolution_mode: ResolutionMode::Lenient,
            ..Self::default()
        }
    }
}

/// Fluent builder for [`RouterConfig`].
#[derive(Debug, Clone, Default)]
pub struct RouterConfigBuilder {
    config: RouterConfig,
}

impl RouterConfigBuilder {
    /// Overrides the notifier signal capacity.
    #[must_use]
    pub fn notifier_capacity(mut self, capacity: NotifierCapacity) -> Self {
        self.config.notifier_capacity = capacity;
        self
    }

    /// Overrides the resolution mode.
    #[must_use]
    pub fn resolution_mode(mut self, mode: ResolutionMode) -> Self {
        self.config.resolution_mode = mode;
        self
    }

    /// Caps the number of `add_requirement` words accepted.
    #[must_use]
    pub fn max_requirements(mut self, max: usize) -> Self {
        self.config.max_requirements = Some(max);
        self
    }

    /// Finishes the builder.
    #[must_use]
    pub fn build(self) -> RouterConfig {
        self.config
    }
}
