//! Domain value types used throughout the router core.
//!
//! Graph indices (`ElementIndex`, `PortNumber`, `GlobalPortId`, `HandlerId`) are
//! hand-rolled newtypes because several of them need `const` sentinel values
//! (the root-element handle, the "no handler" id) that a validated `nutype`
//! wrapper cannot offer. Values with real invariants to enforce (configure
//! phase ordering, notifier capacity) use `nutype` instead, the way the rest
//! of this codebase's validated configuration values do.

use nutype::nutype;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense, stable index of an element within a [`crate::Router`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementIndex(usize);

impl ElementIndex {
    /// Sentinel index for the router's global ("root element") handler table.
    pub const ROOT: ElementIndex = ElementIndex(usize::MAX);

    /// Wraps a raw index. Only the registry that owns the arena should call this.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The underlying dense array index.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// True for the sentinel handle used to address global/default handlers.
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.0 == usize::MAX
    }
}

impl fmt::Display for ElementIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A port number local to one element and one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortNumber(usize);

impl PortNumber {
    /// Wraps a raw port number.
    #[must_use]
    pub const fn new(port: usize) -> Self {
        Self(port)
    }

    /// The underlying port number.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A dense, flat index over all ports of one direction across every element.
///
/// See `Port Index` (`SPEC_FULL.md` §4.2): `global = e2g[element] + local_port`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GlobalPortId(usize);

impl GlobalPortId {
    /// Wraps a raw global port id.
    #[must_use]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// The underlying flat index.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for GlobalPortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Identifier of a handler pool slot (`SPEC_FULL.md` §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HandlerId(usize);

impl HandlerId {
    /// Wraps a raw slot index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The underlying slot index.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

/// Identifier of an allocated notifier signal bit (`SPEC_FULL.md` §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotifierSignalId(usize);

impl NotifierSignalId {
    pub(crate) const fn new(bit: usize) -> Self {
        Self(bit)
    }

    pub(crate) const fn bit_index(self) -> usize {
        self.0
    }
}

/// Direction of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// An input port (packets arrive).
    Input,
    /// An output port (packets leave).
    Output,
}

impl Direction {
    /// The other direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
        }
    }
}

/// Processing polarity of a port, resolved by the `ProcessingResolver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    /// The producer side drives data across the connection.
    Push,
    /// The consumer side drives data across the connection.
    Pull,
    /// Not yet resolved; must not survive on any port that carries traffic.
    Agnostic,
}

impl Polarity {
    /// Whether this polarity is a definite (non-agnostic) one.
    #[must_use]
    pub const fn is_definite(self) -> bool {
        !matches!(self, Polarity::Agnostic)
    }
}

/// How many ports of a direction an element is prepared to expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSpec {
    /// Exactly `n` ports, never resized.
    Fixed(usize),
    /// Between `min` and `max` ports (inclusive), sized by usage during
    /// the port-count notification pass.
    Range {
        /// Minimum port count.
        min: usize,
        /// Maximum port count, or unbounded.
        max: Option<usize>,
    },
}

impl PortSpec {
    /// Resolves a declared count against how many ports were actually used
    /// by connections, per `SPEC_FULL.md` §4.1 step 2.
    #[must_use]
    pub fn resolve(self, used: usize) -> usize {
        match self {
            PortSpec::Fixed(n) => n,
            PortSpec::Range { min, max } => {
                let wanted = used.max(min);
                match max {
                    Some(max) => wanted.min(max),
                    None => wanted,
                }
            }
        }
    }
}

/// Cleanup stage an element reached, passed back to its `cleanup` call so it
/// knows exactly how far bring-up got (`SPEC_FULL.md` §3, §4.1 step 11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CleanupStage {
    /// Never reached `configure`.
    NotConfigured = 0,
    /// `configure` ran and failed.
    ConfigureFailed = 1,
    /// `configure` succeeded.
    Configured = 2,
    /// `initialize` ran and failed.
    InitializeFailed = 3,
    /// `initialize` succeeded; the element is live.
    Initialized = 4,
}

impl CleanupStage {
    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => CleanupStage::ConfigureFailed,
            2 => CleanupStage::Configured,
            3 => CleanupStage::InitializeFailed,
            4 => CleanupStage::Initialized,
            _ => CleanupStage::NotConfigured,
        }
    }
}

/// Configure-phase priority: smaller values configure earlier. Ties break by
/// original insertion order (`SPEC_FULL.md` §4.1 step 7).
#[nutype(
    default = 0,
    derive(
        Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Display, From, Into,
        Serialize, Deserialize
    )
)]
pub struct ConfigurePhase(i32);

/// Notifier signal capacity in bits (`SPEC_FULL.md` §4.9). Rounded up to the
/// next multiple of 32 when the word array is allocated.
#[nutype(
    validate(greater_or_equal = 1024),
    derive(
        Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, AsRef, Into, Serialize, Deserialize
    )
)]
pub struct NotifierCapacity(usize);

impl Default for NotifierCapacity {
    fn default() -> Self {
        Self::try_new(1024).expect("1024 satisfies the >= 1024 invariant")
    }
}

/// Router-wide state machine (`SPEC_FULL.md` §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouterState {
    /// Elements, connections and requirements may be added.
    New,
    /// `initialize` is validating the graph.
    Preconfigure,
    /// `initialize` is running `configure`/`initialize` on elements.
    Preinitialize,
    /// The router initialized successfully and is serving its handler registry.
    Live,
    /// Initialization failed and was rolled back, or the router was killed.
    Dead,
}

/// Scheduler-facing running state, set by `activate` (`SPEC_FULL.md` §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunningState {
    /// Not yet handed to a scheduler.
    Preparing,
    /// Scheduler threads are running it without a foreground thread.
    Background,
    /// A foreground thread is driving it.
    Active,
    /// The runcount dropped to the stop threshold.
    Stopped,
}
