//! Hotswap (`SPEC_FULL.md` §3, §9): installing a new, already-`LIVE` router
//! while transferring per-element state from a predecessor router that is
//! still `LIVE`.
//!
//! The spec leaves the transferred-state wire format undefined (§9 open
//! question); this module only specifies the narrow contract the core
//! itself owns: which predecessor elements pair with which successor
//! elements, and that the predecessor is kept alive until transfer
//! completes.

use crate::domain_types::ElementIndex;
use std::sync::Arc;

/// The predecessor router a hotswap transfers state from.
///
/// Deliberately narrow: a hotswap source only needs to resolve a name to
/// an element, so it can hand that element to the new element's
/// `take_state`. Implemented by [`crate::Router`] itself.
pub trait HotswapSource: Send + Sync {
    /// Resolves `name` to an element index in the predecessor, if present.
    fn find_predecessor(&self, name: &str) -> Option<ElementIndex>;

    /// Runs `with` against the predecessor element at `index`, if it
    /// exists, giving the caller read access without exposing the
    /// predecessor's internal locking strategy.
    fn with_predecessor_element(&self, index: ElementIndex, with: &mut dyn FnMut(&dyn crate::element::Element));
}

/// A pending hotswap: the new router retains its predecessor by [`Arc`]
/// until every element that declared a [`crate::element::Element::hotswap_element`]
/// peer has pulled its state (`SPEC_FULL.md` §3 "Ownership").
pub struct HotswapHandle {
    predecessor: Arc<dyn HotswapSource>,
}

impl HotswapHandle {
    /// Wraps a predecessor router for the duration of a hotswap.
    #[must_use]
    pub fn new(predecessor: Arc<dyn HotswapSource>) -> Self {
        Self { predecessor }
    }

    /// The predecessor this handle keeps alive.
    #[must_use]
    pub fn predecessor(&self) -> &Arc<dyn HotswapSource> {
        &self.predecessor
    }
}

impl std::fmt::Debug for HotswapHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotswapHandle").finish_non_exhaustive()
    }
}
