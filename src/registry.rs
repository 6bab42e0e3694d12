//! Element Registry (`SPEC_FULL.md` §2, §3): the dense, indexed arena of
//! element instances a [`crate::Router`] owns, plus the bookkeeping
//! (names, landmarks, raw configuration, cleanup stage) the lifecycle
//! engine and handler registry need alongside each instance.

use crate::domain_types::{CleanupStage, ConfigurePhase, ElementIndex};
use crate::element::Element;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::RwLock;

/// One element plus everything the router tracks about it.
///
/// The element itself lives behind a [`RwLock`] rather than a bare `Box` so
/// that handler reads (`&dyn Element`) and handler writes (`&mut dyn
/// Element`) can be serialized at runtime instead of requiring the caller
/// to hold `&mut Router` — the single-writer discipline `SPEC_FULL.md` §5
/// asks for, enforced the same way the teacher's own shared maps use
/// `dashmap`/`RwLock` entries instead of a single exterior lock.
pub struct ElementEntry {
    element: RwLock<Box<dyn Element>>,
    name: String,
    landmark: String,
    configuration: String,
    stage: AtomicU8,
}

impl ElementEntry {
    /// This element's registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The source landmark (file:line-equivalent) it was declared at.
    #[must_use]
    pub fn landmark(&self) -> &str {
        &self.landmark
    }

    /// The raw, untokenized configuration string.
    #[must_use]
    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    /// The furthest lifecycle stage this element has reached.
    #[must_use]
    pub fn stage(&self) -> CleanupStage {
        CleanupStage::from_u8(self.stage.load(Ordering::SeqCst))
    }

    pub(crate) fn set_stage(&self, stage: CleanupStage) {
        self.stage.store(stage as u8, Ordering::SeqCst);
    }

    /// Takes a read lock on the underlying element.
    ///
    /// # Panics
    /// Panics if the lock is poisoned by a prior panicking writer.
    pub fn read(&self) -> std::sync::RwLockReadGuard<'_, Box<dyn Element>> {
        self.element.read().expect("element lock poisoned")
    }

    /// Takes a write lock on the underlying element.
    ///
    /// # Panics
    /// Panics if the lock is poisoned by a prior panicking writer.
    pub fn write(&self) -> std::sync::RwLockWriteGuard<'_, Box<dyn Element>> {
        self.element.write().expect("element lock poisoned")
    }
}

/// The dense, stable-indexed arena of elements a router owns
/// (`SPEC_FULL.md` §3 "Invariants" 1).
#[derive(Default)]
pub struct ElementRegistry {
    entries: Vec<ElementEntry>,
}

impl ElementRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new element, returning its dense, stable index.
    pub fn add(&mut self, element: Box<dyn Element>, name: impl Into<String>, configuration: impl Into<String>, landmark: impl Into<String>) -> ElementIndex {
        let index = ElementIndex::new(self.entries.len());
        self.entries.push(ElementEntry {
            element: RwLock::new(element),
            name: name.into(),
            landmark: landmark.into(),
            configuration: configuration.into(),
            stage: AtomicU8::new(CleanupStage::NotConfigured as u8),
        });
        index
    }

    /// Number of elements in the registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `index` refers to a live element (`SPEC_FULL.md` §4.1 step 1).
    #[must_use]
    pub fn contains(&self, index: ElementIndex) -> bool {
        index.as_usize() < self.entries.len()
    }

    /// Fetches the entry for `index`.
    #[must_use]
    pub fn entry(&self, index: ElementIndex) -> Option<&ElementEntry> {
        self.entries.get(index.as_usize())
    }

    /// Every `(index, name)` pair, for [`crate::name_resolution::find`].
    #[must_use]
    pub fn names(&self) -> Vec<(ElementIndex, String)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (ElementIndex::new(i), entry.name.clone()))
            .collect()
    }

    /// Element indices stable-sorted by `configure_phase` (ties keep
    /// original insertion order), the order `configure`/`initialize` run in
    /// and `cleanup` runs in reverse of (`SPEC_FULL.md` §4.1 step 7, §5).
    #[must_use]
    pub fn configure_order(&self) -> Vec<ElementIndex> {
        let mut indices: Vec<ElementIndex> = (0..self.entries.len()).map(ElementIndex::new).collect();
        let phases: Vec<ConfigurePhase> = indices
            .iter()
            .map(|&i| self.entries[i.as_usize()].read().configure_phase())
            .collect();
        indices.sort_by_key(|&i| phases[i.as_usize()]);
        indices
    }

    /// Iterates over every entry alongside its index.
    pub fn iter(&self) -> impl Iterator<Item = (ElementIndex, &ElementEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (ElementIndex::new(i), entry))
    }
}
