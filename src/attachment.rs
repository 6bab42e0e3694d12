//! Attachment Store (`SPEC_FULL.md` §2, §3): named opaque values attached
//! to a router by its elements during `configure`/`initialize`, read back
//! by any collaborator that knows the name and expected type.

use dashmap::DashMap;
use std::any::Any;

/// A read-mostly, single-writer-by-convention map of name to opaque value
/// (`SPEC_FULL.md` §5 "Attachments"), backed by the same sharded concurrent
/// map the rest of this codebase reaches for whenever a shared collection
/// needs lock-free reads without a single exterior `RwLock`.
#[derive(Default)]
pub struct AttachmentStore {
    values: DashMap<String, Box<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for AttachmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.values.iter().map(|entry| entry.key().clone()).collect();
        f.debug_struct("AttachmentStore").field("names", &names).finish()
    }
}

impl AttachmentStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the value attached under `name`.
    pub fn insert<T: Any + Send + Sync>(&self, name: impl Into<String>, value: T) {
        self.values.insert(name.into(), Box::new(value));
    }

    /// Removes and returns the value attached under `name`, if present and
    /// of the expected type.
    pub fn remove<T: Any + Send + Sync + Clone>(&self, name: &str) -> Option<T> {
        self.values.remove(name).and_then(|(_, value)| value.downcast_ref::<T>().cloned())
    }

    /// Reads a clone of the value attached under `name`, if present and of
    /// the expected type `T`.
    pub fn get<T: Any + Send + Sync + Clone>(&self, name: &str) -> Option<T> {
        self.values.get(name).and_then(|value| value.downcast_ref::<T>().cloned())
    }

    /// Whether any value is attached under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_typed_values() {
        let store = AttachmentStore::new();
        store.insert("count", 42_i64);
        assert_eq!(store.get::<i64>("count"), Some(42));
        assert!(store.get::<String>("count").is_none());
        assert!(store.contains("count"));
        assert_eq!(store.remove::<i64>("count"), Some(42));
        assert!(!store.contains("count"));
    }
}
