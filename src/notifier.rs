//! Notifier Signals (`SPEC_FULL.md` §4.8): a fixed-capacity array of atomic
//! 32-bit words exposing one-bit activity flags to schedulers, so they can
//! skip polling subgraphs with nothing to do.

use crate::config::NotifierCapacity;
use crate::domain_types::NotifierSignalId;
use crate::error::RouterError;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::OnceLock;

const BITS_PER_WORD: usize = 32;

/// The lazily-allocated notifier word array (`SPEC_FULL.md` §4.8, §5).
pub struct NotifierSignals {
    capacity_bits: usize,
    words: OnceLock<Vec<AtomicU32>>,
    next_bit: AtomicUsize,
}

impl std::fmt::Debug for NotifierSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierSignals")
            .field("capacity_bits", &self.capacity_bits)
            .field("allocated", &self.next_bit.load(Ordering::Relaxed))
            .finish()
    }
}

impl NotifierSignals {
    /// Builds an unallocated signal array with the given capacity.
    #[must_use]
    pub fn new(capacity: NotifierCapacity) -> Self {
        Self {
            capacity_bits: capacity.into(),
            words: OnceLock::new(),
            next_bit: AtomicUsize::new(0),
        }
    }

    fn words(&self) -> &Vec<AtomicU32> {
        self.words.get_or_init(|| {
            let word_count = self.capacity_bits.div_ceil(BITS_PER_WORD);
            (0..word_count).map(|_| AtomicU32::new(0)).collect()
        })
    }

    /// Allocates the next free bit, initializing it active (`=1`).
    ///
    /// # Errors
    /// Returns [`RouterError::NotifierCapacityExhausted`] once every bit in
    /// the configured capacity has been handed out.
    pub fn new_notifier_signal(&self) -> Result<NotifierSignalId, RouterError> {
        let bit = self.next_bit.fetch_add(1, Ordering::SeqCst);
        if bit >= self.capacity_bits {
            self.next_bit.fetch_sub(1, Ordering::SeqCst);
            return Err(RouterError::NotifierCapacityExhausted {
                capacity: self.capacity_bits,
            });
        }
        let id = NotifierSignalId::new(bit);
        self.set(id);
        Ok(id)
    }

    fn locate(&self, id: NotifierSignalId) -> (usize, u32) {
        let bit = id.bit_index();
        (bit / BITS_PER_WORD, 1u32 << (bit % BITS_PER_WORD))
    }

    /// Sets the signal active.
    pub fn set(&self, id: NotifierSignalId) {
        let (word, mask) = self.locate(id);
        self.words()[word].fetch_or(mask, Ordering::SeqCst);
    }

    /// Clears the signal.
    pub fn clear(&self, id: NotifierSignalId) {
        let (word, mask) = self.locate(id);
        self.words()[word].fetch_and(!mask, Ordering::SeqCst);
    }

    /// Reads whether the signal is currently active.
    #[must_use]
    pub fn is_active(&self, id: NotifierSignalId) -> bool {
        let (word, mask) = self.locate(id);
        self.words()[word].load(Ordering::SeqCst) & mask != 0
    }

    /// Total configured capacity, in bits.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity_bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_active_and_toggles() {
        let signals = NotifierSignals::new(NotifierCapacity::default());
        let id = signals.new_notifier_signal().unwrap();
        assert!(signals.is_active(id));
        signals.clear(id);
        assert!(!signals.is_active(id));
        signals.set(id);
        assert!(signals.is_active(id));
    }

    #[test]
    fn exhausts_capacity() {
        let capacity = NotifierCapacity::try_new(1024).unwrap();
        let signals = NotifierSignals::new(capacity);
        for _ in 0..1024 {
            signals.new_notifier_signal().unwrap();
        }
        assert!(matches!(
            signals.new_notifier_signal(),
            Err(RouterError::NotifierCapacityExhausted { capacity: 1024 })
        ));
    }
}
