//! Runcount and Stop (`SPEC_FULL.md` §4.7): a saturating, lock-free signed
//! counter whose non-positive value tells schedulers to stop.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

/// Sentinel floor: the runcount never drops below this once adjusted
/// downward past zero (`SPEC_FULL.md` §4.7).
pub const STOP_RUNCOUNT: i32 = i32::MIN + 1;

/// The router's saturating runcount plus the stopper flag it drives.
#[derive(Debug, Default)]
pub struct Runcount {
    value: AtomicI32,
    stopped: AtomicBool,
}

impl Runcount {
    /// A fresh runcount, not yet live (value `0`, not stopped).
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: AtomicI32::new(0),
            stopped: AtomicBool::new(false),
        }
    }

    /// Reads the current value.
    #[must_use]
    pub fn get(&self) -> i32 {
        self.value.load(Ordering::SeqCst)
    }

    /// Whether the stopper has latched (runcount crossed to `<= 0`).
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Adds `delta`, saturating at [`i32::MAX`] on top and [`STOP_RUNCOUNT`]
    /// on the bottom, via compare-and-swap. Returns the new value, and
    /// whether this call is the one that crossed into `<= 0` (so the
    /// caller knows whether it must wake a scheduler thread).
    pub fn adjust(&self, delta: i32) -> (i32, bool) {
        let mut current = self.value.load(Ordering::SeqCst);
        loop {
            let next = current
                .saturating_add(delta)
                .clamp(STOP_RUNCOUNT, i32::MAX);
            match self
                .value
                .compare_exchange_weak(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => {
                    let crossed = next <= 0 && current > 0;
                    if next <= 0 {
                        self.stopped.store(true, Ordering::SeqCst);
                    }
                    return (next, crossed);
                }
                Err(observed) => current = observed,
            }
        }
    }

    /// Sets the runcount directly, same saturation and stopper rules as
    /// [`Runcount::adjust`].
    pub fn set(&self, value: i32) -> (i32, bool) {
        let clamped = value.clamp(STOP_RUNCOUNT, i32::MAX);
        let previous = self.value.swap(clamped, Ordering::SeqCst);
        let crossed = clamped <= 0 && previous > 0;
        if clamped <= 0 {
            self.stopped.store(true, Ordering::SeqCst);
        }
        (clamped, crossed)
    }

    /// Resets to `1`, the value a just-`LIVE` router starts with
    /// (`SPEC_FULL.md` §4.1 step 10). Clears the stopper.
    pub fn reset_live(&self) {
        self.value.store(1, Ordering::SeqCst);
        self.stopped.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn saturates_and_sets_stopper() {
        let runcount = Runcount::new();
        runcount.set(5);
        let (value, crossed) = runcount.adjust(-10);
        assert_eq!(value, STOP_RUNCOUNT);
        assert!(crossed);
        assert!(runcount.is_stopped());
    }

    #[test]
    fn stays_positive_without_crossing() {
        let runcount = Runcount::new();
        runcount.set(5);
        let (value, crossed) = runcount.adjust(-2);
        assert_eq!(value, 3);
        assert!(!crossed);
        assert!(!runcount.is_stopped());
    }

    #[test]
    fn saturates_on_top() {
        let runcount = Runcount::new();
        runcount.set(i32::MAX - 1);
        let (value, _) = runcount.adjust(10);
        assert_eq!(value, i32::MAX);
    }

    proptest! {
        // `SPEC_FULL.md` §8 property 5: `adjust_runcount` is saturating and
        // the stopper is set iff the resulting value is `<= 0`.
        #[test]
        fn adjust_is_saturating_and_stopper_tracks_sign(start in -1000i32..1000, deltas in prop::collection::vec(-1000i32..1000, 0..20)) {
            let runcount = Runcount::new();
            runcount.set(start);
            let mut last = start.clamp(STOP_RUNCOUNT, i32::MAX);
            for delta in deltas {
                let (value, _) = runcount.adjust(delta);
                prop_assert!((STOP_RUNCOUNT..=i32::MAX).contains(&value));
                last = value;
            }
            prop_assert_eq!(runcount.is_stopped(), last <= 0);
        }
    }
}
