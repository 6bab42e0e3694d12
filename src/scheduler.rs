//! The scheduler collaborator contract (`SPEC_FULL.md` §6).
//!
//! The scheduler itself — worker threads driving element push/pull methods —
//! is out of scope for this core; only the narrow contract the router holds
//! with it is specified here. `activate` hands the router to a `Scheduler`
//! implementation and the router later calls `wake_one` whenever the
//! runcount crosses to a non-positive value.

use crate::Router;
use std::sync::Arc;
use thiserror::Error;

/// Errors the scheduler contract itself can raise.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler declined to prepare or run the router.
    #[error("scheduler rejected router: {reason}")]
    Rejected {
        /// Why the scheduler declined.
        reason: String,
    },
}

/// The external collaborator that runs a live router's elements.
///
/// Implementations own the worker threads; the router core never blocks and
/// never polls. `wake_one` must be safe to call from any thread, including
/// from within `adjust_runcount`'s compare-and-swap loop.
pub trait Scheduler: Send + Sync {
    /// Called once before `run_router`, while the router is `LIVE` but not
    /// yet handed off, so the scheduler can reserve worker slots.
    fn prepare_router(&self, router: &Router) -> Result<(), SchedulerError>;

    /// Starts running the router's elements. `foreground` mirrors the
    /// `activate(foreground, ...)` argument: a foreground caller expects to
    /// drive at least one thread of execution itself.
    fn run_router(&self, router: Arc<Router>, foreground: bool) -> Result<(), SchedulerError>;

    /// Requests that all worker threads assigned to `router` stop.
    fn kill_router(&self, router: &Router);

    /// Wakes at least one worker thread, even if all are currently idle.
    /// Called whenever `adjust_runcount`/`set_runcount` drives the runcount
    /// to a value `<= 0`.
    fn wake_one(&self);
}
