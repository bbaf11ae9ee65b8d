//! Trailing-edge debouncing.
//!
//! A [`Debouncer`] coalesces a burst of triggers into a single firing once
//! the burst has settled for a configured wait. Typical use is window-resize
//! style handlers where only the final state matters.
//!
//! The debouncer is driven explicitly by the caller's clock: every call
//! takes an [`Instant`], so behavior is fully deterministic and testable
//! without sleeping.

use std::time::{Duration, Instant};

/// A trailing-edge debouncer with a configurable wait.
///
/// Each [`trigger_at`](Self::trigger_at) pushes the firing deadline out to
/// `now + wait`; [`poll`](Self::poll) reports `true` exactly once when the
/// deadline has passed.
#[derive(Debug, Clone)]
pub struct Debouncer {
    /// How long a burst must stay quiet before firing.
    wait: Duration,
    /// The pending firing deadline, if any trigger is outstanding.
    deadline: Option<Instant>,
}

impl Debouncer {
    /// Create a debouncer with the given wait.
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            deadline: None,
        }
    }

    /// The configured wait.
    #[inline]
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Record a trigger at `now`, pushing the deadline to `now + wait`.
    pub fn trigger_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.wait);
    }

    /// Whether a trigger is outstanding and has not yet fired.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Poll the debouncer at `now`.
    ///
    /// Returns `true` exactly once per settled burst: when an outstanding
    /// deadline has passed. The pending state is cleared on firing.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop any outstanding trigger without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
