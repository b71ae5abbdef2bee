//! Adaptive concurrency and spacing for one interface.
//!
//! Additive increase on success (one more slot, or a third of the delay);
//! back-off on the second consecutive failure: first shed a slot, and once
//! down to a single slot, introduce and double an inter-request delay.

use std::time::{Duration, Instant};

use crate::classify::Outcome;

/// Runtime throttle state.
#[derive(Debug, Clone, PartialEq)]
pub struct Throttle {
    pub(crate) active: usize,
    pub(crate) ceiling: usize,
    pub(crate) delay_secs: u64,
    pub(crate) last_dispatch: Option<Instant>,
    pub(crate) failed: bool,
}

impl Throttle {
    pub fn new(adaptive: bool, cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            active: 0,
            ceiling: if adaptive { 1 } else { cap },
            delay_secs: 0,
            last_dispatch: None,
            failed: false,
        }
    }

    /// Restore persisted values, clamped to the current cap and delay bound.
    pub fn restored(ceiling: usize, delay_secs: u64, failed: bool, cap: usize, max_delay_secs: u64) -> Self {
        Self {
            active: 0,
            ceiling: ceiling.clamp(1, cap.max(1)),
            delay_secs: delay_secs.min(max_delay_secs),
            last_dispatch: None,
            failed,
        }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn ready(&self, now: Instant) -> bool {
        if self.active >= self.ceiling {
            return false;
        }
        if self.delay_secs == 0 {
            return true;
        }
        match self.last_dispatch {
            Some(t) => now.saturating_duration_since(t) >= self.delay(),
            None => true,
        }
    }

    pub fn on_acquire(&mut self, adaptive: bool, now: Instant) {
        self.active += 1;
        // The delay gate only matters once down to a single slot.
        if adaptive && self.ceiling == 1 {
            self.last_dispatch = Some(now);
        }
    }

    /// Apply a completed request. `outcome = None` releases without feedback.
    pub fn on_release(&mut self, outcome: Option<Outcome>, adaptive: bool, cap: usize, max_delay_secs: u64) {
        self.active = self.active.saturating_sub(1);
        if !adaptive {
            return;
        }
        match outcome {
            Some(Outcome::Fail) => {
                if !self.failed {
                    self.failed = true;
                    return;
                }
                if self.ceiling > 1 {
                    self.ceiling -= 1;
                } else if self.delay_secs == 0 {
                    self.delay_secs = 1.min(max_delay_secs);
                } else {
                    self.delay_secs = self.delay_secs.saturating_mul(2).min(max_delay_secs);
                }
            }
            Some(Outcome::Success) => {
                self.failed = false;
                if self.delay_secs > 0 {
                    // round(delay / 3)
                    self.delay_secs = (self.delay_secs + 1) / 3;
                } else if self.ceiling < cap {
                    self.ceiling += 1;
                }
            }
            Some(Outcome::Redirect) | Some(Outcome::Discard) | None => {}
        }
    }
}
