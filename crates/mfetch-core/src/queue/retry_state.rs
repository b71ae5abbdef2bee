//! Signed retry-state encoding of a queued URL.
//!
//! `<= 0` means ready with `-state` prior failed attempts; `> 0` means in
//! flight, the value being the ordinal of the outstanding attempt. The raw
//! value is what the recovery record stores, so it must not change meaning.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetryState(i64);

impl RetryState {
    /// Never tried.
    pub const FRESH: RetryState = RetryState(0);

    pub fn from_raw(raw: i64) -> Self {
        RetryState(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }

    pub fn is_ready(self) -> bool {
        self.0 <= 0
    }

    pub fn is_in_flight(self) -> bool {
        self.0 > 0
    }

    /// Failed attempts so far (ready), or the ordinal of the outstanding
    /// attempt (in flight).
    pub fn attempts(self) -> u32 {
        self.0.unsigned_abs().min(u32::MAX as u64) as u32
    }

    /// ready(a) -> in_flight(a + 1).
    pub fn dispatched(self) -> Self {
        debug_assert!(self.is_ready(), "dispatching an in-flight task");
        RetryState(1 - self.0)
    }

    /// in_flight(n) -> ready(n): the failed attempt is counted.
    pub fn failed(self) -> Self {
        debug_assert!(self.is_in_flight(), "failing a task that is not in flight");
        RetryState(-self.0)
    }

    /// in_flight(n) -> ready(n - 1): the interrupted attempt is not counted.
    /// Ready states are returned unchanged.
    pub fn interrupted(self) -> Self {
        if self.is_in_flight() {
            RetryState(1 - self.0)
        } else {
            self
        }
    }
}
