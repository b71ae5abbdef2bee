//! Run counters reported to the embedding program.
//!
//! The scheduler sends a copy over an optional bounded channel with
//! `try_send`: a slow consumer misses updates, it never stalls the loop.

/// Send a snapshot after this many completions.
pub(super) const REPORT_EVERY: u64 = 8;

/// Counters for the current session of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    /// Requests handed to the transfer engine.
    pub dispatched: u64,
    pub succeeded: u64,
    /// Failed attempts that were queued again.
    pub retried: u64,
    /// URLs written to the error file.
    pub abandoned: u64,
    pub redirected: u64,
    pub discarded: u64,
    /// Requests outstanding when the snapshot was taken.
    pub in_flight: usize,
    /// Tasks held in memory (ready and in flight).
    pub queued: usize,
    /// Seconds since the run started, including previous sessions.
    pub elapsed_secs: f64,
    /// Seconds spent in this session only.
    pub session_secs: f64,
}

impl RunStats {
    /// Transfers that came back, whatever the outcome.
    pub fn completed(&self) -> u64 {
        self.succeeded + self.retried + self.abandoned + self.redirected + self.discarded
    }

    /// Completions per second in this session (0 before any time has passed).
    pub fn rate(&self) -> f64 {
        if self.session_secs <= 0.0 {
            return 0.0;
        }
        self.completed() as f64 / self.session_secs
    }
}
