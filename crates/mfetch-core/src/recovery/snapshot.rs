//! Versioned recovery record.

use serde::{Deserialize, Serialize};

use crate::interface::InterfaceRecord;
use crate::queue::{QueueCursor, TaskRecord};

/// Schema version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

/// Everything needed to continue an interrupted run. In-flight tasks are
/// stored as ready, with the interrupted attempt not counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    pub tasks: Vec<TaskRecord>,
    pub interfaces: Vec<InterfaceRecord>,
    /// Seconds spent fetching across all previous sessions of this run.
    pub elapsed_secs: f64,
    /// Byte offset of the next unread line in the primary input.
    pub input_offset: u64,
    /// Times the overflow file has been swapped in.
    pub swaps: u32,
    #[serde(default)]
    pub input_backed_up: bool,
    #[serde(default)]
    pub done: bool,
}

impl Snapshot {
    pub fn cursor(&self) -> QueueCursor {
        QueueCursor {
            input_offset: self.input_offset,
            swaps: self.swaps,
            input_backed_up: self.input_backed_up,
        }
    }

    /// Tasks that have failed at least once.
    pub fn retried(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.retry_state.attempts() > 0)
            .count()
    }
}
