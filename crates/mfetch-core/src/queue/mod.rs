//! Task queue: in-memory tasks with their retry state, fed by the primary
//! input file and an overflow file that bounds memory use.
//!
//! When memory is under pressure, new URLs go to the overflow file instead of
//! memory. Once the in-memory set and the primary input are both exhausted,
//! the overflow file is swapped in as the new primary input:
//!
//! 1. close both files;
//! 2. on the first swap, rename the original input to `B.input.orig`; on
//!    later swaps delete the exhausted input;
//! 3. rename `B.todo` to `B.input`, open a fresh `B.todo`, read `B.input`
//!    from the start.
//!
//! At natural completion [`TaskQueue::finish`] deletes the last promoted
//! input and restores the original one.

mod input;
mod line;
mod memory;
mod overflow;
mod retry_state;

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use crate::error::EngineError;
use crate::layout::{remove_if_empty, RunLayout};

use input::InputReader;
use overflow::OverflowFile;

pub use line::{format_line, parse_line, QueueLine};
pub use memory::{FixedRatio, MemoryProbe, SysinfoProbe};
pub use retry_state::RetryState;

/// Result of submitting a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Inserted into memory as a fresh ready task.
    Queued,
    /// Written to the overflow file (memory pressure).
    Spilled,
    /// Already in the in-memory queue.
    Duplicate,
    /// Swallowed while a recovered queue is waiting to be resumed.
    Ignored,
}

impl AddOutcome {
    pub fn is_accepted(self) -> bool {
        !matches!(self, AddOutcome::Duplicate)
    }
}

/// One queued URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub headers: Option<Vec<String>>,
    pub state: RetryState,
}

/// A ready task handed out for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyTask {
    pub url: String,
    pub headers: Option<Vec<String>>,
    pub state: RetryState,
}

/// What happened to a task whose attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureVerdict {
    /// Back in the ready set with this many failed attempts.
    Retry { attempts: u32 },
    /// Removed from the queue after this many failed attempts.
    Abandon { attempts: u32 },
}

/// Task as stored in the recovery record.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TaskRecord {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
    pub retry_state: RetryState,
}

/// Queue position persisted for resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueCursor {
    pub input_offset: u64,
    pub swaps: u32,
    pub input_backed_up: bool,
}

pub struct TaskQueue {
    input_path: PathBuf,
    overflow_path: PathBuf,
    backup_path: PathBuf,
    tasks: HashMap<String, Task>,
    ready: VecDeque<String>,
    input: Option<InputReader>,
    overflow: Option<OverflowFile>,
    probe: Box<dyn MemoryProbe>,
    max_memory_ratio: f64,
    cursor: QueueCursor,
}

impl TaskQueue {
    pub fn new(layout: &RunLayout, max_memory_ratio: f64, probe: Box<dyn MemoryProbe>) -> Self {
        Self {
            input_path: layout.input.clone(),
            overflow_path: layout.overflow.clone(),
            backup_path: layout.input_backup.clone(),
            tasks: HashMap::new(),
            ready: VecDeque::new(),
            input: None,
            overflow: None,
            probe,
            max_memory_ratio,
            cursor: QueueCursor::default(),
        }
    }

    pub fn set_memory_probe(&mut self, probe: Box<dyn MemoryProbe>) {
        self.probe = probe;
    }

    /// Open the overflow file. `resuming` keeps lines spilled before an interruption.
    pub fn open_overflow(&mut self, resuming: bool) -> Result<(), EngineError> {
        self.overflow = Some(OverflowFile::open(&self.overflow_path, !resuming)?);
        Ok(())
    }

    /// Open the primary input at the persisted offset (no-op if it does not exist).
    pub fn open_input(&mut self) -> Result<(), EngineError> {
        self.input = InputReader::open(&self.input_path, self.cursor.input_offset)?;
        Ok(())
    }

    fn under_pressure(&mut self) -> bool {
        self.overflow.is_some() && self.probe.usage_ratio() > self.max_memory_ratio
    }

    /// Submit a URL. Duplicates of in-memory keys are rejected.
    pub fn add(&mut self, url: &str, headers: Option<Vec<String>>) -> AddOutcome {
        if self.tasks.contains_key(url) {
            return AddOutcome::Duplicate;
        }
        let headers = headers.filter(|h| !h.is_empty());
        if self.under_pressure() {
            if let Some(overflow) = self.overflow.as_mut() {
                match overflow.append(&format_line(url, headers.as_deref())) {
                    Ok(()) => return AddOutcome::Spilled,
                    Err(e) => tracing::warn!("overflow write failed, keeping {} in memory: {}", url, e),
                }
            }
        }
        self.insert(url.to_string(), headers, RetryState::FRESH);
        AddOutcome::Queued
    }

    fn insert(&mut self, url: String, headers: Option<Vec<String>>, state: RetryState) {
        if state.is_ready() {
            self.ready.push_back(url.clone());
        }
        self.tasks.insert(url, Task { headers, state });
    }

    /// Drop a task and its headers.
    pub fn remove(&mut self, url: &str) -> Option<Task> {
        self.tasks.remove(url)
    }

    pub fn get(&self, url: &str) -> Option<&Task> {
        self.tasks.get(url)
    }

    /// Tasks held in memory (ready and in flight).
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.values().filter(|t| t.state.is_in_flight()).count()
    }

    /// Next ready task: from memory, else from the input file, else after
    /// swapping in the overflow file. None when every source is exhausted.
    pub fn next_ready(&mut self) -> Result<Option<ReadyTask>, EngineError> {
        loop {
            if let Some(url) = self.ready.pop_front() {
                match self.tasks.get(&url) {
                    Some(t) if t.state.is_ready() => {
                        return Ok(Some(ReadyTask {
                            headers: t.headers.clone(),
                            state: t.state,
                            url,
                        }))
                    }
                    _ => continue,
                }
            }
            if !self.load_next()? {
                return Ok(None);
            }
        }
    }

    /// ready(a) -> in_flight(a + 1).
    pub fn mark_dispatched(&mut self, url: &str) -> Option<RetryState> {
        let task = self.tasks.get_mut(url)?;
        task.state = task.state.dispatched();
        Some(task.state)
    }

    /// Apply a failed attempt: re-queue, or remove once `max_retry` attempts failed.
    pub fn record_failure(&mut self, url: &str, max_retry: u32) -> Option<FailureVerdict> {
        let task = self.tasks.get_mut(url)?;
        let attempts = task.state.attempts();
        if attempts >= max_retry {
            self.tasks.remove(url);
            return Some(FailureVerdict::Abandon { attempts });
        }
        task.state = task.state.failed();
        self.ready.push_back(url.to_string());
        Some(FailureVerdict::Retry { attempts })
    }

    /// True when nothing is in memory and no more input can be loaded.
    pub fn is_finished(&mut self) -> Result<bool, EngineError> {
        if !self.tasks.is_empty() {
            return Ok(false);
        }
        Ok(!self.load_next()?)
    }

    /// Load one task from the input (swapping in the overflow when needed).
    fn load_next(&mut self) -> Result<bool, EngineError> {
        loop {
            if let Some(input) = self.input.as_mut() {
                while let Some(line) = input.next_line()? {
                    if self.tasks.contains_key(&line.url) {
                        tracing::debug!("skipping duplicate input line {}", line.url);
                        continue;
                    }
                    self.insert(line.url, line.headers, RetryState::FRESH);
                    return Ok(true);
                }
            }
            if self.overflow.as_ref().is_some_and(|o| !o.is_empty()) {
                self.swap()?;
                continue;
            }
            return Ok(false);
        }
    }

    fn swap(&mut self) -> Result<(), EngineError> {
        tracing::info!("swapping {} into {}", self.overflow_path.display(), self.input_path.display());
        if let Some(overflow) = self.overflow.take() {
            overflow.close()?;
        }
        self.input = None;
        if self.input_path.exists() {
            if self.cursor.swaps == 0 {
                std::fs::rename(&self.input_path, &self.backup_path)
                    .map_err(|e| EngineError::io(&self.input_path, e))?;
                self.cursor.input_backed_up = true;
            } else {
                std::fs::remove_file(&self.input_path)
                    .map_err(|e| EngineError::io(&self.input_path, e))?;
            }
        }
        std::fs::rename(&self.overflow_path, &self.input_path)
            .map_err(|e| EngineError::io(&self.overflow_path, e))?;
        self.cursor.swaps += 1;
        self.cursor.input_offset = 0;
        self.overflow = Some(OverflowFile::open(&self.overflow_path, true)?);
        self.input = InputReader::open(&self.input_path, 0)?;
        Ok(())
    }

    /// Current persisted position.
    pub fn cursor(&self) -> QueueCursor {
        let mut c = self.cursor;
        if let Some(input) = &self.input {
            c.input_offset = input.offset();
        }
        c
    }

    pub fn swaps(&self) -> u32 {
        self.cursor.swaps
    }

    /// Flush and close both files, remembering the input position.
    pub fn close(&mut self) -> Result<(), EngineError> {
        self.cursor = self.cursor();
        self.input = None;
        match self.overflow.take() {
            Some(o) => o.close(),
            None => Ok(()),
        }
    }

    /// Cleanup after natural completion: remove an empty overflow file, and
    /// if a swap happened delete the promoted input and restore the original.
    pub fn finish(&mut self) -> Result<(), EngineError> {
        self.close()?;
        remove_if_empty(&self.overflow_path);
        if self.cursor.swaps > 0 {
            if let Err(e) = std::fs::remove_file(&self.input_path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(EngineError::io(&self.input_path, e));
                }
            }
            if self.cursor.input_backed_up && self.backup_path.exists() {
                std::fs::rename(&self.backup_path, &self.input_path)
                    .map_err(|e| EngineError::io(&self.backup_path, e))?;
            }
        }
        Ok(())
    }

    /// Tasks for the recovery record: ready ones in dispatch order, then the
    /// in-flight ones (sorted by URL) turned back into ready states.
    pub fn records(&self) -> Vec<TaskRecord> {
        let mut out: Vec<TaskRecord> = Vec::with_capacity(self.tasks.len());
        let mut seen = std::collections::HashSet::with_capacity(self.tasks.len());
        for url in &self.ready {
            if let Some(t) = self.tasks.get(url) {
                if t.state.is_ready() && seen.insert(url.as_str()) {
                    out.push(TaskRecord {
                        url: url.clone(),
                        headers: t.headers.clone(),
                        retry_state: t.state,
                    });
                }
            }
        }
        let mut rest: Vec<(&String, &Task)> = self
            .tasks
            .iter()
            .filter(|(url, _)| !seen.contains(url.as_str()))
            .collect();
        rest.sort_by(|a, b| a.0.cmp(b.0));
        out.extend(rest.into_iter().map(|(url, t)| TaskRecord {
            url: url.clone(),
            headers: t.headers.clone(),
            retry_state: t.state.interrupted(),
        }));
        out
    }

    /// Replace the in-memory state with a recovered one.
    pub fn restore(&mut self, records: Vec<TaskRecord>, cursor: QueueCursor) {
        self.tasks.clear();
        self.ready.clear();
        for r in records {
            if self.tasks.contains_key(&r.url) {
                continue;
            }
            self.insert(r.url, r.headers, r.retry_state.interrupted());
        }
        self.cursor = cursor;
    }
}

#[cfg(test)]
mod tests;
