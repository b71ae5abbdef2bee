//! The fetch scheduler: owns the queue, the interface pool, the callbacks and
//! the run files, and drives them from a single-threaded curl multi loop.
//!
//! Lifecycle: [`Scheduler::open`] restores a pending recovery record if one
//! exists; [`Scheduler::run`] fetches until the queue is exhausted or a stop
//! is requested; [`Scheduler::shutdown`] (also run from `Drop`) writes a new
//! recovery record when work is left.

mod complete;
mod finish;
mod progress;
mod run;
mod sinks;

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::callbacks::{RedirectHandler, SuccessHandler};
use crate::classify::Classifier;
use crate::config::{FetchConfig, InterfaceDefaults};
use crate::control::StopSignal;
use crate::error::EngineError;
use crate::interface::{InterfacePool, InterfaceSpec};
use crate::layout::RunLayout;
use crate::queue::{AddOutcome, MemoryProbe, SysinfoProbe, TaskQueue};
use crate::recovery::{self, Snapshot, SNAPSHOT_VERSION};

pub use progress::RunStats;

use sinks::Sinks;

/// How a call to [`Scheduler::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every task was completed or abandoned; the run files were cleaned up.
    Completed,
    /// A stop was requested; a recovery record was written.
    Interrupted,
}

pub struct Scheduler {
    layout: RunLayout,
    max_retry: u32,
    interface_defaults: InterfaceDefaults,
    classifier: Classifier,
    queue: TaskQueue,
    pool: InterfacePool,
    success: Option<Box<dyn SuccessHandler>>,
    redirect: Option<Box<dyn RedirectHandler>>,
    sinks: Option<Sinks>,
    stop: StopSignal,
    progress: Option<tokio::sync::mpsc::Sender<RunStats>>,
    stats: RunStats,
    /// Time spent in earlier sessions of a resumed run.
    elapsed_before: Duration,
    started: Option<Instant>,
    resuming: bool,
    run_invoked: bool,
    done: bool,
    shut_down: bool,
}

impl Scheduler {
    /// Prepare a run rooted at `base` (`B.input`, `B.output`, ...). A pending
    /// recovery record is restored and deleted; until `run()` starts, URLs
    /// submitted with `add_url` are then ignored.
    pub fn open(base: impl AsRef<Path>, config: &FetchConfig) -> Result<Self, EngineError> {
        let layout = RunLayout::new(base.as_ref());
        let probe = SysinfoProbe::new(config.memory_limit_bytes);
        let mut queue = TaskQueue::new(&layout, config.max_memory_usage_ratio, Box::new(probe));
        let mut pool = InterfacePool::new();
        let mut elapsed_before = Duration::ZERO;

        let restored = recovery::load(&layout.recovery)?;
        let resuming = restored.is_some();
        if let Some(snap) = restored {
            tracing::info!(
                "resuming {} from {} ({} tasks, {:.1}s elapsed)",
                layout.base.display(),
                layout.recovery.display(),
                snap.tasks.len(),
                snap.elapsed_secs
            );
            let cursor = snap.cursor();
            queue.restore(snap.tasks, cursor);
            pool = InterfacePool::restore(snap.interfaces);
            elapsed_before = Duration::from_secs_f64(snap.elapsed_secs.max(0.0));
        }
        queue.open_overflow(resuming)?;
        if resuming {
            recovery::discard(&layout.recovery)?;
        }

        Ok(Self {
            layout,
            max_retry: config.max_retry.max(1),
            interface_defaults: config.interface_defaults.clone(),
            classifier: Classifier::from_codes(&config.codes),
            queue,
            pool,
            success: None,
            redirect: None,
            sinks: None,
            stop: StopSignal::new(&config.stop_file),
            progress: None,
            stats: RunStats::default(),
            elapsed_before,
            started: None,
            resuming,
            run_invoked: false,
            done: false,
            shut_down: false,
        })
    }

    pub fn layout(&self) -> &RunLayout {
        &self.layout
    }

    /// True when this scheduler continues an interrupted run.
    pub fn is_resuming(&self) -> bool {
        self.resuming
    }

    /// Queue a URL with optional request header lines.
    pub fn add_url(&mut self, url: &str, headers: Option<Vec<String>>) -> AddOutcome {
        if self.resuming && !self.run_invoked {
            tracing::debug!("resuming, ignoring {}", url);
            return AddOutcome::Ignored;
        }
        self.queue.add(url, headers)
    }

    /// Register an egress interface. Returns false if one with the same
    /// address and proxy already exists (including one restored on resume).
    pub fn add_interface(&mut self, spec: InterfaceSpec) -> bool {
        let (key, config) = spec.resolve(&self.interface_defaults);
        self.pool.add(key, config)
    }

    pub fn interfaces(&self) -> &InterfacePool {
        &self.pool
    }

    pub fn set_success_handler(&mut self, handler: impl SuccessHandler + 'static) {
        self.success = Some(Box::new(handler));
    }

    pub fn set_redirect_handler(&mut self, handler: impl RedirectHandler + 'static) {
        self.redirect = Some(Box::new(handler));
    }

    pub fn set_memory_probe(&mut self, probe: impl MemoryProbe + 'static) {
        self.queue.set_memory_probe(Box::new(probe));
    }

    /// Receive [`RunStats`] while the run is in progress.
    pub fn set_progress(&mut self, tx: tokio::sync::mpsc::Sender<RunStats>) {
        self.progress = Some(tx);
    }

    pub fn classifier_mut(&mut self) -> &mut Classifier {
        &mut self.classifier
    }

    /// Stop signal polled by the loop; clone its token for a signal handler.
    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Poll `token` instead of the scheduler's own abort flag.
    pub fn set_abort_token(&mut self, token: Arc<AtomicBool>) {
        self.stop = StopSignal::with_token(self.stop.marker(), token);
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Total fetch time of this run across sessions.
    pub fn elapsed(&self) -> Duration {
        self.elapsed_before + self.started.map(|t| t.elapsed()).unwrap_or_default()
    }

    /// Fetch until done or stopped. Can be called once per scheduler.
    pub fn run(&mut self) -> Result<RunOutcome, EngineError> {
        if self.run_invoked {
            return Err(EngineError::RunAlreadyInvoked);
        }
        self.run_invoked = true;
        self.started = Some(Instant::now());

        if let Err(e) = self.start() {
            if let Err(se) = self.shutdown() {
                tracing::error!("shutdown after failed start: {}", se);
            }
            return Err(e);
        }

        match run::event_loop(self) {
            Ok(run::LoopExit::Done) => {
                finish::finish(self)?;
                Ok(RunOutcome::Completed)
            }
            Ok(run::LoopExit::Stopped(source)) => {
                tracing::info!("stop requested ({:?}), saving state", source);
                self.stop.consume(source);
                self.shutdown()?;
                Ok(RunOutcome::Interrupted)
            }
            Err(e) => {
                tracing::error!("fetch loop failed: {}", e);
                if let Err(se) = self.shutdown() {
                    tracing::error!("shutdown after loop failure: {}", se);
                }
                Err(e)
            }
        }
    }

    fn start(&mut self) -> Result<(), EngineError> {
        self.queue.open_input()?;
        self.sinks = Some(Sinks::open(&self.layout, self.resuming)?);
        if self.pool.is_empty() {
            self.add_interface(InterfaceSpec::local());
        }
        Ok(())
    }

    /// Current state as a recovery record: in-flight tasks become ready
    /// again without counting the interrupted attempt.
    pub fn snapshot(&self) -> Snapshot {
        let cursor = self.queue.cursor();
        Snapshot {
            version: SNAPSHOT_VERSION,
            tasks: self.queue.records(),
            interfaces: self.pool.records(),
            elapsed_secs: self.elapsed().as_secs_f64(),
            input_offset: cursor.input_offset,
            swaps: cursor.swaps,
            input_backed_up: cursor.input_backed_up,
            done: self.done,
        }
    }

    /// Close the run files and, unless the run completed, write a recovery
    /// record. Idempotent.
    pub fn shutdown(&mut self) -> Result<(), EngineError> {
        if self.done || self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        self.success = None;
        self.redirect = None;
        if let Some(sinks) = self.sinks.take() {
            if let Err(e) = sinks.close() {
                tracing::error!("closing run files: {}", e);
            }
        }
        if let Err(e) = self.queue.close() {
            tracing::error!("closing queue files: {}", e);
        }
        if !self.run_invoked && !self.resuming && self.queue.is_empty() {
            // Nothing was consumed; a fresh start is equivalent.
            return Ok(());
        }
        recovery::save(&self.layout.recovery, &self.snapshot())
    }

    fn report(&mut self) {
        self.stats.in_flight = self.queue.in_flight();
        self.stats.queued = self.queue.len();
        self.stats.elapsed_secs = self.elapsed().as_secs_f64();
        self.stats.session_secs = self.started.map(|t| t.elapsed().as_secs_f64()).unwrap_or(0.0);
        if let Some(tx) = &self.progress {
            let _ = tx.try_send(self.stats.clone());
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::error!("saving state on drop: {}", e);
        }
    }
}
