//! Memory pressure measurement for spillover decisions.

use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// How long a measured ratio is reused before `/proc` is read again.
const REFRESH_EVERY: Duration = Duration::from_millis(250);

/// Reports how much of its memory budget the process is using.
pub trait MemoryProbe {
    /// Current usage as a fraction of the limit (1.0 = at the limit).
    fn usage_ratio(&mut self) -> f64;
}

/// Resident memory of this process against a byte limit, via `sysinfo`.
/// The measurement is cached for a short interval.
pub struct SysinfoProbe {
    system: System,
    pid: Option<Pid>,
    limit_bytes: u64,
    refresh_every: Duration,
    last: Option<(Instant, f64)>,
}

impl SysinfoProbe {
    /// `limit_bytes = None` uses total system memory as the limit.
    pub fn new(limit_bytes: Option<u64>) -> Self {
        let mut system = System::new();
        let limit_bytes = match limit_bytes {
            Some(l) => l,
            None => {
                system.refresh_memory();
                system.total_memory()
            }
        };
        let pid = sysinfo::get_current_pid().ok();
        if pid.is_none() {
            tracing::warn!("cannot determine own pid; spillover disabled");
        }
        Self {
            system,
            pid,
            limit_bytes: limit_bytes.max(1),
            refresh_every: REFRESH_EVERY,
            last: None,
        }
    }

    pub fn refresh_every(mut self, interval: Duration) -> Self {
        self.refresh_every = interval;
        self
    }

    fn measure(&mut self, pid: Pid) -> f64 {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        let used = self.system.process(pid).map(|p| p.memory()).unwrap_or(0);
        used as f64 / self.limit_bytes as f64
    }
}

impl MemoryProbe for SysinfoProbe {
    fn usage_ratio(&mut self) -> f64 {
        let Some(pid) = self.pid else {
            return 0.0;
        };
        let now = Instant::now();
        if let Some((at, ratio)) = self.last {
            if now.duration_since(at) < self.refresh_every {
                return ratio;
            }
        }
        let ratio = self.measure(pid);
        self.last = Some((now, ratio));
        ratio
    }
}

/// Constant ratio; lets callers force or suppress spillover.
#[derive(Debug, Clone, Copy)]
pub struct FixedRatio(pub f64);

impl MemoryProbe for FixedRatio {
    fn usage_ratio(&mut self) -> f64 {
        self.0
    }
}
