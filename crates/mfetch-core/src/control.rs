//! Cooperative stop signal: a marker file plus an in-process abort token.
//!
//! The scheduler polls the signal once per loop iteration and after each
//! harvested completion. Either source interrupts the run; the marker file is
//! removed when honored so the next start is not stopped right away.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Which source raised the stop signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSource {
    /// The marker file exists.
    Marker,
    /// The abort token was set (e.g. Ctrl-C in the CLI).
    Token,
}

#[derive(Debug, Clone)]
pub struct StopSignal {
    marker: PathBuf,
    token: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new(marker: impl Into<PathBuf>) -> Self {
        Self {
            marker: marker.into(),
            token: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use an abort token owned by the caller (e.g. shared with a Ctrl-C handler).
    pub fn with_token(marker: impl Into<PathBuf>, token: Arc<AtomicBool>) -> Self {
        Self {
            marker: marker.into(),
            token,
        }
    }

    pub fn marker(&self) -> &Path {
        &self.marker
    }

    /// Abort token to hand to a signal handler or another thread.
    pub fn token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.token)
    }

    /// Request a stop from inside the process.
    pub fn request(&self) {
        self.token.store(true, Ordering::Relaxed);
    }

    /// Returns the source if a stop was requested.
    pub fn poll(&self) -> Option<StopSource> {
        if self.token.load(Ordering::Relaxed) {
            return Some(StopSource::Token);
        }
        if self.marker.exists() {
            return Some(StopSource::Marker);
        }
        None
    }

    /// Clears the request after it has been honored.
    pub(crate) fn consume(&self, source: StopSource) {
        match source {
            StopSource::Token => self.token.store(false, Ordering::Relaxed),
            StopSource::Marker => {
                if let Err(e) = std::fs::remove_file(&self.marker) {
                    tracing::warn!("could not remove stop marker {}: {}", self.marker.display(), e);
                }
            }
        }
    }
}

/// Create the stop marker for a run that is polling `marker`.
pub fn raise_marker(marker: &Path) -> std::io::Result<()> {
    std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(marker)
        .map(|_| ())
}
