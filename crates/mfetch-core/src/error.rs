//! Engine error type.
//!
//! Fetch failures are never errors: they are response codes that flow through
//! the classifier. Only resource problems and API misuse end up here.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A required stream (input, output, errors, overflow) could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading, writing or renaming one of the run files failed mid-run.
    #[error("i/o on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `run()` was called a second time on the same scheduler.
    #[error("run() can only be called once per scheduler")]
    RunAlreadyInvoked,

    /// A recovery record exists but cannot be read or parsed.
    #[error("unable to recover state from {}: {reason}", path.display())]
    Recovery { path: PathBuf, reason: String },

    /// The recovery record was written by a newer, unknown schema.
    #[error("unsupported recovery record version {0}")]
    UnsupportedSnapshot(u32),

    #[error("serialize recovery record: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("curl: {0}")]
    Curl(#[from] curl::Error),

    #[error("curl multi: {0}")]
    CurlMulti(#[from] curl::MultiError),
}

impl EngineError {
    pub(crate) fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Open {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }
}
