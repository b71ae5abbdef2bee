//! Output and error files of a run.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::EngineError;
use crate::layout::RunLayout;

struct Sink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl Sink {
    fn open(path: &Path, append: bool) -> Result<Self, EngineError> {
        let mut opts = OpenOptions::new();
        opts.create(true);
        if append {
            opts.append(true);
        } else {
            opts.write(true).truncate(true);
        }
        let file = opts.open(path).map_err(|e| EngineError::open(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    fn write_line(&mut self, line: &str) -> Result<(), EngineError> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|e| EngineError::io(&self.path, e))
    }

    fn close(mut self) -> Result<(), EngineError> {
        self.writer
            .flush()
            .map_err(|e| EngineError::io(&self.path, e))
    }
}

/// `B.output` (one JSON record per line) and `B.errors` (`URL STATUS` lines).
pub(super) struct Sinks {
    output: Sink,
    errors: Sink,
}

impl Sinks {
    /// Truncate for a fresh run, append when resuming.
    pub(super) fn open(layout: &RunLayout, append: bool) -> Result<Self, EngineError> {
        Ok(Self {
            output: Sink::open(&layout.output, append)?,
            errors: Sink::open(&layout.errors, append)?,
        })
    }

    pub(super) fn write_records(&mut self, records: &[Value]) -> Result<(), EngineError> {
        for r in records {
            let line = serde_json::to_string(r)?;
            self.output.write_line(&line)?;
        }
        Ok(())
    }

    pub(super) fn write_error(&mut self, url: &str, status: u32) -> Result<(), EngineError> {
        self.errors.write_line(&format!("{} {}", url, status))
    }

    pub(super) fn close(self) -> Result<(), EngineError> {
        let out = self.output.close();
        let err = self.errors.close();
        out.and(err)
    }
}
