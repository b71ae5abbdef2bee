//! Append-only overflow file that absorbs new URLs under memory pressure.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::EngineError;

pub(crate) struct OverflowFile {
    path: PathBuf,
    writer: BufWriter<File>,
    len: u64,
}

impl OverflowFile {
    /// Open for appending. `truncate` starts a fresh file; otherwise existing
    /// content (from an interrupted run) is kept.
    pub(crate) fn open(path: &Path, truncate: bool) -> Result<Self, EngineError> {
        let mut opts = OpenOptions::new();
        opts.create(true);
        if truncate {
            opts.write(true).truncate(true);
        } else {
            opts.append(true);
        }
        let file = opts.open(path).map_err(|e| EngineError::open(path, e))?;
        let len = file
            .metadata()
            .map_err(|e| EngineError::open(path, e))?
            .len();
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            len,
        })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn append(&mut self, line: &str) -> std::io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.len += line.len() as u64;
        Ok(())
    }

    /// Flush buffered lines and close the file.
    pub(crate) fn close(mut self) -> Result<(), EngineError> {
        self.writer
            .flush()
            .map_err(|e| EngineError::io(&self.path, e))
    }
}
