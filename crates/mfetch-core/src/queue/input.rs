//! Primary input stream with a byte offset for resume.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::EngineError;

use super::line::{parse_line, QueueLine};

pub(crate) struct InputReader {
    path: PathBuf,
    reader: BufReader<File>,
    offset: u64,
}

impl InputReader {
    /// Open `path` positioned at `offset`. A missing file is not an error
    /// (Ok(None)); an existing file that cannot be opened is.
    pub(crate) fn open(path: &Path, offset: u64) -> Result<Option<Self>, EngineError> {
        let mut file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(EngineError::open(path, e)),
        };
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))
                .map_err(|e| EngineError::open(path, e))?;
        }
        Ok(Some(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            offset,
        }))
    }

    /// Byte offset of the next unread line.
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    /// Next non-blank line, or None at end of file. Lines that are not
    /// valid UTF-8 are skipped with a warning.
    pub(crate) fn next_line(&mut self) -> Result<Option<QueueLine>, EngineError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = self
                .reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| EngineError::io(&self.path, e))?;
            if n == 0 {
                return Ok(None);
            }
            let at = self.offset;
            self.offset += n as u64;
            let Ok(text) = std::str::from_utf8(&buf) else {
                tracing::warn!(
                    "skipping non-UTF-8 line at byte {} of {}: {}",
                    at,
                    self.path.display(),
                    String::from_utf8_lossy(&buf).trim_end()
                );
                continue;
            };
            if let Some(line) = parse_line(text) {
                return Ok(Some(line));
            }
        }
    }
}
