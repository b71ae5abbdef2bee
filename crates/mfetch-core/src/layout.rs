//! On-disk layout of one fetch run.
//!
//! Every file is derived from a stable base path `B` by appending a suffix:
//! `B.input`, `B.output`, `B.errors`, `B.todo`, `B.recover.json` and, once the
//! overflow file has been swapped in, `B.input.orig`.

use std::path::{Path, PathBuf};

pub const INPUT_SUFFIX: &str = ".input";
pub const OUTPUT_SUFFIX: &str = ".output";
pub const ERRORS_SUFFIX: &str = ".errors";
pub const OVERFLOW_SUFFIX: &str = ".todo";
pub const RECOVERY_SUFFIX: &str = ".recover.json";
pub const BACKUP_SUFFIX: &str = ".orig";

/// Appends `suffix` to the full path (e.g. `jobs` + `.input` -> `jobs.input`).
pub fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut o = base.as_os_str().to_owned();
    o.push(suffix);
    PathBuf::from(o)
}

/// Paths of every file a run reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    pub base: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    pub errors: PathBuf,
    pub overflow: PathBuf,
    pub recovery: PathBuf,
    pub input_backup: PathBuf,
}

impl RunLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        let input = with_suffix(&base, INPUT_SUFFIX);
        let input_backup = with_suffix(&input, BACKUP_SUFFIX);
        Self {
            input,
            output: with_suffix(&base, OUTPUT_SUFFIX),
            errors: with_suffix(&base, ERRORS_SUFFIX),
            overflow: with_suffix(&base, OVERFLOW_SUFFIX),
            recovery: with_suffix(&base, RECOVERY_SUFFIX),
            input_backup,
            base,
        }
    }
}

/// Removes `path` if it exists and is empty. Returns true when a file was removed.
pub(crate) fn remove_if_empty(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(m) if m.is_file() && m.len() == 0 => std::fs::remove_file(path).is_ok(),
        _ => false,
    }
}
