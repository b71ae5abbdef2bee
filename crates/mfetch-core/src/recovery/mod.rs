//! Recovery record: read on open, written when a run stops before finishing.
//!
//! The record lives next to the other run files as `B.recover.json`. It is
//! deleted as soon as its content has been taken over by a scheduler, so a
//! record on disk always describes exactly one pending run.

mod snapshot;

use std::path::Path;

use crate::error::EngineError;

pub use snapshot::{Snapshot, SNAPSHOT_VERSION};

/// Read the record at `path`. Missing file is `Ok(None)`; a record that
/// cannot be read or parsed is an error and is left in place.
pub fn load(path: &Path) -> Result<Option<Snapshot>, EngineError> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(EngineError::Recovery {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };
    let snapshot: Snapshot =
        serde_json::from_slice(&bytes).map_err(|e| EngineError::Recovery {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    if snapshot.version > SNAPSHOT_VERSION {
        return Err(EngineError::UnsupportedSnapshot(snapshot.version));
    }
    Ok(Some(snapshot))
}

/// Delete a record whose content has been restored.
pub fn discard(path: &Path) -> Result<(), EngineError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(EngineError::io(path, e)),
    }
}

/// Write the record. If the file cannot be written the JSON goes to stdout
/// so the state can still be saved by hand.
pub fn save(path: &Path, snapshot: &Snapshot) -> Result<(), EngineError> {
    let json = serde_json::to_string_pretty(snapshot)?;
    let written = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => std::fs::create_dir_all(parent).and_then(|_| std::fs::write(path, &json)),
        None => std::fs::write(path, &json),
    };
    if let Err(e) = written {
        tracing::error!("could not write {}: {}", path.display(), e);
        println!("{}", json);
        return Err(EngineError::io(path, e));
    }
    tracing::info!(
        "recovery record written to {} ({} tasks)",
        path.display(),
        snapshot.tasks.len()
    );
    Ok(())
}
