//! `mfetch stop` – create the stop marker polled by running fetches.

use anyhow::{Context, Result};
use mfetch_core::config::FetchConfig;
use mfetch_core::control::raise_marker;

pub fn run_stop(cfg: &FetchConfig) -> Result<()> {
    raise_marker(&cfg.stop_file)
        .with_context(|| format!("create stop marker {}", cfg.stop_file.display()))?;
    println!(
        "Stop requested ({}); running fetches will save their state and exit.",
        cfg.stop_file.display()
    );
    Ok(())
}
