//! `mfetch status <BASE>` – summarize a run's pending recovery record.

use anyhow::Result;
use mfetch_core::layout::RunLayout;
use mfetch_core::recovery;
use std::path::Path;

pub fn run_status(base: &Path) -> Result<()> {
    let layout = RunLayout::new(base);
    let Some(snap) = recovery::load(&layout.recovery)? else {
        println!("No pending run for {}.", base.display());
        return Ok(());
    };
    let spilled = std::fs::metadata(&layout.overflow).map(|m| m.len()).unwrap_or(0);
    println!("Pending run: {}", layout.recovery.display());
    println!("  tasks in memory : {} ({} retried)", snap.tasks.len(), snap.retried());
    println!("  input offset    : {} bytes", snap.input_offset);
    println!("  overflow swaps  : {}", snap.swaps);
    println!("  overflow file   : {} bytes", spilled);
    println!("  elapsed         : {:.1}s", snap.elapsed_secs);
    if !snap.interfaces.is_empty() {
        println!("  {:<28} {:<8} {:<8} {}", "INTERFACE", "CEILING", "CAP", "DELAY");
        for i in &snap.interfaces {
            println!(
                "  {:<28} {:<8} {:<8} {}s",
                i.key.to_string(),
                i.ceiling,
                i.config.max_conns,
                i.delay_secs
            );
        }
    }
    Ok(())
}
