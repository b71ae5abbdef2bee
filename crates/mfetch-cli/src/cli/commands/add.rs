//! `mfetch add <BASE> <URL>` – append a URL to the run's input file.

use anyhow::{Context, Result};
use mfetch_core::layout::RunLayout;
use mfetch_core::queue::format_line;
use std::io::Write;
use std::path::Path;

pub fn run_add(base: &Path, url: &str, headers: Vec<String>) -> Result<()> {
    let url = url.trim();
    anyhow::ensure!(
        !url.is_empty() && !url.contains(char::is_whitespace),
        "invalid URL: {:?}",
        url
    );
    let layout = RunLayout::new(base);
    let headers = (!headers.is_empty()).then_some(headers);
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&layout.input)
        .with_context(|| format!("open {}", layout.input.display()))?;
    file.write_all(format_line(url, headers.as_deref()).as_bytes())
        .with_context(|| format!("write {}", layout.input.display()))?;
    println!("Added {} to {}", url, layout.input.display());
    Ok(())
}
