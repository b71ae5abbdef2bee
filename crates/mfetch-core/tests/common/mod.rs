#![allow(dead_code)]

pub mod status_server;

use std::path::Path;

use mfetch_core::config::FetchConfig;

/// Config for a test run: stop marker inside `dir`, fixed single-slot
/// interfaces and a short timeout.
pub fn config_in(dir: &Path) -> FetchConfig {
    let mut cfg = FetchConfig {
        stop_file: dir.join(".STOP"),
        ..FetchConfig::default()
    };
    cfg.interface_defaults.adaptive = false;
    cfg.interface_defaults.max_conns = 1;
    cfg.interface_defaults.timeout_secs = 5;
    cfg
}

/// Non-empty lines of a file, or an empty list if it does not exist.
pub fn lines(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(s) => s.lines().filter(|l| !l.is_empty()).map(str::to_string).collect(),
        Err(_) => Vec::new(),
    }
}
