//! Tests for add, stop and status.

use super::parse;
use crate::cli::CliCommand;
use std::path::Path;

#[test]
fn cli_parse_add() {
    match parse(&["mfetch", "add", "job", "https://example.com/x"]) {
        CliCommand::Add { base, url, headers } => {
            assert_eq!(base, Path::new("job"));
            assert_eq!(url, "https://example.com/x");
            assert!(headers.is_empty());
        }
        _ => panic!("expected Add"),
    }
}

#[test]
fn cli_parse_add_headers() {
    match parse(&[
        "mfetch",
        "add",
        "job",
        "https://example.com/x",
        "--header",
        "Referer: https://example.com/",
        "-H",
        "Cookie: a=b",
    ]) {
        CliCommand::Add { headers, .. } => {
            assert_eq!(headers, vec!["Referer: https://example.com/", "Cookie: a=b"]);
        }
        _ => panic!("expected Add with headers"),
    }
}

#[test]
fn cli_parse_stop() {
    assert!(matches!(parse(&["mfetch", "stop"]), CliCommand::Stop));
}

#[test]
fn cli_parse_status() {
    match parse(&["mfetch", "status", "runs/a"]) {
        CliCommand::Status { base } => assert_eq!(base, Path::new("runs/a")),
        _ => panic!("expected Status"),
    }
}

#[test]
fn status_without_record_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    crate::cli::commands::run_status(&dir.path().join("job")).unwrap();
}
