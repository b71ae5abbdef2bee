//! End-to-end runs against a local status server: success, abandonment,
//! interrupt and resume, spillover (also across a resume), redirects,
//! request headers.

mod common;

use mfetch_core::callbacks::{FollowRedirects, UrlSink};
use mfetch_core::control::raise_marker;
use mfetch_core::fetch::Response;
use mfetch_core::queue::{format_line, AddOutcome, FixedRatio};
use mfetch_core::{RunOutcome, Scheduler};
use serde_json::Value;
use tempfile::tempdir;

#[test]
fn three_successes_produce_three_records_and_no_error_file() {
    let server = common::status_server::start();
    let dir = tempdir().unwrap();
    let cfg = common::config_in(dir.path());
    let mut s = Scheduler::open(dir.path().join("job"), &cfg).unwrap();
    for name in ["a", "b", "c"] {
        assert_eq!(s.add_url(&server.url(&format!("/ok/{}", name)), None), AddOutcome::Queued);
    }
    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    s.set_progress(tx);

    assert_eq!(s.run().unwrap(), RunOutcome::Completed);
    let layout = s.layout().clone();
    assert_eq!(s.stats().succeeded, 3);
    drop(s);

    let mut out = common::lines(&layout.output);
    out.sort();
    assert_eq!(out, vec!["\"page a\"", "\"page b\"", "\"page c\""]);
    assert!(!layout.errors.exists());
    assert!(!layout.recovery.exists());

    let mut last = None;
    while let Ok(stats) = rx.try_recv() {
        last = Some(stats);
    }
    let last = last.expect("final progress report");
    assert_eq!(last.succeeded, 3);
    assert_eq!(last.in_flight, 0);
}

#[test]
fn always_failing_url_is_abandoned_after_max_retry() {
    let server = common::status_server::start();
    let dir = tempdir().unwrap();
    let mut cfg = common::config_in(dir.path());
    cfg.max_retry = 2;
    let url = server.url("/fail/x");
    let mut s = Scheduler::open(dir.path().join("job"), &cfg).unwrap();
    s.add_url(&url, None);

    assert_eq!(s.run().unwrap(), RunOutcome::Completed);
    let layout = s.layout().clone();
    drop(s);

    assert_eq!(std::fs::read_to_string(&layout.errors).unwrap(), format!("{} 503\n", url));
    assert!(!layout.output.exists(), "no output generated");
    assert_eq!(server.hits("/fail/x"), 2);
}

#[test]
fn interrupted_run_resumes_without_duplicates() {
    let server = common::status_server::start();
    let dir = tempdir().unwrap();
    let cfg = common::config_in(dir.path());
    let base = dir.path().join("job");
    let mut input = String::new();
    for name in ["one", "two", "three"] {
        input.push_str(&format_line(&server.url(&format!("/ok/{}", name)), None));
    }
    std::fs::write(dir.path().join("job.input"), &input).unwrap();

    let marker = cfg.stop_file.clone();
    let mut first = Scheduler::open(&base, &cfg).unwrap();
    first.set_success_handler(move |_urls: &mut UrlSink<'_>, r: &Response| -> Vec<Value> {
        raise_marker(&marker).unwrap();
        vec![Value::String(r.text().into_owned())]
    });
    assert_eq!(first.run().unwrap(), RunOutcome::Interrupted);
    let layout = first.layout().clone();
    drop(first);
    assert!(layout.recovery.exists());
    assert!(!cfg.stop_file.exists());
    assert_eq!(common::lines(&layout.output).len(), 1);

    let mut second = Scheduler::open(&base, &cfg).unwrap();
    assert!(second.is_resuming());
    assert!(!layout.recovery.exists());
    assert_eq!(second.run().unwrap(), RunOutcome::Completed);
    drop(second);

    let mut out = common::lines(&layout.output);
    out.sort();
    assert_eq!(out, vec!["\"page one\"", "\"page three\"", "\"page two\""]);
    assert!(!layout.recovery.exists());
    assert_eq!(std::fs::read_to_string(&layout.input).unwrap(), input, "input untouched");
    for name in ["one", "two", "three"] {
        assert_eq!(server.hits(&format!("/ok/{}", name)), 1);
    }
}

#[test]
fn spilled_urls_are_fetched_once_and_original_input_restored() {
    let server = common::status_server::start();
    let dir = tempdir().unwrap();
    let cfg = common::config_in(dir.path());
    let base = dir.path().join("job");
    let original = format_line(&server.url("/ok/from-input"), None);
    std::fs::write(dir.path().join("job.input"), &original).unwrap();

    let mut s = Scheduler::open(&base, &cfg).unwrap();
    s.set_memory_probe(FixedRatio(1.0));
    for i in 0..4 {
        assert_eq!(
            s.add_url(&server.url(&format!("/ok/spill{}", i)), None),
            AddOutcome::Spilled
        );
    }
    assert_eq!(s.run().unwrap(), RunOutcome::Completed);
    let layout = s.layout().clone();
    drop(s);

    assert_eq!(common::lines(&layout.output).len(), 5);
    for i in 0..4 {
        assert_eq!(server.hits(&format!("/ok/spill{}", i)), 1);
    }
    assert_eq!(server.hits("/ok/from-input"), 1);
    assert!(!layout.overflow.exists());
    assert!(!layout.input_backup.exists());
    assert_eq!(std::fs::read_to_string(&layout.input).unwrap(), original);
}

#[test]
fn run_interrupted_after_swap_resumes_and_restores_input() {
    let server = common::status_server::start();
    let dir = tempdir().unwrap();
    let cfg = common::config_in(dir.path());
    let base = dir.path().join("job");
    let original = format_line(&server.url("/ok/from-input"), None);
    std::fs::write(dir.path().join("job.input"), &original).unwrap();

    let marker = cfg.stop_file.clone();
    let mut seen = 0;
    let mut first = Scheduler::open(&base, &cfg).unwrap();
    first.set_memory_probe(FixedRatio(1.0));
    first.set_success_handler(move |_urls: &mut UrlSink<'_>, r: &Response| -> Vec<Value> {
        seen += 1;
        if seen == 2 {
            raise_marker(&marker).unwrap();
        }
        vec![Value::String(r.text().into_owned())]
    });
    for i in 0..3 {
        assert_eq!(
            first.add_url(&server.url(&format!("/ok/spill{}", i)), None),
            AddOutcome::Spilled
        );
    }
    assert_eq!(first.run().unwrap(), RunOutcome::Interrupted);
    let layout = first.layout().clone();
    drop(first);

    let saved = mfetch_core::recovery::load(&layout.recovery).unwrap().unwrap();
    assert_eq!(saved.swaps, 1);
    assert!(saved.input_backed_up);
    assert!(layout.input_backup.exists(), "original input parked during the run");
    assert_eq!(common::lines(&layout.output).len(), 2);

    let mut second = Scheduler::open(&base, &cfg).unwrap();
    assert!(second.is_resuming());
    assert_eq!(second.run().unwrap(), RunOutcome::Completed);
    drop(second);

    assert_eq!(common::lines(&layout.output).len(), 4);
    assert_eq!(server.hits("/ok/from-input"), 1);
    for i in 0..3 {
        assert_eq!(server.hits(&format!("/ok/spill{}", i)), 1);
    }
    assert!(!layout.recovery.exists());
    assert!(!layout.overflow.exists());
    assert!(!layout.input_backup.exists());
    assert_eq!(std::fs::read_to_string(&layout.input).unwrap(), original);
}

#[test]
fn redirects_are_followed_and_unknown_codes_dropped() {
    let server = common::status_server::start();
    let dir = tempdir().unwrap();
    let cfg = common::config_in(dir.path());
    let mut s = Scheduler::open(dir.path().join("job"), &cfg).unwrap();
    s.set_redirect_handler(FollowRedirects);
    s.add_url(&server.url("/redirect/target"), None);
    s.add_url(&server.url("/missing"), None);

    assert_eq!(s.run().unwrap(), RunOutcome::Completed);
    assert_eq!(s.stats().redirected, 1);
    assert_eq!(s.stats().discarded, 1);
    let layout = s.layout().clone();
    drop(s);

    assert_eq!(common::lines(&layout.output), vec!["\"page target\""]);
    assert!(!layout.errors.exists(), "404 is not an error record");
    assert_eq!(server.hits("/ok/target"), 1);
    assert_eq!(server.hits("/missing"), 1);
}

#[test]
fn request_headers_are_sent_and_handlers_can_queue_more() {
    let server = common::status_server::start();
    let dir = tempdir().unwrap();
    let cfg = common::config_in(dir.path());
    let next = server.url("/ok/discovered");
    let mut s = Scheduler::open(dir.path().join("job"), &cfg).unwrap();
    let mut queued = false;
    s.set_success_handler(move |urls: &mut UrlSink<'_>, r: &Response| -> Vec<Value> {
        if !queued {
            queued = true;
            assert_eq!(urls.add(&next, None), AddOutcome::Queued);
        }
        vec![serde_json::json!({ "url": r.meta.url, "body": r.text() })]
    });
    s.add_url(&server.url("/echo"), Some(vec!["X-Echo: hello".into()]));

    assert_eq!(s.run().unwrap(), RunOutcome::Completed);
    let layout = s.layout().clone();
    drop(s);

    let records: Vec<Value> = common::lines(&layout.output)
        .iter()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["body"], "hello");
    assert_eq!(records[1]["body"], "page discovered");
}
