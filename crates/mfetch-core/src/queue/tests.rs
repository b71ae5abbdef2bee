//! Tests for TaskQueue: duplicates, retry accounting, spillover and swap.

use std::collections::HashSet;

use crate::layout::RunLayout;

use super::*;

fn queue_in(dir: &std::path::Path, ratio: f64) -> (TaskQueue, RunLayout) {
    let layout = RunLayout::new(dir.join("job"));
    let mut q = TaskQueue::new(&layout, 0.8, Box::new(FixedRatio(ratio)));
    q.open_overflow(false).unwrap();
    (q, layout)
}

fn drain(q: &mut TaskQueue) -> Vec<String> {
    let mut out = Vec::new();
    while let Some(t) = q.next_ready().unwrap() {
        q.mark_dispatched(&t.url);
        q.remove(&t.url);
        out.push(t.url);
    }
    out
}

#[test]
fn duplicate_add_is_rejected_and_size_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let (mut q, _) = queue_in(dir.path(), 0.0);
    assert_eq!(q.add("http://a/", None), AddOutcome::Queued);
    assert_eq!(q.len(), 1);
    assert_eq!(q.add("http://a/", None), AddOutcome::Duplicate);
    assert!(!AddOutcome::Duplicate.is_accepted());
    assert_eq!(q.len(), 1);
}

#[test]
fn in_flight_task_is_not_handed_out_again() {
    let dir = tempfile::tempdir().unwrap();
    let (mut q, _) = queue_in(dir.path(), 0.0);
    q.add("http://a/", None);
    let t = q.next_ready().unwrap().unwrap();
    assert_eq!(q.mark_dispatched(&t.url).unwrap().raw(), 1);
    assert!(q.next_ready().unwrap().is_none());
    assert_eq!(q.in_flight(), 1);
    assert!(!q.is_finished().unwrap());
}

#[test]
fn failures_requeue_until_max_retry_then_abandon() {
    let dir = tempfile::tempdir().unwrap();
    let (mut q, _) = queue_in(dir.path(), 0.0);
    q.add("http://flaky/", None);
    let max_retry = 3;
    let mut verdicts = Vec::new();
    loop {
        let t = q.next_ready().unwrap().expect("task should be ready");
        let prior = t.state.attempts();
        let flying = q.mark_dispatched(&t.url).unwrap();
        assert_eq!(flying.raw(), prior as i64 + 1);
        let v = q.record_failure(&t.url, max_retry).unwrap();
        verdicts.push(v);
        if let FailureVerdict::Abandon { .. } = v {
            break;
        }
        assert_eq!(q.get(&t.url).unwrap().state.attempts(), prior + 1);
    }
    assert_eq!(
        verdicts,
        vec![
            FailureVerdict::Retry { attempts: 1 },
            FailureVerdict::Retry { attempts: 2 },
            FailureVerdict::Abandon { attempts: 3 },
        ]
    );
    assert!(q.is_empty());
}

#[test]
fn input_lines_are_loaded_lazily_and_deduplicated() {
    let dir = tempfile::tempdir().unwrap();
    let (mut q, layout) = queue_in(dir.path(), 0.0);
    std::fs::write(&layout.input, "http://a/\nhttp://b/ [\"X-A: 1\"]\nhttp://a/\n").unwrap();
    q.open_input().unwrap();
    assert!(q.is_empty());

    let a = q.next_ready().unwrap().unwrap();
    assert_eq!(a.url, "http://a/");
    q.mark_dispatched(&a.url);
    let b = q.next_ready().unwrap().unwrap();
    assert_eq!(b.url, "http://b/");
    assert_eq!(b.headers, Some(vec!["X-A: 1".to_string()]));
    q.mark_dispatched(&b.url);
    // Third line duplicates the in-flight http://a/.
    assert!(q.next_ready().unwrap().is_none());
}

#[test]
fn spilled_urls_come_back_after_swap_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let (mut q, layout) = queue_in(dir.path(), 0.95);
    std::fs::write(&layout.input, "http://orig/1\nhttp://orig/2\n").unwrap();
    q.open_input().unwrap();

    let n = 25;
    for i in 0..n {
        assert_eq!(q.add(&format!("http://spill/{i}"), None), AddOutcome::Spilled);
    }
    assert!(q.is_empty());

    let got = drain(&mut q);
    assert_eq!(got.len(), n + 2);
    let unique: HashSet<_> = got.iter().collect();
    assert_eq!(unique.len(), got.len());
    assert_eq!(q.swaps(), 1);
    assert!(layout.input_backup.exists());

    assert!(q.is_finished().unwrap());
    q.finish().unwrap();
    assert!(!layout.overflow.exists(), "empty overflow removed");
    assert!(!layout.input_backup.exists());
    let restored = std::fs::read_to_string(&layout.input).unwrap();
    assert_eq!(restored, "http://orig/1\nhttp://orig/2\n");
}

#[test]
fn swap_without_original_input_leaves_no_input_behind() {
    let dir = tempfile::tempdir().unwrap();
    let (mut q, layout) = queue_in(dir.path(), 1.0);
    q.open_input().unwrap();
    q.add("http://x/1", Some(vec!["Cookie: a=b".to_string()]));
    q.add("http://x/2", None);

    let first = q.next_ready().unwrap().unwrap();
    assert_eq!(first.url, "http://x/1");
    assert_eq!(first.headers, Some(vec!["Cookie: a=b".to_string()]));
    q.mark_dispatched(&first.url);
    q.remove(&first.url);

    // Spilled while draining the promoted file: needs a second swap.
    q.add("http://x/3", None);
    let rest = drain(&mut q);
    assert_eq!(rest, vec!["http://x/2".to_string(), "http://x/3".to_string()]);
    assert_eq!(q.swaps(), 2);
    assert!(!layout.input_backup.exists());

    q.finish().unwrap();
    assert!(!layout.input.exists());
    assert!(!layout.overflow.exists());
}

#[test]
fn records_convert_in_flight_and_restore_roundtrips() {
    let dir = tempfile::tempdir().unwrap();
    let (mut q, _) = queue_in(dir.path(), 0.0);
    q.add("http://b/", None);
    q.add("http://a/", Some(vec!["H: v".to_string()]));
    q.add("http://c/", None);
    let t = q.next_ready().unwrap().unwrap();
    assert_eq!(t.url, "http://b/");
    q.mark_dispatched(&t.url);
    q.record_failure(&t.url, 5);
    let t = q.next_ready().unwrap().unwrap();
    assert_eq!(t.url, "http://a/");
    q.mark_dispatched(&t.url);

    let records = q.records();
    let states: Vec<(&str, i64)> = records
        .iter()
        .map(|r| (r.url.as_str(), r.retry_state.raw()))
        .collect();
    assert_eq!(states, vec![("http://c/", 0), ("http://b/", -1), ("http://a/", 0)]);

    let cursor = QueueCursor {
        input_offset: 42,
        swaps: 1,
        input_backed_up: true,
    };
    let (mut q2, _) = queue_in(dir.path(), 0.0);
    q2.restore(records.clone(), cursor);
    assert_eq!(q2.records(), records);
    assert_eq!(q2.cursor(), cursor);
    assert_eq!(q2.in_flight(), 0);
}
