//! Curl multi event loop: fill free interface slots, perform, harvest
//! completions, check the stop signal, wait.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use curl::easy::Easy2;
use curl::multi::{Easy2Handle, Multi};

use crate::control::StopSource;
use crate::error::EngineError;
use crate::fetch::{into_response, Response, ResponseCollector, TransferMeta};
use crate::interface::InterfaceKey;

use super::complete::complete;
use super::progress::REPORT_EVERY;
use super::Scheduler;

/// Upper bound of one wait on the multi handle.
const WAIT: Duration = Duration::from_millis(100);

pub(super) enum LoopExit {
    Done,
    Stopped(StopSource),
}

struct Transfer {
    handle: Easy2Handle<ResponseCollector>,
    url: String,
    interface: InterfaceKey,
}

pub(super) fn event_loop(s: &mut Scheduler) -> Result<LoopExit, EngineError> {
    let multi = Multi::new();
    let mut active: HashMap<usize, Transfer> = HashMap::new();
    let mut next_token = 0usize;
    let mut since_report = 0u64;

    loop {
        if let Some(source) = s.stop.poll() {
            return Ok(LoopExit::Stopped(source));
        }

        fill(s, &multi, &mut active, &mut next_token)?;

        let running = multi.perform()?;

        let mut finished: Vec<(usize, Result<(), curl::Error>)> = Vec::new();
        multi.messages(|msg| {
            if let (Ok(token), Some(result)) = (msg.token(), msg.result()) {
                finished.push((token, result));
            }
        });
        for (token, result) in finished {
            let Some(t) = active.remove(&token) else {
                continue;
            };
            let easy = multi.remove2(t.handle)?;
            let response = into_response(t.url, easy, result);
            complete(s, Some(&t.interface), response)?;
            since_report += 1;
            if let Some(source) = s.stop.poll() {
                return Ok(LoopExit::Stopped(source));
            }
        }
        if since_report >= REPORT_EVERY {
            s.report();
            since_report = 0;
        }

        if active.is_empty() && s.queue.is_finished()? {
            s.report();
            return Ok(LoopExit::Done);
        }

        if running > 0 {
            multi.wait(&mut [], WAIT)?;
        } else if active.is_empty() {
            // Every interface is waiting out its delay.
            std::thread::sleep(WAIT);
        }
    }
}

/// Dispatch ready tasks while an interface has a free slot.
fn fill(
    s: &mut Scheduler,
    multi: &Multi,
    active: &mut HashMap<usize, Transfer>,
    next_token: &mut usize,
) -> Result<(), EngineError> {
    let now = Instant::now();
    while let Some(index) = s.pool.next_ready(now) {
        let Some(task) = s.queue.next_ready()? else {
            break;
        };
        let iface = s.pool.rotate(index);
        let easy: Easy2<ResponseCollector> =
            match iface.acquire(&task.url, task.headers.as_deref(), now) {
                Ok(easy) => easy,
                Err(e) => {
                    // Counts as a failed attempt so a bad URL ends up in the error file.
                    tracing::warn!("cannot build request for {}: {}", task.url, e);
                    s.queue.mark_dispatched(&task.url);
                    s.stats.dispatched += 1;
                    complete(s, None, unsent(task.url))?;
                    continue;
                }
            };
        let key = iface.key().clone();
        let mut handle = multi.add2(easy)?;
        let token = *next_token;
        *next_token += 1;
        handle.set_token(token)?;
        s.queue.mark_dispatched(&task.url);
        s.stats.dispatched += 1;
        tracing::debug!(">>> {}", task.url);
        active.insert(
            token,
            Transfer {
                handle,
                url: task.url,
                interface: key,
            },
        );
    }
    Ok(())
}

/// Response for a request that never reached the network.
fn unsent(url: String) -> Response {
    Response {
        body: Vec::new(),
        headers: Vec::new(),
        meta: TransferMeta {
            effective_url: url.clone(),
            url,
            status: 0,
            total_time: Duration::ZERO,
            redirect_url: None,
        },
    }
}
