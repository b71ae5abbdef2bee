//! Apply one completed transfer to the interface, the queue and the run files.

use crate::callbacks::{default_records, UrlSink};
use crate::classify::Outcome;
use crate::error::EngineError;
use crate::fetch::Response;
use crate::interface::InterfaceKey;
use crate::queue::FailureVerdict;

use super::Scheduler;

/// `interface` is None for requests that were never sent.
pub(super) fn complete(
    s: &mut Scheduler,
    interface: Option<&InterfaceKey>,
    response: Response,
) -> Result<(), EngineError> {
    let url = response.meta.url.as_str();
    let status = response.meta.status;
    let outcome = s.classifier.classify(status);
    tracing::debug!("<<< {} ({})", url, status);

    if let Some(iface) = interface.and_then(|k| s.pool.get_mut(k)) {
        iface.release(Some(outcome));
    }

    // A task leaves the queue only once its result is on disk, so a failed
    // write leaves it in the recovery record.
    match outcome {
        Outcome::Success => {
            let records = match s.success.as_mut() {
                Some(handler) => handler.on_success(&mut UrlSink::new(&mut s.queue), &response),
                None => default_records(&response),
            };
            if let Some(sinks) = s.sinks.as_mut() {
                sinks.write_records(&records)?;
            }
            s.queue.remove(url);
            s.stats.succeeded += 1;
        }
        Outcome::Fail => {
            let exhausted = s
                .queue
                .get(url)
                .is_some_and(|t| t.state.attempts() >= s.max_retry);
            if exhausted {
                if let Some(sinks) = s.sinks.as_mut() {
                    sinks.write_error(url, status)?;
                }
            }
            match s.queue.record_failure(url, s.max_retry) {
                Some(FailureVerdict::Retry { attempts }) => {
                    tracing::info!("{} failed with {} (attempt {})", url, status, attempts);
                    s.stats.retried += 1;
                }
                Some(FailureVerdict::Abandon { attempts }) => {
                    tracing::info!("{} failed with {}, giving up after {} attempts", url, status, attempts);
                    s.stats.abandoned += 1;
                }
                None => {}
            }
        }
        Outcome::Redirect => {
            s.queue.remove(url);
            s.stats.redirected += 1;
            tracing::info!("{} redirected ({})", url, status);
            if let Some(handler) = s.redirect.as_mut() {
                handler.on_redirect(&mut UrlSink::new(&mut s.queue), &response);
            }
        }
        Outcome::Discard => {
            s.queue.remove(url);
            s.stats.discarded += 1;
            tracing::info!("{} returned {}, dropped", url, status);
        }
    }
    Ok(())
}
