//! Natural completion: close the run files and clean up after them.

use crate::error::EngineError;
use crate::layout::remove_if_empty;

use super::Scheduler;

pub(super) fn finish(s: &mut Scheduler) -> Result<(), EngineError> {
    s.done = true;
    s.success = None;
    s.redirect = None;
    if let Some(sinks) = s.sinks.take() {
        sinks.close()?;
    }
    remove_if_empty(&s.layout.errors);
    if remove_if_empty(&s.layout.output) {
        tracing::info!("No output generated");
    }
    s.queue.finish()?;
    tracing::info!("Done in {:.3} seconds", s.elapsed().as_secs_f64());
    Ok(())
}
