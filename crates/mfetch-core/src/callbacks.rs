//! Typed hooks invoked by the scheduler for success and redirect outcomes.
//!
//! Handlers receive a [`UrlSink`] so they can submit newly discovered URLs
//! while the run is in progress.

use serde_json::Value;

use crate::fetch::Response;
use crate::queue::{AddOutcome, TaskQueue};

/// Submission handle passed to callbacks.
pub struct UrlSink<'a> {
    queue: &'a mut TaskQueue,
}

impl<'a> UrlSink<'a> {
    pub(crate) fn new(queue: &'a mut TaskQueue) -> Self {
        Self { queue }
    }

    /// Queue another URL for this run.
    pub fn add(&mut self, url: &str, headers: Option<Vec<String>>) -> AddOutcome {
        self.queue.add(url, headers)
    }
}

/// Called for every response classified as success. Each returned value is
/// written as one JSON line to the output file.
pub trait SuccessHandler {
    fn on_success(&mut self, urls: &mut UrlSink<'_>, response: &Response) -> Vec<Value>;
}

/// Called for every response classified as redirect. Side effects only.
pub trait RedirectHandler {
    fn on_redirect(&mut self, urls: &mut UrlSink<'_>, response: &Response);
}

impl<F> SuccessHandler for F
where
    F: FnMut(&mut UrlSink<'_>, &Response) -> Vec<Value>,
{
    fn on_success(&mut self, urls: &mut UrlSink<'_>, response: &Response) -> Vec<Value> {
        self(urls, response)
    }
}

impl<F> RedirectHandler for F
where
    F: FnMut(&mut UrlSink<'_>, &Response),
{
    fn on_redirect(&mut self, urls: &mut UrlSink<'_>, response: &Response) {
        self(urls, response)
    }
}

/// Records when no success handler is installed: the raw body as one JSON
/// string, or nothing for an empty body.
pub(crate) fn default_records(response: &Response) -> Vec<Value> {
    if response.body.is_empty() {
        Vec::new()
    } else {
        vec![Value::String(response.text().into_owned())]
    }
}

/// Follows redirects by queueing the resolved target.
#[derive(Debug, Default, Clone, Copy)]
pub struct FollowRedirects;

impl RedirectHandler for FollowRedirects {
    fn on_redirect(&mut self, urls: &mut UrlSink<'_>, response: &Response) {
        match response.redirect_target() {
            Some(target) => {
                let outcome = urls.add(&target, None);
                tracing::debug!("redirect {} -> {} ({:?})", response.meta.url, target, outcome);
            }
            None => tracing::info!("redirect from {} without a target", response.meta.url),
        }
    }
}
