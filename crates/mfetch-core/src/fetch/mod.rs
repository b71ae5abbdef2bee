//! Responses handed to callbacks, and their construction from finished
//! curl transfers.

mod collector;

use std::borrow::Cow;
use std::time::Duration;

pub use collector::ResponseCollector;

/// Transport metadata of one completed transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferMeta {
    /// URL as queued.
    pub url: String,
    /// Last URL curl talked to (same as `url` since redirects are not followed).
    pub effective_url: String,
    /// HTTP status, or 0 when the transfer failed at the transport level.
    pub status: u32,
    pub total_time: Duration,
    /// Redirect target reported by curl, if any.
    pub redirect_url: Option<String>,
}

/// A fetched document: body, response header lines and transport metadata.
#[derive(Debug, Clone)]
pub struct Response {
    pub body: Vec<u8>,
    pub headers: Vec<String>,
    pub meta: TransferMeta,
}

impl Response {
    /// First header value with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Absolute redirect target: curl's redirect URL, else the `Location`
    /// header resolved against the effective URL.
    pub fn redirect_target(&self) -> Option<String> {
        if let Some(u) = &self.meta.redirect_url {
            return Some(u.clone());
        }
        let location = self.header("location")?;
        match url::Url::parse(&self.meta.effective_url) {
            Ok(base) => base.join(location).ok().map(|u| u.to_string()),
            Err(_) => url::Url::parse(location).ok().map(|u| u.to_string()),
        }
    }
}

/// Build a Response from a transfer that left the multi handle.
///
/// A transport error maps to status 0 even if a status line had already been
/// received, so a truncated body is never reported as a success.
pub(crate) fn into_response(
    url: String,
    mut easy: curl::easy::Easy2<ResponseCollector>,
    transfer: Result<(), curl::Error>,
) -> Response {
    let status = match transfer {
        Ok(()) => easy.response_code().unwrap_or(0),
        Err(ref e) => {
            tracing::debug!("transfer error for {}: {}", url, e);
            0
        }
    };
    let effective_url = easy
        .effective_url()
        .ok()
        .flatten()
        .map(str::to_string)
        .unwrap_or_else(|| url.clone());
    let redirect_url = easy.redirect_url().ok().flatten().map(str::to_string);
    let total_time = easy.total_time().unwrap_or_default();
    let collector = std::mem::take(easy.get_mut());
    Response {
        body: collector.body,
        headers: collector.headers,
        meta: TransferMeta {
            url,
            effective_url,
            status,
            total_time,
            redirect_url,
        },
    }
}
