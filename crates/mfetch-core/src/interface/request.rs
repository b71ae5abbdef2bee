//! Build the curl easy handle for one request on an interface.

use rand::seq::SliceRandom;

use crate::fetch::ResponseCollector;

use super::{InterfaceConfig, InterfaceKey};

/// Pick one user agent from the pool at random (None = curl default).
pub(crate) fn pick_user_agent(agents: &[String]) -> Option<&str> {
    agents.choose(&mut rand::thread_rng()).map(String::as_str)
}

/// Configure an Easy2 handle with the interface's egress settings and the
/// task's request headers. Redirects are not followed: they are reported to
/// the redirect handler instead.
pub(crate) fn build_easy(
    key: &InterfaceKey,
    config: &InterfaceConfig,
    url: &str,
    headers: Option<&[String]>,
) -> Result<curl::easy::Easy2<ResponseCollector>, curl::Error> {
    let mut easy = curl::easy::Easy2::new(ResponseCollector::new());
    easy.url(url)?;
    easy.get(true)?;
    if let Some(address) = &key.address {
        easy.interface(address)?;
    }
    if let Some(ua) = pick_user_agent(&config.user_agents) {
        easy.useragent(ua)?;
    }
    if let Some(h) = headers.filter(|h| !h.is_empty()) {
        let mut list = curl::easy::List::new();
        for line in h {
            list.append(line)?;
        }
        easy.http_headers(list)?;
    }
    if let Some(proxy) = &key.proxy {
        easy.proxy(proxy)?;
        if let Some(auth) = &config.proxy_auth {
            let (user, pass) = auth.split_once(':').unwrap_or((auth.as_str(), ""));
            easy.proxy_username(user)?;
            easy.proxy_password(pass)?;
        }
    }
    easy.timeout(config.timeout())?;
    easy.ssl_verify_peer(false)?;
    easy.follow_location(false)?;
    Ok(easy)
}
