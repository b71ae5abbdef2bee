//! Interface configuration and the builder used by `add_interface`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::InterfaceDefaults;

use super::InterfaceKey;

/// Resolved configuration of one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    pub user_agents: Vec<String>,
    /// Hard cap on simultaneous connections.
    pub max_conns: usize,
    pub adaptive: bool,
    /// Ceiling of the inter-request delay, seconds.
    pub max_delay_secs: u64,
    pub timeout_secs: u64,
    /// `user:password` for the proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_auth: Option<String>,
}

impl InterfaceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Requested interface; unset fields fall back to `InterfaceDefaults`.
#[derive(Debug, Clone, Default)]
pub struct InterfaceSpec {
    pub address: Option<String>,
    pub proxy: Option<String>,
    pub proxy_auth: Option<String>,
    pub user_agents: Option<Vec<String>>,
    pub max_conns: Option<usize>,
    pub adaptive: Option<bool>,
    pub max_delay_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
}

impl InterfaceSpec {
    pub fn local() -> Self {
        Self::default()
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn proxy(mut self, proxy: impl Into<String>, auth: Option<String>) -> Self {
        self.proxy = Some(proxy.into());
        self.proxy_auth = auth;
        self
    }

    pub fn user_agents(mut self, agents: Vec<String>) -> Self {
        self.user_agents = Some(agents);
        self
    }

    pub fn max_conns(mut self, n: usize) -> Self {
        self.max_conns = Some(n);
        self
    }

    pub fn adaptive(mut self, on: bool) -> Self {
        self.adaptive = Some(on);
        self
    }

    pub fn max_delay_secs(mut self, secs: u64) -> Self {
        self.max_delay_secs = Some(secs);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn key(&self) -> InterfaceKey {
        InterfaceKey::new(self.address.clone(), self.proxy.clone())
    }

    /// Fill unset fields from defaults.
    pub fn resolve(self, defaults: &InterfaceDefaults) -> (InterfaceKey, InterfaceConfig) {
        let key = self.key();
        let config = InterfaceConfig {
            user_agents: self
                .user_agents
                .unwrap_or_else(|| defaults.user_agents.clone()),
            max_conns: self.max_conns.unwrap_or(defaults.max_conns).max(1),
            adaptive: self.adaptive.unwrap_or(defaults.adaptive),
            max_delay_secs: self.max_delay_secs.unwrap_or(defaults.max_delay_secs),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
            proxy_auth: self.proxy_auth.filter(|_| key.proxy.is_some()),
        };
        (key, config)
    }
}
