//! Egress interfaces and their adaptive throttles.
//!
//! Each interface is one egress identity (source address and/or proxy, plus
//! credentials and a user-agent pool) with its own concurrency ceiling and
//! inter-request delay. The pool hands out the first ready interface in
//! rotation order and moves it to the back after use, which spreads load
//! round-robin across whatever is currently available.

mod key;
mod request;
mod spec;
mod throttle;

use std::time::Instant;

use crate::classify::Outcome;
use crate::fetch::ResponseCollector;

pub use key::InterfaceKey;
pub use spec::{InterfaceConfig, InterfaceSpec};
pub use throttle::Throttle;

/// One egress identity with its throttle.
#[derive(Debug, Clone)]
pub struct Interface {
    key: InterfaceKey,
    config: InterfaceConfig,
    throttle: Throttle,
}

impl Interface {
    pub fn new(key: InterfaceKey, config: InterfaceConfig) -> Self {
        let throttle = Throttle::new(config.adaptive, config.max_conns);
        Self {
            key,
            config,
            throttle,
        }
    }

    pub fn key(&self) -> &InterfaceKey {
        &self.key
    }

    pub fn config(&self) -> &InterfaceConfig {
        &self.config
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// May a request be dispatched now?
    pub fn ready(&self, now: Instant) -> bool {
        self.throttle.ready(now)
    }

    /// Build a request for `url` and count it as active.
    pub fn acquire(
        &mut self,
        url: &str,
        headers: Option<&[String]>,
        now: Instant,
    ) -> Result<curl::easy::Easy2<ResponseCollector>, curl::Error> {
        let easy = request::build_easy(&self.key, &self.config, url, headers)?;
        self.throttle.on_acquire(self.config.adaptive, now);
        Ok(easy)
    }

    /// A request finished (or was never sent when `outcome` is None).
    pub fn release(&mut self, outcome: Option<Outcome>) {
        self.throttle.on_release(
            outcome,
            self.config.adaptive,
            self.config.max_conns,
            self.config.max_delay_secs,
        );
    }

    pub fn to_record(&self) -> InterfaceRecord {
        InterfaceRecord {
            key: self.key.clone(),
            config: self.config.clone(),
            ceiling: self.throttle.ceiling,
            delay_secs: self.throttle.delay_secs,
            failed: self.throttle.failed,
        }
    }

    pub fn from_record(record: InterfaceRecord) -> Self {
        let throttle = Throttle::restored(
            record.ceiling,
            record.delay_secs,
            record.failed,
            record.config.max_conns,
            record.config.max_delay_secs,
        );
        Self {
            key: record.key,
            config: record.config,
            throttle,
        }
    }
}

/// Interface as stored in the recovery record (no in-flight counters).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InterfaceRecord {
    pub key: InterfaceKey,
    pub config: InterfaceConfig,
    pub ceiling: usize,
    pub delay_secs: u64,
    pub failed: bool,
}

/// Interfaces in rotation order.
#[derive(Debug, Clone, Default)]
pub struct InterfacePool {
    interfaces: Vec<Interface>,
}

impl InterfacePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an interface. Returns false if its identity is already taken.
    pub fn add(&mut self, key: InterfaceKey, config: InterfaceConfig) -> bool {
        if self.interfaces.iter().any(|i| i.key == key) {
            return false;
        }
        tracing::info!(
            "interface {} registered (max_conns={}, adaptive={})",
            key,
            config.max_conns,
            config.adaptive
        );
        self.interfaces.push(Interface::new(key, config));
        true
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter()
    }

    pub fn get(&self, key: &InterfaceKey) -> Option<&Interface> {
        self.interfaces.iter().find(|i| &i.key == key)
    }

    pub fn get_mut(&mut self, key: &InterfaceKey) -> Option<&mut Interface> {
        self.interfaces.iter_mut().find(|i| &i.key == key)
    }

    /// Position of the first ready interface in rotation order.
    pub fn next_ready(&self, now: Instant) -> Option<usize> {
        self.interfaces.iter().position(|i| i.ready(now))
    }

    /// Move the interface at `index` to the back of the rotation and return it.
    pub fn rotate(&mut self, index: usize) -> &mut Interface {
        let iface = self.interfaces.remove(index);
        self.interfaces.push(iface);
        let last = self.interfaces.len() - 1;
        &mut self.interfaces[last]
    }

    /// Requests currently outstanding across all interfaces.
    pub fn active(&self) -> usize {
        self.interfaces.iter().map(|i| i.throttle.active).sum()
    }

    pub fn records(&self) -> Vec<InterfaceRecord> {
        self.interfaces.iter().map(Interface::to_record).collect()
    }

    pub fn restore(records: Vec<InterfaceRecord>) -> Self {
        let mut pool = Self::new();
        for r in records {
            if pool.get(&r.key).is_none() {
                pool.interfaces.push(Interface::from_record(r));
            }
        }
        pool
    }
}
