use std::fmt;

/// Egress identity of an interface: source address (None = the default
/// route) plus an optional proxy. At most one interface per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct InterfaceKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

impl InterfaceKey {
    pub fn new(address: Option<String>, proxy: Option<String>) -> Self {
        Self {
            address: address.filter(|a| !a.is_empty() && a != "0"),
            proxy: proxy.filter(|p| !p.is_empty()),
        }
    }

    /// The local default route, no proxy.
    pub fn local() -> Self {
        Self::default()
    }
}

impl fmt::Display for InterfaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addr = self.address.as_deref().unwrap_or("default");
        match &self.proxy {
            Some(p) => write!(f, "{addr}-{p}"),
            None => write!(f, "{addr}"),
        }
    }
}
