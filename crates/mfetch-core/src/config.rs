use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Response code sets used to classify completed transfers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeConfig {
    /// Codes that count as a successful fetch.
    pub success: Vec<u32>,
    /// Codes that are retried later (0 = transport failure or timeout).
    pub fail: Vec<u32>,
    /// Codes that are handed to the redirect handler.
    pub redirect: Vec<u32>,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            success: vec![200],
            fail: vec![0, 118, 204, 300, 310, 500, 501, 502, 503, 504, 505, 507, 509],
            redirect: vec![301, 302, 303, 307],
        }
    }
}

/// Defaults applied to every interface field the caller leaves unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDefaults {
    /// User-agent pool; one is picked at random per request. Empty = curl default.
    #[serde(default)]
    pub user_agents: Vec<String>,
    /// Hard cap on simultaneous connections per interface.
    pub max_conns: usize,
    /// Start at one connection and let the interface tune itself.
    pub adaptive: bool,
    /// Upper bound of the inter-request delay in seconds (adaptive mode only).
    pub max_delay_secs: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for InterfaceDefaults {
    fn default() -> Self {
        Self {
            user_agents: Vec::new(),
            max_conns: 1,
            adaptive: true,
            max_delay_secs: 120,
            timeout_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/mfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Failed attempts allowed per URL before it goes to the error file.
    pub max_retry: u32,
    /// New URLs spill to the overflow file above this memory ratio.
    pub max_memory_usage_ratio: f64,
    /// Memory limit the ratio is computed against (None = total system memory).
    #[serde(default)]
    pub memory_limit_bytes: Option<u64>,
    /// Marker file whose presence interrupts a running fetch.
    pub stop_file: PathBuf,
    #[serde(default)]
    pub codes: CodeConfig,
    #[serde(default)]
    pub interface_defaults: InterfaceDefaults,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retry: 5,
            max_memory_usage_ratio: 0.8,
            memory_limit_bytes: None,
            stop_file: PathBuf::from(".STOP"),
            codes: CodeConfig::default(),
            interface_defaults: InterfaceDefaults::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
