//! Client configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Origin the application is served from when nothing else is configured
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Registry API base when nothing else is configured
pub const DEFAULT_API_BASE: &str = "http://localhost:3000/api/";

/// Configuration shared by the notification managers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Origin of the web application (used for routing and the live channel)
    #[serde(default = "default_origin")]
    pub origin: Url,

    /// Base URL of the REST API that hosts the push registry
    #[serde(default = "default_api_base")]
    pub api_base: Url,

    #[serde(default)]
    pub live: LiveChannelConfig,

    #[serde(default)]
    pub shell_cache: ShellCacheConfig,
}

/// Timing of the live channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveChannelConfig {
    /// Seconds between keep-alive probes while connected
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,

    /// Seconds to wait before reconnecting after the transport closes
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
}

/// Offline application shell cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShellCacheConfig {
    /// Versioned cache name; any other cache name is purged on activation
    #[serde(default = "default_cache_name")]
    pub name: String,

    /// Assets stored on install
    #[serde(default = "default_shell_assets")]
    pub assets: Vec<String>,
}

fn default_origin() -> Url {
    Url::parse(DEFAULT_ORIGIN).expect("default origin is a valid URL")
}

fn default_api_base() -> Url {
    Url::parse(DEFAULT_API_BASE).expect("default API base is a valid URL")
}

fn default_ping_interval() -> u64 {
    30
}

fn default_reconnect_delay() -> u64 {
    5
}

fn default_cache_name() -> String {
    "mutabakat-v1".to_string()
}

fn default_shell_assets() -> Vec<String> {
    ["/", "/index.html", "/manifest.json", "/icon-192x192.png", "/badge-72x72.png"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            api_base: default_api_base(),
            live: LiveChannelConfig::default(),
            shell_cache: ShellCacheConfig::default(),
        }
    }
}

impl Default for LiveChannelConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval(),
            reconnect_delay_secs: default_reconnect_delay(),
        }
    }
}

impl Default for ShellCacheConfig {
    fn default() -> Self {
        Self {
            name: default_cache_name(),
            assets: default_shell_assets(),
        }
    }
}

impl LiveChannelConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

impl ClientConfig {
    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
