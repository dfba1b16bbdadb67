use serde::Deserialize;
use url::Url;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawMutabakatConfig {
    /// Origin of the web application
    pub origin: Option<Url>,

    /// Base URL of the REST API
    pub api_base: Option<Url>,

    #[serde(default)]
    pub live: RawLiveConfig,

    #[serde(default)]
    pub shell_cache: RawShellCacheConfig,
}

/// Live channel config as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawLiveConfig {
    pub ping_interval_secs: Option<u64>,
    pub reconnect_delay_secs: Option<u64>,
}

/// Shell cache config as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawShellCacheConfig {
    pub name: Option<String>,
    pub assets: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_config_partial_parsing() {
        let toml_str = r#"
origin = "https://mutabakat.example.com"

[live]
reconnect_delay_secs = 10
"#;
        let raw: RawMutabakatConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(
            raw.origin.as_ref().map(Url::as_str),
            Some("https://mutabakat.example.com/")
        );
        assert!(raw.api_base.is_none());
        assert_eq!(raw.live.reconnect_delay_secs, Some(10));
        assert!(raw.live.ping_interval_secs.is_none());
        assert!(raw.shell_cache.name.is_none());
    }

    #[test]
    fn test_raw_config_empty_uses_none() {
        let raw: RawMutabakatConfig = toml::from_str("").unwrap();

        assert!(raw.origin.is_none());
        assert!(raw.live.ping_interval_secs.is_none());
        assert!(raw.shell_cache.assets.is_none());
    }

    #[test]
    fn test_raw_config_rejects_invalid_url() {
        let result: Result<RawMutabakatConfig, _> = toml::from_str(r#"origin = "not a url""#);
        assert!(result.is_err());
    }
}
