use super::types::{RawLiveConfig, RawMutabakatConfig, RawShellCacheConfig};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use mutabakat_core::{ClientConfig, LiveChannelConfig, ShellCacheConfig};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<ClientConfig> {
        Self::load_from(
            Self::user_config_path().as_deref(),
            &Self::project_config_path(),
        )
    }

    /// Load from explicit paths; missing files are skipped
    pub fn load_from(user_path: Option<&Path>, project_path: &Path) -> Result<ClientConfig> {
        let mut raw = RawMutabakatConfig::default();

        // Layer 1: User config
        if let Some(user_path) = user_path
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read(user_path)?);
        }

        // Layer 2: Project config
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read(project_path)?);
        }

        // Convert to final config with defaults applied
        Ok(Self::finalize(raw))
    }

    fn read(path: &Path) -> Result<RawMutabakatConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "mutabakat").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with MUTABAKAT_PROJECT_CONFIG_DIR (useful for isolated e2e tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("MUTABAKAT_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".mutabakat/config.toml")
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawMutabakatConfig, overlay: RawMutabakatConfig) -> RawMutabakatConfig {
        RawMutabakatConfig {
            origin: overlay.origin.or(base.origin),
            api_base: overlay.api_base.or(base.api_base),
            live: RawLiveConfig {
                ping_interval_secs: overlay
                    .live
                    .ping_interval_secs
                    .or(base.live.ping_interval_secs),
                reconnect_delay_secs: overlay
                    .live
                    .reconnect_delay_secs
                    .or(base.live.reconnect_delay_secs),
            },
            shell_cache: RawShellCacheConfig {
                name: overlay.shell_cache.name.or(base.shell_cache.name),
                assets: overlay.shell_cache.assets.or(base.shell_cache.assets),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawMutabakatConfig) -> ClientConfig {
        let defaults = ClientConfig::default();
        let live_defaults = LiveChannelConfig::default();
        let cache_defaults = ShellCacheConfig::default();

        ClientConfig {
            origin: raw.origin.unwrap_or(defaults.origin),
            api_base: raw.api_base.unwrap_or(defaults.api_base),
            live: LiveChannelConfig {
                ping_interval_secs: raw
                    .live
                    .ping_interval_secs
                    .unwrap_or(live_defaults.ping_interval_secs),
                reconnect_delay_secs: raw
                    .live
                    .reconnect_delay_secs
                    .unwrap_or(live_defaults.reconnect_delay_secs),
            },
            shell_cache: ShellCacheConfig {
                name: raw.shell_cache.name.unwrap_or(cache_defaults.name),
                assets: raw.shell_cache.assets.unwrap_or(cache_defaults.assets),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_files_yield_defaults() {
        let dir = TempDir::new().unwrap();
        let config =
            ConfigLoader::load_from(Some(&dir.path().join("user.toml")), &dir.path().join("p.toml"))
                .unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_project_overrides_user() {
        let dir = TempDir::new().unwrap();
        let user = write(
            &dir,
            "user.toml",
            r#"
origin = "https://user.example.com"
api_base = "https://user.example.com/api/"

[live]
ping_interval_secs = 45
"#,
        );
        let project = write(
            &dir,
            "project.toml",
            r#"
origin = "https://project.example.com"

[shell_cache]
name = "mutabakat-v2"
"#,
        );

        let config = ConfigLoader::load_from(Some(&user), &project).unwrap();

        assert_eq!(config.origin.as_str(), "https://project.example.com/");
        assert_eq!(config.api_base.as_str(), "https://user.example.com/api/");
        assert_eq!(config.live.ping_interval_secs, 45);
        assert_eq!(config.live.reconnect_delay_secs, 5);
        assert_eq!(config.shell_cache.name, "mutabakat-v2");
        assert_eq!(config.shell_cache.assets, ShellCacheConfig::default().assets);
    }

    #[test]
    fn test_user_only() {
        let dir = TempDir::new().unwrap();
        let user = write(&dir, "user.toml", "[live]\nreconnect_delay_secs = 2\n");

        let config = ConfigLoader::load_from(Some(&user), &dir.path().join("none.toml")).unwrap();
        assert_eq!(config.live.reconnect_delay_secs, 2);
        assert_eq!(config.origin, ClientConfig::default().origin);
    }

    #[test]
    fn test_invalid_file_names_path_in_error() {
        let dir = TempDir::new().unwrap();
        let project = write(&dir, "broken.toml", "origin = [");

        let err = ConfigLoader::load_from(None, &project).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.toml"));
    }

    #[test]
    fn test_merge_overlay_wins_only_when_set() {
        let base = RawMutabakatConfig {
            live: RawLiveConfig {
                ping_interval_secs: Some(10),
                reconnect_delay_secs: Some(3),
            },
            ..RawMutabakatConfig::default()
        };
        let overlay = RawMutabakatConfig {
            live: RawLiveConfig {
                ping_interval_secs: None,
                reconnect_delay_secs: Some(7),
            },
            ..RawMutabakatConfig::default()
        };

        let merged = ConfigLoader::merge_raw(base, overlay);
        assert_eq!(merged.live.ping_interval_secs, Some(10));
        assert_eq!(merged.live.reconnect_delay_secs, Some(7));
    }

    #[test]
    fn test_user_config_path_names_app() {
        if let Some(path) = ConfigLoader::user_config_path() {
            assert!(path.ends_with("config.toml"));
            assert!(path.to_string_lossy().contains("mutabakat"));
        }
    }
}
