pub mod config;
pub mod listen;
pub mod push;
pub mod render;

use anyhow::{Result, bail};
use clap::Args;
use mutabakat_core::{ClientConfig, Credential};
use url::Url;

use crate::config::ConfigLoader;

/// Where to reach the application and who to act as
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Application origin (overrides config)
    #[arg(long)]
    pub origin: Option<Url>,

    /// REST API base URL (overrides config)
    #[arg(long)]
    pub api_base: Option<Url>,

    /// Session token
    #[arg(long, env = "MUTABAKAT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl ConnectionArgs {
    /// Load config files, then apply flags on top
    pub fn resolve_config(&self) -> Result<ClientConfig> {
        let mut config = ConfigLoader::load()?;
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut ClientConfig) {
        if let Some(origin) = &self.origin {
            config.origin = origin.clone();
        }
        if let Some(api_base) = &self.api_base {
            config.api_base = api_base.clone();
        }
    }

    /// The session token, or an error telling the user how to pass one
    pub fn credential(&self) -> Result<Credential> {
        let credential = Credential::new(self.token.clone().unwrap_or_default());
        if credential.is_empty() {
            bail!("No session token: pass --token or set MUTABAKAT_TOKEN");
        }
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = ConnectionArgs {
            origin: Some(Url::parse("https://flag.example.com").unwrap()),
            api_base: None,
            token: None,
        };
        let mut config = ClientConfig::default();
        args.apply(&mut config);

        assert_eq!(config.origin.as_str(), "https://flag.example.com/");
        assert_eq!(config.api_base, ClientConfig::default().api_base);
    }

    #[test]
    fn test_blank_token_is_rejected() {
        let args = ConnectionArgs {
            token: Some("   ".to_string()),
            ..ConnectionArgs::default()
        };
        assert!(args.credential().is_err());
        assert!(ConnectionArgs::default().credential().is_err());
    }

    #[test]
    fn test_token_becomes_credential() {
        let args = ConnectionArgs {
            token: Some("abc".to_string()),
            ..ConnectionArgs::default()
        };
        assert_eq!(args.credential().unwrap().token(), "abc");
    }
}
