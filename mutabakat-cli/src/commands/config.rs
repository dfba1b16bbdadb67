//! Configuration inspection

use crate::config::ConfigLoader;
use anyhow::Result;
use clap::{Args, Subcommand};
use mutabakat_core::live::live_channel_url;
use mutabakat_core::{ClientConfig, Credential};

use super::ConnectionArgs;

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration (files merged, flags applied)
    Show {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Show configuration file paths and whether they exist
    Path,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show { connection } => show_config(&connection.resolve_config()?),
        ConfigCommands::Path => show_paths(),
    }
}

fn show_config(config: &ClientConfig) -> Result<()> {
    println!("{}", toml::to_string_pretty(config)?);
    println!("# live channel: {}", live_endpoint(config));
    Ok(())
}

/// Live channel URL with the token elided
fn live_endpoint(config: &ClientConfig) -> String {
    match live_channel_url(&config.origin, &Credential::new("...")) {
        Ok(url) => url.to_string(),
        Err(e) => format!("unavailable ({})", e),
    }
}

fn show_paths() -> Result<()> {
    let describe = |path: &std::path::Path| {
        let state = if path.exists() { "found" } else { "not found" };
        format!("{} ({})", path.display(), state)
    };

    match ConfigLoader::user_config_path() {
        Some(path) => println!("User config:    {}", describe(&path)),
        None => println!("User config:    no home directory"),
    }
    println!(
        "Project config: {}",
        describe(&ConfigLoader::project_config_path())
    );
    Ok(())
}
