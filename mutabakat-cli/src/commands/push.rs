//! Push registry commands

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use mutabakat_core::{HttpRegistry, Registry, ServerKeyMaterial};

use super::ConnectionArgs;

/// Arguments for the push command
#[derive(Debug, Args)]
pub struct PushArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: PushCommand,
}

/// Push subcommands
#[derive(Debug, Subcommand)]
pub enum PushCommand {
    /// Show the server key and whether push is enabled for this user
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask the server to send a test notification
    Test,
    /// Remove a registered endpoint from the registry
    Unsubscribe {
        /// Push service endpoint URL
        endpoint: String,
    },
}

/// Run the push command
pub async fn run(args: PushArgs) -> Result<()> {
    let config = args.connection.resolve_config()?;
    let credential = args.connection.credential()?;
    let registry = HttpRegistry::new(config.api_base);

    match args.command {
        PushCommand::Status { json } => {
            let status = registry
                .status(&credential)
                .await
                .context("Failed to fetch push status")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
                return Ok(());
            }

            let key_check = match ServerKeyMaterial::from_base64url(&status.vapid_public_key) {
                Ok(_) => "valid P-256 key".to_string(),
                Err(e) => e.to_string(),
            };
            println!("Server key: {} ({})", status.vapid_public_key, key_check);
            println!("Enabled:    {}", status.enabled);
        }
        PushCommand::Test => {
            registry
                .send_test(&credential)
                .await
                .context("Failed to send test notification")?;
            println!("Test notification requested");
        }
        PushCommand::Unsubscribe { endpoint } => {
            registry
                .unsubscribe(&credential, &endpoint)
                .await
                .context("Failed to unsubscribe endpoint")?;
            println!("Unsubscribed {}", endpoint);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        push: PushArgs,
    }

    #[test]
    fn test_status_parses() {
        let cli = TestCli::try_parse_from(["test", "status", "--json"]).unwrap();
        assert!(matches!(cli.push.command, PushCommand::Status { json: true }));
    }

    #[test]
    fn test_unsubscribe_requires_endpoint() {
        assert!(TestCli::try_parse_from(["test", "unsubscribe"]).is_err());

        let cli = TestCli::try_parse_from([
            "test",
            "--api-base",
            "https://mutabakat.example.com/api/",
            "unsubscribe",
            "https://push.example.com/abc",
        ])
        .unwrap();
        assert!(matches!(
            cli.push.command,
            PushCommand::Unsubscribe { ref endpoint } if endpoint == "https://push.example.com/abc"
        ));
    }
}
