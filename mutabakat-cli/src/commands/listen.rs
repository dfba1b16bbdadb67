//! Follow the live notification channel

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use mutabakat_core::{InboundEvent, LiveChannelManager, WsConnector};
use serde_json::Value;
use tracing::info;

use super::ConnectionArgs;

/// Arguments for the listen command
#[derive(Debug, Args)]
pub struct ListenArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Print raw JSON messages instead of normalized events
    #[arg(long)]
    pub json: bool,
}

/// Run until interrupted, printing every inbound message
pub async fn run(args: ListenArgs) -> Result<()> {
    let config = args.connection.resolve_config()?;
    let credential = args.connection.credential()?;

    let (mut manager, mut events) =
        LiveChannelManager::spawn(&config.origin, config.live, Arc::new(WsConnector::new()))
            .context("Failed to start live channel")?;
    let mut state = manager.watch_state();

    info!("Listening on {}", config.origin);
    manager.connect(credential);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                if current.is_connected() {
                    info!("Live channel connected to {}", config.origin);
                } else {
                    info!("Live channel {:?}", current);
                }
            }
            message = events.recv() => match message {
                Some(message) => println!("{}", format_message(&message, args.json)),
                None => break,
            },
        }
    }

    manager.teardown().await;
    Ok(())
}

fn format_message(message: &Value, raw: bool) -> String {
    if raw {
        return message.to_string();
    }
    match InboundEvent::from_message(message) {
        Some(event) => format_event(&event),
        None => message.to_string(),
    }
}

fn format_event(event: &InboundEvent) -> String {
    let kind = match event.kind.as_tag() {
        "" => "notification",
        tag => tag,
    };
    format!("[{}] {}: {} -> {}", kind, event.title, event.body, event.route())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        listen: ListenArgs,
    }

    #[test]
    fn test_parses_flags() {
        let cli = TestCli::try_parse_from([
            "test",
            "--origin",
            "https://mutabakat.example.com",
            "--token",
            "abc",
            "--json",
        ])
        .unwrap();

        assert!(cli.listen.json);
        assert_eq!(cli.listen.connection.token.as_deref(), Some("abc"));
        assert!(cli.listen.connection.origin.is_some());
    }

    #[test]
    fn test_rejects_invalid_origin() {
        assert!(TestCli::try_parse_from(["test", "--origin", "not a url"]).is_err());
    }

    #[test]
    fn test_formats_reconciliation_event() {
        let message = json!({
            "type": "mutabakat_sent",
            "title": "Gönderildi",
            "message": "Mutabakat gönderildi",
            "data": { "mutabakat_no": 12 }
        });
        assert_eq!(
            format_message(&message, false),
            "[mutabakat_sent] Gönderildi: Mutabakat gönderildi -> /mutabakat?search=12"
        );
    }

    #[test]
    fn test_formats_untagged_event() {
        let message = json!({ "title": "Duyuru", "body": "Bakım" });
        assert_eq!(format_message(&message, false), "[notification] Duyuru: Bakım -> /");
    }

    #[test]
    fn test_raw_output_is_json() {
        let message = json!({ "a": 1 });
        assert_eq!(format_message(&message, true), r#"{"a":1}"#);
    }
}
