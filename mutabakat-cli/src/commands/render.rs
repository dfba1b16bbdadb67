//! Render a push payload the way the background agent would

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Args;
use mutabakat_core::{
    Activation, DeliveryAgent, PlatformError, PresentedNotification, WindowClient, WorkerHost,
};
use url::Url;

use super::ConnectionArgs;

/// Arguments for the render command
#[derive(Debug, Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Payload text; read from --file or stdin when omitted
    pub payload: Option<String>,

    /// Read the payload from a file
    #[arg(long, conflicts_with = "payload")]
    pub file: Option<PathBuf>,

    /// Simulate a click, optionally on a named action (open, close)
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    pub click: Option<String>,

    /// URL of an already open window (repeatable)
    #[arg(long = "window")]
    pub windows: Vec<String>,
}

/// Host that prints instead of touching a real platform
pub struct ConsoleHost {
    windows: Vec<WindowClient>,
}

impl ConsoleHost {
    pub fn new(urls: &[String]) -> Self {
        let windows = urls
            .iter()
            .enumerate()
            .map(|(i, url)| WindowClient {
                id: format!("window-{}", i + 1),
                url: url.clone(),
            })
            .collect();
        Self { windows }
    }
}

#[async_trait]
impl WorkerHost for ConsoleHost {
    async fn show_notification(
        &self,
        notification: &PresentedNotification,
    ) -> Result<(), PlatformError> {
        let json = serde_json::to_string_pretty(notification)
            .map_err(|e| PlatformError::Failed(e.to_string()))?;
        println!("{}", json);
        Ok(())
    }

    async fn close_notification(&self, notification: &PresentedNotification) {
        println!("close notification {}", notification.tag);
    }

    async fn windows(&self) -> Result<Vec<WindowClient>, PlatformError> {
        Ok(self.windows.clone())
    }

    async fn focus(&self, window: &WindowClient) -> Result<(), PlatformError> {
        println!("focus {} ({})", window.id, window.url);
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<(), PlatformError> {
        println!("open {}", url);
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), PlatformError> {
        Ok(())
    }
}

/// Run the render command
pub async fn run(args: RenderArgs) -> Result<()> {
    let config = args.connection.resolve_config()?;
    let payload = read_payload(&args)?;

    let host = Arc::new(ConsoleHost::new(&args.windows));
    let agent = DeliveryAgent::new(config.origin, host);
    let notification = agent
        .on_push(&payload)
        .await
        .context("Failed to present notification")?;

    if let Some(action) = &args.click {
        let action = (!action.is_empty()).then_some(action.as_str());
        let activation = agent
            .on_notification_click(&notification, action)
            .await
            .context("Failed to handle click")?;
        println!("{}", describe(&activation));
    }
    Ok(())
}

fn read_payload(args: &RenderArgs) -> Result<Vec<u8>> {
    if let Some(payload) = &args.payload {
        return Ok(payload.clone().into_bytes());
    }
    if let Some(path) = &args.file {
        return std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()));
    }
    let mut buffer = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read payload from stdin")?;
    Ok(buffer)
}

fn describe(activation: &Activation) -> String {
    match activation {
        Activation::Dismissed => "dismissed".to_string(),
        Activation::Focused { window, url } => format!("focused {} at {}", window, url),
        Activation::Opened { url } => format!("opened {}", url),
    }
}
