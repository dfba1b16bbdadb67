//! Background delivery agent
//!
//! Each push payload walks `Idle -> PayloadReceived -> Presented` and ends in
//! `Dismissed` or `Activated`, after which the agent is idle again. The agent
//! keeps nothing between payloads; the notification itself carries everything
//! the click handler needs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use super::cache::{CachedResponse, ShellCache};
use super::host::WorkerHost;
use super::payload::{CLOSE_ACTION, PresentedNotification};
use crate::error::PlatformError;
use crate::notifications::DEFAULT_ROUTE;

/// Where a payload is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    #[default]
    Idle,
    PayloadReceived,
    Presented,
    Dismissed,
    Activated,
}

/// Result of a notification click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The close action was chosen
    Dismissed,
    /// An open window already showed the target
    Focused { window: String, url: Url },
    /// A new window was opened at the target
    Opened { url: Url },
}

impl Activation {
    pub fn state(&self) -> DeliveryState {
        match self {
            Self::Dismissed => DeliveryState::Dismissed,
            Self::Focused { .. } | Self::Opened { .. } => DeliveryState::Activated,
        }
    }
}

/// Renders push payloads and routes clicks back into the application
pub struct DeliveryAgent {
    origin: Url,
    host: Arc<dyn WorkerHost>,
    shell: Option<ShellCache>,
}

impl DeliveryAgent {
    pub fn new(origin: Url, host: Arc<dyn WorkerHost>) -> Self {
        Self {
            origin,
            host,
            shell: None,
        }
    }

    /// Attach the offline shell cache
    pub fn with_shell_cache(mut self, shell: ShellCache) -> Self {
        self.shell = Some(shell);
        self
    }

    /// Normalize a payload and show it
    ///
    /// Normalization cannot fail; only the host refusing to show is an error.
    pub async fn on_push(&self, payload: &[u8]) -> Result<PresentedNotification, PlatformError> {
        debug!(
            "Delivery state {:?} -> {:?} ({} bytes)",
            DeliveryState::Idle,
            DeliveryState::PayloadReceived,
            payload.len()
        );
        let notification = PresentedNotification::from_payload(payload);

        self.host.show_notification(&notification).await?;
        debug!(
            "Delivery state {:?} -> {:?}: {}",
            DeliveryState::PayloadReceived,
            DeliveryState::Presented,
            notification.title
        );
        Ok(notification)
    }

    /// Handle a click on the notification body or one of its actions
    ///
    /// The notification is closed whatever happens next. The close action
    /// does nothing more; anything else focuses a window already showing the
    /// target or opens exactly one new window.
    pub async fn on_notification_click(
        &self,
        notification: &PresentedNotification,
        action: Option<&str>,
    ) -> Result<Activation, PlatformError> {
        self.host.close_notification(notification).await;

        if action == Some(CLOSE_ACTION) {
            debug!("Notification {} dismissed by action", notification.tag);
            return Ok(Activation::Dismissed);
        }

        let target = self.resolve(&notification.route());
        for window in self.host.windows().await? {
            if window.url == target.as_str() {
                info!("Focusing window {} at {}", window.id, target);
                self.host.focus(&window).await?;
                return Ok(Activation::Focused {
                    window: window.id,
                    url: target,
                });
            }
        }

        info!("Opening window at {}", target);
        self.host.open_window(&target).await?;
        Ok(Activation::Opened { url: target })
    }

    /// The notification went away without being activated
    pub fn on_notification_close(&self, notification: &PresentedNotification) -> DeliveryState {
        debug!("Notification {} closed", notification.tag);
        DeliveryState::Dismissed
    }

    /// Fill the current shell cache version; returns how many assets were stored
    pub async fn on_install(&self) -> usize {
        match &self.shell {
            Some(shell) => shell.install().await,
            None => 0,
        }
    }

    /// Purge stale caches and take control of open windows
    pub async fn on_activate(&self) -> Vec<String> {
        let purged = match &self.shell {
            Some(shell) => shell.activate().await,
            None => Vec::new(),
        };
        if let Err(e) = self.host.claim_clients().await {
            warn!("Failed to claim open windows: {}", e);
        }
        purged
    }

    /// Answer a fetch, cache first when a shell cache is attached
    pub async fn on_fetch(&self, url: &Url) -> Result<CachedResponse, PlatformError> {
        match &self.shell {
            Some(shell) => shell.fetch(url).await,
            None => Err(PlatformError::Unavailable("shell cache".into())),
        }
    }

    fn resolve(&self, route: &str) -> Url {
        match self.origin.join(route) {
            Ok(url) => url,
            Err(e) => {
                warn!("Cannot resolve route {}: {}, using root", route, e);
                let mut root = self.origin.clone();
                root.set_path(DEFAULT_ROUTE);
                root.set_query(None);
                root.set_fragment(None);
                root
            }
        }
    }
}
