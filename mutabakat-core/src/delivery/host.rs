//! Platform seam for the delivery agent

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::payload::PresentedNotification;
use crate::error::PlatformError;

/// An open application window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
}

/// What the background worker can ask of the platform
#[async_trait]
pub trait WorkerHost: Send + Sync {
    async fn show_notification(&self, notification: &PresentedNotification)
    -> Result<(), PlatformError>;

    async fn close_notification(&self, notification: &PresentedNotification);

    /// Every window of this origin, including ones the worker does not control
    async fn windows(&self) -> Result<Vec<WindowClient>, PlatformError>;

    async fn focus(&self, window: &WindowClient) -> Result<(), PlatformError>;

    async fn open_window(&self, url: &Url) -> Result<(), PlatformError>;

    /// Take control of already open windows
    async fn claim_clients(&self) -> Result<(), PlatformError>;
}
