//! Platform seam for push registration
//!
//! Everything the browser (or any other host runtime) provides to the push
//! registration manager: capability detection, the permission prompt, worker
//! registration and the push subscription object itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::{DeviceDescriptor, PlatformSubscription, ServerKeyMaterial};
use crate::error::PlatformError;

/// Platform features push notifications depend on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Can host a background worker
    pub worker_hosting: bool,
    /// Exposes a push delivery API
    pub push: bool,
    /// Can show user-facing notifications
    pub notifications: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            worker_hosting: true,
            push: true,
            notifications: true,
        }
    }

    /// All three capabilities are present
    pub fn is_complete(&self) -> bool {
        self.worker_hosting && self.push && self.notifications
    }
}

/// Answer to the notification permission prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Granted,
    Denied,
    /// The prompt was closed without an answer
    Dismissed,
}

/// Host runtime operations used by [`super::PushRegistrationManager`]
#[async_trait]
pub trait PushPlatform: Send + Sync {
    /// Single capability query
    fn capabilities(&self) -> Capabilities;

    /// Describe this device for the registry
    fn device(&self) -> DeviceDescriptor;

    /// Ask the user for notification permission
    async fn request_permission(&self) -> Permission;

    /// Register the background worker and wait until it is active
    async fn register_worker(&self) -> Result<(), PlatformError>;

    /// Subscription the platform already holds, if any
    async fn existing_subscription(&self) -> Result<Option<PlatformSubscription>, PlatformError>;

    /// Create a subscription bound to the server key
    async fn create_subscription(
        &self,
        server_key: &ServerKeyMaterial,
    ) -> Result<PlatformSubscription, PlatformError>;

    /// Invalidate a subscription locally
    async fn invalidate_subscription(
        &self,
        subscription: &PlatformSubscription,
    ) -> Result<(), PlatformError>;
}
