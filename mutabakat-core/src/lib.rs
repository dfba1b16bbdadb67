//! mutabakat-core: notification delivery core for the mutabakat application
//!
//! This crate provides the three notification paths of the client:
//!
//! - **Push registration** - [`PushRegistrationManager`] keeps the platform push
//!   subscription and the remote registry record consistent
//! - **Background delivery** - [`DeliveryAgent`] renders push payloads and routes
//!   clicks back into the application
//! - **Live channel** - [`LiveChannelManager`] keeps one WebSocket open while the
//!   application runs, with a keep-alive probe and automatic reconnect
//! - **Notification model** - [`InboundEvent`] and [`route_for`] shared by both
//!   delivery paths
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mutabakat_core::{ClientConfig, Credential, InboundEvent, LiveChannelManager, WsConnector};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::default();
//!     let (mut live, mut events) =
//!         LiveChannelManager::spawn(&config.origin, config.live, Arc::new(WsConnector::new()))?;
//!
//!     live.connect(Credential::new("session-token"));
//!     if let Some(message) = events.recv().await
//!         && let Some(event) = InboundEvent::from_message(&message)
//!     {
//!         println!("{} -> {}", event.title, event.route());
//!     }
//!
//!     live.teardown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────┐
//!                 │ CredentialSource │
//!                 └────────┬─────────┘
//!            ┌─────────────┴─────────────┐
//!            ▼                           ▼
//! ┌───────────────────────┐   ┌──────────────────────┐
//! │PushRegistrationManager│   │  LiveChannelManager  │
//! │  PushPlatform/Registry│   │  Connector/Transport │
//! └───────────┬───────────┘   └──────────┬───────────┘
//!             ▼ push payload             ▼ JSON objects
//! ┌───────────────────────┐   ┌──────────────────────┐
//! │     DeliveryAgent     │   │     InboundEvent     │
//! │ WorkerHost/ShellCache │   │                      │
//! └───────────────────────┘   └──────────────────────┘
//! ```

pub mod config;
pub mod credential;
pub mod delivery;
pub mod error;
pub mod live;
pub mod notifications;
pub mod push;

// Re-export key types for convenience
pub use config::{ClientConfig, LiveChannelConfig, ShellCacheConfig};
pub use credential::{Credential, CredentialSource, SharedCredential};
pub use delivery::{
    Activation, DeliveryAgent, DeliveryState, PresentedNotification, ShellCache, WindowClient,
    WorkerHost,
};
pub use error::{ConfigError, LiveError, MutabakatError, PlatformError, PushError, RegistryError};
pub use live::{Connector, LiveChannelManager, LiveChannelState, Transport, WsConnector};
pub use notifications::{EventKind, InboundEvent, NotificationData, route_for};
pub use push::{
    HttpRegistry, NotReady, Outcome, PushPlatform, PushRegistrationManager, PushStatus, Readiness,
    Registry, ServerKeyMaterial, Subscription,
};
