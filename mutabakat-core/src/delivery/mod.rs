//! Background delivery of push notifications
//!
//! Runs without any UI: renders push payloads as notifications, routes clicks
//! back into the application and keeps the offline shell cache.

mod agent;
mod cache;
mod host;
pub mod mock;
mod payload;

pub use agent::{Activation, DeliveryAgent, DeliveryState};
pub use cache::{CacheStorage, CachedResponse, HttpNetwork, MemoryCache, Network, ShellCache};
pub use host::{WindowClient, WorkerHost};
pub use payload::{
    CLOSE_ACTION, DEFAULT_BADGE, DEFAULT_BODY, DEFAULT_ICON, DEFAULT_TAG, DEFAULT_TITLE,
    NotificationAction, OPEN_ACTION, PresentedNotification, VIBRATION_PATTERN,
};
