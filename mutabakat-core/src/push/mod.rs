//! Push subscription registration
//!
//! [`PushRegistrationManager`] keeps the platform push subscription and the
//! remote registry record consistent.

mod manager;
pub mod mock;
mod platform;
mod registry;
mod types;

pub use manager::PushRegistrationManager;
pub use platform::{Capabilities, Permission, PushPlatform};
pub use registry::{HttpRegistry, Registry, RegistryStatus, SubscribeRequest};
pub use types::{
    DeviceDescriptor, NotReady, Outcome, PlatformSubscription, PushStatus, Readiness,
    ServerKeyMaterial, Subscription, SubscriptionKeys, WireKeys,
};
