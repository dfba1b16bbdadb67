//! Notification model shared by the live channel and the delivery agent

mod route;
mod types;

pub use route::{DEFAULT_ROUTE, RECONCILIATION_ROUTE, route_for};
pub use types::{EventKind, InboundEvent, NotificationData};
