//! Live notification channel
//!
//! One persistent WebSocket per application instance, kept alive with a text
//! probe and reconnected after a fixed delay whenever it drops.

mod manager;
mod state;
mod transport;

pub use manager::{LIVE_CHANNEL_PATH, LiveChannelManager, PING_MESSAGE, live_channel_url};
pub use state::LiveChannelState;
pub use transport::{Connector, Transport, WsConnector, WsTransport};
