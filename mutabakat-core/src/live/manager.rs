//! Live channel manager
//!
//! The manager is a handle to an actor task that owns the transport and both
//! timers. Commands are processed in order by that task, so a liveness probe
//! can never race a teardown.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::state::LiveChannelState;
use super::transport::{Connector, Transport};
use crate::config::LiveChannelConfig;
use crate::credential::Credential;
use crate::error::LiveError;

/// Path of the notification WebSocket, relative to the application origin
pub const LIVE_CHANNEL_PATH: &str = "/ws/notifications";

/// Keep-alive probe sent while connected
pub const PING_MESSAGE: &str = "ping";

/// Build the live channel URL for an origin
///
/// `https` origins get `wss`, `http` origins get `ws`. The credential travels
/// in the `token` query parameter.
pub fn live_channel_url(origin: &Url, credential: &Credential) -> Result<Url, LiveError> {
    let scheme = match origin.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => return Err(LiveError::UnsupportedScheme(other.to_string())),
    };

    let mut url = origin.join(LIVE_CHANNEL_PATH)?;
    url.set_scheme(scheme)
        .map_err(|_| LiveError::UnsupportedScheme(origin.scheme().to_string()))?;
    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .append_pair("token", credential.token());
    Ok(url)
}

enum Command {
    Connect(Credential),
    Send(String),
}

/// How a connection phase ended
enum Step {
    /// Transport closed or never opened; schedule a reconnect
    Closed,
    /// Teardown requested
    Shutdown,
}

/// Handle to the live channel of one application instance
pub struct LiveChannelManager {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<LiveChannelState>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LiveChannelManager {
    /// Start the manager in `Disconnected`
    ///
    /// Returns the handle and the stream of inbound JSON objects. Must be
    /// called from within a tokio runtime.
    pub fn spawn(
        origin: &Url,
        config: LiveChannelConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Value>), LiveError> {
        // Reject unusable origins up front rather than on every attempt
        live_channel_url(origin, &Credential::new(""))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(LiveChannelState::Disconnected);
        let shutdown = CancellationToken::new();

        let actor = Actor {
            origin: origin.clone(),
            config,
            connector,
            commands: command_rx,
            events: event_tx,
            state: state_tx,
            shutdown: shutdown.clone(),
            credential: None,
        };
        let task = tokio::spawn(actor.run());

        Ok((
            Self {
                commands: command_tx,
                state: state_rx,
                shutdown,
                task: Some(task),
            },
            event_rx,
        ))
    }

    /// Open the channel with this credential
    ///
    /// An empty credential leaves the manager `Disconnected`. While connected
    /// the credential is kept for the next reconnect; while a reconnect is
    /// pending it triggers an immediate attempt.
    pub fn connect(&self, credential: Credential) {
        if self.commands.send(Command::Connect(credential)).is_err() {
            debug!("Live channel already torn down, ignoring connect");
        }
    }

    /// Send a JSON message; dropped unless currently connected
    pub fn send_message(&self, payload: &Value) {
        let text = payload.to_string();
        if self.commands.send(Command::Send(text)).is_err() {
            debug!("Live channel already torn down, dropping message");
        }
    }

    pub fn state(&self) -> LiveChannelState {
        *self.state.borrow()
    }

    /// Receiver for state changes
    pub fn watch_state(&self) -> watch::Receiver<LiveChannelState> {
        self.state.clone()
    }

    /// Stop timers, close the transport and end the actor
    ///
    /// Idempotent. Returns once the actor has exited.
    pub async fn teardown(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!("Live channel task ended abnormally: {}", e);
        }
    }
}

impl Drop for LiveChannelManager {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct Actor {
    origin: Url,
    config: LiveChannelConfig,
    connector: Arc<dyn Connector>,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<Value>,
    state: watch::Sender<LiveChannelState>,
    shutdown: CancellationToken,
    credential: Option<Credential>,
}

impl Actor {
    async fn run(mut self) {
        if let Some(credential) = self.wait_for_credential().await {
            self.credential = Some(credential);
            let mut attempt: u64 = 0;
            loop {
                attempt += 1;
                if let Step::Shutdown = self.connect_and_serve(attempt).await {
                    break;
                }
                if !self.wait_reconnect().await {
                    break;
                }
            }
        }

        self.set_state(LiveChannelState::Disconnected);
        debug!("Live channel stopped");
    }

    /// Stay `Disconnected` until a non-empty credential arrives
    async fn wait_for_credential(&mut self) -> Option<Credential> {
        let shutdown = self.shutdown.clone();
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return None,
                command = self.commands.recv() => match command? {
                    Command::Connect(credential) if credential.is_empty() => {
                        debug!("No credential, live channel stays disconnected");
                    }
                    Command::Connect(credential) => return Some(credential),
                    Command::Send(_) => warn!("Live channel not connected, dropping message"),
                },
            }
        }
    }

    async fn connect_and_serve(&mut self, attempt: u64) -> Step {
        let Some(credential) = self.credential.clone() else {
            return Step::Shutdown;
        };
        let url = match live_channel_url(&self.origin, &credential) {
            Ok(url) => url,
            Err(e) => {
                warn!("Cannot build live channel URL: {}", e);
                return Step::Closed;
            }
        };

        self.set_state(LiveChannelState::Connecting);
        debug!("Connecting live channel (attempt {})", attempt);

        let connector = Arc::clone(&self.connector);
        let connect = connector.connect(&url);
        tokio::pin!(connect);
        let shutdown = self.shutdown.clone();

        let transport = loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Step::Shutdown,
                result = &mut connect => break result,
                command = self.commands.recv() => match command {
                    None => return Step::Shutdown,
                    Some(command) => self.handle_offline_command(command),
                },
            }
        };

        match transport {
            Ok(transport) => self.serve(transport).await,
            Err(e) => {
                warn!("Live channel connection failed: {}", e);
                Step::Closed
            }
        }
    }

    async fn serve(&mut self, mut transport: Box<dyn Transport>) -> Step {
        info!("Live channel connected");
        self.set_state(LiveChannelState::Connected);

        let period = self.config.ping_interval();
        let mut liveness = tokio::time::interval_at(Instant::now() + period, period);
        liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    transport.close().await;
                    return Step::Shutdown;
                }
                frame = transport.next_text() => match frame {
                    Some(Ok(text)) => self.dispatch(&text),
                    Some(Err(e)) => {
                        warn!("Live channel transport error: {}", e);
                        return Step::Closed;
                    }
                    None => {
                        info!("Live channel closed");
                        return Step::Closed;
                    }
                },
                command = self.commands.recv() => match command {
                    None => {
                        transport.close().await;
                        return Step::Shutdown;
                    }
                    Some(Command::Send(text)) => {
                        if !transport.is_open() {
                            warn!("Live channel not open, dropping message");
                        } else if let Err(e) = transport.send_text(&text).await {
                            warn!("Failed to send live channel message: {}", e);
                            return Step::Closed;
                        }
                    }
                    Some(Command::Connect(credential)) => self.replace_credential(credential),
                },
                _ = liveness.tick() => {
                    if !transport.is_open() {
                        continue;
                    }
                    if let Err(e) = transport.send_text(PING_MESSAGE).await {
                        warn!("Liveness probe failed: {}", e);
                        return Step::Closed;
                    }
                    debug!("Sent liveness probe");
                }
            }
        }
    }

    /// Wait out the reconnect delay; `false` on teardown
    async fn wait_reconnect(&mut self) -> bool {
        self.set_state(LiveChannelState::ReconnectPending);
        let delay = tokio::time::sleep(self.config.reconnect_delay());
        tokio::pin!(delay);
        let shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return false,
                _ = &mut delay => return true,
                command = self.commands.recv() => match command {
                    None => return false,
                    Some(Command::Connect(credential)) if !credential.is_empty() => {
                        debug!("Connect requested while reconnect pending, reconnecting now");
                        self.credential = Some(credential);
                        return true;
                    }
                    Some(command) => self.handle_offline_command(command),
                },
            }
        }
    }

    fn handle_offline_command(&mut self, command: Command) {
        match command {
            Command::Send(_) => warn!("Live channel not connected, dropping message"),
            Command::Connect(credential) => self.replace_credential(credential),
        }
    }

    fn replace_credential(&mut self, credential: Credential) {
        if !credential.is_empty() {
            self.credential = Some(credential);
        }
    }

    fn dispatch(&self, text: &str) {
        match serde_json::from_str::<Value>(text) {
            Ok(value @ Value::Object(_)) => {
                if self.events.send(value).is_err() {
                    debug!("No live channel consumer, dropping message");
                }
            }
            Ok(other) => debug!("Ignoring non-object live channel message: {}", other),
            Err(_) if text == "pong" => debug!("Received pong"),
            Err(e) => warn!("Failed to parse live channel message: {}", e),
        }
    }

    fn set_state(&self, state: LiveChannelState) {
        self.state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            debug!("Live channel state: {:?} -> {:?}", *current, state);
            *current = state;
            true
        });
    }
}
