//! Switchboard production server.
//!
//! This crate provides the production runtime around the sans-IO core:
//! - Tokio for the async runtime
//! - `tokio-tungstenite` for the WebSocket transport
//! - System time and cryptographic RNG
//!
//! ## Architecture
//!
//! ```text
//! switchboard-server
//!   ├─ SystemEnv         (production Environment impl)
//!   ├─ Server            (accept loop, one task per connection)
//!   ├─ SignalingDriver   (sans-IO core, behind one mutex)
//!   └─ peer map          (PeerId → outbound channel)
//! ```
//!
//! Each connection gets a writer task draining an unbounded channel, so
//! deliveries to one peer stay ordered while the driver lock is held
//! only for state transitions, never for socket writes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod system_env;

use std::collections::HashMap;
use std::sync::Arc;

pub use error::ServerError;
use futures_util::{SinkExt, StreamExt};
use switchboard_core::{Action, DriverEvent, Environment, SignalingDriver};
use switchboard_proto::{ClientCommand, PeerId, ServerMessage};
pub use system_env::SystemEnv;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message;

/// Outbound channels of every live connection.
type PeerMap = Arc<Mutex<HashMap<PeerId, mpsc::UnboundedSender<ServerMessage>>>>;

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:3000")
    pub bind_address: String,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self { bind_address: "0.0.0.0:3000".to_string() }
    }
}

/// Production switchboard server.
///
/// Wraps `SignalingDriver` with a WebSocket accept loop and the system
/// environment.
pub struct Server {
    /// Bound TCP listener
    listener: TcpListener,
    /// The sans-IO signaling core
    driver: Arc<Mutex<SignalingDriver>>,
    /// Outbound channel per live connection
    peers: PeerMap,
    /// Environment
    env: SystemEnv,
}

impl Server {
    /// Create and bind a new server.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.bind_address).await?;

        Ok(Self {
            listener,
            driver: Arc::new(Mutex::new(SignalingDriver::new())),
            peers: Arc::new(Mutex::new(HashMap::new())),
            env: SystemEnv::new(),
        })
    }

    /// Run the server, accepting connections and relaying messages.
    ///
    /// This method runs until the server is shut down or an error
    /// occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Server listening on {}", self.listener.local_addr()?);

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let driver = Arc::clone(&self.driver);
                    let peers = Arc::clone(&self.peers);
                    let env = self.env.clone();

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, driver, peers, env).await {
                            tracing::debug!("Connection {} error: {}", addr, e);
                        }
                    });
                },
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                },
            }
        }
    }

    /// Get the local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }
}

/// Handle a single WebSocket connection for its whole lifetime.
async fn handle_connection(
    stream: TcpStream,
    driver: Arc<Mutex<SignalingDriver>>,
    peers: PeerMap,
    env: SystemEnv,
) -> Result<(), ServerError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let peer = PeerId(env.random_u64());

    tracing::debug!(%peer, "websocket established");

    // Register before exposing the outbound channel; a duplicate
    // identity is fatal and the connection never becomes visible.
    {
        let mut driver = driver.lock().await;
        let actions = driver.process_event(DriverEvent::Connected { peer }, &env)?;
        execute_actions(actions, &peers).await;
    }

    let (mut sink, mut source) = ws.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerMessage>();
    peers.lock().await.insert(peer, outbound_tx);

    // Writer task: drains the outbound channel in order. Ends when the
    // channel closes (peer-map removal) or the socket rejects a write.
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            match message.encode() {
                Ok(json) => {
                    if sink.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                },
                Err(e) => tracing::error!(%peer, "failed to encode outbound message: {}", e),
            }
        }
        let _ = sink.close().await;
    });

    while let Some(frame) = source.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let command = match ClientCommand::decode(text.as_str()) {
                    Ok(command) => command,
                    Err(e) => {
                        tracing::warn!(%peer, "ignoring malformed frame: {}", e);
                        continue;
                    },
                };

                let actions = {
                    let mut driver = driver.lock().await;
                    match driver.process_event(DriverEvent::Command { peer, command }, &env) {
                        Ok(actions) => actions,
                        Err(e) => {
                            tracing::error!(%peer, "invariant violation, closing: {}", e);
                            break;
                        },
                    }
                };
                execute_actions(actions, &peers).await;
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {
                // Binary, ping and pong frames carry no commands.
            },
            Err(e) => {
                tracing::debug!(%peer, "read error: {}", e);
                break;
            },
        }
    }

    // Cascade cleanup: dropping the outbound channel stops the writer,
    // the Disconnected event tears down keyword and pairing state.
    peers.lock().await.remove(&peer);
    {
        let mut driver = driver.lock().await;
        match driver.process_event(DriverEvent::Disconnected { peer }, &env) {
            Ok(actions) => execute_actions(actions, &peers).await,
            Err(e) => tracing::error!(%peer, "disconnect cleanup failed: {}", e),
        }
    }
    let _ = writer.await;

    tracing::debug!(%peer, "connection closed");
    Ok(())
}

/// Execute delivery actions against the peer map.
///
/// Fire-and-forget: a target that disconnected between the state
/// transition and delivery just loses the message.
async fn execute_actions(actions: Vec<Action>, peers: &PeerMap) {
    if actions.is_empty() {
        return;
    }

    let peers = peers.lock().await;
    for action in actions {
        match action {
            Action::Deliver { to, message } => match peers.get(&to) {
                Some(tx) => {
                    if tx.send(message).is_err() {
                        tracing::debug!(%to, "outbound channel closed, dropping message");
                    }
                },
                None => {
                    tracing::debug!(%to, "peer not connected, dropping message");
                },
            },
        }
    }
}
