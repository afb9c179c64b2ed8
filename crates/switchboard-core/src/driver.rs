//! Signaling driver.
//!
//! Event-in, actions-out orchestrator over the registry, directory, and
//! pairing tables. Performs no I/O: the runtime feeds it one transport
//! event at a time and executes the returned delivery actions.

use switchboard_proto::{ClientCommand, PeerId, ServerMessage};

use crate::directory::KeywordDirectory;
use crate::env::Environment;
use crate::error::SignalingError;
use crate::pairing::CallPairing;
use crate::registry::ConnectionRegistry;

/// A transport event for the driver to process.
#[derive(Debug, Clone)]
pub enum DriverEvent {
    /// A new connection was accepted and assigned an identity.
    Connected {
        /// Freshly minted identity.
        peer: PeerId,
    },

    /// A connection went away, for whatever reason.
    Disconnected {
        /// The identity that is no longer reachable.
        peer: PeerId,
    },

    /// A decoded command arrived from a live connection.
    Command {
        /// The sending identity.
        peer: PeerId,
        /// The decoded command.
        command: ClientCommand,
    },
}

/// An effect for the runtime to execute.
#[derive(Debug, Clone)]
pub enum Action {
    /// Deliver a message to a connected peer. Fire-and-forget: if the
    /// peer is gone by delivery time the message is dropped and logged,
    /// never retried.
    Deliver {
        /// Target identity.
        to: PeerId,
        /// Message to deliver.
        message: ServerMessage,
    },
}

/// The signaling state machine.
///
/// Owns all shared tables. Every `process_event` call is a single
/// critical section; the runtime serializes calls through one lock so
/// concurrent connections cannot interleave half-applied transitions.
#[derive(Debug, Default)]
pub struct SignalingDriver {
    registry: ConnectionRegistry,
    directory: KeywordDirectory,
    pairing: CallPairing,
}

impl SignalingDriver {
    /// Create a driver with empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the connection registry.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Read-only view of the keyword directory.
    pub fn directory(&self) -> &KeywordDirectory {
        &self.directory
    }

    /// Read-only view of the pairing tables.
    pub fn pairing(&self) -> &CallPairing {
        &self.pairing
    }

    /// Process one transport event and return the deliveries it caused.
    ///
    /// # Errors
    ///
    /// Only invariant violations surface as errors; expected conditions
    /// (no keyword match, stale accept, relay without a room) resolve to
    /// empty results or silent drops.
    pub fn process_event<E: Environment>(
        &mut self,
        event: DriverEvent,
        env: &E,
    ) -> Result<Vec<Action>, SignalingError> {
        match event {
            DriverEvent::Connected { peer } => {
                self.registry.register(peer)?;
                tracing::info!(%peer, "peer registered");
                Ok(vec![])
            },

            DriverEvent::Disconnected { peer } => {
                if !self.registry.is_live(peer) {
                    // Already unregistered; disconnect is idempotent.
                    return Ok(vec![]);
                }
                let actions = self.pairing.teardown(peer);
                self.directory.clear(peer);
                self.registry.unregister(peer);
                tracing::info!(%peer, "peer unregistered");
                Ok(actions)
            },

            DriverEvent::Command { peer, command } => {
                if !self.registry.is_live(peer) {
                    tracing::warn!(%peer, "dropping command from unregistered peer");
                    return Ok(vec![]);
                }
                self.process_command(peer, command, env)
            },
        }
    }

    fn process_command<E: Environment>(
        &mut self,
        peer: PeerId,
        command: ClientCommand,
        env: &E,
    ) -> Result<Vec<Action>, SignalingError> {
        Ok(match command {
            ClientCommand::SetKeyword { keyword } => {
                if keyword.is_empty() {
                    tracing::warn!(%peer, "ignoring empty keyword");
                    return Ok(vec![]);
                }
                tracing::debug!(%peer, %keyword, "keyword set");
                self.directory.set_keyword(peer, keyword);
                vec![]
            },

            ClientCommand::SearchUsers { keyword } => {
                let peers = self.directory.find_by_keyword(&self.registry, &keyword, peer);
                tracing::debug!(%peer, %keyword, matches = peers.len(), "keyword search");
                vec![Action::Deliver { to: peer, message: ServerMessage::SearchResult { peers } }]
            },

            ClientCommand::StartVideoCall { keyword } => {
                let matches = self.directory.find_by_keyword(&self.registry, &keyword, peer);
                let Some(callee) = matches.first().copied() else {
                    tracing::debug!(%peer, %keyword, "call initiation found no match");
                    return Ok(vec![Action::Deliver {
                        to: peer,
                        message: ServerMessage::SearchResult { peers: vec![] },
                    }]);
                };

                let mut actions = self.pairing.initiate(peer, callee, env.now());
                actions.push(Action::Deliver {
                    to: peer,
                    message: ServerMessage::SearchResult { peers: vec![callee] },
                });
                actions
            },

            ClientCommand::AcceptVideoCall { caller } => {
                self.pairing.accept(peer, caller, &self.registry)?
            },

            ClientCommand::Offer { sdp } => {
                self.relay(peer, |from| ServerMessage::Offer { payload: sdp, from })
            },
            ClientCommand::Answer { sdp } => {
                self.relay(peer, |from| ServerMessage::Answer { payload: sdp, from })
            },
            ClientCommand::Candidate { candidate } => {
                self.relay(peer, |from| ServerMessage::Candidate { payload: candidate, from })
            },
            ClientCommand::ChatMessage { text } => {
                self.relay(peer, |from| ServerMessage::ChatMessage { text, from })
            },
        })
    }

    /// Forward a negotiation payload or chat line to the sender's room
    /// counterpart, tagged with the sender. Senders without a room are
    /// protocol violators; their messages are dropped, not answered.
    fn relay(
        &self,
        from: PeerId,
        message: impl FnOnce(PeerId) -> ServerMessage,
    ) -> Vec<Action> {
        match self.pairing.counterpart_of(from) {
            Some(to) => vec![Action::Deliver { to, message: message(from) }],
            None => {
                tracing::debug!(%from, "dropping relay message from unpaired peer");
                vec![]
            },
        }
    }
}
