//! Server-to-client messages.

use serde::{Deserialize, Serialize};

use crate::{PeerId, ProtoError};

/// A message pushed to a connected client.
///
/// Every client-visible outcome is one of these; the relay never sends
/// error codes. The incoming-call notice keeps the `startVideoCall` tag
/// the original clients listen for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Result of a keyword search, in registration order. May be empty;
    /// an empty result is the normal "no match" outcome, not an error.
    SearchResult {
        /// Matching identities, registration order, searcher excluded.
        peers: Vec<PeerId>,
    },

    /// Incoming-call notice: someone wants to pair with this client.
    #[serde(rename = "startVideoCall")]
    IncomingCall {
        /// The caller's identity, echoed back in `acceptVideoCall`.
        from: PeerId,
    },

    /// The callee accepted; the receiver is the initiating side of the
    /// session negotiation that follows.
    CallAccepted {
        /// The callee's identity.
        peer: PeerId,
    },

    /// A pending call toward this client was withdrawn.
    CallCanceled,

    /// The room this client was in is gone (partner disconnected or
    /// re-initiated elsewhere).
    CallEnded,

    /// Relayed session-description offer.
    Offer {
        /// Opaque session description.
        payload: serde_json::Value,
        /// The room counterpart that sent it.
        from: PeerId,
    },

    /// Relayed session-description answer.
    Answer {
        /// Opaque session description.
        payload: serde_json::Value,
        /// The room counterpart that sent it.
        from: PeerId,
    },

    /// Relayed connectivity candidate.
    Candidate {
        /// Opaque candidate structure.
        payload: serde_json::Value,
        /// The room counterpart that sent it.
        from: PeerId,
    },

    /// Relayed chat text.
    ChatMessage {
        /// Chat text.
        text: String,
        /// The room counterpart that sent it.
        from: PeerId,
    },
}

impl ServerMessage {
    /// Encode this message as a JSON text frame.
    pub fn encode(&self) -> Result<String, ProtoError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a message from a JSON text frame.
    pub fn decode(frame: &str) -> Result<Self, ProtoError> {
        Ok(serde_json::from_str(frame)?)
    }
}
