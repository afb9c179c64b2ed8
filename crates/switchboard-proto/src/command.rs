//! Client-to-server commands.

use serde::{Deserialize, Serialize};

use crate::{PeerId, ProtoError};

/// A command sent by a connected client.
///
/// The `type` tag carries the event name; remaining fields are the event
/// payload. Unknown tags fail to decode and are dropped by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientCommand {
    /// Declare (or replace) this client's discovery keyword.
    SetKeyword {
        /// Self-declared, non-unique discovery keyword.
        keyword: String,
    },

    /// Ask which other clients currently share a keyword.
    ///
    /// Informational only: returns a `searchResult` and changes no
    /// pairing state.
    SearchUsers {
        /// Keyword to match, exact string equality.
        keyword: String,
    },

    /// Initiate a call toward the first client matching a keyword.
    StartVideoCall {
        /// Keyword to match, exact string equality.
        keyword: String,
    },

    /// Accept an incoming call from the named caller.
    AcceptVideoCall {
        /// Identity carried by the incoming-call notice.
        caller: PeerId,
    },

    /// Forward a session-description offer to the room counterpart.
    Offer {
        /// Opaque session description, never interpreted by the relay.
        sdp: serde_json::Value,
    },

    /// Forward a session-description answer to the room counterpart.
    Answer {
        /// Opaque session description, never interpreted by the relay.
        sdp: serde_json::Value,
    },

    /// Forward a connectivity candidate to the room counterpart.
    Candidate {
        /// Opaque candidate structure, relayed verbatim.
        candidate: serde_json::Value,
    },

    /// Send chat text to the room counterpart.
    ChatMessage {
        /// Chat text.
        text: String,
    },
}

impl ClientCommand {
    /// Decode a command from a JSON text frame.
    pub fn decode(frame: &str) -> Result<Self, ProtoError> {
        Ok(serde_json::from_str(frame)?)
    }

    /// Encode this command as a JSON text frame.
    pub fn encode(&self) -> Result<String, ProtoError> {
        Ok(serde_json::to_string(self)?)
    }
}
