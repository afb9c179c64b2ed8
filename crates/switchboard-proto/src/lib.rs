//! Wire protocol for the switchboard signaling relay.
//!
//! Messages travel as JSON text frames. Both directions use internally
//! tagged enums whose `type` tags are the event names clients speak
//! (`setKeyword`, `startVideoCall`, `searchResult`, ...).
//!
//! Negotiation payloads (session descriptions, connectivity candidates)
//! are opaque to the relay and carried as raw JSON values; the relay
//! forwards them verbatim, tagged with the sender's identity.

mod command;
mod message;
mod peer;

pub use command::ClientCommand;
pub use message::ServerMessage;
pub use peer::PeerId;

/// Errors from encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// The frame was not valid JSON for the expected message shape.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}
