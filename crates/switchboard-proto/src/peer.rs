//! Peer identity.

use serde::{Deserialize, Serialize};

/// Transport-assigned identity of one live connection.
///
/// Opaque to clients: it has no meaning beyond the lifetime of the
/// connection it was minted for and is never persisted. The server
/// derives it from OS randomness at accept time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub u64);

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl std::fmt::Debug for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PeerId({:016x})", self.0)
    }
}
