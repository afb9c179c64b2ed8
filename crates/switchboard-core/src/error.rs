//! Core error types.

use switchboard_proto::PeerId;

/// Invariant violations inside the signaling state machine.
///
/// These are logic errors, not expected runtime conditions: normal
/// "not found" and stale-message outcomes are handled silently (empty
/// results, dropped frames). Anything surfacing here means a table is
/// inconsistent and must not be tolerated — the runtime logs it at
/// error level and tears the offending connection down.
#[derive(Debug, thiserror::Error)]
pub enum SignalingError {
    /// An identity was registered twice. The transport mints a fresh
    /// identity per connection, so this cannot happen unless the
    /// registry is corrupt.
    #[error("peer already registered: {0}")]
    PeerAlreadyRegistered(PeerId),

    /// A room was about to reference an identity with no live
    /// connection. Disconnect cleanup must invalidate pending calls
    /// before this point can be reached.
    #[error("room would reference dead peer: {0}")]
    DeadPeerInRoom(PeerId),

    /// An identity would have ended up in two rooms at once.
    #[error("peer already belongs to a room: {0}")]
    AlreadyInRoom(PeerId),
}
