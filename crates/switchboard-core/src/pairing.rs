//! Call pairing state machine.
//!
//! Tracks every outstanding call intent and every confirmed pairing.
//! Per identity the states are Idle → Offering → Paired; Offering falls
//! back to Idle on cancellation or disconnect, Paired falls back to Idle
//! on disconnect or when either party initiates a new call.
//!
//! All room creation and destruction funnels through this component; no
//! other table mutates pairing state.

use std::collections::HashMap;
use std::time::Instant;

use switchboard_proto::{PeerId, ServerMessage};

use crate::driver::Action;
use crate::error::SignalingError;
use crate::registry::ConnectionRegistry;

/// Addressing key of a room, derived deterministically from the
/// unordered member pair.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoomKey {
    lo: PeerId,
    hi: PeerId,
}

impl RoomKey {
    /// Key for the room containing `a` and `b`, independent of argument
    /// order.
    pub fn for_pair(a: PeerId, b: PeerId) -> Self {
        if a <= b { Self { lo: a, hi: b } } else { Self { lo: b, hi: a } }
    }
}

impl std::fmt::Display for RoomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.lo, self.hi)
    }
}

impl std::fmt::Debug for RoomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RoomKey({self})")
    }
}

/// An outstanding, unconfirmed call intent.
///
/// At most one exists per caller; initiating a new call supersedes the
/// old one. No expiry timer: a pending call persists until it is
/// accepted, superseded, or either party disconnects.
#[derive(Debug, Clone)]
pub struct PendingCall {
    /// Who initiated the call.
    pub caller: PeerId,
    /// Who the call is directed at.
    pub callee: PeerId,
    /// When the intent was created.
    pub created_at: Instant,
}

/// A confirmed two-party pairing.
#[derive(Debug, Clone)]
pub struct Room {
    /// The unordered member pair.
    pub members: [PeerId; 2],
    /// Deterministic addressing key.
    pub key: RoomKey,
}

impl Room {
    /// The other member of the room, or `None` if `peer` is not a
    /// member.
    pub fn counterpart(&self, peer: PeerId) -> Option<PeerId> {
        match self.members {
            [a, b] if a == peer => Some(b),
            [a, b] if b == peer => Some(a),
            _ => None,
        }
    }
}

/// Pending-call and room tables.
#[derive(Debug, Default)]
pub struct CallPairing {
    /// Outstanding call intents, keyed by caller.
    pending: HashMap<PeerId, PendingCall>,
    /// Confirmed pairings.
    rooms: HashMap<RoomKey, Room>,
    /// Which room each identity belongs to, if any.
    membership: HashMap<PeerId, RoomKey>,
}

impl CallPairing {
    /// Create empty pairing tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// The pending call this identity initiated, if any.
    pub fn pending_from(&self, caller: PeerId) -> Option<&PendingCall> {
        self.pending.get(&caller)
    }

    /// All outstanding `(caller, callee)` intents.
    pub fn pending_calls(&self) -> impl Iterator<Item = (PeerId, PeerId)> + '_ {
        self.pending.values().map(|call| (call.caller, call.callee))
    }

    /// The room this identity belongs to, if any.
    pub fn room_of(&self, peer: PeerId) -> Option<&Room> {
        self.membership.get(&peer).and_then(|key| self.rooms.get(key))
    }

    /// The other member of this identity's room, if paired.
    pub fn counterpart_of(&self, peer: PeerId) -> Option<PeerId> {
        self.room_of(peer).and_then(|room| room.counterpart(peer))
    }

    /// Member pairs of every confirmed room.
    pub fn room_pairs(&self) -> impl Iterator<Item = [PeerId; 2]> + '_ {
        self.rooms.values().map(|room| room.members)
    }

    /// Record a new call intent from `caller` toward `callee`.
    ///
    /// A caller gets one outstanding intent at a time: any prior pending
    /// call is withdrawn first and its callee told so. A caller that was
    /// still paired leaves its room, ending the old session for the
    /// partner. The callee is then notified of the incoming call.
    pub fn initiate(&mut self, caller: PeerId, callee: PeerId, now: Instant) -> Vec<Action> {
        let mut actions = self.cancel_pending_as_caller(caller);
        actions.extend(self.leave_room(caller));

        self.pending.insert(caller, PendingCall { caller, callee, created_at: now });
        tracing::debug!(%caller, %callee, "pending call created");

        actions.push(Action::Deliver {
            to: callee,
            message: ServerMessage::IncomingCall { from: caller },
        });
        actions
    }

    /// Promote a pending call to a room.
    ///
    /// Only an exact `(caller, callee)` pending pair is promotable;
    /// anything else is a stale or duplicate accept and is ignored.
    /// The new pairing supersedes any room either party was still in.
    /// On success the caller learns its call was accepted and begins
    /// session negotiation as the initiating side.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if the caller is no longer live
    /// (disconnect cleanup should have withdrawn the intent) or if
    /// either party would end up in two rooms.
    pub fn accept(
        &mut self,
        callee: PeerId,
        caller: PeerId,
        registry: &ConnectionRegistry,
    ) -> Result<Vec<Action>, SignalingError> {
        match self.pending.get(&caller) {
            Some(call) if call.callee == callee => {},
            _ => {
                tracing::debug!(%callee, %caller, "ignoring stale accept");
                return Ok(vec![]);
            },
        }
        self.pending.remove(&caller);

        if !registry.is_live(caller) {
            return Err(SignalingError::DeadPeerInRoom(caller));
        }

        let mut actions = self.leave_room(caller);
        actions.extend(self.leave_room(callee));

        let key = RoomKey::for_pair(caller, callee);
        self.rooms.insert(key, Room { members: [caller, callee], key });
        for member in [caller, callee] {
            if self.membership.insert(member, key).is_some() {
                return Err(SignalingError::AlreadyInRoom(member));
            }
        }
        tracing::debug!(%key, "room established");

        actions.push(Action::Deliver {
            to: caller,
            message: ServerMessage::CallAccepted { peer: callee },
        });
        Ok(actions)
    }

    /// Cascade cleanup when an identity disconnects.
    ///
    /// Withdraws its outgoing intent, withdraws every intent directed at
    /// it, and ends its room session, notifying each affected party.
    pub fn teardown(&mut self, peer: PeerId) -> Vec<Action> {
        let mut actions = self.cancel_pending_as_caller(peer);
        actions.extend(self.cancel_pending_as_callee(peer));
        actions.extend(self.leave_room(peer));
        actions
    }

    /// Withdraw the intent `caller` initiated, telling its callee.
    fn cancel_pending_as_caller(&mut self, caller: PeerId) -> Vec<Action> {
        self.pending
            .remove(&caller)
            .map(|call| {
                tracing::debug!(%caller, callee = %call.callee, "pending call withdrawn");
                Action::Deliver { to: call.callee, message: ServerMessage::CallCanceled }
            })
            .into_iter()
            .collect()
    }

    /// Withdraw every intent directed at `callee`, telling each caller.
    fn cancel_pending_as_callee(&mut self, callee: PeerId) -> Vec<Action> {
        let callers: Vec<PeerId> = self
            .pending
            .values()
            .filter(|call| call.callee == callee)
            .map(|call| call.caller)
            .collect();

        callers
            .into_iter()
            .map(|caller| {
                self.pending.remove(&caller);
                tracing::debug!(%caller, %callee, "pending call withdrawn, callee gone");
                Action::Deliver { to: caller, message: ServerMessage::CallCanceled }
            })
            .collect()
    }

    /// Destroy the room `peer` belongs to, telling the partner the
    /// session ended. No-op when idle.
    fn leave_room(&mut self, peer: PeerId) -> Vec<Action> {
        let Some(key) = self.membership.remove(&peer) else {
            return vec![];
        };
        let Some(room) = self.rooms.remove(&key) else {
            return vec![];
        };
        tracing::debug!(%key, "room destroyed");

        room.counterpart(peer)
            .map(|partner| {
                self.membership.remove(&partner);
                Action::Deliver { to: partner, message: ServerMessage::CallEnded }
            })
            .into_iter()
            .collect()
    }
}
