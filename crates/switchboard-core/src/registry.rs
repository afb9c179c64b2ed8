//! Connection registry.

use std::collections::HashSet;

use switchboard_proto::PeerId;

use crate::error::SignalingError;

/// Source of truth for which identities currently have a live
/// connection.
///
/// Also records registration order: keyword search resolves collisions
/// deterministically by picking the earliest-registered match, so the
/// directory iterates peers in the order they arrived here.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Live identities, for O(1) liveness checks.
    live: HashSet<PeerId>,
    /// Same identities in registration order.
    order: Vec<PeerId>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly connected identity.
    ///
    /// # Errors
    ///
    /// Returns `SignalingError::PeerAlreadyRegistered` if the identity
    /// is already live. The transport mints a unique identity per
    /// connection, so a duplicate is a fatal logic error.
    pub fn register(&mut self, peer: PeerId) -> Result<(), SignalingError> {
        if !self.live.insert(peer) {
            return Err(SignalingError::PeerAlreadyRegistered(peer));
        }
        self.order.push(peer);
        Ok(())
    }

    /// Remove an identity. Idempotent: returns `false` if it was not
    /// registered.
    pub fn unregister(&mut self, peer: PeerId) -> bool {
        if !self.live.remove(&peer) {
            return false;
        }
        self.order.retain(|p| *p != peer);
        true
    }

    /// Whether this identity is currently reachable.
    pub fn is_live(&self, peer: PeerId) -> bool {
        self.live.contains(&peer)
    }

    /// Live identities in registration order.
    pub fn iter(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.order.iter().copied()
    }

    /// Number of live identities.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no identity is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_unregister_round_trips() {
        let mut registry = ConnectionRegistry::new();
        let peer = PeerId(1);

        registry.register(peer).unwrap();
        assert!(registry.is_live(peer));

        assert!(registry.unregister(peer));
        assert!(!registry.is_live(peer));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ConnectionRegistry::new();
        registry.register(PeerId(1)).unwrap();

        let result = registry.register(PeerId(1));
        assert!(matches!(result, Err(SignalingError::PeerAlreadyRegistered(_))));
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut registry = ConnectionRegistry::new();
        registry.register(PeerId(1)).unwrap();

        assert!(registry.unregister(PeerId(1)));
        assert!(!registry.unregister(PeerId(1)));
        assert!(!registry.unregister(PeerId(99)));
    }

    #[test]
    fn iteration_preserves_registration_order() {
        let mut registry = ConnectionRegistry::new();
        for id in [3, 1, 2] {
            registry.register(PeerId(id)).unwrap();
        }
        registry.unregister(PeerId(1));
        registry.register(PeerId(1)).unwrap();

        let order: Vec<_> = registry.iter().collect();
        assert_eq!(order, vec![PeerId(3), PeerId(2), PeerId(1)]);
    }
}
