//! Environment abstraction for deterministic testing.
//!
//! Decouples the core from system resources (time, randomness) so the
//! state machine can run under a virtual clock and seeded RNG in tests
//! while the production runtime plugs in real system resources.

use std::time::Instant;

/// Abstract environment providing time and randomness.
///
/// # Invariants
///
/// - Monotonicity: `now()` never goes backwards within one execution
///   context.
/// - Production implementations must draw `random_bytes()` from the OS
///   entropy pool; identities minted from it must be unpredictable.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current time.
    fn now(&self) -> Instant;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`, the shape used for transport-assigned
    /// identities.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}
