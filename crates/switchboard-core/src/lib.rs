//! Sans-IO core of the switchboard signaling relay.
//!
//! Everything stateful lives here: which identities are reachable, which
//! keyword each one declared, which calls are pending, and which pairs
//! are in a room together. The core performs no I/O — the driver consumes
//! transport events and returns delivery actions for the runtime to
//! execute.
//!
//! ```text
//! switchboard-core
//!   ├─ SignalingDriver      (event → actions orchestrator)
//!   ├─ ConnectionRegistry   (liveness + registration order)
//!   ├─ KeywordDirectory     (identity → discovery keyword)
//!   └─ CallPairing          (pending calls + rooms)
//! ```
//!
//! One `process_event` call is one critical section; the runtime holds
//! the driver behind a single lock so every state transition is atomic
//! with respect to every other connection's events.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod directory;
mod driver;
pub mod env;
mod error;
mod pairing;
mod registry;

pub use directory::KeywordDirectory;
pub use driver::{Action, DriverEvent, SignalingDriver};
pub use env::Environment;
pub use error::SignalingError;
pub use pairing::{CallPairing, PendingCall, Room, RoomKey};
pub use registry::ConnectionRegistry;
