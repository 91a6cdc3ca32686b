//! Presence Module
//!
//! Who is online right now, and the per-connection lifecycle that keeps that
//! answer correct.
//!
//! # Module Structure
//!
//! ```text
//! presence/
//! ├── mod.rs          - Module exports and documentation
//! ├── registry.rs     - PresenceRegistry, ConnectionId, PresenceChange
//! ├── session.rs      - Connection session state machine
//! ├── hub.rs          - PresenceHub (shared collaborators)
//! └── handlers.rs     - REST views of presence
//! ```
//!
//! # Scaling
//!
//! The registry lives in process memory. Running several server processes
//! behind a load balancer needs an external registry and pub/sub channel;
//! each process would otherwise only see its own connections.

/// Live connection registry
pub mod registry;

/// Connection session lifecycle
pub mod session;

/// Shared presence collaborators
pub mod hub;

/// REST handlers
pub mod handlers;

pub use hub::PresenceHub;
pub use registry::{ConnectionId, PresenceChange, PresenceError, PresenceRegistry, Transition};
pub use session::{ActiveSession, AuthenticatedSession, PendingSession, SessionState};
