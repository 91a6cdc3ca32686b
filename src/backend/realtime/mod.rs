//! Real-time Module
//!
//! Pushes presence and message events to connected clients over WebSockets.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── broadcast.rs    - Broadcaster, RealtimeEvent, DeliveryError
//! └── socket.rs       - `GET /ws` connection driver
//! ```
//!
//! # Event Flow
//!
//! Presence changes and persisted messages are published once on the
//! broadcast channel. Every socket task holds its own receiver and forwards
//! what its session is allowed to see as JSON frames (see
//! `shared::ServerEvent`).

/// Event broadcasting
pub mod broadcast;

/// WebSocket connection driver
pub mod socket;

pub use broadcast::{Broadcaster, DeliveryError, RealtimeEvent};
pub use socket::ws_handler;
