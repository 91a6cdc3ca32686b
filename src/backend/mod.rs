//! Backend Module
//!
//! Server-side code for chatline: an Axum server that authenticates
//! connections, tracks who is online, broadcasts presence changes and
//! delivers direct messages in real time.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`auth`** - Credential tokens and the credential verifier
//! - **`presence`** - Presence registry and connection sessions
//! - **`realtime`** - Broadcast channel and WebSocket driver
//! - **`messaging`** - Delivery coordinator and message REST handlers
//! - **`store`** - Identity, message and blob store collaborators
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - Router assembly
//! - **`middleware`** - Auth middleware
//! - **`error`** - HTTP-facing error type
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Binary entry point
//! ├── auth/           - Tokens and verification
//! ├── presence/       - Registry, sessions, hub
//! ├── realtime/       - Broadcast and WebSocket
//! ├── messaging/      - Delivery coordinator
//! ├── store/          - Store traits and implementations
//! ├── server/         - Config, state, init
//! ├── routes/         - Router
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. A client opens `GET /ws` carrying its `jwt` cookie
//! 2. The credential verifier resolves the identity (or the socket is closed
//!    with code 1008)
//! 3. The presence registry records the connection; if the identity just
//!    came online, the new online set is broadcast
//! 4. Messages sent over REST or the socket are persisted by the delivery
//!    coordinator and pushed to the recipient's sessions
//! 5. On disconnect the connection is deregistered and, if it was the
//!    identity's last one, the shrunk online set is broadcast
//!
//! # Thread Safety
//!
//! The presence registry is the only shared mutable state. It is guarded
//! by a `std::sync::Mutex` that is never held across an `.await`.

/// Authentication
pub mod auth;

/// Presence tracking
pub mod presence;

/// Real-time update system
pub mod realtime;

/// Direct messaging
pub mod messaging;

/// Store collaborators
pub mod store;

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Middleware for request processing
pub mod middleware;

/// Backend error types
pub mod error;

pub use error::BackendError;
pub use server::{create_app, create_app_with_state, AppState, ServerConfig};
