//! Chatline - Main Library
//!
//! Chatline is a realtime presence and direct-messaging server. It
//! authenticates long-lived WebSocket connections, keeps a live registry of
//! who is online, broadcasts presence changes to every connected client, and
//! delivers persisted messages to their recipients in real time.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between server and clients
//!   - Message and identity structures
//!   - Realtime wire frames
//!   - Error types
//!
//! - **`client`** - Client-side chat state
//!   - Optimistic (pending) vs durable messages
//!   - Online set maintenance from server frames
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP and WebSocket server
//!   - Credential verification, presence registry, broadcast channel
//!   - Message delivery and store collaborators
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - Enables the `backend` module and the server binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use chatline::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let app = create_app(config).await;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - Custom error types in `shared::error` and `backend::error`
//! - Domain errors (`AuthError`, `SendError`, `PresenceError`) live next to
//!   the component that raises them

/// Shared types and data structures
pub mod shared;

/// Client-side chat state
pub mod client;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
