//! Route Configuration Module
//!
//! Assembles the HTTP and WebSocket routes, the auth middleware and the
//! tower layers into one router. See `router` for the route table.

/// Main router creation
pub mod router;

pub use router::create_router;
