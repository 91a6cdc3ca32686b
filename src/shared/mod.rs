//! Shared Module
//!
//! Types shared between the server and clients: the durable message, the
//! send body, identities and the realtime wire frames. Nothing in here
//! depends on the server stack, so the module compiles without the `ssr`
//! feature.

/// Message data structures
pub mod message;

/// Identity and presence views
pub mod identity;

/// Realtime socket frames
pub mod event;

/// Shared error types
pub mod error;

pub use error::SharedError;
pub use event::{ClientEvent, ServerEvent};
pub use identity::{Identity, OnlineSnapshot, UserStatus};
pub use message::{Message, SendMessageBody};
