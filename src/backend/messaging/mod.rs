//! Messaging Module
//!
//! Direct messages between two identities: the delivery coordinator that
//! persists and routes them, and the REST handlers in front of it.

/// Send validation, persistence and fan-out
pub mod delivery;

/// REST handlers
pub mod handlers;

pub use delivery::{DeliveryCoordinator, SendError};
pub use handlers::{get_chat_partners, get_contacts, get_messages, send_message};
