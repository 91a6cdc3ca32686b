//! Client Module
//!
//! Client-side chat state driven by the server's realtime frames. Pure data
//! structures with no transport attached, so any client (desktop, CLI, test
//! harness) can feed them from its own socket.
//!
//! - **`optimistic`** - Pending vs durable entries and per-partner conversations
//! - **`state`** - `ChatState`: online set, conversations, login status, failed sends

/// Optimistic message entries
pub mod optimistic;

/// Aggregate chat state
pub mod state;

pub use optimistic::{ChatEntry, Conversation, PendingMessage};
pub use state::{ChatState, SendFailure};
