//! Store Collaborators
//!
//! The realtime core talks to persistence only through the traits in this
//! module. The stores provide their own single-document consistency; the
//! core never spans a transaction across them.
//!
//! # Implementations
//!
//! - **`memory`** - In-process stores for development and tests
//! - **`postgres`** - PostgreSQL-backed stores (`sqlx`)
//! - **`blob`** - Image upload collaborators (HTTP endpoint, inline)
//!
//! # Module Structure
//!
//! ```text
//! store/
//! ├── mod.rs      - Traits, NewMessage, StoreError
//! ├── memory.rs   - MemoryStore
//! ├── postgres.rs - PgStore
//! └── blob.rs     - HttpBlobStore, InlineBlobStore
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::shared::{Identity, Message};

pub mod blob;
pub mod memory;
pub mod postgres;

pub use blob::{HttpBlobStore, InlineBlobStore};
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors raised by a store collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A message that has not been persisted yet
///
/// The store assigns `id` and `created_at` in [`MessageStore::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub text: Option<String>,
    pub image: Option<String>,
}

/// Read access to registered users
///
/// Read-only from the core's perspective except for `touch_last_seen`.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError>;

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Every identity except `id`, ordered by display name
    async fn list_except(&self, id: Uuid) -> Result<Vec<Identity>, StoreError>;

    /// Identities for the given ids; unknown ids are skipped
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Identity>, StoreError>;

    async fn touch_last_seen(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Durable message storage
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message, assigning its durable id and timestamp
    async fn create(&self, message: NewMessage) -> Result<Message, StoreError>;

    /// All messages between `a` and `b`, oldest first
    async fn find_conversation(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>, StoreError>;

    /// Distinct identities `user` has exchanged messages with
    async fn partner_ids(&self, user: Uuid) -> Result<Vec<Uuid>, StoreError>;
}

/// Image upload collaborator
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload raw image data (usually a base64 data URI) and return its URL
    async fn upload(&self, data: &str) -> Result<String, StoreError>;
}
