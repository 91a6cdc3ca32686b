//! In-memory identity and message stores
//!
//! Used when `DATABASE_URL` is not configured and by the test suite. Both
//! traits are implemented by the same struct so one `Arc<MemoryStore>` can
//! back the whole application.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{IdentityStore, MessageStore, NewMessage, StoreError};
use crate::shared::{Identity, Message};

#[derive(Debug, Default)]
pub struct MemoryStore {
    identities: RwLock<HashMap<Uuid, Identity>>,
    messages: RwLock<Vec<Message>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_identity(&self, identity: Identity) {
        self.identities.write().await.insert(identity.id, identity);
    }

    pub async fn remove_identity(&self, id: Uuid) {
        self.identities.write().await.remove(&id);
    }

    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Make every following `create` fail, to exercise the persistence
    /// failure path
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        Ok(self.identities.read().await.get(&id).cloned())
    }

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.identities.read().await.contains_key(&id))
    }

    async fn list_except(&self, id: Uuid) -> Result<Vec<Identity>, StoreError> {
        let identities = self.identities.read().await;
        let mut others: Vec<Identity> = identities.values().filter(|i| i.id != id).cloned().collect();
        others.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(others)
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Identity>, StoreError> {
        let identities = self.identities.read().await;
        Ok(ids.iter().filter_map(|id| identities.get(id).cloned()).collect())
    }

    async fn touch_last_seen(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(identity) = self.identities.write().await.get_mut(&id) {
            identity.last_seen = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create(&self, message: NewMessage) -> Result<Message, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is rejecting writes".to_string()));
        }

        let stored = Message {
            id: Uuid::new_v4(),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            text: message.text,
            image: message.image,
            created_at: Utc::now(),
        };
        self.messages.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn find_conversation(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>, StoreError> {
        // Insertion order is creation order
        let messages = self.messages.read().await;
        Ok(messages.iter().filter(|m| m.is_between(a, b)).cloned().collect())
    }

    async fn partner_ids(&self, user: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let messages = self.messages.read().await;
        let partners: BTreeSet<Uuid> = messages
            .iter()
            .filter(|m| m.sender_id == user || m.receiver_id == user)
            .map(|m| m.counterpart(user))
            .collect();
        Ok(partners.into_iter().collect())
    }
}
