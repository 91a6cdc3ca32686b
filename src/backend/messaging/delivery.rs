/**
 * Message Delivery Coordinator
 *
 * The single writer of persisted messages. Both the REST endpoint and the
 * socket `send_message` frame go through `submit`, so the two paths
 * validate, upload and persist identically.
 *
 * # Send Flow
 *
 * 1. Validate the body (text or image required)
 * 2. Check the recipient (not the sender, must exist)
 * 3. Upload the image, if any, and keep the returned URL
 * 4. Persist the message
 * 5. Publish `MessageDelivered`; the recipient's sessions pick it up
 *
 * A failure in steps 1-4 aborts the send and nothing is broadcast. Step 5
 * is best-effort: an offline recipient or a broadcast with no subscribers is
 * not an error, and the sender gets the durable message either way.
 */
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::backend::realtime::broadcast::{Broadcaster, RealtimeEvent};
use crate::backend::store::{BlobStore, IdentityStore, MessageStore, NewMessage, StoreError};
use crate::shared::{Message, SendMessageBody, SharedError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("Message must contain text or an image")]
    Empty,

    #[error("Cannot send message to yourself")]
    SelfTarget,

    #[error("Receiver not found")]
    UnknownReceiver,

    #[error("Invalid message: {0}")]
    Invalid(String),

    #[error("Image upload failed: {0}")]
    ImageUpload(String),

    #[error("Failed to save message: {0}")]
    Persistence(String),
}

impl SendError {
    /// Whether the same send could succeed if tried again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ImageUpload(_) | Self::Persistence(_))
    }
}

impl From<SharedError> for SendError {
    fn from(err: SharedError) -> Self {
        match err {
            SharedError::EmptyMessage => Self::Empty,
            other => Self::Invalid(other.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct DeliveryCoordinator {
    identities: Arc<dyn IdentityStore>,
    messages: Arc<dyn MessageStore>,
    blobs: Arc<dyn BlobStore>,
    broadcaster: Broadcaster,
}

impl DeliveryCoordinator {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        messages: Arc<dyn MessageStore>,
        blobs: Arc<dyn BlobStore>,
        broadcaster: Broadcaster,
    ) -> Self {
        Self {
            identities,
            messages,
            blobs,
            broadcaster,
        }
    }

    /// Validate a send without persisting anything
    pub async fn check(&self, sender: Uuid, receiver: Uuid, has_content: bool) -> Result<(), SendError> {
        if !has_content {
            return Err(SendError::Empty);
        }
        if sender == receiver {
            return Err(SendError::SelfTarget);
        }
        let exists = self
            .identities
            .exists(receiver)
            .await
            .map_err(|e| SendError::Persistence(e.to_string()))?;
        if !exists {
            return Err(SendError::UnknownReceiver);
        }
        Ok(())
    }

    /// Persist a message whose image (if any) is already uploaded, then
    /// publish it
    pub async fn send(
        &self,
        sender: Uuid,
        receiver: Uuid,
        text: Option<String>,
        image_url: Option<String>,
    ) -> Result<Message, SendError> {
        let text = text.filter(|t| !t.is_empty());
        let image_url = image_url.filter(|i| !i.is_empty());
        self.check(sender, receiver, text.is_some() || image_url.is_some()).await?;

        let message = self
            .messages
            .create(NewMessage {
                sender_id: sender,
                receiver_id: receiver,
                text,
                image: image_url,
            })
            .await
            .map_err(|e| {
                tracing::error!("[Delivery] Failed to persist message {} -> {}: {}", sender, receiver, e);
                SendError::Persistence(e.to_string())
            })?;

        let reached = self.broadcaster.publish(RealtimeEvent::MessageDelivered(message.clone()));
        tracing::info!(
            "[Delivery] Message {} from {} to {} persisted ({} subscribers notified)",
            message.id,
            sender,
            receiver,
            reached
        );

        Ok(message)
    }

    /// Full send path shared by REST and the socket
    pub async fn submit(&self, sender: Uuid, receiver: Uuid, body: SendMessageBody) -> Result<Message, SendError> {
        let body = body.normalized();
        body.validate()?;
        self.check(sender, receiver, true).await?;

        let image_url = match body.image.as_deref() {
            Some(data) => Some(self.blobs.upload(data).await.map_err(|e| {
                tracing::warn!("[Delivery] Image upload failed for {}: {}", sender, e);
                match e {
                    StoreError::Upload(message) => SendError::ImageUpload(message),
                    other => SendError::ImageUpload(other.to_string()),
                }
            })?),
            None => None,
        };

        self.send(sender, receiver, body.text, image_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::store::{InlineBlobStore, MemoryStore};
    use crate::shared::Identity;
    use async_trait::async_trait;

    struct FailingBlobs;

    #[async_trait]
    impl BlobStore for FailingBlobs {
        async fn upload(&self, _data: &str) -> Result<String, StoreError> {
            Err(StoreError::Upload("service down".to_string()))
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        broadcaster: Broadcaster,
        alice: Identity,
        bob: Identity,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let alice = Identity::new("Alice", "alice@example.com");
            let bob = Identity::new("Bob", "bob@example.com");
            store.insert_identity(alice.clone()).await;
            store.insert_identity(bob.clone()).await;
            Self {
                store,
                broadcaster: Broadcaster::new(16),
                alice,
                bob,
            }
        }

        fn coordinator(&self) -> DeliveryCoordinator {
            self.coordinator_with(Arc::new(InlineBlobStore))
        }

        fn coordinator_with(&self, blobs: Arc<dyn BlobStore>) -> DeliveryCoordinator {
            DeliveryCoordinator::new(self.store.clone(), self.store.clone(), blobs, self.broadcaster.clone())
        }
    }

    #[tokio::test]
    async fn test_send_persists_and_publishes() {
        let fx = Fixture::new().await;
        let mut sub = fx.broadcaster.subscribe();

        let message = fx
            .coordinator()
            .send(fx.alice.id, fx.bob.id, Some("hi".to_string()), None)
            .await
            .unwrap();

        assert_eq!(message.sender_id, fx.alice.id);
        assert_eq!(message.receiver_id, fx.bob.id);
        assert_eq!(fx.store.message_count().await, 1);
        assert_eq!(sub.recv().await.unwrap(), RealtimeEvent::MessageDelivered(message));
    }

    #[tokio::test]
    async fn test_send_to_offline_receiver_is_ok() {
        let fx = Fixture::new().await;
        // No subscribers at all
        let result = fx.coordinator().send(fx.alice.id, fx.bob.id, Some("hi".to_string()), None).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_send_empty() {
        let fx = Fixture::new().await;
        let result = fx.coordinator().send(fx.alice.id, fx.bob.id, Some(String::new()), None).await;
        assert_eq!(result.unwrap_err(), SendError::Empty);
        assert_eq!(fx.store.message_count().await, 0);
    }

    #[tokio::test]
    async fn test_send_to_self() {
        let fx = Fixture::new().await;
        let result = fx.coordinator().send(fx.alice.id, fx.alice.id, Some("me".to_string()), None).await;
        assert_eq!(result.unwrap_err(), SendError::SelfTarget);
    }

    #[tokio::test]
    async fn test_send_unknown_receiver() {
        let fx = Fixture::new().await;
        let result = fx
            .coordinator()
            .send(fx.alice.id, Uuid::new_v4(), Some("hi".to_string()), None)
            .await;
        assert_eq!(result.unwrap_err(), SendError::UnknownReceiver);
    }

    #[tokio::test]
    async fn test_persistence_failure_broadcasts_nothing() {
        let fx = Fixture::new().await;
        let mut sub = fx.broadcaster.subscribe();
        fx.store.set_fail_writes(true);

        let err = fx
            .coordinator()
            .send(fx.alice.id, fx.bob.id, Some("hi".to_string()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Persistence(_)));
        assert!(err.is_retryable());
        assert!(sub.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_submit_uploads_image() {
        let fx = Fixture::new().await;
        let message = fx
            .coordinator()
            .submit(fx.alice.id, fx.bob.id, SendMessageBody::image("data:image/png;base64,AAAA"))
            .await
            .unwrap();
        assert_eq!(message.image.as_deref(), Some("data:image/png;base64,AAAA"));
        assert_eq!(message.text, None);
    }

    #[tokio::test]
    async fn test_submit_image_upload_failure() {
        let fx = Fixture::new().await;
        let err = fx
            .coordinator_with(Arc::new(FailingBlobs))
            .submit(fx.alice.id, fx.bob.id, SendMessageBody::image("data:image/png;base64,AAAA"))
            .await
            .unwrap_err();
        assert_eq!(err, SendError::ImageUpload("service down".to_string()));
        assert_eq!(fx.store.message_count().await, 0);
    }

    #[tokio::test]
    async fn test_submit_rejects_before_upload() {
        let fx = Fixture::new().await;
        // The failing blob store is never reached for an unknown receiver
        let err = fx
            .coordinator_with(Arc::new(FailingBlobs))
            .submit(fx.alice.id, Uuid::new_v4(), SendMessageBody::image("data:image/png;base64,AAAA"))
            .await
            .unwrap_err();
        assert_eq!(err, SendError::UnknownReceiver);
    }

    #[tokio::test]
    async fn test_submit_empty_body() {
        let fx = Fixture::new().await;
        let err = fx
            .coordinator()
            .submit(fx.alice.id, fx.bob.id, SendMessageBody::default())
            .await
            .unwrap_err();
        assert_eq!(err, SendError::Empty);
        assert!(!err.is_retryable());
    }
}
