/**
 * Message Data Structures
 *
 * This module defines the durable direct message and the body a client
 * submits to create one. Both are shared between the server and clients so
 * the REST path, the socket path and the client's optimistic state all
 * validate and serialize the same way.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// A persisted direct message
///
/// `id` and `created_at` are assigned by the message store when the message
/// is persisted. A `Message` is immutable afterwards.
///
/// At least one of `text` and `image` is present on every persisted message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Durable ID assigned by the store
    pub id: Uuid,
    /// Identity that sent the message
    pub sender_id: Uuid,
    /// Identity the message is addressed to
    pub receiver_id: Uuid,
    /// Optional text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Optional image URL (already uploaded to the blob store)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Persistence timestamp
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether this message belongs to the conversation between `a` and `b`
    pub fn is_between(&self, a: Uuid, b: Uuid) -> bool {
        (self.sender_id == a && self.receiver_id == b) || (self.sender_id == b && self.receiver_id == a)
    }

    /// The other participant, seen from `me`
    pub fn counterpart(&self, me: Uuid) -> Uuid {
        if self.sender_id == me {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

/// Body of a send request: `{text?, image?}`
///
/// Used verbatim as the REST request body and as the payload of the
/// `send_message` socket frame. `image` is the raw upload payload (usually a
/// base64 data URI); the server replaces it by the blob store URL before the
/// message is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageBody {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl SendMessageBody {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }

    pub fn image(image: impl Into<String>) -> Self {
        Self {
            text: None,
            image: Some(image.into()),
        }
    }

    /// Drop empty strings so that `""` counts as absent
    pub fn normalized(self) -> Self {
        Self {
            text: self.text.filter(|t| !t.is_empty()),
            image: self.image.filter(|i| !i.is_empty()),
        }
    }

    pub fn has_content(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
            || self.image.as_deref().is_some_and(|i| !i.is_empty())
    }

    /// Validate the body
    ///
    /// # Errors
    ///
    /// * `SharedError::EmptyMessage` - neither text nor image is present
    /// * `SharedError::ValidationError` - the image payload is only whitespace
    pub fn validate(&self) -> Result<(), SharedError> {
        if !self.has_content() {
            return Err(SharedError::EmptyMessage);
        }
        if let Some(image) = &self.image {
            if !image.is_empty() && image.trim().is_empty() {
                return Err(SharedError::validation("image", "image payload must not be blank"));
            }
        }
        Ok(())
    }
}
