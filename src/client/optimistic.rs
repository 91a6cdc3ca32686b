//! # Optimistic Messages
//!
//! A sent message shows up in the conversation immediately as a pending
//! entry with a client-generated temporary id. When the server acknowledges
//! the send, the pending entry is replaced in place by the durable message;
//! when the send fails, it is removed again.
//!
//! ## Usage
//!
//! ```rust
//! use chatline::client::Conversation;
//! use chatline::shared::SendMessageBody;
//! use uuid::Uuid;
//!
//! let mut conversation = Conversation::new(Uuid::new_v4(), Uuid::new_v4());
//! let temp_id = conversation.begin_send(SendMessageBody::text("hi")).unwrap();
//! assert_eq!(conversation.pending_count(), 1);
//! conversation.fail(temp_id);
//! assert_eq!(conversation.pending_count(), 0);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::{Message, SendMessageBody, SharedError};

/// A message that has been submitted but not acknowledged
///
/// Lives only on the client; the temporary id never reaches server state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingMessage {
    pub temp_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub text: Option<String>,
    /// Raw image payload as submitted (not yet a URL)
    pub image: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// One row of a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChatEntry {
    Pending(PendingMessage),
    Durable(Message),
}

impl ChatEntry {
    /// Temporary id for pending entries, durable id otherwise
    pub fn id(&self) -> Uuid {
        match self {
            Self::Pending(pending) => pending.temp_id,
            Self::Durable(message) => message.id,
        }
    }

    pub fn sender_id(&self) -> Uuid {
        match self {
            Self::Pending(pending) => pending.sender_id,
            Self::Durable(message) => message.sender_id,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Pending(pending) => pending.text.as_deref(),
            Self::Durable(message) => message.text.as_deref(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// The entries exchanged between the local user and one partner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    me: Uuid,
    partner: Uuid,
    entries: Vec<ChatEntry>,
}

impl Conversation {
    pub fn new(me: Uuid, partner: Uuid) -> Self {
        Self {
            me,
            partner,
            entries: Vec::new(),
        }
    }

    pub fn partner(&self) -> Uuid {
        self.partner
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_pending()).count()
    }

    pub fn has_pending(&self, temp_id: Uuid) -> bool {
        self.position(temp_id, true).is_some()
    }

    fn position(&self, id: Uuid, pending: bool) -> Option<usize> {
        self.entries.iter().position(|e| e.is_pending() == pending && e.id() == id)
    }

    /// Replace the durable history, keeping in-flight sends at the end
    pub fn load_history(&mut self, history: Vec<Message>) {
        let pending: Vec<ChatEntry> = self.entries.drain(..).filter(ChatEntry::is_pending).collect();
        self.entries = history
            .into_iter()
            .filter(|m| m.is_between(self.me, self.partner))
            .map(ChatEntry::Durable)
            .collect();
        self.entries.extend(pending);
    }

    /// Add a pending entry for `body` and return its temporary id
    pub fn begin_send(&mut self, body: SendMessageBody) -> Result<Uuid, SharedError> {
        let body = body.normalized();
        body.validate()?;

        let temp_id = Uuid::new_v4();
        self.entries.push(ChatEntry::Pending(PendingMessage {
            temp_id,
            sender_id: self.me,
            receiver_id: self.partner,
            text: body.text,
            image: body.image,
            submitted_at: Utc::now(),
        }));
        Ok(temp_id)
    }

    /// Swap the pending entry for the server's durable record
    ///
    /// Returns `false` when no such pending entry exists (already confirmed
    /// or failed); the durable message is then added unless already present.
    pub fn confirm(&mut self, temp_id: Uuid, message: Message) -> bool {
        let already_present = self.position(message.id, false).is_some();
        match self.position(temp_id, true) {
            Some(index) if already_present => {
                self.entries.remove(index);
                true
            }
            Some(index) => {
                self.entries[index] = ChatEntry::Durable(message);
                true
            }
            None => {
                self.receive(message);
                false
            }
        }
    }

    /// Drop a pending entry whose send was rejected
    pub fn fail(&mut self, temp_id: Uuid) -> Option<PendingMessage> {
        let index = self.position(temp_id, true)?;
        match self.entries.remove(index) {
            ChatEntry::Pending(pending) => Some(pending),
            ChatEntry::Durable(_) => None,
        }
    }

    /// Append a durable message pushed by the server
    ///
    /// Ignores messages from other conversations and duplicates.
    pub fn receive(&mut self, message: Message) -> bool {
        if !message.is_between(self.me, self.partner) || self.position(message.id, false).is_some() {
            return false;
        }
        self.entries.push(ChatEntry::Durable(message));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn durable(sender: Uuid, receiver: Uuid, text: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender_id: sender,
            receiver_id: receiver,
            text: Some(text.to_string()),
            image: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_begin_send_adds_pending() {
        let (me, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mut conversation = Conversation::new(me, bob);
        let temp_id = conversation.begin_send(SendMessageBody::text("hello")).unwrap();

        assert_eq!(conversation.entries().len(), 1);
        let entry = &conversation.entries()[0];
        assert!(entry.is_pending());
        assert_eq!(entry.id(), temp_id);
        assert_eq!(entry.text(), Some("hello"));
        assert_eq!(entry.sender_id(), me);
    }

    #[test]
    fn test_begin_send_rejects_empty() {
        let mut conversation = Conversation::new(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            conversation.begin_send(SendMessageBody::text("")),
            Err(SharedError::EmptyMessage)
        );
        assert!(conversation.entries().is_empty());
    }

    #[test]
    fn test_confirm_replaces_in_place() {
        let (me, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mut conversation = Conversation::new(me, bob);
        let first = conversation.begin_send(SendMessageBody::text("one")).unwrap();
        conversation.begin_send(SendMessageBody::text("two")).unwrap();

        let stored = durable(me, bob, "one");
        assert!(conversation.confirm(first, stored.clone()));
        assert_eq!(conversation.entries()[0], ChatEntry::Durable(stored));
        assert!(conversation.entries()[1].is_pending());
        assert_eq!(conversation.pending_count(), 1);
    }

    #[test]
    fn test_confirm_unknown_temp_id_adds_durable_once() {
        let (me, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mut conversation = Conversation::new(me, bob);
        let stored = durable(me, bob, "late");
        assert!(!conversation.confirm(Uuid::new_v4(), stored.clone()));
        assert!(!conversation.confirm(Uuid::new_v4(), stored));
        assert_eq!(conversation.entries().len(), 1);
    }

    #[test]
    fn test_fail_removes_pending() {
        let mut conversation = Conversation::new(Uuid::new_v4(), Uuid::new_v4());
        let temp_id = conversation.begin_send(SendMessageBody::text("oops")).unwrap();
        let removed = conversation.fail(temp_id).unwrap();
        assert_eq!(removed.text.as_deref(), Some("oops"));
        assert!(conversation.entries().is_empty());
        assert_eq!(conversation.fail(temp_id), None);
    }

    #[test]
    fn test_receive_filters_other_conversations_and_duplicates() {
        let (me, bob, carol) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut conversation = Conversation::new(me, bob);
        let from_bob = durable(bob, me, "hi");

        assert!(conversation.receive(from_bob.clone()));
        assert!(!conversation.receive(from_bob));
        assert!(!conversation.receive(durable(carol, me, "wrong chat")));
        assert_eq!(conversation.entries().len(), 1);
    }

    #[test]
    fn test_load_history_keeps_pending() {
        let (me, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mut conversation = Conversation::new(me, bob);
        let temp_id = conversation.begin_send(SendMessageBody::text("in flight")).unwrap();

        conversation.load_history(vec![durable(bob, me, "old")]);
        assert_eq!(conversation.entries().len(), 2);
        assert_eq!(conversation.entries()[0].text(), Some("old"));
        assert!(conversation.has_pending(temp_id));
    }
}
