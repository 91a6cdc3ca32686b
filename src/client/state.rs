/**
 * Client Chat State
 *
 * Everything a client needs to render the chat: the online set, one
 * `Conversation` per partner, and whether the user has to log in again.
 * Server frames are applied with `apply`; nothing here performs I/O.
 *
 * # Online Set
 *
 * `online_users` frames carry the full set, so the local set is replaced
 * wholesale rather than patched. Frames older than the one already applied
 * (lower revision) are ignored. Revisions only order frames within one
 * connection: a restarted server counts from zero again, so the transport
 * calls `connection_lost` and `connection_opened` around every reconnect.
 *
 * # Failed Sends
 *
 * A `send_failed` frame removes the pending entry and keeps it in
 * `last_failure`, together with whether the server considers it
 * retryable. `retry_failed` resubmits a retryable one.
 */
use std::collections::{BTreeSet, HashMap};

use uuid::Uuid;

use crate::client::optimistic::{Conversation, PendingMessage};
use crate::shared::{ClientEvent, SendMessageBody, ServerEvent, SharedError};

/// The most recent send the server refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFailure {
    pub error: String,
    pub retryable: bool,
    /// The optimistic entry that was withdrawn; `None` when the frame did not
    /// match a pending send
    pub pending: Option<PendingMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatState {
    me: Uuid,
    online: BTreeSet<Uuid>,
    online_revision: Option<u64>,
    conversations: HashMap<Uuid, Conversation>,
    needs_login: bool,
    last_error: Option<String>,
    last_failure: Option<SendFailure>,
}

impl ChatState {
    pub fn new(me: Uuid) -> Self {
        Self {
            me,
            online: BTreeSet::new(),
            online_revision: None,
            conversations: HashMap::new(),
            needs_login: false,
            last_error: None,
            last_failure: None,
        }
    }

    pub fn me(&self) -> Uuid {
        self.me
    }

    pub fn is_online(&self, user: Uuid) -> bool {
        self.online.contains(&user)
    }

    pub fn online_users(&self) -> impl Iterator<Item = &Uuid> {
        self.online.iter()
    }

    pub fn needs_login(&self) -> bool {
        self.needs_login
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_failure(&self) -> Option<&SendFailure> {
        self.last_failure.as_ref()
    }

    pub fn conversation(&self, partner: Uuid) -> Option<&Conversation> {
        self.conversations.get(&partner)
    }

    pub fn conversation_mut(&mut self, partner: Uuid) -> &mut Conversation {
        let me = self.me;
        self.conversations
            .entry(partner)
            .or_insert_with(|| Conversation::new(me, partner))
    }

    /// Start an optimistic send and build the socket frame for it
    pub fn send(&mut self, partner: Uuid, body: SendMessageBody) -> Result<ClientEvent, SharedError> {
        let body = body.normalized();
        let temp_id = self.conversation_mut(partner).begin_send(body.clone())?;
        Ok(ClientEvent::send_message(Some(temp_id), partner, body))
    }

    /// Resubmit the last failed send if the server marked it retryable
    ///
    /// Returns `None` (and keeps the failure) when there is nothing to retry.
    pub fn retry_failed(&mut self) -> Option<Result<ClientEvent, SharedError>> {
        if !self.last_failure.as_ref().is_some_and(|f| f.retryable && f.pending.is_some()) {
            return None;
        }
        let pending = self.last_failure.take()?.pending?;
        let body = SendMessageBody {
            text: pending.text,
            image: pending.image,
        };
        Some(self.send(pending.receiver_id, body))
    }

    /// Apply one server frame
    pub fn apply(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::OnlineUsers { revision, online } => {
                if self.online_revision.is_some_and(|current| revision < current) {
                    return;
                }
                self.online_revision = Some(revision);
                self.online = online.into_iter().collect();
            }
            ServerEvent::NewMessage { message } => {
                let partner = message.counterpart(self.me);
                self.conversation_mut(partner).receive(message);
            }
            ServerEvent::MessageSent { client_id, message } => {
                let partner = message.counterpart(self.me);
                let conversation = self.conversation_mut(partner);
                match client_id {
                    Some(temp_id) => {
                        conversation.confirm(temp_id, message);
                    }
                    None => {
                        conversation.receive(message);
                    }
                }
            }
            ServerEvent::SendFailed {
                client_id,
                error,
                retryable,
            } => {
                let pending = client_id.and_then(|temp_id| {
                    self.conversations
                        .values_mut()
                        .find_map(|conversation| conversation.fail(temp_id))
                });
                self.last_error = Some(error.clone());
                self.last_failure = Some(SendFailure {
                    error,
                    retryable,
                    pending,
                });
            }
            ServerEvent::Pong => {}
            ServerEvent::Error { message } => {
                self.last_error = Some(message);
            }
        }
    }

    /// A socket was (re)established
    ///
    /// Forgets the last applied revision so the new connection's first
    /// snapshot is accepted even if its counter restarted.
    pub fn connection_opened(&mut self) {
        self.online_revision = None;
        self.needs_login = false;
    }

    /// The socket dropped; presence is unknown until the next snapshot
    pub fn connection_lost(&mut self) {
        self.online.clear();
        self.online_revision = None;
    }

    /// The server refused the connection (e.g. expired token)
    pub fn connection_rejected(&mut self, reason: impl Into<String>) {
        self.needs_login = true;
        self.online.clear();
        self.online_revision = None;
        self.last_error = Some(reason.into());
    }
}
