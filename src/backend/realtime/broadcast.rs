/**
 * Real-time Event Broadcasting
 *
 * Fans events out to every connected session using `tokio::sync::broadcast`,
 * a multi-producer, multi-consumer channel where every subscriber receives a
 * copy of each event.
 *
 * # Event Types
 *
 * - `OnlineSetChanged` - the full online set after a presence change
 * - `MessageDelivered` - a persisted message; sessions keep only the ones
 *   addressed to their own identity
 *
 * # Delivery
 *
 * Delivery is best-effort. A subscriber that falls more than the channel
 * capacity behind loses the oldest events (`DeliveryError::Lagged`) and keeps
 * going; nothing is retried. Presence events carry a revision and stale ones
 * are dropped at publish time, so subscribers never see the online set move
 * backwards.
 */
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::backend::presence::registry::PresenceChange;
use crate::shared::{Message, ServerEvent};

/// Event carried on the broadcast channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeEvent {
    OnlineSetChanged { revision: u64, online: Vec<Uuid> },
    MessageDelivered(Message),
}

impl RealtimeEvent {
    /// Whether a session authenticated as `identity` should see this event
    pub fn is_visible_to(&self, identity: Uuid) -> bool {
        match self {
            Self::OnlineSetChanged { .. } => true,
            Self::MessageDelivered(message) => message.receiver_id == identity,
        }
    }
}

impl From<RealtimeEvent> for ServerEvent {
    fn from(event: RealtimeEvent) -> Self {
        match event {
            RealtimeEvent::OnlineSetChanged { revision, online } => ServerEvent::OnlineUsers { revision, online },
            RealtimeEvent::MessageDelivered(message) => ServerEvent::NewMessage { message },
        }
    }
}

/// Failures delivering an event to one subscriber
///
/// Logged, never surfaced to the sender and never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Subscriber lagged behind and skipped {0} events")]
    Lagged(u64),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to encode event: {0}")]
    Encode(String),
}

/// Handle to the broadcast channel; cheap to clone
#[derive(Debug, Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<RealtimeEvent>,
    last_presence_revision: Arc<Mutex<u64>>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            last_presence_revision: Arc::new(Mutex::new(0)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.tx.subscribe()
    }

    /// Send an event to every current subscriber
    ///
    /// Returns the number of subscribers that received it (0 if none).
    pub fn publish(&self, event: RealtimeEvent) -> usize {
        match self.tx.send(event) {
            Ok(subscriber_count) => {
                tracing::debug!("[Realtime] Event broadcast to {} subscribers", subscriber_count);
                subscriber_count
            }
            Err(_) => {
                tracing::debug!("[Realtime] No subscribers to receive event");
                0
            }
        }
    }

    /// Publish the online set carried by `change`
    ///
    /// Dropped when a newer revision has already gone out. Returns `None` for
    /// a dropped event, otherwise the subscriber count.
    pub fn publish_presence(&self, change: &PresenceChange) -> Option<usize> {
        let mut last = self.last_presence_revision.lock().unwrap_or_else(PoisonError::into_inner);
        if change.revision <= *last {
            tracing::debug!(
                "[Realtime] Dropping stale presence revision {} (last published {})",
                change.revision,
                *last
            );
            return None;
        }
        *last = change.revision;

        // Sent under the lock so two publishers cannot reorder revisions
        Some(self.publish(RealtimeEvent::OnlineSetChanged {
            revision: change.revision,
            online: change.online.clone(),
        }))
    }
}
