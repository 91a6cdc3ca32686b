/**
 * Connection Session
 *
 * One session per live client connection, modelled as a typestate:
 *
 * ```text
 * Connecting --authenticate--> Authenticated --activate--> Active --close--> Closed
 *      |                              |
 *      +--------- (failure) ----------+------------------------------------> Closed
 * ```
 *
 * - `PendingSession` (Connecting) holds a freshly allocated handle.
 * - `AuthenticatedSession` knows its identity but is not yet visible to
 *   anyone.
 * - `ActiveSession` is registered in the presence registry and subscribed
 *   to the broadcast channel.
 *
 * Only `ActiveSession` touches shared state. `close()` undoes its
 * registration; dropping an `ActiveSession` without closing it (a panicked
 * socket task, an aborted future) deregisters it too, so a dead connection
 * never leaves its identity marked online.
 */
use std::collections::VecDeque;

use chrono::Utc;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::backend::auth::AuthError;
use crate::backend::presence::hub::PresenceHub;
use crate::backend::presence::registry::{ConnectionId, PresenceChange, PresenceError, Transition};
use crate::backend::realtime::broadcast::{DeliveryError, RealtimeEvent};
use crate::shared::{Identity, ServerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticated,
    Active,
    Closed,
}

/// A connection that has not presented credentials yet
pub struct PendingSession {
    hub: PresenceHub,
    handle: ConnectionId,
}

impl PendingSession {
    pub fn new(hub: &PresenceHub) -> Self {
        Self {
            hub: hub.clone(),
            handle: hub.registry.next_handle(),
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState::Connecting
    }

    pub fn handle(&self) -> ConnectionId {
        self.handle
    }

    /// Verify the presented token
    ///
    /// On failure the session is over; the caller closes the transport with
    /// the error text as the reason.
    pub async fn authenticate(self, token: Option<&str>) -> Result<AuthenticatedSession, AuthError> {
        match self.hub.verifier.verify(token).await {
            Ok(identity) => {
                tracing::info!(
                    "[Presence] {} authenticated as {} ({})",
                    self.handle,
                    identity.full_name,
                    identity.id
                );
                Ok(AuthenticatedSession {
                    hub: self.hub,
                    identity,
                    handle: self.handle,
                })
            }
            Err(e) => {
                tracing::warn!("[Presence] {} rejected: {}", self.handle, e);
                Err(e)
            }
        }
    }
}

/// A verified connection that is not registered yet
pub struct AuthenticatedSession {
    hub: PresenceHub,
    identity: Identity,
    handle: ConnectionId,
}

impl AuthenticatedSession {
    pub fn state(&self) -> SessionState {
        SessionState::Authenticated
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Register the connection and start receiving events
    ///
    /// Subscribes before registering so this session sees the broadcast its
    /// own registration causes. When the identity was already online only
    /// this session gets the current online set.
    pub fn activate(self) -> Result<ActiveSession, PresenceError> {
        let receiver = self.hub.broadcaster.subscribe();
        let change = self.hub.registry.register(self.identity.id, self.handle)?;

        let mut pending = VecDeque::new();
        match change.transition {
            Transition::CameOnline => {
                tracing::info!("[Presence] {} came online", self.identity.full_name);
                self.hub.broadcaster.publish_presence(&change);
            }
            _ => {
                tracing::debug!(
                    "[Presence] {} opened another connection ({})",
                    self.identity.full_name,
                    self.handle
                );
                pending.push_back(ServerEvent::OnlineUsers {
                    revision: change.revision,
                    online: change.online,
                });
            }
        }

        Ok(ActiveSession {
            hub: self.hub,
            identity: self.identity,
            handle: self.handle,
            receiver: Some(receiver),
            pending,
            last_presence_revision: 0,
            closed: false,
        })
    }
}

/// A registered connection receiving realtime events
pub struct ActiveSession {
    hub: PresenceHub,
    identity: Identity,
    handle: ConnectionId,
    receiver: Option<broadcast::Receiver<RealtimeEvent>>,
    pending: VecDeque<ServerEvent>,
    last_presence_revision: u64,
    closed: bool,
}

impl ActiveSession {
    pub fn state(&self) -> SessionState {
        SessionState::Active
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn identity_id(&self) -> Uuid {
        self.identity.id
    }

    pub fn handle(&self) -> ConnectionId {
        self.handle
    }

    // Presence snapshots are only delivered in increasing revision order
    fn accept(&mut self, event: ServerEvent) -> Option<ServerEvent> {
        if let ServerEvent::OnlineUsers { revision, .. } = &event {
            if *revision < self.last_presence_revision {
                return None;
            }
            self.last_presence_revision = *revision;
        }
        Some(event)
    }

    /// Next event for this connection
    ///
    /// Yields presence snapshots and messages addressed to this identity.
    /// Returns `None` once the broadcast channel is gone. Cancel-safe.
    pub async fn next_event(&mut self) -> Option<ServerEvent> {
        while let Some(event) = self.pending.pop_front() {
            if let Some(event) = self.accept(event) {
                return Some(event);
            }
        }

        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(event) if event.is_visible_to(self.identity.id) => {
                    if let Some(event) = self.accept(event.into()) {
                        return Some(event);
                    }
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[Realtime] {}: {}", self.handle, DeliveryError::Lagged(skipped));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn deregister(&mut self) -> PresenceChange {
        self.closed = true;
        self.receiver = None;
        let change = self.hub.registry.deregister(self.identity.id, self.handle);
        if change.transition == Transition::WentOffline {
            tracing::info!("[Presence] {} went offline", self.identity.full_name);
            self.hub.broadcaster.publish_presence(&change);
        }
        change
    }

    /// Deregister the connection and announce the change
    ///
    /// Records `last_seen` when this was the identity's last connection.
    pub async fn close(mut self) -> SessionState {
        let change = self.deregister();
        if change.transition == Transition::WentOffline {
            if let Err(e) = self.hub.identities.touch_last_seen(self.identity.id, Utc::now()).await {
                tracing::warn!("[Presence] Failed to record last_seen for {}: {}", self.identity.id, e);
            }
        }
        tracing::debug!("[Presence] {} closed", self.handle);
        SessionState::Closed
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        tracing::warn!("[Presence] {} dropped without close, deregistering", self.handle);
        let change = self.deregister();
        if change.transition == Transition::WentOffline {
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                let identities = self.hub.identities.clone();
                let id = self.identity.id;
                runtime.spawn(async move {
                    if let Err(e) = identities.touch_last_seen(id, Utc::now()).await {
                        tracing::warn!("[Presence] Failed to record last_seen for {}: {}", id, e);
                    }
                });
            }
        }
    }
}
