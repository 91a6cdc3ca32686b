//! Presence Hub
//!
//! Bundles the collaborators every connection session needs: the registry,
//! the broadcast channel, the credential verifier and the identity store.
//! Cloning is cheap; every field is shared.

use std::sync::Arc;

use crate::backend::auth::CredentialVerifier;
use crate::backend::presence::registry::PresenceRegistry;
use crate::backend::presence::session::PendingSession;
use crate::backend::realtime::broadcast::Broadcaster;
use crate::backend::store::IdentityStore;
use crate::shared::OnlineSnapshot;

#[derive(Clone)]
pub struct PresenceHub {
    pub registry: Arc<PresenceRegistry>,
    pub broadcaster: Broadcaster,
    pub verifier: CredentialVerifier,
    pub identities: Arc<dyn IdentityStore>,
}

impl PresenceHub {
    pub fn new(
        registry: Arc<PresenceRegistry>,
        broadcaster: Broadcaster,
        verifier: CredentialVerifier,
        identities: Arc<dyn IdentityStore>,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            verifier,
            identities,
        }
    }

    /// Start a new connection session in the `Connecting` state
    pub fn connect(&self) -> PendingSession {
        PendingSession::new(self)
    }

    pub fn snapshot(&self) -> OnlineSnapshot {
        let (revision, online) = self.registry.snapshot_with_revision();
        OnlineSnapshot { revision, online }
    }
}
