/**
 * Application State Management
 *
 * `AppState` is the central state container handed to every handler. It
 * holds the presence hub (registry, broadcast channel, verifier), the
 * delivery coordinator and the store collaborators.
 *
 * # State Extraction
 *
 * The `FromRef` implementations let handlers extract only the part they
 * need, e.g. `State(hub): State<PresenceHub>`.
 *
 * # Thread Safety
 *
 * Every field is cheap to clone and shares its data: stores sit behind
 * `Arc<dyn Trait>`, the registry behind an `Arc<Mutex<..>>`, and the
 * broadcast sender is itself a shared handle.
 */
use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::auth::CredentialVerifier;
use crate::backend::messaging::DeliveryCoordinator;
use crate::backend::presence::{PresenceHub, PresenceRegistry};
use crate::backend::realtime::broadcast::Broadcaster;
use crate::backend::server::config::ServerConfig;
use crate::backend::store::{BlobStore, IdentityStore, MessageStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub hub: PresenceHub,
    pub delivery: DeliveryCoordinator,
    pub identities: Arc<dyn IdentityStore>,
    pub messages: Arc<dyn MessageStore>,
}

impl AppState {
    /// Wire the realtime core to its collaborators
    pub fn new(
        config: ServerConfig,
        identities: Arc<dyn IdentityStore>,
        messages: Arc<dyn MessageStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let broadcaster = Broadcaster::new(config.broadcast_capacity);
        let verifier = CredentialVerifier::new(&config.jwt_secret, identities.clone());
        let hub = PresenceHub::new(
            Arc::new(PresenceRegistry::new()),
            broadcaster.clone(),
            verifier,
            identities.clone(),
        );
        let delivery = DeliveryCoordinator::new(identities.clone(), messages.clone(), blobs, broadcaster);

        Self {
            config: Arc::new(config),
            hub,
            delivery,
            identities,
            messages,
        }
    }
}

impl FromRef<AppState> for PresenceHub {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.hub.clone()
    }
}

impl FromRef<AppState> for DeliveryCoordinator {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.delivery.clone()
    }
}

impl FromRef<AppState> for Arc<ServerConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
