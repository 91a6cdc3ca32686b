/**
 * Server Initialization
 *
 * Builds the collaborators from the configuration and assembles the router.
 *
 * # Initialization Process
 *
 * 1. Connect to PostgreSQL if `DATABASE_URL` is set, otherwise use the
 *    in-memory stores
 * 2. Pick the blob store (`BLOB_UPLOAD_URL` or inline)
 * 3. Create the application state (registry, broadcast channel, verifier,
 *    delivery coordinator)
 * 4. Create the router
 */
use std::sync::Arc;

use axum::Router;

use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;
use crate::backend::store::{BlobStore, HttpBlobStore, IdentityStore, InlineBlobStore, MemoryStore, MessageStore, PgStore};

/// Create and configure the Axum application from `config`
pub async fn create_app(config: ServerConfig) -> Router<()> {
    tracing::info!("Initializing chatline backend server");

    let (identities, messages): (Arc<dyn IdentityStore>, Arc<dyn MessageStore>) =
        match load_database(config.database_url.as_deref()).await {
            Some(pool) => {
                let store = Arc::new(PgStore::new(pool));
                (store.clone() as Arc<dyn IdentityStore>, store as Arc<dyn MessageStore>)
            }
            None => {
                let store = Arc::new(MemoryStore::new());
                (store.clone() as Arc<dyn IdentityStore>, store as Arc<dyn MessageStore>)
            }
        };

    let blobs: Arc<dyn BlobStore> = match &config.blob_upload_url {
        Some(url) => {
            tracing::info!("Uploading images to {}", url);
            Arc::new(HttpBlobStore::new(url.clone()))
        }
        None => {
            tracing::warn!("BLOB_UPLOAD_URL not set. Images are stored inline.");
            Arc::new(InlineBlobStore)
        }
    };

    create_app_with_state(AppState::new(config, identities, messages, blobs))
}

/// Create the application around an already wired state
///
/// Used by the integration tests to run against in-memory stores.
pub fn create_app_with_state(app_state: AppState) -> Router<()> {
    let app = create_router(app_state);
    tracing::info!("Router configured");
    app
}
