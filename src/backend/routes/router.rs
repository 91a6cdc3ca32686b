/**
 * Router Configuration
 *
 * Combines every route into a single Axum router.
 *
 * # Routes
 *
 * Public:
 * - `GET /health` - liveness check
 * - `GET /ws` - WebSocket upgrade (authenticates itself, see `realtime::socket`)
 * - `POST /api/auth/logout` - expire the session cookie
 *
 * Behind `auth_middleware`:
 * - `POST /api/auth/refresh` - reissue the session cookie
 * - `POST /api/messages/send/{id}` - send a direct message
 * - `GET /api/messages/contacts` - every other identity
 * - `GET /api/messages/chats` - identities with a shared conversation
 * - `GET /api/messages/{id}` - conversation history
 * - `GET /api/presence` - current online set
 * - `GET /api/users/{id}/status` - one identity's presence and last seen
 *
 * # Layers
 *
 * `TraceLayer` logs every request; `CorsLayer` allows the configured
 * `CLIENT_URL` with credentials (cookies), or any origin without
 * credentials when no client URL is configured.
 */
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::backend::auth::handlers::{logout, refresh};
use crate::backend::messaging::handlers::{get_chat_partners, get_contacts, get_messages, send_message};
use crate::backend::middleware::auth_middleware;
use crate::backend::presence::handlers::{get_presence, get_user_status};
use crate::backend::realtime::socket::ws_handler;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let protected = Router::new()
        .route("/api/auth/refresh", post(refresh))
        .route("/api/messages/send/{id}", post(send_message))
        .route("/api/messages/contacts", get(get_contacts))
        .route("/api/messages/chats", get(get_chat_partners))
        .route("/api/messages/{id}", get(get_messages))
        .route("/api/presence", get(get_presence))
        .route("/api/users/{id}/status", get(get_user_status))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware));

    let cors = cors_layer(app_state.config.client_url.as_deref());

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/ws", get(ws_handler))
        .route("/api/auth/logout", post(logout))
        .merge(protected)
        .fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "404 Not Found") })
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(app_state)
}

fn cors_layer(client_url: Option<&str>) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    match client_url.and_then(|url| HeaderValue::from_str(url).ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true),
        None => CorsLayer::new().allow_origin(Any).allow_methods(methods).allow_headers(Any),
    }
}
