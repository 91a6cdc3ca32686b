//! Presence HTTP Handlers
//!
//! Read-only views over the presence registry for clients that are not (or
//! not yet) connected over the socket.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::presence::hub::PresenceHub;
use crate::shared::{OnlineSnapshot, UserStatus};

/// `GET /api/presence`
pub async fn get_presence(State(hub): State<PresenceHub>) -> Json<OnlineSnapshot> {
    Json(hub.snapshot())
}

/// `GET /api/users/{id}/status`
pub async fn get_user_status(
    State(hub): State<PresenceHub>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserStatus>, BackendError> {
    let identity = hub
        .identities
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| BackendError::handler(StatusCode::NOT_FOUND, "User not found"))?;

    let online = hub.registry.is_online(user_id);
    Ok(Json(UserStatus::from_identity(identity, online)))
}
