//! Messaging HTTP Handlers
//!
//! REST endpoints for sending messages and reading conversations. All of
//! them sit behind the auth middleware and act as the authenticated user.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::{Identity, Message, SendMessageBody};

/// `POST /api/messages/send/{id}`
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(receiver_id): Path<Uuid>,
    Json(body): Json<SendMessageBody>,
) -> Result<(StatusCode, Json<Message>), BackendError> {
    let message = state.delivery.submit(user.user_id, receiver_id, body).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// `GET /api/messages/{id}`
///
/// Conversation between the caller and `id`, oldest first.
pub async fn get_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(other_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, BackendError> {
    let messages = state.messages.find_conversation(user.user_id, other_id).await?;
    Ok(Json(messages))
}

/// `GET /api/messages/contacts`
pub async fn get_contacts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Identity>>, BackendError> {
    let contacts = state.identities.list_except(user.user_id).await?;
    Ok(Json(contacts))
}

/// `GET /api/messages/chats`
///
/// Everyone the caller has exchanged at least one message with.
pub async fn get_chat_partners(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Identity>>, BackendError> {
    let partner_ids = state.messages.partner_ids(user.user_id).await?;
    let partners = state.identities.find_many(&partner_ids).await?;
    Ok(Json(partners))
}
