/**
 * Session Cookie Handlers
 *
 * Renewal and removal of the `jwt` cookie. Signup and login live in the
 * account service; these endpoints only work on an existing credential.
 *
 * # Endpoints
 *
 * - `POST /api/auth/refresh` (protected) - issue a fresh token for the
 *   caller with the configured `TOKEN_TTL_DAYS` and set it as the cookie
 * - `POST /api/auth/logout` (public) - expire the cookie
 */
use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};

use crate::backend::auth::{cleared_session_cookie, issue_token, session_cookie};
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::Identity;

/// Refresh the caller's session cookie
///
/// # Returns
/// The caller's identity, with a `Set-Cookie` carrying the new token.
/// `Secure` follows `cookie_secure` from the server config.
///
/// # Errors
/// * 404 if the identity disappeared after the middleware resolved it
/// * 500 if the token cannot be signed
pub async fn refresh(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Identity>), BackendError> {
    let identity = state
        .identities
        .find_by_id(user.user_id)
        .await?
        .ok_or_else(|| BackendError::handler(StatusCode::NOT_FOUND, "User not found"))?;

    let token = issue_token(identity.id, &state.config.jwt_secret, state.config.token_ttl).map_err(|e| {
        tracing::error!("[Auth] Failed to sign token for {}: {}", identity.id, e);
        BackendError::handler(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    })?;

    tracing::debug!("[Auth] Refreshed session for {}", identity.id);
    let cookie = session_cookie(token, state.config.token_ttl, state.config.cookie_secure);
    Ok((jar.add(cookie), Json(identity)))
}

/// Expire the session cookie
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = jar.add(cleared_session_cookie(state.config.cookie_secure));
    (jar, Json(json!({ "message": "Logout successfully" })))
}
