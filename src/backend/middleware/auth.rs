/**
 * Authentication Middleware
 *
 * Protects the REST routes. Reads the credential token from the `jwt`
 * cookie (or an `Authorization: Bearer` header), verifies it with the same
 * `CredentialVerifier` the WebSocket upgrade uses, and attaches the
 * authenticated user to the request extensions.
 */
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::backend::auth::{extract_token, AuthError};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::Identity;

/// Authenticated user data resolved from the credential token
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
}

impl From<Identity> for AuthenticatedUser {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.id,
            email: identity.email,
            full_name: identity.full_name,
        }
    }
}

/// Authentication middleware
///
/// Rejects the request with the verifier's error (401, or 404 for a token
/// whose user no longer exists) when the credential does not check out.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let token = extract_token(request.headers());
    let identity = app_state.hub.verifier.verify(token.as_deref()).await.map_err(|e| {
        tracing::warn!("[Auth] Rejected {} {}: {}", request.method(), request.uri().path(), e);
        e
    })?;

    request.extensions_mut().insert(AuthenticatedUser::from(identity));
    Ok(next.run(request).await)
}

/// Axum extractor for the user set by `auth_middleware`
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<AuthenticatedUser>().cloned().ok_or_else(|| {
            tracing::warn!("AuthenticatedUser not found in request extensions");
            BackendError::from(AuthError::Missing)
        })?;

        Ok(AuthUser(user))
    }
}
