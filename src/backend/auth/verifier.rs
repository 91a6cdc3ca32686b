/**
 * Credential Verifier
 *
 * Turns a presented credential token into an authenticated identity. Used by
 * both the REST auth middleware and the WebSocket upgrade, so the two
 * transports accept and reject exactly the same tokens.
 *
 * Verification has no side effects: it decodes the token, checks signature
 * and expiry, then resolves the subject against the identity store.
 */
use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use thiserror::Error;
use uuid::Uuid;

use super::tokens::{Claims, AUTH_COOKIE};
use crate::backend::store::IdentityStore;
use crate::shared::Identity;

/// Why a credential was rejected
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unauthorized - No Token Provided")]
    Missing,

    #[error("Unauthorized - Invalid Token")]
    Invalid,

    #[error("Unauthorized - Token expired")]
    Expired,

    #[error("User not found")]
    UnknownUser,

    #[error("Unauthorized - Authentication failed: {0}")]
    Store(String),
}

#[derive(Clone)]
pub struct CredentialVerifier {
    key: DecodingKey,
    validation: Validation,
    identities: Arc<dyn IdentityStore>,
}

impl CredentialVerifier {
    pub fn new(secret: &str, identities: Arc<dyn IdentityStore>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            identities,
        }
    }

    /// Decode and check a token without touching the identity store
    pub fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid,
            })
    }

    /// Verify a presented token and resolve its identity
    ///
    /// # Errors
    ///
    /// * `AuthError::Missing` - no token (or an empty one)
    /// * `AuthError::Invalid` - bad signature, malformed token or subject
    /// * `AuthError::Expired` - the token is past its `exp`
    /// * `AuthError::UnknownUser` - the subject no longer exists
    /// * `AuthError::Store` - the identity store could not be queried
    pub async fn verify(&self, token: Option<&str>) -> Result<Identity, AuthError> {
        let token = token.filter(|t| !t.is_empty()).ok_or(AuthError::Missing)?;
        let claims = self.decode_claims(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::Invalid)?;

        self.identities
            .find_by_id(user_id)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?
            .ok_or(AuthError::UnknownUser)
    }
}

/// Read the credential token from a request
///
/// The `jwt` cookie wins; an `Authorization: Bearer` header is the fallback
/// for non-browser clients.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(AUTH_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::auth::tokens::{issue_token, issue_token_at};
    use crate::backend::store::MemoryStore;
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};

    const SECRET: &str = "test-secret";

    async fn setup() -> (CredentialVerifier, Identity) {
        let store = Arc::new(MemoryStore::new());
        let alice = Identity::new("Alice", "alice@example.com");
        store.insert_identity(alice.clone()).await;
        (CredentialVerifier::new(SECRET, store), alice)
    }

    #[tokio::test]
    async fn test_verify_valid_token() {
        let (verifier, alice) = setup().await;
        let token = issue_token(alice.id, SECRET, Duration::days(7)).unwrap();
        let identity = verifier.verify(Some(&token)).await.unwrap();
        assert_eq!(identity, alice);
    }

    #[tokio::test]
    async fn test_verify_missing() {
        let (verifier, _) = setup().await;
        assert_eq!(verifier.verify(None).await.unwrap_err(), AuthError::Missing);
        assert_eq!(verifier.verify(Some("")).await.unwrap_err(), AuthError::Missing);
    }

    #[tokio::test]
    async fn test_verify_wrong_secret() {
        let (verifier, alice) = setup().await;
        let token = issue_token(alice.id, "other-secret", Duration::days(7)).unwrap();
        assert_eq!(verifier.verify(Some(&token)).await.unwrap_err(), AuthError::Invalid);
    }

    #[tokio::test]
    async fn test_verify_garbage() {
        let (verifier, _) = setup().await;
        assert_eq!(verifier.verify(Some("not.a.token")).await.unwrap_err(), AuthError::Invalid);
    }

    #[tokio::test]
    async fn test_verify_expired() {
        let (verifier, alice) = setup().await;
        let issued = Utc::now() - Duration::days(8);
        let token = issue_token_at(alice.id, SECRET, issued, Duration::days(7)).unwrap();
        let err = verifier.verify(Some(&token)).await.unwrap_err();
        assert_eq!(err, AuthError::Expired);
        assert_eq!(err.to_string(), "Unauthorized - Token expired");
    }

    #[tokio::test]
    async fn test_verify_unknown_user() {
        let (verifier, _) = setup().await;
        let token = issue_token(Uuid::new_v4(), SECRET, Duration::days(7)).unwrap();
        assert_eq!(verifier.verify(Some(&token)).await.unwrap_err(), AuthError::UnknownUser);
    }

    #[test]
    fn test_extract_token_prefers_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("theme=dark; jwt=from-cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_extract_token_bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_extract_token_none() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
