/**
 * Credential Tokens
 *
 * HS256 JWTs signed with the shared `JWT_SECRET`, carried in the `jwt`
 * cookie. Issued by the login collaborator and renewed by
 * `POST /api/auth/refresh`; verified by `verifier`.
 */
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the cookie carrying the credential token
pub const AUTH_COOKIE: &str = "jwt";

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Identity ID
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

/// Create a token for `user_id` valid for `ttl` from now
pub fn issue_token(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, jsonwebtoken::errors::Error> {
    issue_token_at(user_id, secret, Utc::now(), ttl)
}

/// Create a token with an explicit issue time
pub fn issue_token_at(
    user_id: Uuid,
    secret: &str,
    issued_at: DateTime<Utc>,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::new(user_id, issued_at, ttl);
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key)
}

/// Auth cookie storing `token`, expiring with it
///
/// HttpOnly and SameSite=Strict always; `Secure` outside development.
pub fn session_cookie(token: impl Into<String>, ttl: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token.into()))
        .path("/")
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .build()
}

/// Cookie that clears the auth cookie on the client
pub fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .build()
}
