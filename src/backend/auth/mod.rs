//! Authentication Module
//!
//! Credential tokens and their verification. Signup, login and password
//! flows belong to the account service; this module issues tokens (for that
//! service, for session refresh and for tests) and verifies them on every
//! REST request and WebSocket upgrade.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── handlers.rs     - Session refresh and logout endpoints
//! ├── tokens.rs       - Claims, token issuance, session cookie
//! └── verifier.rs     - CredentialVerifier, AuthError, token extraction
//! ```
//!
//! # Token Flow
//!
//! 1. **Issue**: the login collaborator (and `POST /api/auth/refresh`) calls
//!    `issue_token` and sets the `session_cookie` on its response
//! 2. **Present**: browsers send the `jwt` cookie; other clients may use
//!    `Authorization: Bearer <token>`
//! 3. **Verify**: `CredentialVerifier::verify` checks signature and expiry
//!    and resolves the identity
//! 4. **Clear**: `POST /api/auth/logout` expires the cookie

/// Refresh and logout handlers
pub mod handlers;

/// Token claims and issuance
pub mod tokens;

/// Token verification
pub mod verifier;

pub use tokens::{cleared_session_cookie, issue_token, issue_token_at, session_cookie, Claims, AUTH_COOKIE};
pub use verifier::{extract_token, AuthError, CredentialVerifier};
