//! Middleware Module
//!
//! Request processing that runs before the handlers.
//!
//! - **`auth`** - Credential verification for protected routes

pub mod auth;

pub use auth::{auth_middleware, AuthUser, AuthenticatedUser};
