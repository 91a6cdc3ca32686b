//! Authentication test helpers
//!
//! Provides utilities for creating test users and generating the cookie
//! and bearer headers the server accepts.

use axum::http::HeaderValue;
use chatline::backend::auth::{issue_token, AUTH_COOKIE};
use chatline::backend::store::MemoryStore;
use chatline::shared::Identity;
use uuid::Uuid;

use super::TEST_SECRET;

/// A registered identity and a valid token for it
pub struct TestUser {
    pub identity: Identity,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> Uuid {
        self.identity.id
    }

    pub fn cookie(&self) -> HeaderValue {
        cookie_header(&self.token)
    }

    pub fn bearer(&self) -> HeaderValue {
        auth_header(&self.token)
    }
}

/// Insert an identity into the store and sign a token for it
pub async fn create_test_user(store: &MemoryStore, full_name: &str) -> TestUser {
    let email = format!("{}_{}@example.com", full_name.to_lowercase(), Uuid::new_v4());
    let identity = Identity::new(full_name, email);
    store.insert_identity(identity.clone()).await;

    let token = generate_test_token(identity.id);
    TestUser { identity, token }
}

pub fn generate_test_token(user_id: Uuid) -> String {
    issue_token(user_id, TEST_SECRET, chrono::Duration::days(7)).expect("Failed to generate test token")
}

/// `Cookie` header value carrying the credential
pub fn cookie_header(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("{}={}", AUTH_COOKIE, token)).unwrap()
}

/// `Authorization` header value
pub fn auth_header(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}
