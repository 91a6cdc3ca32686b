//! Common test utilities and helpers
//!
//! This module provides shared utilities for the integration tests:
//! - An application wired to in-memory stores
//! - Test users with signed credential tokens
//! - Custom assertion macros

#![allow(dead_code)]

pub mod assertions;
pub mod auth_helpers;

use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use chatline::backend::server::{create_app_with_state, AppState, ServerConfig};
use chatline::backend::store::{InlineBlobStore, MemoryStore};

pub use auth_helpers::*;

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn test_config() -> ServerConfig {
    ServerConfig::builder(TEST_SECRET)
        .heartbeat(Duration::from_secs(30), Duration::from_secs(90))
        .cookie_secure(false)
        .build()
        .unwrap()
}

/// Application state and store handle for one test
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(test_config(), store.clone(), store.clone(), Arc::new(InlineBlobStore));
        Self { state, store }
    }

    /// Serve the router through axum-test's mock transport
    pub fn server(&self) -> TestServer {
        TestServer::new(create_app_with_state(self.state.clone())).unwrap()
    }

    /// Serve over a real socket (needed for WebSocket upgrades)
    pub fn http_server(&self) -> TestServer {
        TestServer::builder()
            .http_transport()
            .build(create_app_with_state(self.state.clone()))
            .unwrap()
    }

    pub async fn user(&self, full_name: &str) -> TestUser {
        create_test_user(&self.store, full_name).await
    }
}
