//! Identity Data Structures
//!
//! Public view of a registered user. Password hashes and other credentials
//! stay inside the identity store and never appear here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user as seen by the realtime core
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// Opaque user ID
    pub id: Uuid,
    /// Display name
    pub full_name: String,
    /// Email address
    pub email: String,
    /// Avatar URL (empty when the user has not uploaded one)
    #[serde(default)]
    pub profile_pic: String,
    /// When the user's last live connection closed
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn new(full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.into(),
            email: email.into(),
            profile_pic: String::new(),
            last_seen: None,
        }
    }
}

/// Response of `GET /api/users/{id}/status`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserStatus {
    pub id: Uuid,
    pub full_name: String,
    pub profile_pic: String,
    pub last_seen: Option<DateTime<Utc>>,
    /// Whether the user holds at least one live connection right now
    pub online: bool,
}

impl UserStatus {
    pub fn from_identity(identity: Identity, online: bool) -> Self {
        Self {
            id: identity.id,
            full_name: identity.full_name,
            profile_pic: identity.profile_pic,
            last_seen: identity.last_seen,
            online,
        }
    }
}

/// Response of `GET /api/presence`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OnlineSnapshot {
    pub revision: u64,
    pub online: Vec<Uuid>,
}
