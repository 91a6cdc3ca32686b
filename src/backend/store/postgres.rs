//! PostgreSQL-backed identity and message stores
//!
//! Schema lives in `migrations/`. Queries are runtime-checked so the crate
//! builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::{IdentityStore, MessageStore, NewMessage, StoreError};
use crate::shared::{Identity, Message};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn identity_from_row(row: PgRow) -> Identity {
    Identity {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        profile_pic: row.get("profile_pic"),
        last_seen: row.get("last_seen"),
    }
}

fn message_from_row(row: PgRow) -> Message {
    Message {
        id: row.get("id"),
        sender_id: row.get("sender_id"),
        receiver_id: row.get("receiver_id"),
        text: row.get("text"),
        image: row.get("image"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, full_name, email, profile_pic, last_seen
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(identity_from_row))
    }

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn list_except(&self, id: Uuid) -> Result<Vec<Identity>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, full_name, email, profile_pic, last_seen
            FROM users
            WHERE id <> $1
            ORDER BY full_name
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(identity_from_row).collect())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Identity>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT id, full_name, email, profile_pic, last_seen
            FROM users
            WHERE id = ANY($1)
            ORDER BY full_name
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(identity_from_row).collect())
    }

    async fn touch_last_seen(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET last_seen = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MessageStore for PgStore {
    async fn create(&self, message: NewMessage) -> Result<Message, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO messages (id, sender_id, receiver_id, text, image, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, sender_id, receiver_id, text, image, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(&message.text)
        .bind(&message.image)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(message_from_row(row))
    }

    async fn find_conversation(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, sender_id, receiver_id, text, image, created_at
            FROM messages
            WHERE (sender_id = $1 AND receiver_id = $2)
               OR (sender_id = $2 AND receiver_id = $1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(message_from_row).collect())
    }

    async fn partner_ids(&self, user: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT CASE WHEN sender_id = $1 THEN receiver_id ELSE sender_id END AS partner
            FROM messages
            WHERE sender_id = $1 OR receiver_id = $1
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}
