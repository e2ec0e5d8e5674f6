use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::models::{ConversationSummary, Message, Profile, ProfileUpdate, User};
use crate::middleware::AuthUser;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Query(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence boundary for the API.
///
/// Handlers never touch the pool directly; they go through this trait (via
/// [`ScopedStore`]) so the data layer stays swappable and the caller identity
/// is threaded into every query.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health(&self) -> Result<(), StoreError>;

    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError>;
    async fn upsert_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<Profile, StoreError>;

    async fn insert_message(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        content: &str,
    ) -> Result<Message, StoreError>;

    /// All messages between `caller_id` and `peer_id`, in either direction,
    /// ordered by creation time ascending, truncated to `limit`.
    async fn message_thread(
        &self,
        caller_id: Uuid,
        peer_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Message>, StoreError>;

    /// One summary per distinct peer the caller has exchanged messages with.
    /// Ordering comes from the aggregation itself; callers return it as-is.
    async fn conversations(&self, caller_id: Uuid) -> Result<Vec<ConversationSummary>, StoreError>;
}

pub type SharedStore = Arc<dyn Store>;

/// Postgres-backed store. Reads go through `messages_view`, writes through
/// `messages`, and the conversation rollup delegates to the
/// `get_conversations` database function (see db/schema.sql).
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const UNIQUE_VIOLATION: &str = "23505";

fn map_insert_error(err: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Duplicate(format!("{} already exists", what));
        }
    }
    StoreError::Sqlx(err)
}

#[async_trait]
impl Store for PgStore {
    async fn health(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) \
             RETURNING id, email, password_hash, created_at",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "email"))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, name, avatar_url, bio, updated_at FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn upsert_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<Profile, StoreError> {
        let profile = sqlx::query_as::<_, Profile>(
            "INSERT INTO profiles (id, name, avatar_url, bio, updated_at) \
             VALUES ($1, $2, $3, $4, now()) \
             ON CONFLICT (id) DO UPDATE \
             SET name = EXCLUDED.name, avatar_url = EXCLUDED.avatar_url, \
                 bio = EXCLUDED.bio, updated_at = now() \
             RETURNING id, name, avatar_url, bio, updated_at",
        )
        .bind(user_id)
        .bind(update.name)
        .bind(update.avatar_url)
        .bind(update.bio)
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn insert_message(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        content: &str,
    ) -> Result<Message, StoreError> {
        let message = sqlx::query_as::<_, Message>(
            "INSERT INTO messages (sender_id, recipient_id, content) VALUES ($1, $2, $3) \
             RETURNING id, sender_id, recipient_id, content, created_at",
        )
        .bind(sender_id)
        .bind(recipient_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    async fn message_thread(
        &self,
        caller_id: Uuid,
        peer_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Message>, StoreError> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT id, sender_id, recipient_id, content, created_at FROM messages_view \
             WHERE (sender_id = $1 AND recipient_id = $2) \
                OR (sender_id = $2 AND recipient_id = $1) \
             ORDER BY created_at ASC \
             LIMIT $3",
        )
        .bind(caller_id)
        .bind(peer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn conversations(&self, caller_id: Uuid) -> Result<Vec<ConversationSummary>, StoreError> {
        let summaries = sqlx::query_as::<_, ConversationSummary>(
            "SELECT peer_id, last_message, last_message_at FROM get_conversations($1)",
        )
        .bind(caller_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(summaries)
    }
}

/// Clamp a caller-supplied thread limit to the configured window.
pub fn clamp_thread_limit(requested: Option<i64>) -> i64 {
    let api = &config::config().api;
    requested
        .unwrap_or(api.default_thread_limit)
        .clamp(1, api.max_thread_limit)
}

/// A store handle bound to one authenticated caller.
///
/// Built fresh per request from the validated token, never shared across
/// requests. Every operation takes the caller identity from this handle, so a
/// query can only touch the caller's own rows; there is no way to supply a
/// different sender from request input.
pub struct ScopedStore {
    store: SharedStore,
    caller: AuthUser,
}

impl ScopedStore {
    pub fn new(store: SharedStore, caller: AuthUser) -> Self {
        Self { store, caller }
    }

    pub fn caller_id(&self) -> Uuid {
        self.caller.id
    }

    pub async fn send_message(&self, recipient_id: Uuid, content: &str) -> Result<Message, StoreError> {
        self.store
            .insert_message(self.caller.id, recipient_id, content)
            .await
    }

    pub async fn thread(&self, peer_id: Uuid, limit: Option<i64>) -> Result<Vec<Message>, StoreError> {
        let limit = clamp_thread_limit(limit);
        self.store.message_thread(self.caller.id, peer_id, limit).await
    }

    pub async fn conversations(&self) -> Result<Vec<ConversationSummary>, StoreError> {
        self.store.conversations(self.caller.id).await
    }

    pub async fn profile(&self) -> Result<Option<Profile>, StoreError> {
        self.store.profile(self.caller.id).await
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Profile, StoreError> {
        self.store.upsert_profile(self.caller.id, update).await
    }
}
