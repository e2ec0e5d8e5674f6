use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single message between two users. Immutable once created: there is no
/// update or delete surface, and neither party may remove it unilaterally.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Per-peer conversation rollup: the most recent message exchanged with that
/// peer and its timestamp. Derived on read, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConversationSummary {
    pub peer_id: Uuid,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
}
