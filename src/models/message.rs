use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMessage {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
}

/// Latest message exchanged with one partner.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ConversationSummary {
    pub partner_id: Uuid,
    pub partner_name: String,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub unread: i64,
}
