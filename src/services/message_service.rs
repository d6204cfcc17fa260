use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::message::{ConversationSummary, CreateMessage, Message};
use crate::services::realtime_service::{RealtimeHub, Topic};

#[derive(Clone)]
pub struct MessageService {
    pool: PgPool,
    hub: RealtimeHub,
}

impl MessageService {
    pub fn new(pool: PgPool, hub: RealtimeHub) -> Self {
        Self { pool, hub }
    }

    pub async fn create(&self, msg: CreateMessage) -> Result<Message> {
        if msg.sender_id == msg.recipient_id {
            return Err(Error::BadRequest("Cannot send a message to yourself".into()));
        }
        if msg.content.trim().is_empty() {
            return Err(Error::BadRequest("Message must not be empty".into()));
        }

        let exists: Option<(Uuid,)> = sqlx::query_as(r#"SELECT id FROM profiles WHERE id = $1"#)
            .bind(msg.recipient_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(Error::NotFound("Recipient not found".into()));
        }

        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (sender_id, recipient_id, content)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(msg.sender_id)
        .bind(msg.recipient_id)
        .bind(msg.content.trim())
        .fetch_one(&self.pool)
        .await?;

        self.hub
            .publish_many(&[message.sender_id, message.recipient_id], Topic::Messages);
        Ok(message)
    }

    pub async fn get_conversation(&self, user_id: Uuid, partner_id: Uuid) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2)
               OR (sender_id = $2 AND recipient_id = $1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(partner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    pub async fn mark_as_read(&self, user_id: Uuid, partner_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET read_at = NOW()
            WHERE recipient_id = $1 AND sender_id = $2 AND read_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(partner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            self.hub.publish(user_id, Topic::Messages);
        }
        Ok(result.rows_affected())
    }

    pub async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>> {
        let rows = sqlx::query_as::<_, ConversationSummary>(
            r#"
            WITH mine AS (
                SELECT
                    CASE WHEN sender_id = $1 THEN recipient_id ELSE sender_id END AS partner_id,
                    content, created_at, recipient_id, read_at
                FROM messages
                WHERE sender_id = $1 OR recipient_id = $1
            ),
            latest AS (
                SELECT DISTINCT ON (partner_id) partner_id, content, created_at
                FROM mine
                ORDER BY partner_id, created_at DESC
            )
            SELECT
                l.partner_id,
                p.full_name AS partner_name,
                l.content AS last_message,
                l.created_at AS last_message_at,
                (SELECT COUNT(*) FROM mine u
                  WHERE u.partner_id = l.partner_id AND u.recipient_id = $1 AND u.read_at IS NULL) AS unread
            FROM latest l
            JOIN profiles p ON p.id = l.partner_id
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM messages
            WHERE recipient_id = $1 AND read_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}
