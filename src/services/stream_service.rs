use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;
use crate::models::course::CourseRole;
use crate::models::notification::{NewNotification, NotificationKind};
use crate::models::post::{Comment, Post, StreamItem};
use crate::services::access;
use crate::services::notification_service::NotificationService;

#[derive(Clone)]
pub struct StreamService {
    pool: PgPool,
    notifications: NotificationService,
}

impl StreamService {
    pub fn new(pool: PgPool, notifications: NotificationService) -> Self {
        Self { pool, notifications }
    }

    /// Newest posts first; each post's comments oldest first.
    pub async fn list(
        &self,
        user: &AuthUser,
        course_id: Uuid,
        limit: i64,
        before: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Vec<StreamItem>> {
        access::require_member(&self.pool, course_id, user).await?;

        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.course_id, p.author_id, a.full_name AS author_name, p.content, p.created_at
            FROM posts p
            JOIN profiles a ON a.id = p.author_id
            WHERE p.course_id = $1 AND ($2::timestamptz IS NULL OR p.created_at < $2)
            ORDER BY p.created_at DESC
            LIMIT $3
            "#,
        )
        .bind(course_id)
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.post_id, c.author_id, a.full_name AS author_name, c.content, c.created_at
            FROM comments c
            JOIN profiles a ON a.id = c.author_id
            WHERE c.post_id = ANY($1)
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(&post_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_post: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for comment in comments {
            by_post.entry(comment.post_id).or_default().push(comment);
        }

        Ok(posts
            .into_iter()
            .map(|post| {
                let comments = by_post.remove(&post.id).unwrap_or_default();
                StreamItem { post, comments }
            })
            .collect())
    }

    pub async fn create_post(&self, user: &AuthUser, course_id: Uuid, content: &str) -> Result<Post> {
        let role = access::require_member(&self.pool, course_id, user).await?;
        let post = sqlx::query_as::<_, Post>(
            r#"
            WITH inserted AS (
                INSERT INTO posts (course_id, author_id, content)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT i.id, i.course_id, i.author_id, a.full_name AS author_name, i.content, i.created_at
            FROM inserted i
            JOIN profiles a ON a.id = i.author_id
            "#,
        )
        .bind(course_id)
        .bind(user.id)
        .bind(content.trim())
        .fetch_one(&self.pool)
        .await?;

        if role == CourseRole::Teacher {
            self.notifications
                .announce(NewNotification {
                    kind: NotificationKind::Post,
                    title: format!("{} published a new post", post.author_name),
                    body: Some(preview(&post.content)),
                    course_id,
                    reference_id: Some(post.id),
                })
                .await;
        }
        Ok(post)
    }

    pub async fn add_comment(&self, user: &AuthUser, post_id: Uuid, content: &str) -> Result<Comment> {
        let course_id = self.course_of_post(post_id).await?;
        access::require_member(&self.pool, course_id, user).await?;

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (post_id, author_id, content)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT i.id, i.post_id, i.author_id, a.full_name AS author_name, i.content, i.created_at
            FROM inserted i
            JOIN profiles a ON a.id = i.author_id
            "#,
        )
        .bind(post_id)
        .bind(user.id)
        .bind(content.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    pub async fn delete_post(&self, user: &AuthUser, post_id: Uuid) -> Result<()> {
        let (course_id, author_id): (Uuid, Uuid) =
            sqlx::query_as(r#"SELECT course_id, author_id FROM posts WHERE id = $1"#)
                .bind(post_id)
                .fetch_one(&self.pool)
                .await?;
        self.require_author_or_teacher(user, course_id, author_id).await?;

        sqlx::query(r#"DELETE FROM posts WHERE id = $1"#)
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_comment(&self, user: &AuthUser, comment_id: Uuid) -> Result<()> {
        let (course_id, author_id): (Uuid, Uuid) = sqlx::query_as(
            r#"
            SELECT p.course_id, c.author_id
            FROM comments c JOIN posts p ON p.id = c.post_id
            WHERE c.id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_one(&self.pool)
        .await?;
        self.require_author_or_teacher(user, course_id, author_id).await?;

        sqlx::query(r#"DELETE FROM comments WHERE id = $1"#)
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn course_of_post(&self, post_id: Uuid) -> Result<Uuid> {
        let course_id: Uuid = sqlx::query_scalar(r#"SELECT course_id FROM posts WHERE id = $1"#)
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(course_id)
    }

    async fn require_author_or_teacher(&self, user: &AuthUser, course_id: Uuid, author_id: Uuid) -> Result<()> {
        let role = access::require_member(&self.pool, course_id, user).await?;
        if author_id == user.id || role == CourseRole::Teacher {
            Ok(())
        } else {
            Err(Error::Forbidden("Only the author or a teacher can delete this".into()))
        }
    }
}

fn preview(content: &str) -> String {
    const MAX: usize = 140;
    let trimmed = content.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::preview;

    #[test]
    fn preview_cuts_on_char_boundary() {
        let long = "á".repeat(200);
        let p = preview(&long);
        assert_eq!(p.chars().count(), 141);
        assert!(p.ends_with('…'));
        assert_eq!(preview("  corto "), "corto");
    }
}
