use std::collections::BTreeMap;

use bytes::Bytes;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;
use crate::models::material::{Material, WeekMaterials};
use crate::models::notification::{NewNotification, NotificationKind};
use crate::services::access;
use crate::services::notification_service::NotificationService;
use crate::services::storage_service::{sanitize_file_name, StorageService};

pub const MAX_WEEK: i16 = 52;

pub struct NewMaterial {
    pub week: i16,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub data: Bytes,
}

#[derive(Clone)]
pub struct MaterialService {
    pool: PgPool,
    storage: StorageService,
    notifications: NotificationService,
}

impl MaterialService {
    pub fn new(pool: PgPool, storage: StorageService, notifications: NotificationService) -> Self {
        Self {
            pool,
            storage,
            notifications,
        }
    }

    pub async fn upload(&self, user: &AuthUser, course_id: Uuid, new: NewMaterial) -> Result<Material> {
        access::require_teacher(&self.pool, course_id, user).await?;
        if !(1..=MAX_WEEK).contains(&new.week) {
            return Err(Error::BadRequest(format!("Week must be between 1 and {}", MAX_WEEK)));
        }
        if new.data.is_empty() {
            return Err(Error::BadRequest("File is empty".into()));
        }

        let name = sanitize_file_name(&new.file_name);
        let key = format!(
            "courses/{}/week-{}/{}-{}",
            course_id,
            new.week,
            Uuid::new_v4(),
            name
        );
        let mime_type = new
            .mime_type
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        self.storage.put(&key, &new.data).await?;

        let inserted = sqlx::query_as::<_, Material>(
            r#"
            INSERT INTO materials (course_id, week, name, storage_path, size_bytes, mime_type, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(course_id)
        .bind(new.week)
        .bind(new.file_name.trim())
        .bind(&key)
        .bind(new.data.len() as i64)
        .bind(&mime_type)
        .bind(user.id)
        .fetch_one(&self.pool)
        .await;

        let material = match inserted {
            Ok(m) => m,
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&key).await {
                    tracing::warn!(error = ?cleanup, key, "failed to remove orphaned blob");
                }
                return Err(e.into());
            }
        };

        tracing::info!(material_id = %material.id, %course_id, week = material.week, "material uploaded");
        self.notifications
            .announce(NewNotification {
                kind: NotificationKind::Material,
                title: format!("New material for week {}", material.week),
                body: Some(material.name.clone()),
                course_id,
                reference_id: Some(material.id),
            })
            .await;
        Ok(material)
    }

    pub async fn list_by_week(&self, user: &AuthUser, course_id: Uuid) -> Result<Vec<WeekMaterials>> {
        access::require_member(&self.pool, course_id, user).await?;
        let rows = sqlx::query_as::<_, Material>(
            r#"SELECT * FROM materials WHERE course_id = $1 ORDER BY week ASC, created_at ASC"#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(group_by_week(rows))
    }

    pub async fn open(&self, user: &AuthUser, material_id: Uuid) -> Result<(Material, tokio::fs::File)> {
        let material = self.get_by_id(material_id).await?;
        access::require_member(&self.pool, material.course_id, user).await?;
        let file = self.storage.open(&material.storage_path).await?;
        Ok((material, file))
    }

    pub async fn delete(&self, user: &AuthUser, material_id: Uuid) -> Result<()> {
        let material = self.get_by_id(material_id).await?;
        access::require_teacher(&self.pool, material.course_id, user).await?;

        sqlx::query(r#"DELETE FROM materials WHERE id = $1"#)
            .bind(material_id)
            .execute(&self.pool)
            .await?;
        self.storage.delete(&material.storage_path).await?;
        Ok(())
    }

    async fn get_by_id(&self, material_id: Uuid) -> Result<Material> {
        let material = sqlx::query_as::<_, Material>(r#"SELECT * FROM materials WHERE id = $1"#)
            .bind(material_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(material)
    }
}

pub fn group_by_week(rows: Vec<Material>) -> Vec<WeekMaterials> {
    let mut weeks: BTreeMap<i16, Vec<Material>> = BTreeMap::new();
    for m in rows {
        weeks.entry(m.week).or_default().push(m);
    }
    weeks
        .into_iter()
        .map(|(week, materials)| WeekMaterials { week, materials })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn material(week: i16, name: &str) -> Material {
        Material {
            id: Uuid::new_v4(),
            course_id: Uuid::nil(),
            week,
            name: name.into(),
            storage_path: format!("courses/x/week-{}/{}", week, name),
            size_bytes: 1,
            mime_type: "text/plain".into(),
            uploaded_by: Uuid::nil(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn groups_in_week_order() {
        let grouped = group_by_week(vec![material(3, "c"), material(1, "a"), material(3, "d")]);
        let weeks: Vec<i16> = grouped.iter().map(|w| w.week).collect();
        assert_eq!(weeks, vec![1, 3]);
        assert_eq!(grouped[1].materials.len(), 2);
        assert_eq!(grouped[1].materials[0].name, "c");
    }
}
