use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::user::Profile;

#[derive(Clone)]
pub struct ProfileService {
    pool: PgPool,
}

impl ProfileService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the profile row for a token holder on first sight. The token
    /// stays authoritative for email and role; the name is user-editable.
    pub async fn ensure(&self, user: &AuthUser) -> Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, full_name, email, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
                SET email = EXCLUDED.email,
                    role = EXCLUDED.role,
                    updated_at = CASE
                        WHEN profiles.email <> EXCLUDED.email OR profiles.role <> EXCLUDED.role
                        THEN NOW() ELSE profiles.updated_at END
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }

    pub async fn get(&self, id: Uuid) -> Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(r#"SELECT * FROM profiles WHERE id = $1"#)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(profile)
    }

    pub async fn update_name(&self, id: Uuid, full_name: &str) -> Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles SET full_name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(full_name.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }
}
