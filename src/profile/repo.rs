use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{ProfileChanges, UserProfile};

const PROFILE_COLUMNS: &str = r#"
    p.user_id, u.email, p.full_name, p.age, p.gender, p.location,
    p.profile_picture, p.created_at, p.updated_at
"#;

impl UserProfile {
    pub async fn find(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<UserProfile>> {
        let sql = format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profiles p JOIN users u ON u.id = p.user_id WHERE p.user_id = $1"
        );
        let profile = sqlx::query_as::<_, UserProfile>(&sql)
            .bind(user_id)
            .fetch_optional(db)
            .await
            .context("find profile")?;
        Ok(profile)
    }

    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        changes: &ProfileChanges,
    ) -> anyhow::Result<Option<UserProfile>> {
        let sql = format!(
            r#"
            WITH p AS (
                UPDATE user_profiles
                   SET full_name  = COALESCE($2, full_name),
                       age        = COALESCE($3, age),
                       gender     = COALESCE($4, gender),
                       location   = COALESCE($5, location),
                       updated_at = now()
                 WHERE user_id = $1
             RETURNING *
            )
            SELECT {PROFILE_COLUMNS} FROM p JOIN users u ON u.id = p.user_id
            "#
        );
        let profile = sqlx::query_as::<_, UserProfile>(&sql)
            .bind(user_id)
            .bind(changes.full_name.as_deref())
            .bind(changes.age)
            .bind(changes.gender)
            .bind(changes.location.as_deref())
            .fetch_optional(db)
            .await
            .context("update profile")?;
        Ok(profile)
    }

    /// Stores the new picture key and returns the one it replaced.
    pub async fn replace_picture(
        db: &PgPool,
        user_id: Uuid,
        key: &str,
    ) -> anyhow::Result<Option<Option<String>>> {
        let previous = sqlx::query_scalar::<_, Option<String>>(
            r#"
            UPDATE user_profiles p
               SET profile_picture = $2, updated_at = now()
              FROM user_profiles old
             WHERE p.user_id = $1 AND old.user_id = p.user_id
         RETURNING old.profile_picture
            "#,
        )
        .bind(user_id)
        .bind(key)
        .fetch_optional(db)
        .await
        .context("replace profile picture")?;
        Ok(previous)
    }
}
