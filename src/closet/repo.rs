use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{ClothingCategory, ClothingChanges, ClothingItem, NewClothingItem};

impl ClothingItem {
    pub async fn list_by_user(
        db: &PgPool,
        user_id: Uuid,
        category: Option<ClothingCategory>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<ClothingItem>> {
        let rows = sqlx::query_as::<_, ClothingItem>(
            r#"
            SELECT id, user_id, category, name, image_key, description, created_at
              FROM clothing_items
             WHERE user_id = $1 AND ($2::clothing_category IS NULL OR category = $2)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(category)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("list clothing items")?;
        Ok(rows)
    }

    /// Oldest items first; the recommendation generator takes the head of this list.
    pub async fn first_by_user(
        db: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> anyhow::Result<Vec<ClothingItem>> {
        let rows = sqlx::query_as::<_, ClothingItem>(
            r#"
            SELECT id, user_id, category, name, image_key, description, created_at
              FROM clothing_items
             WHERE user_id = $1
             ORDER BY created_at ASC, id ASC
             LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(db)
        .await
        .context("first clothing items")?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<ClothingItem>> {
        let row = sqlx::query_as::<_, ClothingItem>(
            r#"
            SELECT id, user_id, category, name, image_key, description, created_at
              FROM clothing_items
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("find clothing item")?;
        Ok(row)
    }

    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        new: &NewClothingItem,
    ) -> anyhow::Result<ClothingItem> {
        let row = sqlx::query_as::<_, ClothingItem>(
            r#"
            INSERT INTO clothing_items (user_id, category, name, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, category, name, image_key, description, created_at
            "#,
        )
        .bind(user_id)
        .bind(new.category)
        .bind(&new.name)
        .bind(&new.description)
        .fetch_one(db)
        .await
        .context("insert clothing item")?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        changes: &ClothingChanges,
    ) -> anyhow::Result<Option<ClothingItem>> {
        let row = sqlx::query_as::<_, ClothingItem>(
            r#"
            UPDATE clothing_items
               SET category    = COALESCE($3, category),
                   name        = COALESCE($4, name),
                   description = COALESCE($5, description)
             WHERE id = $1 AND user_id = $2
         RETURNING id, user_id, category, name, image_key, description, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(changes.category)
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .fetch_optional(db)
        .await
        .context("update clothing item")?;
        Ok(row)
    }

    /// Returns the deleted row so its image can be removed from storage.
    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<ClothingItem>> {
        let row = sqlx::query_as::<_, ClothingItem>(
            r#"
            DELETE FROM clothing_items
             WHERE id = $1 AND user_id = $2
         RETURNING id, user_id, category, name, image_key, description, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("delete clothing item")?;
        Ok(row)
    }

    /// Stores the new image key and returns the item with the key it replaced.
    pub async fn replace_image(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        key: &str,
    ) -> anyhow::Result<Option<(ClothingItem, Option<String>)>> {
        let mut tx = db.begin().await.context("begin tx")?;
        let previous = sqlx::query_scalar::<_, Option<String>>(
            r#"SELECT image_key FROM clothing_items WHERE id = $1 AND user_id = $2 FOR UPDATE"#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .context("lock clothing item")?;
        let Some(previous) = previous else {
            return Ok(None);
        };

        let item = sqlx::query_as::<_, ClothingItem>(
            r#"
            UPDATE clothing_items SET image_key = $3
             WHERE id = $1 AND user_id = $2
         RETURNING id, user_id, category, name, image_key, description, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(key)
        .fetch_one(&mut *tx)
        .await
        .context("set clothing image")?;
        tx.commit().await.context("commit tx")?;
        Ok(Some((item, previous)))
    }
}
