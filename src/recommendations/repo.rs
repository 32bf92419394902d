use anyhow::Context;
use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use super::repo_types::{Recommendation, RecommendationRow};
use crate::closet::repo_types::ClothingItem;
use crate::db::PgStore;
use crate::events::repo_types::Event;

/// Persistence used by the recommendation generator and its read endpoints.
#[async_trait]
pub trait RecommendationStore: Send + Sync {
    async fn find_event(&self, user_id: Uuid, event_id: Uuid) -> anyhow::Result<Option<Event>>;
    /// The user's oldest `limit` clothing items.
    async fn first_items(&self, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<ClothingItem>>;
    /// Persists the recommendation and copies its weather summary onto the event.
    async fn save(&self, rec: &Recommendation) -> anyhow::Result<()>;
    async fn list(&self, user_id: Uuid, limit: i64, offset: i64) -> anyhow::Result<Vec<Recommendation>>;
    async fn find(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Recommendation>>;
}

impl PgStore {
    async fn items_for(&self, recommendation_id: Uuid) -> anyhow::Result<Vec<ClothingItem>> {
        let rows = sqlx::query_as::<_, ClothingItem>(
            r#"
            SELECT c.id, c.user_id, c.category, c.name, c.image_key, c.description, c.created_at
              FROM recommendation_items ri
              JOIN clothing_items c ON c.id = ri.clothing_item_id
             WHERE ri.recommendation_id = $1
             ORDER BY ri.position ASC
            "#,
        )
        .bind(recommendation_id)
        .fetch_all(&self.pool)
        .await
        .context("recommendation items")?;
        Ok(rows)
    }
}

#[async_trait]
impl RecommendationStore for PgStore {
    async fn find_event(&self, user_id: Uuid, event_id: Uuid) -> anyhow::Result<Option<Event>> {
        Event::find(&self.pool, user_id, event_id).await
    }

    async fn first_items(&self, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<ClothingItem>> {
        ClothingItem::first_by_user(&self.pool, user_id, limit).await
    }

    async fn save(&self, rec: &Recommendation) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await.context("begin tx")?;

        sqlx::query(
            r#"
            INSERT INTO recommendations (id, user_id, event_id, description, weather, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(rec.id)
        .bind(rec.user_id)
        .bind(rec.event_id)
        .bind(&rec.description)
        .bind(Json(&rec.weather))
        .bind(rec.created_at)
        .execute(&mut *tx)
        .await
        .context("insert recommendation")?;

        for (position, item) in rec.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO recommendation_items (recommendation_id, clothing_item_id, position)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(rec.id)
            .bind(item.id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .context("insert recommendation item")?;
        }

        sqlx::query(r#"UPDATE events SET weather_notes = $3 WHERE id = $1 AND user_id = $2"#)
            .bind(rec.event_id)
            .bind(rec.user_id)
            .bind(&rec.weather.summary)
            .execute(&mut *tx)
            .await
            .context("update event weather notes")?;

        tx.commit().await.context("commit tx")?;
        Ok(())
    }

    async fn list(&self, user_id: Uuid, limit: i64, offset: i64) -> anyhow::Result<Vec<Recommendation>> {
        let rows = sqlx::query_as::<_, RecommendationRow>(
            r#"
            SELECT id, user_id, event_id, description, weather, created_at
              FROM recommendations
             WHERE user_id = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("list recommendations")?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for(row.id).await?;
            out.push(Recommendation::from_row(row, items));
        }
        Ok(out)
    }

    async fn find(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Recommendation>> {
        let row = sqlx::query_as::<_, RecommendationRow>(
            r#"
            SELECT id, user_id, event_id, description, weather, created_at
              FROM recommendations
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("find recommendation")?;

        match row {
            Some(row) => {
                let items = self.items_for(row.id).await?;
                Ok(Some(Recommendation::from_row(row, items)))
            }
            None => Ok(None),
        }
    }
}
