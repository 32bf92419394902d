use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Event, EventChanges, NewEvent};

impl Event {
    pub async fn list_by_user(
        db: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, user_id, name, location, date, event_notes, weather_notes, created_at
              FROM events
             WHERE user_id = $1
             ORDER BY date ASC, created_at ASC
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("list events")?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Event>> {
        let row = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, user_id, name, location, date, event_notes, weather_notes, created_at
              FROM events
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("find event")?;
        Ok(row)
    }

    pub async fn create(db: &PgPool, user_id: Uuid, new: &NewEvent) -> anyhow::Result<Event> {
        let row = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (user_id, name, location, date, event_notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, location, date, event_notes, weather_notes, created_at
            "#,
        )
        .bind(user_id)
        .bind(&new.name)
        .bind(&new.location)
        .bind(new.date)
        .bind(new.event_notes.as_deref())
        .fetch_one(db)
        .await
        .context("insert event")?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        changes: &EventChanges,
    ) -> anyhow::Result<Option<Event>> {
        let row = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
               SET name        = COALESCE($3, name),
                   location    = COALESCE($4, location),
                   date        = COALESCE($5, date),
                   event_notes = COALESCE($6, event_notes)
             WHERE id = $1 AND user_id = $2
         RETURNING id, user_id, name, location, date, event_notes, weather_notes, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(changes.name.as_deref())
        .bind(changes.location.as_deref())
        .bind(changes.date)
        .bind(changes.event_notes.as_deref())
        .fetch_optional(db)
        .await
        .context("update event")?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM events WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await
            .context("delete event")?;
        Ok(res.rows_affected() > 0)
    }
}
