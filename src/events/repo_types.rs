use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub location: String,
    pub date: Date,
    pub event_notes: Option<String>,
    pub weather_notes: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub location: String,
    pub date: Date,
    pub event_notes: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct EventChanges {
    pub name: Option<String>,
    pub location: Option<String>,
    pub date: Option<Date>,
    pub event_notes: Option<String>,
}
