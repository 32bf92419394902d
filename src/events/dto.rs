use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::{Event, EventChanges, NewEvent};
use crate::error::{AppError, AppResult};

const MAX_TEXT_LEN: usize = 100;

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub date: Date,
    pub event_notes: Option<String>,
    pub weather_notes: Option<String>,
    pub created_at: OffsetDateTime,
}

impl From<Event> for EventResponse {
    fn from(e: Event) -> Self {
        Self {
            id: e.id,
            name: e.name,
            location: e.location,
            date: e.date,
            event_notes: e.event_notes,
            weather_notes: e.weather_notes,
            created_at: e.created_at,
        }
    }
}

/// `date` is an ISO-8601 calendar date, e.g. `2025-06-14`.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub location: String,
    pub date: Date,
    pub event_notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub date: Option<Date>,
    pub event_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 { 50 }

fn required_text(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::validation(format!("{field} is too long")));
    }
    Ok(value.to_string())
}

impl CreateEventRequest {
    pub fn validate(self) -> AppResult<NewEvent> {
        Ok(NewEvent {
            name: required_text("name", &self.name)?,
            location: required_text("location", &self.location)?,
            date: self.date,
            event_notes: self.event_notes,
        })
    }
}

impl UpdateEventRequest {
    pub fn validate(self) -> AppResult<EventChanges> {
        Ok(EventChanges {
            name: self.name.as_deref().map(|n| required_text("name", n)).transpose()?,
            location: self
                .location
                .as_deref()
                .map(|l| required_text("location", l))
                .transpose()?,
            date: self.date,
            event_notes: self.event_notes,
        })
    }
}
