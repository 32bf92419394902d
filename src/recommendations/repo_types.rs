use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use super::weather::WeatherSnapshot;
use crate::closet::repo_types::ClothingItem;

#[derive(Debug, Clone, FromRow)]
pub struct RecommendationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub description: String,
    pub weather: Json<WeatherSnapshot>,
    pub created_at: OffsetDateTime,
}

/// A recommendation with its clothing items in suggested order.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub description: String,
    pub weather: WeatherSnapshot,
    pub items: Vec<ClothingItem>,
    pub created_at: OffsetDateTime,
}

impl Recommendation {
    pub fn from_row(row: RecommendationRow, items: Vec<ClothingItem>) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            event_id: row.event_id,
            description: row.description,
            weather: row.weather.0,
            items,
            created_at: row.created_at,
        }
    }
}
