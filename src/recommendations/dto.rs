use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::weather::WeatherSnapshot;
use crate::closet::repo_types::ClothingCategory;

#[derive(Debug, Serialize)]
pub struct RecommendedItem {
    pub id: Uuid,
    pub category: ClothingCategory,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub description: String,
    pub weather: WeatherSnapshot,
    pub items: Vec<RecommendedItem>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 { 20 }
