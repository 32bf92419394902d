use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "clothing_category", rename_all = "lowercase")]
pub enum ClothingCategory {
    Jackets,
    Shirts,
    Pants,
    Shoes,
    Accessories,
    Dresses,
}

impl ClothingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClothingCategory::Jackets => "jackets",
            ClothingCategory::Shirts => "shirts",
            ClothingCategory::Pants => "pants",
            ClothingCategory::Shoes => "shoes",
            ClothingCategory::Accessories => "accessories",
            ClothingCategory::Dresses => "dresses",
        }
    }
}

impl fmt::Display for ClothingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClothingItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: ClothingCategory,
    pub name: String,
    pub image_key: Option<String>,
    pub description: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewClothingItem {
    pub category: ClothingCategory,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Default, Clone)]
pub struct ClothingChanges {
    pub category: Option<ClothingCategory>,
    pub name: Option<String>,
    pub description: Option<String>,
}
