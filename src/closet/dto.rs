use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{ClothingCategory, ClothingChanges, NewClothingItem};
use crate::error::{AppError, AppResult};

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Serialize)]
pub struct ClothingItemResponse {
    pub id: Uuid,
    pub category: ClothingCategory,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct CreateClothingRequest {
    pub category: ClothingCategory,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateClothingRequest {
    pub category: Option<ClothingCategory>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClosetQuery {
    pub category: Option<ClothingCategory>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 { 50 }

fn clean_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation("name is too long"));
    }
    Ok(name.to_string())
}

impl CreateClothingRequest {
    pub fn validate(self) -> AppResult<NewClothingItem> {
        Ok(NewClothingItem {
            category: self.category,
            name: clean_name(&self.name)?,
            description: self.description.trim().to_string(),
        })
    }
}

impl UpdateClothingRequest {
    pub fn validate(self) -> AppResult<ClothingChanges> {
        Ok(ClothingChanges {
            category: self.category,
            name: self.name.as_deref().map(clean_name).transpose()?,
            description: self.description.map(|d| d.trim().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_known_category() {
        let err = serde_json::from_str::<CreateClothingRequest>(r#"{"category":"hats","name":"Cap"}"#);
        assert!(err.is_err());

        let ok: CreateClothingRequest =
            serde_json::from_str(r#"{"category":"jackets","name":"  Denim  "}"#).unwrap();
        let new = ok.validate().unwrap();
        assert_eq!(new.category, ClothingCategory::Jackets);
        assert_eq!(new.name, "Denim");
        assert_eq!(new.description, "");
    }

    #[test]
    fn update_rejects_blank_name() {
        let req = UpdateClothingRequest {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn query_defaults() {
        let q: ClosetQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.limit, 50);
        assert_eq!(q.offset, 0);
        assert!(q.category.is_none());
    }
}
