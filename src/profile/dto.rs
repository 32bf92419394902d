use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Gender, ProfileChanges};
use crate::error::{AppError, AppResult};

const MAX_TEXT_LEN: usize = 100;
const MAX_AGE: u32 = 150;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub location: Option<String>,
    pub profile_picture_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub location: Option<String>,
}

impl UpdateProfileRequest {
    pub fn into_changes(self) -> AppResult<ProfileChanges> {
        let full_name = match self.full_name.map(|n| n.trim().to_string()) {
            Some(n) if n.is_empty() => return Err(AppError::validation("full_name cannot be blank")),
            Some(n) if n.chars().count() > MAX_TEXT_LEN => {
                return Err(AppError::validation("full_name is too long"))
            }
            other => other,
        };
        let age = match self.age {
            Some(a) if a > MAX_AGE => return Err(AppError::validation("age is out of range")),
            other => other.map(|a| a as i32),
        };
        let location = self.location.map(|l| l.trim().to_string());
        if location
            .as_deref()
            .is_some_and(|l| l.chars().count() > MAX_TEXT_LEN)
        {
            return Err(AppError::validation("location is too long"));
        }
        Ok(ProfileChanges {
            full_name,
            age,
            gender: self.gender,
            location,
        })
    }
}
