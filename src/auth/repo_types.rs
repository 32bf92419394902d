use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                     // unique user ID
    pub email: String,                // lowercased, unique
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 hash, not exposed in JSON
    pub is_active: bool,              // false until the signup OTP is verified
    pub created_at: OffsetDateTime,   // creation timestamp
}

/// Why an OTP was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "otp_purpose", rename_all = "snake_case")]
pub enum OtpPurpose {
    Signup,
    PasswordReset,
}

#[derive(Debug, Clone, FromRow)]
pub struct Otp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub purpose: OtpPurpose,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl Otp {
    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        now <= self.expires_at
    }
}
