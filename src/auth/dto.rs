use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::OtpPurpose;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user: PublicUser,
    pub message: String,
}

/// Identifies the account an OTP belongs to: by id after signup, by email in the reset flow.
#[derive(Debug, Default, Deserialize)]
pub struct AccountRef {
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(flatten)]
    pub account: AccountRef,
    pub code: String,
    pub purpose: OtpPurpose,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub message: String,
    pub user_id: Uuid,
    pub purpose: OtpPurpose,
    #[serde(flatten)]
    pub session: Option<AuthResponse>,
}

#[derive(Debug, Deserialize)]
pub struct ResendOtpRequest {
    pub email: String,
    pub purpose: OtpPurpose,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirmRequest {
    #[serde(flatten)]
    pub account: AccountRef,
    pub code: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GoogleLoginResponse {
    pub authorization_url: String,
    pub state: String,
}

/// Response returned after OTP verification, login, refresh or social login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
