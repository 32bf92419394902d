use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    dto::{
        AccountRef, AuthResponse, MessageResponse, PasswordResetConfirmRequest, PublicUser,
        ResendOtpRequest, SignupRequest, SignupResponse, VerifyOtpRequest, VerifyOtpResponse,
    },
    jwt::JwtKeys,
    otp::{self, OtpError},
    password::{hash_password, unusable_password_hash, verify_password, MIN_PASSWORD_LEN},
    repo::{AccountStore, NewUser},
    repo_types::{OtpPurpose, User},
};
use crate::{
    error::{AppError, AppResult},
    mail::{otp_email, Mailer},
    state::AppState,
};

pub const RESET_REQUESTED_MESSAGE: &str =
    "If an account with this email exists, a password reset code has been sent.";
pub const RESEND_MESSAGE: &str =
    "If the account exists and needs a code, a new one has been sent.";
const INVALID_CREDENTIALS: &str = "Invalid email or password.";
const MAX_NAME_LEN: usize = 100;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn default_full_name(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Account lifecycle: signup, OTP verification, login and password reset.
#[derive(Clone)]
pub struct Accounts {
    store: Arc<dyn AccountStore>,
    mailer: Arc<dyn Mailer>,
    keys: JwtKeys,
    otp_ttl: Duration,
}

impl FromRef<AppState> for Accounts {
    fn from_ref(state: &AppState) -> Self {
        Accounts::new(
            state.accounts.clone(),
            state.mailer.clone(),
            JwtKeys::from_ref(state),
            Duration::minutes(state.config.otp_ttl_minutes),
        )
    }
}

impl Accounts {
    pub fn new(
        store: Arc<dyn AccountStore>,
        mailer: Arc<dyn Mailer>,
        keys: JwtKeys,
        otp_ttl: Duration,
    ) -> Self {
        Self {
            store,
            mailer,
            keys,
            otp_ttl,
        }
    }

    /// Creates an inactive account and mails a `signup` code.
    pub async fn signup(&self, req: SignupRequest) -> AppResult<SignupResponse> {
        let email = normalize_email(&req.email);
        let full_name = req.full_name.trim();

        if !is_valid_email(&email) {
            warn!(%email, "invalid email");
            return Err(AppError::validation("Invalid email."));
        }
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation("Password too short."));
        }
        if full_name.is_empty() {
            return Err(AppError::validation("Full name is required."));
        }
        if full_name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::validation("Full name is too long."));
        }

        if self.store.find_user_by_email(&email).await?.is_some() {
            warn!(%email, "email already registered");
            return Err(AppError::Conflict("A user with this email already exists.".into()));
        }

        let hash = hash_password(&req.password)?;
        let user = self
            .store
            .create_user(NewUser {
                email: &email,
                password_hash: &hash,
                full_name,
                is_active: false,
            })
            .await?
            .ok_or_else(|| AppError::Conflict("A user with this email already exists.".into()))?;

        info!(user_id = %user.id, email = %user.email, "user registered (pending)");

        let message = match self.send_code(&user, OtpPurpose::Signup).await {
            Ok(()) => "Verification code sent to your email.",
            Err(e) => {
                error!(error = ?e, user_id = %user.id, "signup otp delivery failed");
                "Account created, but the verification email could not be sent. Request a new code."
            }
        };

        Ok(SignupResponse {
            user: PublicUser {
                id: user.id,
                email: user.email,
                full_name: Some(full_name.to_string()),
                is_active: user.is_active,
            },
            message: message.to_string(),
        })
    }

    /// Checks a code. A `signup` code activates the account and opens a session.
    pub async fn verify_otp(&self, req: VerifyOtpRequest) -> AppResult<VerifyOtpResponse> {
        let user = self.resolve_account(&req.account).await?;
        otp::verify(self.store.as_ref(), user.id, &req.code, req.purpose).await?;

        match req.purpose {
            OtpPurpose::Signup => {
                if !user.is_active {
                    self.store.activate_user(user.id).await?;
                    info!(user_id = %user.id, "account activated");
                }
                self.store
                    .ensure_profile(user.id, default_full_name(&user.email))
                    .await?;
                let session = self
                    .session(User {
                        is_active: true,
                        ..user
                    })
                    .await?;
                Ok(VerifyOtpResponse {
                    message: "Account verified.".into(),
                    user_id: session.user.id,
                    purpose: req.purpose,
                    session: Some(session),
                })
            }
            OtpPurpose::PasswordReset => Ok(VerifyOtpResponse {
                message: "OTP verified. You may now reset your password.".into(),
                user_id: user.id,
                purpose: req.purpose,
                session: None,
            }),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthResponse> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::validation("Email and password are required."));
        }

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            warn!(%email, "login unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(%email, user_id = %user.id, "login invalid password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        if !user.is_active {
            warn!(user_id = %user.id, "login on inactive account");
            return Err(AppError::Forbidden("Account is not verified.".into()));
        }

        info!(user_id = %user.id, "user logged in");
        self.session(user).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self
            .keys
            .verify_refresh(refresh_token)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;
        let user = self
            .store
            .find_user_by_id(claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
        self.session(user).await
    }

    /// Same answer whether or not the email is registered.
    pub async fn reset_request(&self, email: &str) -> AppResult<MessageResponse> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AppError::validation("Email is required."));
        }

        match self.store.find_user_by_email(&email).await? {
            Some(user) => {
                if let Err(e) = self.send_code(&user, OtpPurpose::PasswordReset).await {
                    error!(error = ?e, user_id = %user.id, "password reset otp delivery failed");
                }
            }
            None => info!("password reset requested for unknown email"),
        }

        Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE))
    }

    /// Sets a new password once the reset code checks out, then drops outstanding reset codes.
    pub async fn reset_confirm(&self, req: PasswordResetConfirmRequest) -> AppResult<MessageResponse> {
        if req.new_password.is_empty() || req.confirm_password.is_empty() {
            return Err(AppError::validation("New password and confirmation are required."));
        }
        if req.new_password != req.confirm_password {
            return Err(AppError::validation("Passwords do not match."));
        }
        if req.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation("Password too short."));
        }

        let user = self.resolve_account(&req.account).await?;
        otp::verify(self.store.as_ref(), user.id, &req.code, OtpPurpose::PasswordReset).await?;

        let hash = hash_password(&req.new_password)?;
        self.store.replace_password(user.id, &hash).await?;
        info!(user_id = %user.id, "password reset");

        Ok(MessageResponse::new("Password has been reset successfully."))
    }

    pub async fn resend_otp(&self, req: ResendOtpRequest) -> AppResult<MessageResponse> {
        let email = normalize_email(&req.email);
        if email.is_empty() {
            return Err(AppError::validation("Email is required."));
        }

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .filter(|u| req.purpose != OtpPurpose::Signup || !u.is_active);

        if let Some(user) = user {
            if let Err(e) = self.send_code(&user, req.purpose).await {
                error!(error = ?e, user_id = %user.id, "otp resend failed");
            }
        }

        Ok(MessageResponse::new(RESEND_MESSAGE))
    }

    /// Finds or creates an active account for an email verified by an identity provider.
    pub async fn social_login(&self, email: &str, full_name: Option<&str>) -> AppResult<AuthResponse> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AppError::validation("Invalid email."));
        }
        let full_name = full_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| default_full_name(&email))
            .chars()
            .take(MAX_NAME_LEN)
            .collect::<String>();

        let user = match self.store.find_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                let hash = unusable_password_hash()?;
                let created = self
                    .store
                    .create_user(NewUser {
                        email: &email,
                        password_hash: &hash,
                        full_name: &full_name,
                        is_active: true,
                    })
                    .await?;
                match created {
                    Some(user) => {
                        info!(user_id = %user.id, "user registered via google");
                        user
                    }
                    // lost a race with a concurrent signup
                    None => self
                        .store
                        .find_user_by_email(&email)
                        .await?
                        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user vanished after conflict")))?,
                }
            }
        };

        if user.is_active {
            self.store.ensure_profile(user.id, &full_name).await?;
        } else {
            // whoever signed up with this address never proved they own it
            let hash = unusable_password_hash()?;
            self.store
                .claim_pending_account(user.id, &hash, &full_name)
                .await?;
            warn!(user_id = %user.id, "pending account claimed via google; password and codes reset");
        }

        self.session(User {
            is_active: true,
            ..user
        })
        .await
    }

    pub async fn me(&self, user_id: Uuid) -> AppResult<PublicUser> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
        self.public_user(user).await
    }

    async fn resolve_account(&self, account: &AccountRef) -> AppResult<User> {
        if let Some(id) = account.user_id {
            return self
                .store
                .find_user_by_id(id)
                .await?
                .ok_or_else(|| AppError::not_found("User not found."));
        }
        let email = account
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::validation("user_id or email is required."))?;
        // an unknown email reads like a wrong code so the reset flow does not reveal accounts
        self.store
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| OtpError::Invalid.into())
    }

    async fn send_code(&self, user: &User, purpose: OtpPurpose) -> anyhow::Result<()> {
        let code = otp::issue(self.store.as_ref(), user.id, purpose, self.otp_ttl).await?;
        let mail = otp_email(&user.email, &code.code, purpose, self.otp_ttl.whole_minutes());
        self.mailer.send(mail).await
    }

    async fn public_user(&self, user: User) -> AppResult<PublicUser> {
        let full_name = self.store.profile_full_name(user.id).await?;
        Ok(PublicUser {
            id: user.id,
            email: user.email,
            full_name,
            is_active: user.is_active,
        })
    }

    async fn session(&self, user: User) -> AppResult<AuthResponse> {
        let access_token = self.keys.sign_access(user.id)?;
        let refresh_token = self.keys.sign_refresh(user.id)?;
        Ok(AuthResponse {
            access_token,
            refresh_token,
            user: self.public_user(user).await?,
        })
    }
}
