use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            AuthResponse, GoogleCallbackQuery, GoogleLoginResponse, LoginRequest, MessageResponse,
            PasswordResetConfirmRequest, PasswordResetRequest, PublicUser, RefreshRequest,
            ResendOtpRequest, SignupRequest, SignupResponse, VerifyOtpRequest, VerifyOtpResponse,
        },
        extractors::AuthUser,
        google::{check_state, clear_state_cookie, cookie_value, state_cookie, STATE_COOKIE},
        jwt::JwtKeys,
        services::Accounts,
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/verify-otp", post(verify_otp))
        .route("/auth/resend-otp", post(resend_otp))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/password-reset", post(password_reset_request))
        .route("/auth/password-reset/confirm", post(password_reset_confirm))
        .route("/auth/google/login", get(google_login))
        .route("/auth/google/callback", get(google_callback))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(accounts, payload))]
pub async fn signup(
    State(accounts): State<Accounts>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let resp = accounts.signup(payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[instrument(skip(accounts, payload))]
pub async fn verify_otp(
    State(accounts): State<Accounts>,
    Json(payload): Json<VerifyOtpRequest>,
) -> AppResult<Json<VerifyOtpResponse>> {
    Ok(Json(accounts.verify_otp(payload).await?))
}

#[instrument(skip(accounts, payload))]
pub async fn resend_otp(
    State(accounts): State<Accounts>,
    Json(payload): Json<ResendOtpRequest>,
) -> AppResult<Json<MessageResponse>> {
    Ok(Json(accounts.resend_otp(payload).await?))
}

#[instrument(skip(accounts, payload))]
pub async fn login(
    State(accounts): State<Accounts>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    Ok(Json(accounts.login(&payload.email, &payload.password).await?))
}

#[instrument(skip(accounts, payload))]
pub async fn refresh(
    State(accounts): State<Accounts>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    Ok(Json(accounts.refresh(&payload.refresh_token).await?))
}

#[instrument(skip(accounts, payload))]
pub async fn password_reset_request(
    State(accounts): State<Accounts>,
    Json(payload): Json<PasswordResetRequest>,
) -> AppResult<Json<MessageResponse>> {
    Ok(Json(accounts.reset_request(&payload.email).await?))
}

#[instrument(skip(accounts, payload))]
pub async fn password_reset_confirm(
    State(accounts): State<Accounts>,
    Json(payload): Json<PasswordResetConfirmRequest>,
) -> AppResult<Json<MessageResponse>> {
    Ok(Json(accounts.reset_confirm(payload).await?))
}

type WithCookie<T> = ([(header::HeaderName, String); 1], Json<T>);

#[instrument(skip(state, keys))]
pub async fn google_login(
    State(state): State<AppState>,
    State(keys): State<JwtKeys>,
) -> AppResult<WithCookie<GoogleLoginResponse>> {
    let google = state
        .google
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Google login is not configured".into()))?;

    let nonce = Uuid::new_v4();
    let token = keys.sign_oauth_state(nonce)?;
    Ok((
        [(header::SET_COOKIE, state_cookie(nonce))],
        Json(GoogleLoginResponse {
            authorization_url: google.authorization_url(&token)?,
            state: token,
        }),
    ))
}

#[instrument(skip(state, accounts, keys, headers, query))]
pub async fn google_callback(
    State(state): State<AppState>,
    State(accounts): State<Accounts>,
    State(keys): State<JwtKeys>,
    headers: HeaderMap,
    Query(query): Query<GoogleCallbackQuery>,
) -> AppResult<WithCookie<AuthResponse>> {
    let google = state
        .google
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Google login is not configured".into()))?;

    if let Some(err) = query.error {
        return Err(AppError::Unauthorized(format!("Authentication failed: {err}")));
    }
    check_state(&keys, query.state.as_deref(), cookie_value(&headers, STATE_COOKIE)).map_err(|e| {
        warn!(error = %e, "google callback state rejected");
        AppError::Unauthorized("Invalid OAuth state".into())
    })?;
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::validation("Missing authorization code"))?;

    let identity = google.exchange_code(&code).await.map_err(|e| {
        error!(error = ?e, "google code exchange failed");
        AppError::Unauthorized("Authentication failed".into())
    })?;

    let session = accounts
        .social_login(&identity.email, identity.name.as_deref())
        .await?;
    Ok(([(header::SET_COOKIE, clear_state_cookie())], Json(session)))
}

#[instrument(skip(accounts))]
pub async fn get_me(
    State(accounts): State<Accounts>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    Ok(Json(accounts.me(user_id).await?))
}
