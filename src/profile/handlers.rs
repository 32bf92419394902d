use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{ProfileResponse, UpdateProfileRequest},
    repo_types::UserProfile,
};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    images::services::{discard, presign_optional, read_image_field, store_image, MAX_IMAGE_BYTES},
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).patch(update_profile))
        .route(
            "/profile/picture",
            post(upload_picture).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
}

async fn to_response(state: &AppState, p: UserProfile) -> ProfileResponse {
    let profile_picture_url =
        presign_optional(state.storage.as_ref(), p.profile_picture.as_deref()).await;
    ProfileResponse {
        user_id: p.user_id,
        email: p.email,
        full_name: p.full_name,
        age: p.age,
        gender: p.gender,
        location: p.location,
        profile_picture_url,
        created_at: p.created_at,
        updated_at: p.updated_at,
    }
}

fn profile_not_found() -> AppError {
    AppError::not_found("Profile not found")
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ProfileResponse>> {
    let profile = UserProfile::find(&state.db, user_id)
        .await?
        .ok_or_else(profile_not_found)?;
    Ok(Json(to_response(&state, profile).await))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ProfileResponse>> {
    let changes = payload.into_changes()?;
    let profile = UserProfile::update(&state.db, user_id, &changes)
        .await?
        .ok_or_else(profile_not_found)?;
    info!(%user_id, "profile updated");
    Ok(Json(to_response(&state, profile).await))
}

/// POST /profile/picture (multipart, field `picture`)
#[instrument(skip(state, mp))]
pub async fn upload_picture(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> AppResult<Json<ProfileResponse>> {
    let item = read_image_field(&mut mp, "picture").await?;
    let key = store_image(state.storage.as_ref(), "profiles", user_id, item).await?;

    let Some(previous) = UserProfile::replace_picture(&state.db, user_id, &key).await? else {
        discard(state.storage.as_ref(), Some(&key)).await;
        return Err(profile_not_found());
    };
    discard(state.storage.as_ref(), previous.as_deref()).await;

    let profile = UserProfile::find(&state.db, user_id)
        .await?
        .ok_or_else(profile_not_found)?;
    Ok(Json(to_response(&state, profile).await))
}
