use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{ClosetQuery, ClothingItemResponse, CreateClothingRequest, UpdateClothingRequest},
    repo_types::ClothingItem,
};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    images::services::{discard, presign_optional, read_image_field, store_image, MAX_IMAGE_BYTES},
    state::AppState,
};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/closet", get(list_items))
        .route("/closet/:id", get(get_item))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/closet", post(create_item))
        .route("/closet/:id", axum::routing::patch(update_item).delete(delete_item))
        .route(
            "/closet/:id/image",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
}

// --- helpers ---

pub(crate) async fn to_response(state: &AppState, item: ClothingItem) -> ClothingItemResponse {
    let image_url = presign_optional(state.storage.as_ref(), item.image_key.as_deref()).await;
    ClothingItemResponse {
        id: item.id,
        category: item.category,
        name: item.name,
        description: item.description,
        image_url,
        created_at: item.created_at,
    }
}

fn item_not_found() -> AppError {
    AppError::not_found("Clothing item not found")
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ClosetQuery>,
) -> AppResult<Json<Vec<ClothingItemResponse>>> {
    let items = ClothingItem::list_by_user(
        &state.db,
        user_id,
        q.category,
        q.limit.clamp(1, 200),
        q.offset.max(0),
    )
    .await?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(to_response(&state, item).await);
    }
    Ok(Json(out))
}

#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ClothingItemResponse>> {
    let item = ClothingItem::find(&state.db, user_id, id)
        .await?
        .ok_or_else(item_not_found)?;
    Ok(Json(to_response(&state, item).await))
}

#[instrument(skip(state, payload))]
pub async fn create_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateClothingRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<ClothingItemResponse>)> {
    let new = payload.validate()?;
    let item = ClothingItem::create(&state.db, user_id, &new).await?;
    info!(%user_id, item_id = %item.id, category = %item.category, "clothing item created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/closet/{}", item.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(to_response(&state, item).await)))
}

#[instrument(skip(state, payload))]
pub async fn update_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClothingRequest>,
) -> AppResult<Json<ClothingItemResponse>> {
    let changes = payload.validate()?;
    let item = ClothingItem::update(&state.db, user_id, id, &changes)
        .await?
        .ok_or_else(item_not_found)?;
    Ok(Json(to_response(&state, item).await))
}

#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let item = ClothingItem::delete(&state.db, user_id, id)
        .await?
        .ok_or_else(item_not_found)?;
    discard(state.storage.as_ref(), item.image_key.as_deref()).await;
    info!(%user_id, item_id = %id, "clothing item deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /closet/:id/image (multipart, field `image`)
#[instrument(skip(state, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    mut mp: Multipart,
) -> AppResult<Json<ClothingItemResponse>> {
    if ClothingItem::find(&state.db, user_id, id).await?.is_none() {
        return Err(item_not_found());
    }
    let upload = read_image_field(&mut mp, "image").await?;
    let key = store_image(state.storage.as_ref(), "closet", user_id, upload).await?;

    let Some((item, previous)) = ClothingItem::replace_image(&state.db, user_id, id, &key).await? else {
        discard(state.storage.as_ref(), Some(&key)).await;
        return Err(item_not_found());
    };
    discard(state.storage.as_ref(), previous.as_deref()).await;
    Ok(Json(to_response(&state, item).await))
}
