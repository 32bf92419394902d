use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{Pagination, RecommendationResponse, RecommendedItem},
    repo_types::Recommendation,
    services::Recommender,
};
use crate::{
    auth::extractors::AuthUser, error::AppResult, images::services::presign_optional,
    state::AppState,
};

pub fn recommendation_routes() -> Router<AppState> {
    Router::new()
        .route("/events/:id/recommendations", post(generate))
        .route("/recommendations", get(list_recommendations))
        .route("/recommendations/:id", get(get_recommendation))
}

async fn to_response(state: &AppState, rec: Recommendation) -> RecommendationResponse {
    let mut items = Vec::with_capacity(rec.items.len());
    for item in rec.items {
        items.push(RecommendedItem {
            image_url: presign_optional(state.storage.as_ref(), item.image_key.as_deref()).await,
            id: item.id,
            category: item.category,
            name: item.name,
        });
    }
    RecommendationResponse {
        id: rec.id,
        event_id: rec.event_id,
        description: rec.description,
        weather: rec.weather,
        items,
        created_at: rec.created_at,
    }
}

#[instrument(skip(state, recommender))]
pub async fn generate(
    State(state): State<AppState>,
    State(recommender): State<Recommender>,
    AuthUser(user_id): AuthUser,
    Path(event_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<RecommendationResponse>)> {
    let rec = recommender.generate(user_id, event_id).await?;
    Ok((StatusCode::CREATED, Json(to_response(&state, rec).await)))
}

#[instrument(skip(state, recommender))]
pub async fn list_recommendations(
    State(state): State<AppState>,
    State(recommender): State<Recommender>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> AppResult<Json<Vec<RecommendationResponse>>> {
    let recs = recommender
        .list(user_id, p.limit.clamp(1, 100), p.offset.max(0))
        .await?;
    let mut out = Vec::with_capacity(recs.len());
    for rec in recs {
        out.push(to_response(&state, rec).await);
    }
    Ok(Json(out))
}

#[instrument(skip(state, recommender))]
pub async fn get_recommendation(
    State(state): State<AppState>,
    State(recommender): State<Recommender>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RecommendationResponse>> {
    let rec = recommender.get(user_id, id).await?;
    Ok(Json(to_response(&state, rec).await))
}
