use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateEventRequest, EventResponse, Pagination, UpdateEventRequest},
    repo_types::Event,
};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/:id",
            get(get_event).patch(update_event).delete(delete_event),
        )
}

fn event_not_found() -> AppError {
    AppError::not_found("Event not found")
}

#[instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> AppResult<Json<Vec<EventResponse>>> {
    let events = Event::list_by_user(&state.db, user_id, p.limit.clamp(1, 200), p.offset.max(0)).await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EventResponse>> {
    let event = Event::find(&state.db, user_id, id)
        .await?
        .ok_or_else(event_not_found)?;
    Ok(Json(event.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<EventResponse>)> {
    let new = payload.validate()?;
    let event = Event::create(&state.db, user_id, &new).await?;
    info!(%user_id, event_id = %event.id, "event created");
    Ok((StatusCode::CREATED, Json(event.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEventRequest>,
) -> AppResult<Json<EventResponse>> {
    let changes = payload.validate()?;
    let event = Event::update(&state.db, user_id, id, &changes)
        .await?
        .ok_or_else(event_not_found)?;
    Ok(Json(event.into()))
}

#[instrument(skip(state))]
pub async fn delete_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !Event::delete(&state.db, user_id, id).await? {
        return Err(event_not_found());
    }
    info!(%user_id, event_id = %id, "event deleted");
    Ok(StatusCode::NO_CONTENT)
}
