use std::sync::Arc;

use axum::extract::FromRef;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    repo::RecommendationStore,
    repo_types::Recommendation,
    weather::{WeatherProvider, WeatherSnapshot},
};
use crate::{
    closet::repo_types::ClothingItem,
    error::{AppError, AppResult},
    events::repo_types::Event,
    state::AppState,
};

/// How many closet items a recommendation suggests.
pub const ITEMS_PER_RECOMMENDATION: i64 = 3;

/// Builds outfit recommendations for a user's events.
#[derive(Clone)]
pub struct Recommender {
    store: Arc<dyn RecommendationStore>,
    weather: Arc<dyn WeatherProvider>,
}

impl FromRef<AppState> for Recommender {
    fn from_ref(state: &AppState) -> Self {
        Recommender::new(state.recommendations.clone(), state.weather.clone())
    }
}

impl Recommender {
    pub fn new(store: Arc<dyn RecommendationStore>, weather: Arc<dyn WeatherProvider>) -> Self {
        Self { store, weather }
    }

    /// Weather failures degrade to a placeholder; they never fail the request.
    #[instrument(skip(self))]
    pub async fn generate(&self, user_id: Uuid, event_id: Uuid) -> AppResult<Recommendation> {
        let event = self
            .store
            .find_event(user_id, event_id)
            .await?
            .ok_or_else(|| AppError::not_found("Event not found"))?;

        let weather = match self.weather.forecast(&event.location, event.date).await {
            Ok(w) => w,
            Err(e) => {
                warn!(error = %e, %event_id, location = %event.location, "weather unavailable, using placeholder");
                WeatherSnapshot::placeholder(&event.location, event.date)
            }
        };

        let items = self
            .store
            .first_items(user_id, ITEMS_PER_RECOMMENDATION)
            .await?;

        let rec = Recommendation {
            id: Uuid::new_v4(),
            user_id,
            event_id,
            description: describe(&event, &weather, &items),
            weather,
            items,
            created_at: OffsetDateTime::now_utc(),
        };
        self.store.save(&rec).await?;

        info!(%user_id, %event_id, recommendation_id = %rec.id, items = rec.items.len(), "recommendation generated");
        Ok(rec)
    }

    pub async fn list(&self, user_id: Uuid, limit: i64, offset: i64) -> AppResult<Vec<Recommendation>> {
        Ok(self.store.list(user_id, limit, offset).await?)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> AppResult<Recommendation> {
        self.store
            .find(user_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Recommendation not found"))
    }
}

fn describe(event: &Event, weather: &WeatherSnapshot, items: &[ClothingItem]) -> String {
    let header = format!(
        "Outfit suggestion for {} in {} on {}. Weather: {}.",
        event.name, event.location, event.date, weather.summary
    );
    if items.is_empty() {
        return format!("{header} Add clothing items to your closet to get outfit suggestions.");
    }
    let picks = items
        .iter()
        .map(|i| format!("{} ({})", i.name, i.category))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{header} Suggested items: {picks}.")
}
