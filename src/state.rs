use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::google::GoogleOAuth;
use crate::auth::repo::AccountStore;
use crate::config::AppConfig;
use crate::db::{self, PgStore};
use crate::mail::{LogMailer, Mailer, SmtpMailer};
use crate::recommendations::repo::RecommendationStore;
use crate::recommendations::weather::{OpenWeatherMap, WeatherProvider};
use crate::storage::{Storage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub accounts: Arc<dyn AccountStore>,
    pub recommendations: Arc<dyn RecommendationStore>,
    pub mailer: Arc<dyn Mailer>,
    pub weather: Arc<dyn WeatherProvider>,
    pub google: Option<GoogleOAuth>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url).await?;
        let store = Arc::new(PgStore::new(db.clone()));

        let storage =
            Arc::new(Storage::new(&config.storage, "us-east-1").await?) as Arc<dyn StorageClient>;

        let mailer: Arc<dyn Mailer> = if config.mail.smtp.is_some() {
            Arc::new(SmtpMailer::new(&config.mail)?)
        } else {
            warn!("SMTP_HOST not set; verification codes are written to the log");
            Arc::new(LogMailer)
        };

        if config.weather.api_key.is_none() {
            warn!("WEATHER_API_KEY not set; recommendations use placeholder weather");
        }
        let weather = Arc::new(OpenWeatherMap::new(&config.weather)?) as Arc<dyn WeatherProvider>;

        let google = match config.google.clone() {
            Some(cfg) => Some(GoogleOAuth::new(cfg)?),
            None => {
                info!("google login disabled");
                None
            }
        };

        Ok(Self {
            db,
            config,
            storage,
            accounts: store.clone(),
            recommendations: store,
            mailer,
            weather,
            google,
        })
    }
}
