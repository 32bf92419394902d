//! Weather forecasts for event locations.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use tracing::{debug, instrument};

use crate::config::WeatherConfig;

/// The weather a recommendation was based on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub summary: String,
    pub temperature_c: Option<f64>,
    pub conditions: Option<String>,
    /// `false` when the provider failed and `summary` is a placeholder.
    pub available: bool,
}

impl WeatherSnapshot {
    pub fn placeholder(location: &str, date: Date) -> Self {
        Self {
            summary: format!("Weather data unavailable for {} on {}", location, date),
            temperature_c: None,
            conditions: None,
            available: false,
        }
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn forecast(&self, location: &str, date: Date) -> anyhow::Result<WeatherSnapshot>;
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt: i64,
    main: ForecastMain,
    #[serde(default)]
    weather: Vec<ForecastCondition>,
}

#[derive(Debug, Deserialize)]
struct ForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastCondition {
    main: String,
    description: String,
}

/// OpenWeatherMap 5 day / 3 hour forecast client.
pub struct OpenWeatherMap {
    api_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenWeatherMap {
    pub fn new(cfg: &WeatherConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            api_url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
            client,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMap {
    #[instrument(skip(self))]
    async fn forecast(&self, location: &str, date: Date) -> anyhow::Result<WeatherSnapshot> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("weather api key is not configured"))?;

        let response: ForecastResponse = self
            .client
            .get(&self.api_url)
            .query(&[("q", location), ("appid", api_key), ("units", "metric")])
            .send()
            .await
            .context("weather request failed")?
            .error_for_status()
            .context("weather provider rejected request")?
            .json()
            .await
            .context("parse weather response")?;

        debug!(entries = response.list.len(), "forecast received");
        pick_forecast(&response.list, date)
            .ok_or_else(|| anyhow!("no forecast for {} on {}", location, date))
    }
}

/// The entry on `date` closest to midday UTC.
fn pick_forecast(entries: &[ForecastEntry], date: Date) -> Option<WeatherSnapshot> {
    entries
        .iter()
        .filter_map(|e| {
            let at = OffsetDateTime::from_unix_timestamp(e.dt).ok()?;
            (at.date() == date).then_some((e, (at.hour() as i32 - 12).abs()))
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(e, _)| {
            let condition = e.weather.first();
            let summary = match condition {
                Some(c) => format!("{}, {:.1}°C", c.description, e.main.temp),
                None => format!("{:.1}°C", e.main.temp),
            };
            WeatherSnapshot {
                summary,
                temperature_c: Some(e.main.temp),
                conditions: condition.map(|c| c.main.clone()),
                available: true,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn entry(at: OffsetDateTime, temp: f64, main: &str, description: &str) -> ForecastEntry {
        ForecastEntry {
            dt: at.unix_timestamp(),
            main: ForecastMain { temp },
            weather: vec![ForecastCondition {
                main: main.into(),
                description: description.into(),
            }],
        }
    }

    #[test]
    fn picks_entry_closest_to_noon_on_date() {
        let entries = vec![
            entry(datetime!(2025-06-13 12:00 UTC), 30.0, "Clear", "clear sky"),
            entry(datetime!(2025-06-14 06:00 UTC), 12.0, "Clouds", "few clouds"),
            entry(datetime!(2025-06-14 12:00 UTC), 18.25, "Rain", "light rain"),
            entry(datetime!(2025-06-14 18:00 UTC), 15.0, "Clear", "clear sky"),
        ];
        let snap = pick_forecast(&entries, date!(2025 - 06 - 14)).unwrap();
        assert_eq!(snap.conditions.as_deref(), Some("Rain"));
        assert_eq!(snap.temperature_c, Some(18.25));
        assert!(snap.summary.starts_with("light rain"));
        assert!(snap.available);
    }

    #[test]
    fn no_entry_for_date_yields_none() {
        let entries = vec![entry(datetime!(2025-06-13 12:00 UTC), 30.0, "Clear", "clear sky")];
        assert!(pick_forecast(&entries, date!(2025 - 07 - 01)).is_none());
    }

    #[test]
    fn parses_provider_payload() {
        let body = r#"{"cod":"200","list":[{"dt":1749902400,"main":{"temp":21.4,"humidity":40},
            "weather":[{"id":800,"main":"Clear","description":"clear sky","icon":"01d"}]}],
            "city":{"name":"Lisbon"}}"#;
        let parsed: ForecastResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.list.len(), 1);
        assert_eq!(parsed.list[0].weather[0].main, "Clear");
    }

    #[test]
    fn placeholder_names_location_and_date() {
        let p = WeatherSnapshot::placeholder("Lisbon", date!(2025 - 06 - 14));
        assert_eq!(p.summary, "Weather data unavailable for Lisbon on 2025-06-14");
        assert!(!p.available);
    }

    #[tokio::test]
    async fn unconfigured_client_fails() {
        let client = OpenWeatherMap::new(&WeatherConfig {
            api_url: "http://127.0.0.1:9/forecast".into(),
            api_key: None,
        })
        .unwrap();
        assert!(client.forecast("Lisbon", date!(2025 - 06 - 14)).await.is_err());
    }
}
