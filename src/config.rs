use std::net::SocketAddr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub from: String,
    /// `None` routes mail to the log instead of an SMTP relay.
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    pub api_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub otp_ttl_minutes: i64,
    pub mail: MailConfig,
    pub weather: WeatherConfig,
    pub storage: StorageConfig,
    pub google: Option<GoogleConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| get(key).filter(|v| !v.is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());
        let parse = |key: &str| -> anyhow::Result<Option<i64>> {
            var(key)
                .map(|v| v.parse::<i64>().with_context(|| format!("{key} must be an integer")))
                .transpose()
        };

        let port = match var("APP_PORT") {
            Some(v) => v.parse::<u16>().context("APP_PORT must be a port number")?,
            None => 8080,
        };

        let jwt = JwtConfig {
            secret: var("JWT_SECRET").context("JWT_SECRET is required")?,
            issuer: or("JWT_ISSUER", "closetai"),
            audience: or("JWT_AUDIENCE", "closetai-users"),
            ttl_minutes: parse("JWT_TTL_MINUTES")?.unwrap_or(60),
            refresh_ttl_minutes: parse("JWT_REFRESH_TTL_MINUTES")?.unwrap_or(60 * 24 * 14),
        };

        let otp_ttl_minutes = parse("OTP_TTL_MINUTES")?.unwrap_or(10);
        if otp_ttl_minutes < 1 {
            anyhow::bail!("OTP_TTL_MINUTES must be at least 1, got {otp_ttl_minutes}");
        }

        let smtp = match var("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: match var("SMTP_PORT") {
                    Some(v) => v.parse::<u16>().context("SMTP_PORT must be a port number")?,
                    None => 587,
                },
                username: var("SMTP_USERNAME"),
                password: var("SMTP_PASSWORD"),
            }),
            None => None,
        };
        let mail = MailConfig {
            from: or("SMTP_FROM", "noreply@closetai.com"),
            smtp,
        };

        let weather = WeatherConfig {
            api_url: or(
                "WEATHER_API_URL",
                "https://api.openweathermap.org/data/2.5/forecast",
            ),
            api_key: var("WEATHER_API_KEY"),
        };

        let storage = StorageConfig {
            endpoint: or("MINIO_ENDPOINT", "http://localhost:9000"),
            bucket: or("MINIO_BUCKET", "closetai"),
            access_key: or("MINIO_ACCESS_KEY", "minioadmin"),
            secret_key: or("MINIO_SECRET_KEY", "minioadmin"),
        };

        let google = match (
            var("GOOGLE_CLIENT_ID"),
            var("GOOGLE_CLIENT_SECRET"),
            var("GOOGLE_REDIRECT_URI"),
        ) {
            (Some(client_id), Some(client_secret), Some(redirect_uri)) => Some(GoogleConfig {
                client_id,
                client_secret,
                redirect_uri,
            }),
            _ => None,
        };

        Ok(Self {
            host: or("APP_HOST", "0.0.0.0"),
            port,
            database_url: var("DATABASE_URL").context("DATABASE_URL is required")?,
            jwt,
            otp_ttl_minutes,
            mail,
            weather,
            storage,
            google,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
