use anyhow::{anyhow, Context};
use axum::http::{header, HeaderMap};
use serde::Deserialize;
use tracing::{error, instrument};
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::config::GoogleConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

pub const STATE_COOKIE: &str = "closetai_oauth_state";
const STATE_COOKIE_PATH: &str = "/api/v1/auth/google";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Subset of the OpenID Connect userinfo document.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleIdentity {
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
}

/// OAuth2 authorization-code client for Google sign-in.
#[derive(Clone)]
pub struct GoogleOAuth {
    config: GoogleConfig,
    client: reqwest::Client,
}

impl GoogleOAuth {
    pub fn new(config: GoogleConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { config, client })
    }

    /// `state` is echoed back by Google on the callback.
    pub fn authorization_url(&self, state: &str) -> anyhow::Result<String> {
        let url = reqwest::Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("access_type", "online"),
                ("state", state),
            ],
        )?;
        Ok(url.into())
    }

    /// Exchanges an authorization code for the caller's identity.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> anyhow::Result<GoogleIdentity> {
        let token: TokenResponse = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("google token request")?
            .error_for_status()
            .map_err(|e| {
                error!(error = %e, "google token exchange rejected");
                anyhow!("google token exchange rejected: {}", e)
            })?
            .json()
            .await
            .context("parse google token response")?;

        let identity: GoogleIdentity = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .context("google userinfo request")?
            .error_for_status()
            .context("google userinfo rejected")?
            .json()
            .await
            .context("parse google userinfo")?;

        if !identity.email_verified {
            anyhow::bail!("google account email is not verified");
        }
        Ok(identity)
    }
}

/// Binds a login attempt to the browser that started it.
pub fn state_cookie(nonce: Uuid) -> String {
    format!("{STATE_COOKIE}={nonce}; Path={STATE_COOKIE_PATH}; Max-Age=600; HttpOnly; SameSite=Lax")
}

pub fn clear_state_cookie() -> String {
    format!("{STATE_COOKIE}=; Path={STATE_COOKIE_PATH}; Max-Age=0; HttpOnly; SameSite=Lax")
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

/// The callback must carry a state token we signed whose nonce matches the browser's cookie.
pub fn check_state(keys: &JwtKeys, state: Option<&str>, cookie: Option<&str>) -> anyhow::Result<()> {
    let state = state.filter(|s| !s.is_empty()).context("missing state")?;
    let nonce = keys.verify_oauth_state(state)?;
    let cookie = cookie.context("missing state cookie")?;
    if cookie != nonce.to_string() {
        anyhow::bail!("state does not belong to this browser");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_jwt_config;
    use axum::http::HeaderValue;

    #[test]
    fn authorization_url_carries_client_and_redirect() {
        let google = GoogleOAuth::new(GoogleConfig {
            client_id: "client-123".into(),
            client_secret: "secret".into(),
            redirect_uri: "http://localhost:8080/api/v1/auth/google/callback".into(),
        })
        .unwrap();
        let url = google.authorization_url("signed-state").unwrap();
        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080"));
        assert!(url.contains("state=signed-state"));
        assert!(!url.contains("client_secret"));
    }

    #[test]
    fn state_check_requires_matching_cookie() {
        let keys = JwtKeys::from_config(&test_jwt_config());
        let nonce = Uuid::new_v4();
        let state = keys.sign_oauth_state(nonce).unwrap();
        let nonce_str = nonce.to_string();

        assert!(check_state(&keys, Some(&state), Some(&nonce_str)).is_ok());
        assert!(check_state(&keys, None, Some(&nonce_str)).is_err());
        assert!(check_state(&keys, Some(""), Some(&nonce_str)).is_err());
        assert!(check_state(&keys, Some(&state), None).is_err());
        let other = Uuid::new_v4().to_string();
        assert!(check_state(&keys, Some(&state), Some(&other)).is_err());
    }

    #[test]
    fn state_check_rejects_tokens_of_other_kinds() {
        let keys = JwtKeys::from_config(&test_jwt_config());
        let nonce = Uuid::new_v4();
        let access = keys.sign_access(nonce).unwrap();
        assert!(check_state(&keys, Some(&access), Some(&nonce.to_string())).is_err());
    }

    #[test]
    fn reads_state_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; closetai_oauth_state=abc-123; lang=pt"),
        );
        assert_eq!(cookie_value(&headers, STATE_COOKIE), Some("abc-123"));
        assert_eq!(cookie_value(&headers, "missing"), None);
        assert!(state_cookie(Uuid::nil()).contains("HttpOnly"));
    }

    #[test]
    fn identity_defaults_unverified() {
        let id: GoogleIdentity = serde_json::from_str(r#"{"email":"a@b.co"}"#).unwrap();
        assert!(!id.email_verified);
        assert!(id.name.is_none());
    }
}
