//! Client side of Google's OAuth2 authorization code flow: building the
//! consent URL, exchanging the code and refreshing access tokens.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::core::{AppConfig, Error};

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
    pub token_type: Option<String>,
}

impl TokenResponse {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs))
    }
}

/// URL of Google's consent screen for this app. `state` is echoed back
/// to the redirect URI.
pub fn authorization_url(config: &AppConfig, state: &str) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent&state={}",
        config.google_auth_url,
        urlencoding::encode(&config.google_client_id),
        urlencoding::encode(&config.google_redirect_uri),
        urlencoding::encode(&config.google_scopes),
        urlencoding::encode(state)
    )
}

async fn request_token(token_url: &str, form: &[(&str, &str)]) -> Result<TokenResponse, Error> {
    let res = Client::new().post(token_url).form(form).send().await?;
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        // Google answers a bad code or revoked refresh token with 400
        // `invalid_grant`, which is an auth failure from our side.
        if status.is_client_error() {
            return Err(Error::Unauthorized(format!(
                "Token request failed: {} ({})",
                status, text
            )));
        }
        return Err(Error::from_status(status, "Token request", &text));
    }
    Ok(serde_json::from_str(&text)?)
}

pub async fn exchange_code_for_token(
    config: &AppConfig,
    code: &str,
) -> Result<TokenResponse, Error> {
    tracing::debug!("Exchanging authorization code for token");
    request_token(
        &config.google_token_url,
        &[
            ("code", code),
            ("client_id", config.google_client_id.as_str()),
            ("client_secret", config.google_client_secret.as_str()),
            ("redirect_uri", config.google_redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ],
    )
    .await
}

pub async fn refresh_access_token(
    config: &AppConfig,
    refresh_token: &str,
) -> Result<TokenResponse, Error> {
    tracing::debug!("Refreshing access token");
    request_token(
        &config.google_token_url,
        &[
            ("client_id", config.google_client_id.as_str()),
            ("client_secret", config.google_client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ],
    )
    .await
}
