use std::env;

use anyhow::{Context, Result, anyhow};

pub const DEFAULT_INBOX_LIMIT: i64 = 10;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_redirect_uri: String,
    pub google_auth_url: String,
    pub google_token_url: String,
    pub google_scopes: String,
    pub gmail_api_base_url: String,
    pub sender_address: String,
    pub inbox_limit: i64,
    pub static_dir: String,
}

impl AppConfig {
    /// Load the config from `GMAIL_RELAY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let google_client_id = lookup("GMAIL_RELAY_CLIENT_ID")
            .ok_or_else(|| anyhow!("Missing env var GMAIL_RELAY_CLIENT_ID"))?;
        let google_client_secret = lookup("GMAIL_RELAY_CLIENT_SECRET")
            .ok_or_else(|| anyhow!("Missing env var GMAIL_RELAY_CLIENT_SECRET"))?;
        let google_redirect_uri = var_or(
            "GMAIL_RELAY_REDIRECT_URI",
            "http://localhost:8080/login/oauth2/code/google",
        );
        let google_auth_url = var_or(
            "GMAIL_RELAY_AUTH_URL",
            "https://accounts.google.com/o/oauth2/v2/auth",
        );
        let google_token_url = var_or(
            "GMAIL_RELAY_TOKEN_URL",
            "https://oauth2.googleapis.com/token",
        );
        // Permanent delete needs the full mail scope, gmail.modify is not enough
        let google_scopes = var_or("GMAIL_RELAY_SCOPES", "openid email https://mail.google.com/");
        let gmail_api_base_url = var_or("GMAIL_RELAY_API_BASE_URL", "https://gmail.googleapis.com");
        let sender_address = var_or("GMAIL_RELAY_SENDER", "me");
        let inbox_limit = match lookup("GMAIL_RELAY_INBOX_LIMIT") {
            Some(limit) => limit
                .parse::<i64>()
                .with_context(|| format!("Invalid GMAIL_RELAY_INBOX_LIMIT: {}", limit))?,
            None => DEFAULT_INBOX_LIMIT,
        };
        let static_dir = var_or("GMAIL_RELAY_STATIC_DIR", "./static");

        Ok(Self {
            google_client_id,
            google_client_secret,
            google_redirect_uri,
            google_auth_url,
            google_token_url,
            google_scopes,
            gmail_api_base_url: gmail_api_base_url.trim_end_matches('/').to_string(),
            sender_address,
            inbox_limit,
            static_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GMAIL_RELAY_CLIENT_ID", "id"),
            ("GMAIL_RELAY_CLIENT_SECRET", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.google_client_id, "id");
        assert_eq!(config.inbox_limit, 10);
        assert_eq!(config.sender_address, "me");
        assert_eq!(config.gmail_api_base_url, "https://gmail.googleapis.com");
        assert_eq!(config.static_dir, "./static");
    }

    #[test]
    fn test_missing_client_id() {
        let result = AppConfig::from_lookup(lookup(&[("GMAIL_RELAY_CLIENT_SECRET", "secret")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GMAIL_RELAY_CLIENT_ID", "id"),
            ("GMAIL_RELAY_CLIENT_SECRET", "secret"),
            ("GMAIL_RELAY_API_BASE_URL", "http://127.0.0.1:1234/"),
            ("GMAIL_RELAY_INBOX_LIMIT", "25"),
        ]))
        .unwrap();
        assert_eq!(config.gmail_api_base_url, "http://127.0.0.1:1234");
        assert_eq!(config.inbox_limit, 25);
    }

    #[test]
    fn test_invalid_inbox_limit() {
        let result = AppConfig::from_lookup(lookup(&[
            ("GMAIL_RELAY_CLIENT_ID", "id"),
            ("GMAIL_RELAY_CLIENT_SECRET", "secret"),
            ("GMAIL_RELAY_INBOX_LIMIT", "ten"),
        ]));
        assert!(result.is_err());
    }
}
