//! Test utilities for integration tests
use std::sync::{Arc, RwLock};

use axum::{Router, body::Body};

use gmail_relay::api::AppState;
use gmail_relay::api::app;
use gmail_relay::core::AppConfig;

pub type SharedState = Arc<RwLock<AppState>>;

/// Config pointing both the Gmail API and the OAuth2 token endpoint at
/// `server_url` (usually a `mockito` server).
pub fn test_config(server_url: &str) -> AppConfig {
    AppConfig {
        google_client_id: String::from("test_client_id"),
        google_client_secret: String::from("test_client_secret"),
        google_redirect_uri: String::from("http://localhost:8080/login/oauth2/code/google"),
        google_auth_url: String::from("https://accounts.google.com/o/oauth2/v2/auth"),
        google_token_url: format!("{}/token", server_url),
        google_scopes: String::from("openid email https://mail.google.com/"),
        gmail_api_base_url: server_url.to_string(),
        sender_address: String::from("me"),
        inbox_limit: 10,
        static_dir: String::from("./static"),
    }
}

/// Creates a test application router along with its shared state so
/// tests can seed sessions.
pub fn test_app_with_state(server_url: &str) -> (Router, SharedState) {
    let state = Arc::new(RwLock::new(AppState::new(test_config(server_url))));
    (app(Arc::clone(&state)), state)
}

pub fn test_app(server_url: &str) -> Router {
    test_app_with_state(server_url).0
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not utf-8")
}

pub async fn body_to_json(body: Body) -> serde_json::Value {
    serde_json::from_str(&body_to_string(body).await).expect("Body is not JSON")
}
