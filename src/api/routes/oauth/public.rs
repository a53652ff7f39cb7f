//! Public types for the OAuth2 login routes
use serde::Deserialize;

/// Query parameters Google appends to the redirect URI
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}
