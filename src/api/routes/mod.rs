//! API routes module

pub mod gmail;
pub mod oauth;

use std::sync::{Arc, RwLock};

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<RwLock<AppState>>;

/// Create the combined router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Gmail routes
        .nest("/gmail", gmail::router())
        // Login, callback and logout
        .merge(oauth::router())
}
