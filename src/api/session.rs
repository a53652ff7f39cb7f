//! Request-scoped access to the caller's Google access token.
//!
//! A token is taken from an `Authorization: Bearer` header when present,
//! otherwise from the session named by the `SESSION` cookie. Expired
//! session tokens are refreshed when a refresh token is available.

use std::sync::{Arc, RwLock};

use axum::extract::FromRequestParts;
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use http::{HeaderMap, header, request::Parts};

use crate::api::public::ApiError;
use crate::api::state::{AppState, Session};
use crate::core::Error;
use crate::google::oauth::refresh_access_token;

pub const SESSION_COOKIE: &str = "SESSION";

type SharedState = Arc<RwLock<AppState>>;

/// The caller's access token, resolved once per request
#[derive(Debug, Clone)]
pub struct AccessToken(pub String);

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

impl FromRequestParts<SharedState> for AccessToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(token) = bearer_token(&parts.headers) {
            return Ok(AccessToken(token));
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let session_id = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(|| Error::Unauthorized("Not authenticated".to_string()))?;

        let (session, config) = {
            let mut shared_state = state.write().expect("Unable to write shared state");
            let session = shared_state.sessions.get_mut(&session_id).map(|s| {
                s.last_used = Utc::now();
                s.clone()
            });
            (session, shared_state.config.clone())
        };
        let session =
            session.ok_or_else(|| Error::Unauthorized("Session not found".to_string()))?;

        if !session.is_expired() {
            return Ok(AccessToken(session.access_token));
        }

        let Some(refresh_token) = session.refresh_token.clone() else {
            remove_session(state, &session_id);
            return Err(Error::Unauthorized("Session expired".to_string()).into());
        };

        let token = refresh_access_token(&config, &refresh_token).await?;
        let refreshed = Session::new(
            token.access_token.clone(),
            // Google only rotates the refresh token sometimes
            token.refresh_token.clone().or(Some(refresh_token)),
            token.expires_at(),
        );
        state
            .write()
            .expect("Unable to write shared state")
            .sessions
            .insert(session_id, refreshed);

        Ok(AccessToken(token.access_token))
    }
}

/// Store a new session and return its id
pub fn create_session(state: &SharedState, session: Session) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    state
        .write()
        .expect("Unable to write shared state")
        .insert_session(id.clone(), session);
    id
}

pub fn remove_session(state: &SharedState, session_id: &str) {
    state
        .write()
        .expect("Unable to write shared state")
        .sessions
        .remove(session_id);
}
