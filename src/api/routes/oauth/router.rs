//! Router for the Google login flow

use std::sync::{Arc, RwLock};

use axum::{Router, extract::State, response::Redirect, routing::get};
use axum_extra::extract::{
    Query,
    cookie::{Cookie, CookieJar, SameSite},
};
use chrono::Utc;

use super::public;
use crate::api::public::ApiError;
use crate::api::session::{SESSION_COOKIE, create_session, remove_session};
use crate::api::state::{AppState, Session};
use crate::core::Error;
use crate::google::oauth::{authorization_url, exchange_code_for_token};

type SharedState = Arc<RwLock<AppState>>;

/// Where the browser lands after logging in or out
const LANDING_PAGE: &str = "/";

/// Ties a login `state` to the browser that started the login
pub const LOGIN_STATE_COOKIE: &str = "OAUTH_STATE";

fn login_state_cookie(value: String) -> Cookie<'static> {
    Cookie::build((LOGIN_STATE_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

async fn login_handler(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let login_state = uuid::Uuid::new_v4().to_string();
    let url = {
        let mut shared_state = state.write().expect("Unable to write shared state");
        shared_state.insert_pending_login(login_state.clone(), Utc::now());
        authorization_url(&shared_state.config, &login_state)
    };
    (jar.add(login_state_cookie(login_state)), Redirect::to(&url))
}

async fn callback_handler(
    State(state): State<SharedState>,
    jar: CookieJar,
    Query(params): Query<public::CallbackQuery>,
) -> Result<(CookieJar, Redirect), ApiError> {
    if let Some(error) = params.error {
        return Err(Error::Unauthorized(format!("Login failed: {}", error)).into());
    }

    let login_state = params.state.unwrap_or_default();
    let same_browser = jar
        .get(LOGIN_STATE_COOKIE)
        .is_some_and(|c| !login_state.is_empty() && c.value() == login_state);
    if !same_browser {
        return Err(
            Error::Unauthorized("Login state does not match this browser".to_string()).into(),
        );
    }

    let (known, config) = {
        let mut shared_state = state.write().expect("Unable to write shared state");
        // A state value can only be used once
        let known = shared_state.take_pending_login(&login_state, Utc::now());
        (known, shared_state.config.clone())
    };
    if !known {
        return Err(Error::Unauthorized("Unknown login state".to_string()).into());
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::Invalid("Missing authorization code".to_string()))?;
    let token = exchange_code_for_token(&config, &code).await?;

    let session_id = create_session(
        &state,
        Session::new(
            token.access_token.clone(),
            token.refresh_token.clone(),
            token.expires_at(),
        ),
    );
    tracing::info!("Login completed, new session created");

    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    let jar = jar
        .remove(Cookie::build(LOGIN_STATE_COOKIE).path("/"))
        .add(cookie);
    Ok((jar, Redirect::to(LANDING_PAGE)))
}

async fn logout_handler(State(state): State<SharedState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        remove_session(&state, cookie.value());
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to(LANDING_PAGE))
}

/// Create the login router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/oauth2/authorization/google", get(login_handler))
        .route("/login/oauth2/code/google", get(callback_handler))
        .route("/logout", get(logout_handler).post(logout_handler))
}
