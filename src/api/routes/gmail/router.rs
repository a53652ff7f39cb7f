//! Router for the Gmail API

use std::sync::{Arc, RwLock};

use axum::{
    Router,
    extract::{Path, State, rejection::JsonRejection},
    response::Json,
    routing::get,
};
use axum_extra::extract::{Query, QueryRejection};

use super::public;
use crate::api::public::ApiError;
use crate::api::session::AccessToken;
use crate::api::state::AppState;
use crate::core::Error;
use crate::google::gmail::GmailClient;
use crate::mail::MailService;

type SharedState = Arc<RwLock<AppState>>;

/// Build the message service for this request's token
fn mail_service(state: &SharedState, AccessToken(token): AccessToken) -> (MailService, i64) {
    let shared_state = state.read().expect("Unable to read shared state");
    let config = &shared_state.config;
    let gmail = GmailClient::new(&config.gmail_api_base_url, &token);
    (
        MailService::new(gmail, &config.sender_address),
        config.inbox_limit,
    )
}

async fn ping_handler() -> &'static str {
    "pong"
}

async fn inbox_handler(
    State(state): State<SharedState>,
    token: AccessToken,
    params: Result<Query<public::InboxQuery>, QueryRejection>,
) -> Result<Json<Vec<public::MessageSummary>>, ApiError> {
    let Query(params) =
        params.map_err(|e| Error::Invalid(format!("Invalid query parameters: {}", e)))?;
    let (service, default_limit) = mail_service(&state, token);
    let messages = service
        .list_inbox(params.limit.unwrap_or(default_limit))
        .await?;
    Ok(Json(messages))
}

async fn send_handler(
    State(state): State<SharedState>,
    token: AccessToken,
    payload: Result<Json<public::SendRequest>, JsonRejection>,
) -> Result<Json<public::StatusResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| Error::Invalid(e.body_text()))?;
    let (service, _) = mail_service(&state, token);
    let sent = service
        .send_message(
            payload.to.as_deref(),
            payload.subject.as_deref(),
            payload.body.as_deref(),
        )
        .await?;

    Ok(Json(public::StatusResponse {
        status: "success".to_string(),
        message: format!("Email sent to {}", sent.to),
        id: Some(sent.id),
    }))
}

async fn get_message_handler(
    State(state): State<SharedState>,
    token: AccessToken,
    Path(id): Path<String>,
) -> Result<Json<public::MessageDetail>, ApiError> {
    let (service, _) = mail_service(&state, token);
    Ok(Json(service.get_message(&id).await?))
}

async fn delete_message_handler(
    State(state): State<SharedState>,
    token: AccessToken,
    Path(id): Path<String>,
) -> Result<Json<public::StatusResponse>, ApiError> {
    let (service, _) = mail_service(&state, token);
    service.delete_message(&id).await?;

    Ok(Json(public::StatusResponse {
        status: "success".to_string(),
        message: format!("Message {} permanently deleted", id),
        id: None,
    }))
}

/// Create the Gmail router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/inbox", get(inbox_handler))
        .route("/send", axum::routing::post(send_handler))
        .route(
            "/{id}",
            get(get_message_handler).delete(delete_message_handler),
        )
}
