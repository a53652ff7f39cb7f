//! Public API types

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;

use crate::core::Error;

// Errors

#[derive(Debug)]
pub struct ApiError(Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Invalid(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self.0);
        } else {
            tracing::warn!("{}", self.0);
        }

        (
            status,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

/// Enables using `?` on anything that converts into `core::Error`
impl<E> From<E> for ApiError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// Re-export public types from each route

pub mod gmail {
    pub use crate::api::routes::gmail::public::*;
}

pub mod oauth {
    pub use crate::api::routes::oauth::public::*;
}
