//! Error kinds shared by the Gmail client and the message service.
//!
//! Each variant maps to exactly one HTTP status at the API boundary
//! (see `crate::api::public::ApiError`).

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required field was missing or a value was malformed
    #[error("{0}")]
    Invalid(String),
    /// No usable access token, or the token was rejected upstream
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    /// Transport failures, unexpected upstream statuses, bad payloads
    #[error("{0}")]
    Upstream(String),
}

impl Error {
    /// Classify a non-success status returned by a Google API.
    pub fn from_status(status: http::StatusCode, context: &str, body: &str) -> Self {
        let msg = format!("{} failed: {} ({})", context, status, body);
        match status.as_u16() {
            401 | 403 => Error::Unauthorized(msg),
            404 => Error::NotFound(msg),
            _ => Error::Upstream(msg),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Upstream(format!("Request failed: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Upstream(format!("Unexpected response: {}", err))
    }
}
