//! Public types for the Gmail API
use serde::{Deserialize, Serialize};

pub use crate::mail::models::{Attachment, MessageDetail, MessageSummary};

#[derive(Deserialize)]
pub struct InboxQuery {
    pub limit: Option<i64>,
}

/// Fields are optional so that a missing one is reported as a 400
/// rather than an extractor rejection
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SendRequest {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}
