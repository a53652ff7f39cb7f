use serde::{Deserialize, Serialize};

/// Inbox listing entry built from the metadata headers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageSummary {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageDetail {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub snippet: String,
    /// First text/plain or text/html part, `None` if the message has no
    /// textual body
    pub body: Option<String>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
    /// Standard padded base64
    pub content_base64: String,
}

/// Result of a successful send
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentMessage {
    pub id: String,
    pub to: String,
}
