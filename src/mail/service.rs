use base64::{Engine as _, engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD}};
use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};

use super::mime::build_plain_text_message;
use super::models::{Attachment, MessageDetail, MessageSummary, SentMessage};
use crate::core::Error;
use crate::google::gmail::{
    GmailClient, MessageFormat, MessagePart, attachment_parts, decode_base64, extract_body,
    extract_from, extract_subject,
};

pub const INBOX_LABEL: &str = "INBOX";

/// Gmail's own upper bound for `maxResults`
const MAX_PAGE_SIZE: i64 = 500;

/// Gmail requests in flight at once for a single call
const MAX_CONCURRENT_FETCHES: usize = 5;

/// Reject ids that could escape the `/messages/{id}` path segment.
pub fn validate_message_id(id: &str) -> Result<(), Error> {
    if id.trim().is_empty() || id.contains('/') || id.contains('\\') || id.contains("..") {
        return Err(Error::Invalid(format!("Invalid message id: {:?}", id)));
    }
    Ok(())
}

fn require<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, Error> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::Invalid(format!("Missing required field: {}", field))),
    }
}

pub struct MailService {
    gmail: GmailClient,
    sender: String,
}

impl MailService {
    pub fn new(gmail: GmailClient, sender: &str) -> Self {
        Self {
            gmail,
            sender: sender.to_string(),
        }
    }

    /// Most recent inbox messages with their `From`, `Subject` and
    /// snippet, in the order Gmail listed them.
    pub async fn list_inbox(&self, limit: i64) -> Result<Vec<MessageSummary>, Error> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let ids = self.gmail.list_messages(INBOX_LABEL, limit).await?;

        // `buffered` keeps the listing order
        let fetches: Vec<_> = ids.iter().map(|m| self.fetch_summary(&m.id)).collect();
        let summaries: Vec<Option<MessageSummary>> = stream::iter(fetches)
            .buffered(MAX_CONCURRENT_FETCHES)
            .try_collect()
            .await?;

        Ok(summaries.into_iter().flatten().collect())
    }

    /// `None` when the message was deleted between listing and fetching
    async fn fetch_summary(&self, id: &str) -> Result<Option<MessageSummary>, Error> {
        let message = match self.gmail.get_message(id, MessageFormat::Metadata).await {
            Ok(message) => message,
            Err(e) if e.is_not_found() => {
                tracing::debug!("Skipping message {} missing since listing", id);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        Ok(Some(MessageSummary {
            from: extract_from(&message),
            subject: extract_subject(&message),
            snippet: message.snippet.clone().unwrap_or_default(),
            id: message.id,
        }))
    }

    pub async fn get_message(&self, id: &str) -> Result<MessageDetail, Error> {
        validate_message_id(id)?;
        let message = self.gmail.get_message(id, MessageFormat::Full).await?;
        let body = extract_body(&message)?;

        let fetches: Vec<_> = attachment_parts(&message)
            .into_iter()
            .map(|part| self.fetch_attachment(&message.id, part))
            .collect();
        let attachments: Vec<Attachment> = stream::iter(fetches)
            .buffered(MAX_CONCURRENT_FETCHES)
            .try_collect()
            .await?;

        Ok(MessageDetail {
            from: extract_from(&message),
            subject: extract_subject(&message),
            snippet: message.snippet.clone().unwrap_or_default(),
            id: message.id,
            body,
            attachments,
        })
    }

    async fn fetch_attachment(
        &self,
        message_id: &str,
        part: &MessagePart,
    ) -> Result<Attachment, Error> {
        let body = part.body.clone().unwrap_or_default();
        let data = match (&body.attachment_id, &body.data) {
            (Some(attachment_id), _) => self
                .gmail
                .get_attachment(message_id, attachment_id)
                .await?
                .data
                .unwrap_or_default(),
            (None, Some(data)) => data.clone(),
            (None, None) => String::new(),
        };
        let bytes = decode_base64(&data)?;

        Ok(Attachment {
            filename: part.filename.clone().unwrap_or_default(),
            mime_type: part.mimetype.clone(),
            size: if body.size > 0 {
                body.size
            } else {
                bytes.len() as u64
            },
            content_base64: STANDARD.encode(&bytes),
        })
    }

    /// Send a plain text message. Every field is required and is
    /// checked before anything goes over the network.
    pub async fn send_message(
        &self,
        to: Option<&str>,
        subject: Option<&str>,
        body: Option<&str>,
    ) -> Result<SentMessage, Error> {
        let to = require("to", to)?;
        let subject = require("subject", subject)?;
        let body = require("body", body)?;

        let raw = build_plain_text_message(&self.sender, to, subject, body, Utc::now());
        let sent = self.gmail.send_raw(&URL_SAFE_NO_PAD.encode(raw)).await?;
        tracing::info!("Sent message {}", sent.id);

        Ok(SentMessage {
            id: sent.id,
            to: to.to_string(),
        })
    }

    /// Move the message to the trash, then delete it permanently. A
    /// message that is already gone from the trash step still gets the
    /// permanent delete.
    pub async fn delete_message(&self, id: &str) -> Result<(), Error> {
        validate_message_id(id)?;
        match self.gmail.trash_message(id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("Message {} not found when trashing, deleting anyway", id);
            }
            Err(e) => return Err(e),
        }
        self.gmail.delete_message(id).await?;
        tracing::info!("Deleted message {}", id);
        Ok(())
    }
}
