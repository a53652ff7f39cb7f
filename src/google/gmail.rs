//! Gmail API client for listing the inbox, fetching messages and
//! attachments, sending raw messages, and trashing/deleting messages.
//!
//! The client is bound to a single access token and is meant to be
//! built once per request.

use base64::{
    Engine as _,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::core::Error;

/// Gmail sends base64url with or without padding depending on the endpoint
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Message structures from Gmail API documentation
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MessageResponse {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Option<Vec<MessageResponse>>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
    pub snippet: Option<String>,
    pub payload: Option<MessagePart>,
    #[serde(rename = "labelIds")]
    pub label_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePartBody {
    #[serde(rename = "attachmentId")]
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub size: u64,
    // Base64url encoded
    pub data: Option<String>,
}

/// A node of the MIME tree. The top-level `payload` of a message is a
/// part too.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePart {
    #[serde(rename = "partId")]
    pub part_id: Option<String>,
    #[serde(rename = "mimeType", default)]
    pub mimetype: String,
    pub filename: Option<String>,
    pub headers: Option<Vec<MessageHeader>>,
    pub body: Option<MessagePartBody>,
    pub parts: Option<Vec<MessagePart>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    /// Headers and snippet only
    Metadata,
    Full,
}

impl MessageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageFormat::Metadata => "metadata",
            MessageFormat::Full => "full",
        }
    }
}

/// Decode a base64url payload as found in `body.data`.
pub fn decode_base64(data: &str) -> Result<Vec<u8>, Error> {
    URL_SAFE_LENIENT.decode(data.trim()).map_err(|e| {
        tracing::error!("Base64 decode failed: {}", e);
        Error::Upstream(format!("Failed to decode message data: {}", e))
    })
}

fn decode_text(data: &str) -> Result<String, Error> {
    let bytes = decode_base64(data)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Find the first header named `name`, ignoring case.
pub fn find_header<'a>(message: &'a Message, name: &str) -> Option<&'a str> {
    message
        .payload
        .as_ref()?
        .headers
        .as_ref()?
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

pub fn extract_subject(message: &Message) -> String {
    find_header(message, "Subject").unwrap_or_default().to_string()
}

pub fn extract_from(message: &Message) -> String {
    find_header(message, "From").unwrap_or_default().to_string()
}

fn is_text(part: &MessagePart) -> bool {
    part.mimetype.eq_ignore_ascii_case("text/plain")
        || part.mimetype.eq_ignore_ascii_case("text/html")
}

fn inline_data(part: &MessagePart) -> Option<&str> {
    part.body
        .as_ref()
        .and_then(|b| b.data.as_deref())
        .filter(|d| !d.is_empty())
}

/// Depth-first search for the first textual part carrying inline data.
fn first_text_part(parts: &[MessagePart]) -> Option<&MessagePart> {
    for part in parts {
        if is_text(part) && inline_data(part).is_some() {
            return Some(part);
        }
        if let Some(nested) = &part.parts
            && let Some(found) = first_text_part(nested)
        {
            return Some(found);
        }
    }
    None
}

/// Extract the body from the Gmail API message payload.
///
/// - A payload without `parts` decodes its own `body.data`.
/// - A multipart payload returns the first `text/plain` or `text/html`
///   part in payload order. There is no preference between the two.
/// - Falls back to the top-level body, then to `None`.
pub fn extract_body(message: &Message) -> Result<Option<String>, Error> {
    let Some(payload) = &message.payload else {
        return Ok(None);
    };

    if let Some(parts) = &payload.parts
        && let Some(part) = first_text_part(parts)
        && let Some(data) = inline_data(part)
    {
        return decode_text(data).map(Some);
    }

    match inline_data(payload) {
        Some(data) => decode_text(data).map(Some),
        None => Ok(None),
    }
}

fn collect_attachments<'a>(parts: &'a [MessagePart], out: &mut Vec<&'a MessagePart>) {
    for part in parts {
        if part.filename.as_deref().is_some_and(|f| !f.is_empty()) {
            out.push(part);
        }
        if let Some(nested) = &part.parts {
            collect_attachments(nested, out);
        }
    }
}

/// All parts with a non-empty filename, in payload order.
pub fn attachment_parts(message: &Message) -> Vec<&MessagePart> {
    let mut out = Vec::new();
    if let Some(parts) = message.payload.as_ref().and_then(|p| p.parts.as_ref()) {
        collect_attachments(parts, &mut out);
    }
    out
}

/// Gmail API client bound to one access token
pub struct GmailClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl GmailClient {
    pub fn new(api_base_url: &str, access_token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/gmail/v1/users/me", api_base_url.trim_end_matches('/')),
            access_token: access_token.to_string(),
        }
    }

    fn message_url(&self, id: &str) -> String {
        format!("{}/messages/{}", self.base_url, urlencoding::encode(id))
    }

    async fn execute(&self, req: RequestBuilder, context: &str) -> Result<String, Error> {
        let res = req.bearer_auth(&self.access_token).send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            tracing::warn!("{} failed with status {}", context, status);
            return Err(Error::from_status(status, context, &text));
        }
        Ok(text)
    }

    /// List the most recent message ids carrying `label`
    pub async fn list_messages(
        &self,
        label: &str,
        max_results: i64,
    ) -> Result<Vec<MessageResponse>, Error> {
        let url = format!("{}/messages", self.base_url);
        let req = self.client.get(&url).query(&[
            ("labelIds", label.to_string()),
            ("maxResults", max_results.to_string()),
        ]);
        let text = self.execute(req, "Message list").await?;
        let msgs: ListMessagesResponse = serde_json::from_str(&text)?;
        Ok(msgs.messages.unwrap_or_default())
    }

    /// Fetch a message. `Metadata` only asks for the `Subject` and
    /// `From` headers.
    pub async fn get_message(&self, id: &str, format: MessageFormat) -> Result<Message, Error> {
        let mut query = vec![("format", format.as_str())];
        if format == MessageFormat::Metadata {
            query.push(("metadataHeaders", "Subject"));
            query.push(("metadataHeaders", "From"));
        }
        let req = self.client.get(self.message_url(id)).query(&query);
        let text = self.execute(req, "Message fetch").await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<MessagePartBody, Error> {
        let url = format!(
            "{}/attachments/{}",
            self.message_url(message_id),
            urlencoding::encode(attachment_id)
        );
        let text = self
            .execute(self.client.get(&url), "Attachment fetch")
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Send an RFC 822 message that is already base64url encoded
    pub async fn send_raw(&self, raw: &str) -> Result<MessageResponse, Error> {
        let url = format!("{}/messages/send", self.base_url);
        let req = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "raw": raw }));
        let text = self.execute(req, "Message send").await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn trash_message(&self, id: &str) -> Result<(), Error> {
        let url = format!("{}/trash", self.message_url(id));
        self.execute(self.client.post(&url), "Message trash").await?;
        Ok(())
    }

    /// Permanently delete a message, bypassing the trash
    pub async fn delete_message(&self, id: &str) -> Result<(), Error> {
        self.execute(self.client.delete(self.message_url(id)), "Message delete")
            .await?;
        Ok(())
    }
}
