//! Message service sitting between the HTTP routes and the Gmail client

mod mime;
pub mod models;
mod service;

pub use mime::build_plain_text_message;
pub use service::{INBOX_LABEL, MailService, validate_message_id};
