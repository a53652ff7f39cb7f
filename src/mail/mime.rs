use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};

/// Header values must stay on one line
fn sanitize_header(value: &str) -> String {
    value.replace(['\r', '\n'], " ").trim().to_string()
}

/// Bytes of text per encoded-word. 45 bytes are 60 base64 chars, which
/// with the `=?UTF-8?B?` and `?=` delimiters is 72, under the 75 limit.
const ENCODED_WORD_BYTES: usize = 45;

/// RFC 2047 encoded-words for non-ASCII header text, split on char
/// boundaries and folded one word per line
fn encode_header_text(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in value.chars() {
        if chunk.len() + c.len_utf8() > ENCODED_WORD_BYTES {
            words.push(std::mem::take(&mut chunk));
        }
        chunk.push(c);
    }
    words.push(chunk);

    words
        .iter()
        .map(|w| format!("=?UTF-8?B?{}?=", STANDARD.encode(w.as_bytes())))
        .collect::<Vec<_>>()
        .join("\r\n ")
}

/// Normalize bare `\n` line endings to CRLF
fn crlf(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\n', "\r\n")
}

/// Build a single-part `text/plain` RFC 822 message.
pub fn build_plain_text_message(
    from: &str,
    to: &str,
    subject: &str,
    body: &str,
    date: DateTime<Utc>,
) -> String {
    format!(
        "From: {}\r\nTo: {}\r\nSubject: {}\r\nDate: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=UTF-8\r\nContent-Transfer-Encoding: 8bit\r\n\r\n{}",
        sanitize_header(from),
        sanitize_header(to),
        encode_header_text(&sanitize_header(subject)),
        date.to_rfc2822(),
        crlf(body)
    )
}
