//! Client-side error taxonomy.

use serde::Deserialize;

/// Error surfaced by the API layer and the feed controllers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No usable response was obtained (DNS, refused, timeout).
    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    /// Authorization rejected after the one-shot refresh attempt.
    #[error("auth: {0}")]
    Auth(String),

    /// A local precondition failed; the request was never sent.
    #[error("{0}")]
    Validation(String),

    /// Non-2xx response, message extracted from the body.
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    /// 2xx response whose body did not parse.
    #[error("decode: {0}")]
    Decode(String),
}

impl ApiError {
    /// Message suitable for showing directly to a person.
    ///
    /// Server and validation messages pass through as-is; transport and
    /// decode failures collapse to a generic phrase.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error. Check your connection and try again.".to_string(),
            Self::Auth(_) => "Your session has expired. Please sign in again.".to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::Server { message, .. } => message.clone(),
            Self::Decode(_) => "The server returned an unexpected response.".to_string(),
        }
    }
}

/// Error body shape the API uses. Only one key is ever set; older
/// endpoints use `message` or `error` instead of `detail`.
#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

/// Pull the most useful human-readable message out of an error response.
///
/// Tries the known JSON keys first, then the raw body text, then a
/// generic fallback naming the status.
pub(crate) fn extract_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => {
            if let Some(msg) = parsed.detail.or(parsed.message).or(parsed.error) {
                if !msg.trim().is_empty() {
                    return msg;
                }
            }
        }
        Err(_) => {
            let trimmed = body.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    format!("request failed with status {}", status)
}
