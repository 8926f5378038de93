use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Please 'login' to execute this command")]
    NotLoggedIn,

    #[error("Command files nested more than {0} levels deep")]
    NestingTooDeep(usize),

    #[error("Cannot {action}: {reason}")]
    Usage { action: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// An error reported by the Dropbox API itself (non-2xx response).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}", self.message())]
pub struct ApiError {
    pub status: u16,
    /// Machine-readable summary, e.g. `path/not_found/..`.
    pub summary: String,
    /// Localized text meant for end users, when the server provides one.
    pub user_message: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error_summary: String,
    #[serde(default)]
    user_message: Option<LocalizedText>,
}

#[derive(Deserialize)]
struct LocalizedText {
    text: String,
}

impl ApiError {
    /// Build from a failed response. Route errors (409) and auth errors (401)
    /// come back as JSON; bad-input errors (400) are plain text.
    pub fn from_body(status: u16, reason: &str, body: &str, request_id: Option<String>) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => ApiError {
                status,
                summary: parsed.error_summary,
                user_message: parsed.user_message.map(|m| m.text),
                request_id,
            },
            Err(_) => {
                let text = body.trim();
                let summary = if text.is_empty() {
                    format!("{} {}", status, reason)
                } else {
                    text.to_string()
                };
                ApiError {
                    status,
                    summary,
                    user_message: None,
                    request_id,
                }
            }
        }
    }

    pub fn message(&self) -> &str {
        self.user_message.as_deref().unwrap_or(&self.summary)
    }
}
