// Error taxonomy for the publish workflow. Every stage returns
// `Result<T>` so failures bubble up to the single handler in `main.rs`,
// which prints `PublishError::user_message`.

use reqwest::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PublishError>;

#[derive(Debug, Error)]
pub enum PublishError {
    /// 401 from any endpoint.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// 403 from any endpoint.
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    /// 409, the repository already holds this asset version.
    #[error("Conflict error, the asset version already exists.")]
    VersionConflict,

    /// Any other non-success status. `body` is kept raw.
    #[error("request failed with status {status}")]
    Http { status: u16, body: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{field} must not be empty")]
    EmptyInput { field: &'static str },

    #[error("no files matching '{marker}' in {dir}")]
    NoCandidates { marker: &'static str, dir: String },

    #[error("no groups available for organization {organization_id}")]
    NoGroups { organization_id: String },

    #[error("the account is not a contributor of any organization")]
    NoOrganizations,

    #[error("selection {0} is not a valid choice")]
    InvalidSelection(usize),
}

impl PublishError {
    /// Classify a non-success HTTP status. The three statuses the
    /// repository is known to return get their own variant.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => PublishError::InvalidCredentials,
            StatusCode::FORBIDDEN => PublishError::InsufficientPermissions,
            StatusCode::CONFLICT => PublishError::VersionConflict,
            other => PublishError::Http {
                status: other.as_u16(),
                body,
            },
        }
    }

    /// Message printed by the terminal handler. Classified failures get a
    /// fixed sentence, everything else is dumped as JSON.
    pub fn user_message(&self) -> String {
        match self {
            PublishError::InvalidCredentials
            | PublishError::InsufficientPermissions
            | PublishError::VersionConflict => self.to_string(),
            other => other.to_json().to_string(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            PublishError::Http { status, body } => {
                // Most endpoints answer with a JSON error document; keep it
                // structured when it parses.
                let body = serde_json::from_str::<Value>(body)
                    .unwrap_or_else(|_| Value::String(body.clone()));
                json!({ "status": status, "body": body })
            }
            PublishError::Transport(e) => json!({
                "error": e.to_string(),
                "status": e.status().map(|s| s.as_u16()),
                "url": e.url().map(|u| u.to_string()),
            }),
            other => json!({ "error": other.to_string() }),
        }
    }
}
