//! Error types for the REST layer

use thiserror::Error;

/// Result type alias for REST operations
pub type Result<T> = std::result::Result<T, RestError>;

/// Errors that can occur talking to Supabase
#[derive(Error, Debug)]
pub enum RestError {
    /// Transport errors (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response
    #[error("{context} failed with status {status}: {body}")]
    Status { context: String, status: u16, body: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Still rate limited after every retry
    #[error("Rate limit exceeded after {attempts} attempts: {context}")]
    RateLimited { context: String, attempts: u32 },

    /// A key or setting needed for the request is not configured
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Response was well-formed HTTP but not what PostgREST promises
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl RestError {
    /// Create a status error, truncating long bodies
    pub fn status(context: impl Into<String>, status: u16, body: &str) -> Self {
        Self::Status { context: context.into(), status, body: truncate(body, 500) }
    }

    /// Create a missing credential error
    pub fn missing_credential(name: impl Into<String>) -> Self {
        Self::MissingCredential(name.into())
    }

    /// Create an unexpected response error
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::UnexpectedResponse(msg.into())
    }
}

pub(crate) fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}
