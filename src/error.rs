use std::time::Duration;
use thiserror::Error;

/// Errors produced by the generation and delivery layers.
///
/// The extraction core never constructs these: it is total and always
/// produces a document. Errors here come from the edges of the system,
/// the model transport and the mailer.
#[derive(Error, Debug)]
pub enum LessonError {
    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization failed at the serde level (request bodies,
    /// response envelopes). Document parsing failures never surface here.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration detected at build time.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP error with status code, response body, and optional Retry-After hint.
    ///
    /// Returned by [`ModelClient`](crate::model::ModelClient) implementations
    /// when the provider returns a non-success status code. The `retry_after`
    /// field is populated from the `Retry-After` response header when present.
    #[error("HTTP {status}: {body}")]
    HttpError {
        /// HTTP status code (e.g. 429, 500, 503).
        status: u16,
        /// Response body text.
        body: String,
        /// Parsed `Retry-After` header value, if present.
        retry_after: Option<Duration>,
    },

    /// The mailer refused or failed to send an outbound message.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for LessonError {
    fn from(err: anyhow::Error) -> Self {
        LessonError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LessonError>;
