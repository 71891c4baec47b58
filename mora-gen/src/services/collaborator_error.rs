//! Error type shared by all external collaborators

use thiserror::Error;

/// Failure of a transcript, planning, synthesis or timeline call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollaboratorError {
    /// Transport or connection error
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// Non-success HTTP status
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Response carried no usable content
    #[error("Empty response from {0}")]
    EmptyResponse(String),

    /// The service answered but refused the request
    #[error("{0}")]
    Rejected(String),
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => CollaboratorError::Status {
                status: status.as_u16(),
                body: e.to_string(),
            },
            None => CollaboratorError::Request(e.to_string()),
        }
    }
}
