//! JSON error body for the API endpoints.

use serde::{Deserialize, Serialize};

/// Error body returned by every failing endpoint.
///
/// `error` is always a human-readable message; `details` carries the
/// stringified underlying error for 500s and is omitted otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiError {
    /// Human-readable error message.
    pub error: String,

    /// Stringified underlying error, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Create an error body with just a message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    /// Attach underlying error detail.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Body for a missing resource (404).
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message)
    }

    /// Body for a malformed request or dataset (400).
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message)
    }

    /// Body for an unexpected internal failure (500).
    pub fn internal_error(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(message).with_details(details)
    }
}
