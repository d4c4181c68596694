use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::utils::truncate;

/// Message used when a failed response carries no `error` field
pub const GENERIC_FAILURE_MESSAGE: &str = "API request failed";

/// Maximum length for response bodies quoted in errors and logs
pub(crate) const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The service answered with a non-2xx status.
    #[error("{message}")]
    Http { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A 2xx body that was not JSON
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A JSON body that does not have the endpoint's shape
    #[error("Unexpected response shape: {0}")]
    Schema(String),

    #[error("Failed to encode request: {0}")]
    Encode(String),
}

impl ApiError {
    /// Build the error for a failed response whose body parsed as JSON.
    pub fn from_body(status: StatusCode, body: &Value) -> Self {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(GENERIC_FAILURE_MESSAGE)
            .to_string();
        ApiError::Http { status, message }
    }

    /// Build the error for a failed response whose body was not JSON.
    pub fn from_status(status: StatusCode) -> Self {
        ApiError::Http {
            status,
            message: GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    pub(crate) fn invalid_body(cause: &serde_json::Error, body: &str) -> Self {
        ApiError::InvalidResponse(format!(
            "{} in body: {}",
            cause,
            truncate(body, MAX_ERROR_BODY_LENGTH)
        ))
    }

    /// HTTP status, when the service produced one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Network(e) => e.status(),
            _ => None,
        }
    }

    /// Human-readable message; for `Http` this is the service's own text.
    pub fn message(&self) -> String {
        match self {
            ApiError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(StatusCode::UNAUTHORIZED))
    }
}
