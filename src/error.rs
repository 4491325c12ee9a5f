//! Error types
//!
//! Missing optional fields in remote records are never errors (see [`crate::property`]).
//! What remains is split by who has to act on it:
//! - the caller forgot a required input (an HTTP layer would answer 400)
//! - the remote store failed (an HTTP layer would answer 500)
//! - the process is not configured

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failure reported by the remote store, or by the transport to reach it
#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct StoreError {
    /// A human-readable description
    pub message: String,
    /// Structured detail, when the store returned some (e.g. Notion's own error message)
    pub detail: Option<String>,
}

impl StoreError {
    pub fn new<S: ToString>(message: S) -> Self {
        Self { message: message.to_string(), detail: None }
    }

    pub fn with_detail<S: ToString, T: ToString>(message: S, detail: T) -> Self {
        Self { message: message.to_string(), detail: Some(detail.to_string()) }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(format!("Request to the remote store failed: {}", err))
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// A required input (e.g. a task id) is missing. Nothing has been sent to the store.
    #[error("Missing required input: {0}")]
    MissingInput(&'static str),

    #[error("Remote store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// The HTTP status class an outer layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Error::MissingInput(_) => 400,
            Error::Store(_) | Error::Config(_) => 500,
        }
    }

    /// The `{ "error": ... }` body an outer layer should answer with
    pub fn to_body(&self) -> ErrorBody {
        let detail = match self {
            Error::Store(store_err) => store_err.detail.clone(),
            _ => None,
        };
        ErrorBody { error: self.to_string(), detail }
    }
}

/// JSON error body, as served by the task and meeting routes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
