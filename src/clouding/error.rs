//! Error types for Clouding API calls

use super::nullable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error produced by a [`Transport`](super::http::Transport) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Structured failure body returned by the provider on a non-success status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    #[serde(default, deserialize_with = "nullable::or_default", rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub status: u16,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub detail: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub instance: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub trace_id: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub errors: Vec<String>,
}

impl ErrorEnvelope {
    fn describe(&self) -> String {
        let mut out = format!("title: {}", self.title);
        if !self.detail.is_empty() {
            out.push_str(&format!(", detail: {}", self.detail));
        }
        if !self.errors.is_empty() {
            out.push_str(&format!(", errors: [{}]", self.errors.join("; ")));
        }
        out
    }
}

/// Errors returned by the Clouding client, poller and lifecycle flows.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport failed before any status was obtained.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The provider answered with a status other than the one the operation expects.
    #[error("error {}, status code: {}, {}", .operation, .status, .envelope.describe())]
    Api {
        operation: &'static str,
        status: u16,
        envelope: ErrorEnvelope,
    },

    /// Unexpected status, and the body could not be decoded as an [`ErrorEnvelope`] either.
    #[error("error {operation}, status code: {status}; error decoding error response: {source}")]
    ErrorDecode {
        operation: &'static str,
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// A success body could not be decoded into the target record.
    #[error("error decoding {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("error marshaling {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The action reached the `errored` terminal state.
    #[error("action id: {action_id} failed")]
    ActionFailed { action_id: String },

    /// The caller's cancellation signal fired while waiting on an action.
    #[error("waiting for action id: {action_id} was cancelled")]
    Cancelled { action_id: String },

    #[error("action id: {action_id} still running after {attempts} polls")]
    PollLimitExceeded { action_id: String, attempts: u32 },

    #[error("action id: {action_id} reported an unknown status")]
    UnexpectedActionStatus { action_id: String },

    /// An asynchronous mutation was accepted but carried no action handle.
    #[error("{resource} action id response is empty")]
    MissingAction { resource: &'static str },

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } | Error::ErrorDecode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error means the addressed resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Action identifier carried by polling errors.
    pub fn action_id(&self) -> Option<&str> {
        match self {
            Error::ActionFailed { action_id }
            | Error::Cancelled { action_id }
            | Error::PollLimitExceeded { action_id, .. }
            | Error::UnexpectedActionStatus { action_id } => Some(action_id),
            _ => None,
        }
    }
}

/// Format a Clouding API error for display
pub fn format_api_error(error: &Error) -> String {
    match error {
        Error::Api { status: 401, .. } => {
            "Authentication failed. Check CLOUDING_TOKEN or the configured token.".to_string()
        }
        Error::Api { status: 403, .. } => "Permission denied for this API key.".to_string(),
        Error::Api { status: 404, .. } => "Resource not found.".to_string(),
        Error::Api { status: 429, .. } => {
            "Rate limit exceeded. Please try again later.".to_string()
        }
        Error::Api { envelope, .. } if !envelope.title.is_empty() => {
            if envelope.detail.is_empty() {
                envelope.title.clone()
            } else {
                format!("{}: {}", envelope.title, envelope.detail)
            }
        }
        Error::Transport(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        }
        other => other.to_string(),
    }
}
