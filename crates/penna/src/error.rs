//! Error types for the penna library.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, protocol, storage and input validation errors.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The unified error type for penna operations.
///
/// Callers that only care whether the session survived can use
/// [`Error::is_session_fatal`]; views that show inline messages can match
/// on the [`AuthError`] variants directly.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, body decoding).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication and session errors.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// The API answered with a non-success status.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Input validation errors (API URL, request body).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Credential store failures.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl Error {
    /// Classify this error for the session snapshot.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) => ErrorKind::Network,
            Error::Auth(auth) => auth.kind(),
            Error::Protocol(_) => ErrorKind::Protocol,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Returns true for errors that end the session: a corrupt token or a
    /// failed refresh.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            Error::Auth(AuthError::MalformedToken { .. }) | Error::Auth(AuthError::SessionExpired)
        )
    }

    /// Returns true if the API rejected the request's credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Protocol(p) if p.is_unauthorized())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::from(err))
    }
}

/// Coarse classification of an [`Error`], stored in the session snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedToken,
    Authentication,
    Validation,
    Registration,
    SessionExpired,
    Superseded,
    Network,
    Protocol,
    InvalidInput,
    Storage,
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// The response body could not be decoded.
    #[error("failed to decode response body: {message}")]
    Decode { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else if err.is_decode() {
            TransportError::Decode {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        }
    }
}

/// Authentication and session errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A stored token could not be parsed. Forces logout.
    #[error("malformed token: {reason}")]
    MalformedToken { reason: String },

    /// The login endpoint rejected the credentials.
    #[error("{message}")]
    Authentication { message: String },

    /// Registration fields were rejected, either locally or by the API.
    #[error("{message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },

    /// Registration failed without usable field errors.
    #[error("{message}")]
    Registration { message: String },

    /// The refresh token was refused; the session has been ended.
    #[error("session expired, please log in again")]
    SessionExpired,

    /// The session was ended while this call was in flight.
    #[error("session ended while the request was in flight")]
    Superseded,
}

impl AuthError {
    /// Classify this error for the session snapshot.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MalformedToken { .. } => ErrorKind::MalformedToken,
            AuthError::Authentication { .. } => ErrorKind::Authentication,
            AuthError::Validation { .. } => ErrorKind::Validation,
            AuthError::Registration { .. } => ErrorKind::Registration,
            AuthError::SessionExpired => ErrorKind::SessionExpired,
            AuthError::Superseded => ErrorKind::Superseded,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        AuthError::MalformedToken {
            reason: reason.into(),
        }
    }
}

/// A non-success response from the API.
#[derive(Debug, Clone)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// The `detail` message from the error body, if present.
    pub detail: Option<String>,
    /// The parsed JSON error body, if it was JSON.
    pub body: Option<serde_json::Value>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref detail) = self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, detail: Option<String>, body: Option<serde_json::Value>) -> Self {
        Self {
            status,
            detail,
            body,
        }
    }

    /// Build a protocol error from a raw response body.
    pub fn from_body(status: u16, body: &str) -> Self {
        let body: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let detail = body
            .as_ref()
            .and_then(|b| b.get("detail"))
            .and_then(|d| d.as_str())
            .map(str::to_string);
        Self::new(status, detail, body)
    }

    /// Check if the API refused the bearer credential.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// A request body could not be serialized.
    #[error("invalid request body: {message}")]
    Body { message: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

/// Credential store errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but does not hold a credential record.
    #[error("corrupt credential file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_extracts_detail() {
        let err = ProtocolError::from_body(
            401,
            r#"{"detail": "No active account found with the given credentials"}"#,
        );
        assert!(err.is_unauthorized());
        assert_eq!(
            err.detail.as_deref(),
            Some("No active account found with the given credentials")
        );
        assert_eq!(
            err.to_string(),
            "HTTP 401: No active account found with the given credentials"
        );
    }

    #[test]
    fn protocol_error_tolerates_non_json_body() {
        let err = ProtocolError::from_body(502, "<html>Bad Gateway</html>");
        assert!(err.detail.is_none());
        assert!(err.body.is_none());
        assert_eq!(err.to_string(), "HTTP 502");
    }

    #[test]
    fn session_fatal_classification() {
        assert!(Error::from(AuthError::SessionExpired).is_session_fatal());
        assert!(Error::from(AuthError::malformed("bad")).is_session_fatal());
        assert!(
            !Error::from(AuthError::Authentication {
                message: "Login failed".into()
            })
            .is_session_fatal()
        );
        assert_eq!(
            Error::from(ProtocolError::new(500, None, None)).kind(),
            ErrorKind::Protocol
        );
    }
}
