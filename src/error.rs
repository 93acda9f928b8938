//! Error types for the Mint API client.
//!
//! The important distinction for callers is between [`Error::SessionExpired`]
//! (re-login and retry by hand), local validation errors (fix the request),
//! and everything else (surface and abandon). The client never retries
//! automatically.

use thiserror::Error;

/// A specialized `Result` type for Mint operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for all Mint API operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed at the transport level
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error (session cache)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server reported that the session has expired.
    ///
    /// Detected from the response status or a "session has expired" marker
    /// in the body. Callers should re-login and retry manually.
    #[error("session expired; re-login required")]
    SessionExpired,

    /// The server returned an unusable response (bad status, wrong content
    /// type, or missing expected keys). Carries the request context so the
    /// failure can be diagnosed.
    #[error("request for {url} failed: {detail}")]
    Request {
        /// URL of the failing request
        url: String,
        /// HTTP status code, if a response was received
        status: Option<u16>,
        /// What was wrong with the response
        detail: String,
    },

    /// A bundled-service response did not contain the envelope id that was
    /// sent. Treated as a protocol violation, never retried.
    #[error("bundled-service protocol violation: {0}")]
    Protocol(String),

    /// Interactive login failed (driver could not produce a token)
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Invalid input provided to a function
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The requested sort field/direction pair has no server-side sort code
    #[error("sort by {field} ({direction}) is not supported")]
    UnsupportedSort {
        /// Requested sort field
        field: &'static str,
        /// "ascending" or "descending"
        direction: &'static str,
    },

    /// A category name matched more than one category; a parent category
    /// name is needed to disambiguate.
    #[error("multiple categories named {name:?}; supply one of the parent names {parents:?}")]
    AmbiguousCategory {
        /// The ambiguous name
        name: String,
        /// Parent names of the candidate categories
        parents: Vec<String>,
    },

    /// No category with the given name (or id) exists
    #[error("category {0:?} does not exist")]
    UnknownCategory(String),

    /// No tag with the given name exists
    #[error("tag {0:?} does not exist; create it first with tags().create()")]
    UnknownTag(String),

    /// The entity is not client-mutable (system category, non-deletable
    /// transaction, and so on). Raised before any request is sent.
    #[error("not editable: {0}")]
    NotEditable(String),
}

impl Error {
    /// Returns `true` if this error means the session must be re-established.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::SessionExpired | Error::Authentication(_))
    }

    /// Returns `true` if this error was raised locally, before any request
    /// was sent.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_)
                | Error::UnsupportedSort { .. }
                | Error::AmbiguousCategory { .. }
                | Error::UnknownCategory(_)
                | Error::UnknownTag(_)
                | Error::NotEditable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_classification() {
        assert!(Error::SessionExpired.is_auth_error());
        assert!(Error::Authentication("no token".into()).is_auth_error());
        assert!(!Error::Protocol("missing id".into()).is_auth_error());
    }

    #[test]
    fn test_validation_error_classification() {
        assert!(Error::UnknownTag("vacation".into()).is_validation_error());
        assert!(Error::NotEditable("system category".into()).is_validation_error());
        assert!(!Error::SessionExpired.is_validation_error());
    }
}
