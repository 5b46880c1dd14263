//! Search error types

use serde::Serialize;
use thiserror::Error;

/// A failed round-trip, classified for the user-facing banner.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct SearchError {
    pub kind: SearchErrorKind,
    pub message: String,
}

impl SearchError {
    pub fn new(kind: SearchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::new(SearchErrorKind::Connectivity, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(SearchErrorKind::Timeout, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(SearchErrorKind::Server, message)
    }
}

/// Failure classification. Never retried automatically; every kind surfaces
/// as the same session-level failure, differing only in wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchErrorKind {
    /// Endpoint unreachable (connect failure, DNS, refused).
    Connectivity,
    /// No response within the expected window.
    Timeout,
    /// Non-success response or a body we could not interpret.
    Server,
}

impl SearchErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            SearchErrorKind::Connectivity => "connectivity",
            SearchErrorKind::Timeout => "timeout",
            SearchErrorKind::Server => "server",
        }
    }
}
