//! Error types for GitDrop.

use thiserror::Error;

/// Common error type for GitDrop.
#[derive(Error, Debug)]
pub enum GitDropError {
    /// No session is available, or the remote rejected the token.
    #[error("authentication required")]
    AuthRequired,

    /// Resource not found.
    ///
    /// Listings treat this as an empty result instead of surfacing it.
    #[error("{0} not found")]
    NotFound(String),

    /// The folder (or object) already exists.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Stale version token on a write or delete.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other non-success status from the content store.
    #[error("remote error ({status}): {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Message reported by the store.
        message: String,
    },

    /// Validation error for user input (folder or file names).
    #[error("validation error: {0}")]
    Validation(String),

    /// Transport failure before any status was received.
    #[error("HTTP error: {0}")]
    Http(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GitDropError {
    /// Whether this error means the addressed path does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GitDropError::NotFound(_))
    }

    /// Whether this error is a stale-token conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, GitDropError::Conflict(_))
    }

    /// Prefix the message with `prefix`, keeping the error kind.
    ///
    /// `AuthRequired` and `Io` carry no message of their own and are
    /// returned unchanged.
    pub fn context(self, prefix: &str) -> Self {
        match self {
            GitDropError::NotFound(m) => GitDropError::NotFound(format!("{prefix}: {m}")),
            GitDropError::AlreadyExists(m) => {
                GitDropError::AlreadyExists(format!("{prefix}: {m}"))
            }
            GitDropError::Conflict(m) => GitDropError::Conflict(format!("{prefix}: {m}")),
            GitDropError::Remote { status, message } => GitDropError::Remote {
                status,
                message: format!("{prefix}: {message}"),
            },
            GitDropError::Validation(m) => GitDropError::Validation(format!("{prefix}: {m}")),
            GitDropError::Http(m) => GitDropError::Http(format!("{prefix}: {m}")),
            GitDropError::Config(m) => GitDropError::Config(format!("{prefix}: {m}")),
            other => other,
        }
    }
}

impl From<reqwest::Error> for GitDropError {
    fn from(e: reqwest::Error) -> Self {
        GitDropError::Http(e.to_string())
    }
}

/// Result type alias for GitDrop operations.
pub type Result<T> = std::result::Result<T, GitDropError>;
