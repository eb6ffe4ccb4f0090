//! Error types for Workspace API operations.
//!
//! Errors carry an [`ErrorCategory`] so callers can decide whether a failure
//! is fatal for the run (authentication) or local to one item (a 403 on one
//! user's mailbox settings).

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for adminkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad key file, bad private key, or rejected token exchange.
    Auth,
    /// The delegated principal lacks access (HTTP 403).
    Permission,
    /// The resource does not exist or is not visible (HTTP 404).
    NotFound,
    /// Transport failure or server-side error.
    Network,
    /// The service rejected the request parameters (HTTP 400).
    BadRequest,
    /// A response could not be decoded.
    Format,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this category means the whole run cannot continue.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Auth => "Authentication failed",
            Self::Permission => "Permission denied",
            Self::NotFound => "Resource not found",
            Self::Network => "Network or service error",
            Self::BadRequest => "Request rejected",
            Self::Format => "Unexpected response format",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Auth => {
                "Check the key file and that domain-wide delegation is granted for the requested scopes"
            }
            Self::Permission => {
                "Check that the admin account has the required privileges and the scope is authorized"
            }
            Self::NotFound => "Verify the identifier and that the admin account can see the resource",
            Self::Network => "Check your internet connection and try again",
            Self::BadRequest => "The request parameters may not be supported for this account",
            Self::Format => "The service returned data in an unexpected shape",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the Workspace APIs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The service-account key file could not be used.
    #[error("invalid service account key {path}: {message}")]
    InvalidKey {
        /// Key file path (empty when parsed from memory).
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Signing the JWT assertion failed.
    #[error("failed to sign assertion: {0}")]
    Signing(String),

    /// The token endpoint rejected the assertion.
    #[error("token exchange failed for {subject}: {message}")]
    TokenExchange {
        /// Impersonated principal.
        subject: String,
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    HttpError {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Invalid response from API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// IO error during file operations.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::HttpError {
            message: message.into(),
            status,
        }
    }

    /// Create an HTTP status error, as the service would return it.
    pub fn status(code: u16) -> Self {
        Self::http(format!("HTTP {}", code), Some(code))
    }

    /// HTTP status code, if the error came from an HTTP response.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpError { status, .. } | Self::TokenExchange { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the service answered 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// Whether the service answered 403.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        self.status_code() == Some(403)
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidKey { .. } | Error::Signing(_) | Error::TokenExchange { .. } => {
                ErrorCategory::Auth
            }
            Error::HttpError { status, .. } => match status {
                Some(400) => ErrorCategory::BadRequest,
                Some(401) => ErrorCategory::Auth,
                Some(403) => ErrorCategory::Permission,
                Some(404) => ErrorCategory::NotFound,
                _ => ErrorCategory::Network,
            },
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::Io { source, .. } => {
                if source.kind() == io::ErrorKind::PermissionDenied {
                    ErrorCategory::Permission
                } else {
                    ErrorCategory::Other
                }
            }
            Error::Other(_) => ErrorCategory::Other,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::status(code),
            ureq::Error::Json(e) => Self::InvalidResponse(e.to_string()),
            other => Self::HttpError {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Signing(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_fatal() {
        assert!(ErrorCategory::Auth.is_fatal());
        assert!(!ErrorCategory::Permission.is_fatal());
        assert!(!ErrorCategory::NotFound.is_fatal());
        assert!(!ErrorCategory::Network.is_fatal());
        assert!(!ErrorCategory::BadRequest.is_fatal());
        assert!(!ErrorCategory::Format.is_fatal());
        assert!(!ErrorCategory::Other.is_fatal());
    }

    #[test]
    fn test_error_category_description_and_advice() {
        for category in [
            ErrorCategory::Auth,
            ErrorCategory::Permission,
            ErrorCategory::NotFound,
            ErrorCategory::Network,
            ErrorCategory::BadRequest,
            ErrorCategory::Format,
            ErrorCategory::Other,
        ] {
            assert!(!category.description().is_empty());
            assert!(!category.advice().is_empty());
        }
    }

    #[test]
    fn test_error_category_display() {
        let display = format!("{}", ErrorCategory::Permission);
        assert!(display.contains("Permission"));
    }

    #[test]
    fn test_status_categories() {
        assert_eq!(Error::status(400).category(), ErrorCategory::BadRequest);
        assert_eq!(Error::status(401).category(), ErrorCategory::Auth);
        assert_eq!(Error::status(403).category(), ErrorCategory::Permission);
        assert_eq!(Error::status(404).category(), ErrorCategory::NotFound);
        assert_eq!(Error::status(503).category(), ErrorCategory::Network);
        assert_eq!(Error::http("reset", None).category(), ErrorCategory::Network);
    }

    #[test]
    fn test_status_helpers() {
        assert!(Error::status(404).is_not_found());
        assert!(!Error::status(404).is_forbidden());
        assert!(Error::status(403).is_forbidden());
        assert_eq!(Error::Other("x".into()).status_code(), None);
    }

    #[test]
    fn test_token_exchange_is_auth() {
        let err = Error::TokenExchange {
            subject: "admin@example.com".into(),
            message: "unauthorized_client".into(),
            status: Some(401),
        };
        assert_eq!(err.category(), ErrorCategory::Auth);
        assert!(err.category().is_fatal());
        assert!(err.to_string().contains("admin@example.com"));
    }

    #[test]
    fn test_from_ureq_status() {
        let err: Error = ureq::Error::StatusCode(403).into();
        assert!(err.is_forbidden());
        assert_eq!(err.to_string(), "HTTP request failed: HTTP 403");
    }

    #[test]
    fn test_from_serde_json() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json");
        let err: Error = parse.unwrap_err().into();
        assert_eq!(err.category(), ErrorCategory::Format);
    }

    #[test]
    fn test_io_permission_denied_category() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = Error::io("/keys/sa.json", io_err);
        assert_eq!(err.category(), ErrorCategory::Permission);
    }
}
