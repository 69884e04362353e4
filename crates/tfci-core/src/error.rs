//! Error types for tfci-core

/// Result type alias for tfci operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tfci operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or missing configuration / workflow context
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// GitHub API answered with a non-success status
    #[error("GitHub API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Operation and truncated response body
        message: String,
    },

    /// API rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// GitHub event parsing error
    #[error("Event parse error: {0}")]
    EventParse(String),

    /// Runtime error (Tokio, threading, etc.)
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors may embed the request URL, never headers
        Error::Http(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", err))
    }
}

/// Fieldless error category for zero-cost pattern matching.
///
/// Single byte representation (`#[repr(u8)]`), `Copy`, no allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    /// Configuration error
    Config,
    /// Invalid file path error
    InvalidPath,
    /// I/O operation error
    Io,
    /// HTTP transport error
    Http,
    /// GitHub API status error
    Api,
    /// API rate limit exceeded
    RateLimitExceeded,
    /// GitHub event parsing error
    EventParse,
    /// Runtime error
    Runtime,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind; zero allocation, returns a Copy enum.
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::InvalidPath(_) => ErrorKind::InvalidPath,
            Error::Io(_) => ErrorKind::Io,
            Error::Http(_) => ErrorKind::Http,
            Error::Api { .. } => ErrorKind::Api,
            Error::RateLimitExceeded(_) => ErrorKind::RateLimitExceeded,
            Error::EventParse(_) => ErrorKind::EventParse,
            Error::Runtime(_) => ErrorKind::Runtime,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Borrow the error message; zero allocation.
    #[inline]
    pub fn message(&self) -> &str {
        match self {
            Error::Config(msg)
            | Error::InvalidPath(msg)
            | Error::Http(msg)
            | Error::RateLimitExceeded(msg)
            | Error::EventParse(msg)
            | Error::Runtime(msg)
            | Error::Other(msg) => msg,
            Error::Api { message, .. } => message,
            Error::Io(_) => "I/O error",
        }
    }

    /// HTTP status carried by API errors
    #[inline]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_is_copy() {
        let err = Error::Config("test".to_string());
        let k = err.kind();
        let k2 = k;
        assert_eq!(k, k2);
    }

    #[test]
    fn test_error_kind_repr_u8() {
        assert_eq!(std::mem::size_of::<ErrorKind>(), 1);
    }

    #[test]
    fn test_error_message_borrows() {
        let err = Error::Config("bad config".to_string());
        let msg: &str = err.message();
        assert_eq!(msg, "bad config");
    }

    #[test]
    fn test_api_error_display_and_status() {
        let err = Error::Api {
            status: 404,
            message: "get pull request: Not Found".into(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(
            err.to_string(),
            "GitHub API error (404): get pull request: Not Found"
        );
        assert_eq!(Error::Other("x".into()).status(), None);
    }

    #[test]
    fn test_all_error_variants_have_kind() {
        let cases: Vec<(Error, ErrorKind)> = vec![
            (Error::Config("c".into()), ErrorKind::Config),
            (Error::InvalidPath("p".into()), ErrorKind::InvalidPath),
            (Error::Io(std::io::Error::other("io")), ErrorKind::Io),
            (Error::Http("h".into()), ErrorKind::Http),
            (
                Error::Api {
                    status: 500,
                    message: "a".into(),
                },
                ErrorKind::Api,
            ),
            (
                Error::RateLimitExceeded("rl".into()),
                ErrorKind::RateLimitExceeded,
            ),
            (Error::EventParse("ep".into()), ErrorKind::EventParse),
            (Error::Runtime("r".into()), ErrorKind::Runtime),
            (Error::Other("o".into()), ErrorKind::Other),
        ];

        for (err, expected_kind) in cases {
            assert_eq!(err.kind(), expected_kind, "Mismatch for {:?}", err);
        }
    }

    #[test]
    fn test_io_error_converts() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.message(), "I/O error");
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_error_messages_never_contain_token_patterns() {
        let token_patterns = ["ghp_", "gho_", "ghs_", "github_pat_", "Bearer "];
        let errors: Vec<Error> = vec![
            Error::Config("config error".into()),
            Error::Http("http error".into()),
            Error::Api {
                status: 401,
                message: "list issue comments: Bad credentials".into(),
            },
            Error::RateLimitExceeded("rate limit exceeded".into()),
        ];

        for err in &errors {
            let display = format!("{}", err);
            let debug = format!("{:?}", err);
            for pattern in &token_patterns {
                assert!(!err.message().contains(pattern));
                assert!(!display.contains(pattern), "{}", display);
                assert!(!debug.contains(pattern), "{}", debug);
            }
        }
    }
}
