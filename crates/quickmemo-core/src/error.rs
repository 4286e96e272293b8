//! Error types for quickmemo.

use thiserror::Error;

/// Result type alias using quickmemo's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for quickmemo operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Request failed in transit or the server answered with a non-2xx status
    #[error("Network error: {0}")]
    Network(String),

    /// Token missing or rejected by the server
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Server returned data the client cannot interpret
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Local validation found nothing linkable
    #[error("No valid resources to link")]
    NoValidResource,

    /// No server URL configured
    #[error("Server URL is not configured")]
    ConfigurationMissing,

    /// Draft is empty or whitespace only
    #[error("Memo content is empty")]
    EmptyContent,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Persistent store failed
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure came back from (or on the way to) the server.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Auth(_) | Error::MalformedResponse(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) if status.as_u16() == 401 || status.as_u16() == 403 => {
                Error::Auth(e.to_string())
            }
            _ if e.is_decode() => Error::MalformedResponse(e.to_string()),
            _ => Error::Network(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_network() {
        let err = Error::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_error_display_auth() {
        let err = Error::Auth("401 Unauthorized".to_string());
        assert_eq!(err.to_string(), "Authentication failed: 401 Unauthorized");
    }

    #[test]
    fn test_error_display_malformed() {
        let err = Error::MalformedResponse("missing name and id".to_string());
        assert_eq!(err.to_string(), "Malformed response: missing name and id");
    }

    #[test]
    fn test_error_display_unit_variants() {
        assert_eq!(
            Error::NoValidResource.to_string(),
            "No valid resources to link"
        );
        assert_eq!(
            Error::ConfigurationMissing.to_string(),
            "Server URL is not configured"
        );
        assert_eq!(Error::EmptyContent.to_string(), "Memo content is empty");
    }

    #[test]
    fn test_is_remote() {
        assert!(Error::Network("x".into()).is_remote());
        assert!(Error::Auth("x".into()).is_remote());
        assert!(Error::MalformedResponse("x".into()).is_remote());
        assert!(!Error::ConfigurationMissing.is_remote());
        assert!(!Error::EmptyContent.is_remote());
        assert!(!Error::Store("x".into()).is_remote());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
