//! Error types for proxima.
//!
//! All fallible operations in the crate return [`Result<T>`], whose error type
//! is [`ProximaError`]. Construction-time problems (a query that cannot be
//! parsed, a function with unusable arguments) are fatal, while store failures
//! hit during per-document evaluation are usually recovered by the caller.

use std::io;

use thiserror::Error;

/// The error type for proxima operations.
#[derive(Error, Debug)]
pub enum ProximaError {
    /// I/O failure reported by an underlying store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure inside the sorted index (seek, read, decode).
    #[error("Index error: {0}")]
    Index(String),

    /// The query text could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The query tree is structurally unusable (e.g. a function with too few arguments).
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// A function argument holds a literal that cannot be used as a term.
    #[error("Unsupported literal in `{function}`: expected a string but found {found}")]
    UnsupportedLiteral { function: String, found: String },

    /// A key does not follow the expected composite layout.
    #[error("Malformed key: {0}")]
    MalformedKey(String),

    /// An argument passed to an API is invalid.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProximaError {
    /// Create an index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        ProximaError::Index(msg.into())
    }

    /// Create a parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        ProximaError::Parse(msg.into())
    }

    /// Create a malformed query error.
    pub fn malformed_query<S: Into<String>>(msg: S) -> Self {
        ProximaError::MalformedQuery(msg.into())
    }

    /// Create an unsupported literal error.
    pub fn unsupported_literal<F: Into<String>, S: Into<String>>(function: F, found: S) -> Self {
        ProximaError::UnsupportedLiteral {
            function: function.into(),
            found: found.into(),
        }
    }

    /// Create a malformed key error.
    pub fn malformed_key<S: Into<String>>(msg: S) -> Self {
        ProximaError::MalformedKey(msg.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        ProximaError::InvalidArgument(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        ProximaError::InvalidConfig(msg.into())
    }

    /// Whether this error came from the storage layer rather than from the query.
    pub fn is_storage_error(&self) -> bool {
        matches!(self, ProximaError::Io(_) | ProximaError::Index(_))
    }
}

/// Result type alias for proxima operations.
pub type Result<T> = std::result::Result<T, ProximaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProximaError::malformed_query("`within` has no arguments");
        assert_eq!(err.to_string(), "Malformed query: `within` has no arguments");

        let err = ProximaError::unsupported_literal("phrase", "number 3");
        assert_eq!(
            err.to_string(),
            "Unsupported literal in `phrase`: expected a string but found number 3"
        );
    }

    #[test]
    fn test_storage_classification() {
        let io_err: ProximaError = io::Error::other("disk gone").into();
        assert!(io_err.is_storage_error());
        assert!(ProximaError::index("seek failed").is_storage_error());
        assert!(!ProximaError::parse("bad token").is_storage_error());
    }
}
