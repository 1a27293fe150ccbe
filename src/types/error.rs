//! Error types for Lectern
//!
//! One enum covers both the request-level taxonomy (validation, conflict,
//! not found, authentication, authorization) and infrastructure faults.

use hyper::StatusCode;

/// Main error type for Lectern operations
#[derive(Debug, thiserror::Error)]
pub enum LecternError {
    /// Malformed or unacceptable input (empty password, bad id, bad JSON)
    #[error("{0}")]
    Validation(String),

    /// Unique constraint violated (login already taken)
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Missing, malformed, forged or expired session token
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated, but the role is not allowed here
    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LecternError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code sent alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::Conflict(_) => "CONFLICT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Database(_) => "DB_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether the message is safe to show to the client verbatim.
    ///
    /// Infrastructure errors are logged in full but reported generically.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<std::io::Error> for LecternError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for LecternError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("Invalid JSON: {}", err))
    }
}

impl From<serde_urlencoded::de::Error> for LecternError {
    fn from(err: serde_urlencoded::de::Error) -> Self {
        Self::Validation(format!("Invalid query string: {}", err))
    }
}

impl From<bson::oid::Error> for LecternError {
    fn from(_: bson::oid::Error) -> Self {
        Self::Validation("Invalid id".into())
    }
}

impl From<tokio::task::JoinError> for LecternError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Task failed: {}", err))
    }
}

/// Result type alias for Lectern operations
pub type Result<T> = std::result::Result<T, LecternError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            LecternError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LecternError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            LecternError::Unauthenticated("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            LecternError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_client_errors_keep_message() {
        let err = LecternError::NotFound("Post not found".into());
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Post not found");

        let err = LecternError::Database("connection reset".into());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_invalid_object_id_is_validation() {
        let err: LecternError = bson::oid::ObjectId::parse_str("nope").unwrap_err().into();
        assert!(matches!(err, LecternError::Validation(_)));
    }
}
