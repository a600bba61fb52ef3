//! # Error Types
//!
//! Error types for the authcore service using `thiserror`.
//!
//! Authentication failures carry an [`AuthErrorType`] so the transport layer
//! can pick a status code without parsing message strings. Messages shown to
//! callers stay generic where account enumeration is a concern.

use std::fmt;

/// Custom result type for authcore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the authcore service
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors (missing role seed data, bad settings).
    /// Fatal-class: operator-correctable, never retried by callers.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database and storage errors
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// Input rejection (password strength, email format). Surfaced before
    /// any store access.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Authentication and account-state failures
    #[error("Authentication error: {message}")]
    Auth {
        message: String,
        error_type: AuthErrorType,
    },

    /// Resource conflict errors (duplicate email)
    #[error("Resource conflict: {message}")]
    Conflict {
        message: String,
        resource_type: String,
    },

    /// Resource not found errors
    #[error("Resource not found: {resource_type} with ID '{id}'")]
    NotFound {
        resource_type: String,
        id: String,
    },

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Authentication failure subtypes.
///
/// `InvalidCredentials` deliberately covers both "no such account" and
/// "wrong password" so the two are indistinguishable to callers.
/// `AccountInactive` is distinct because the credential itself was valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorType {
    InvalidCredentials,
    AccountInactive,
    InvalidOrExpiredToken,
    InvalidResetToken,
    UsedResetToken,
    ExpiredResetToken,
    ResetAccountNotFound,
    CurrentPasswordIncorrect,
}

impl fmt::Display for AuthErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthErrorType::InvalidCredentials => "invalid_credentials",
            AuthErrorType::AccountInactive => "account_inactive",
            AuthErrorType::InvalidOrExpiredToken => "invalid_or_expired_token",
            AuthErrorType::InvalidResetToken => "invalid_reset_token",
            AuthErrorType::UsedResetToken => "used_reset_token",
            AuthErrorType::ExpiredResetToken => "expired_reset_token",
            AuthErrorType::ResetAccountNotFound => "reset_account_not_found",
            AuthErrorType::CurrentPasswordIncorrect => "current_password_incorrect",
        };
        write!(f, "{}", s)
    }
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a database error with context
    pub fn database(source: sqlx::Error, context: impl Into<String>) -> Self {
        Self::Database { source, context: context.into() }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create an authentication error
    pub fn auth<S: Into<String>>(message: S, error_type: AuthErrorType) -> Self {
        Self::Auth { message: message.into(), error_type }
    }

    /// Create a conflict error
    pub fn conflict<M: Into<String>, R: Into<String>>(message: M, resource_type: R) -> Self {
        Self::Conflict { message: message.into(), resource_type: resource_type.into() }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource_type: R, id: I) -> Self {
        Self::NotFound { resource_type: resource_type.into(), id: id.into() }
    }

    /// Create an internal server error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Get the HTTP status code that should be returned for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 500,
            Error::Database { .. } => 500,
            Error::Io { .. } => 500,
            Error::Serialization { .. } => 400,
            Error::Validation { .. } => 400,
            Error::Auth { error_type, .. } => match error_type {
                AuthErrorType::InvalidCredentials => 401,
                AuthErrorType::InvalidOrExpiredToken => 401,
                AuthErrorType::AccountInactive => 403,
                // Reset-token and current-password failures are
                // client-correctable, matching the original wire contract.
                AuthErrorType::InvalidResetToken
                | AuthErrorType::UsedResetToken
                | AuthErrorType::ExpiredResetToken
                | AuthErrorType::ResetAccountNotFound
                | AuthErrorType::CurrentPasswordIncorrect => 400,
            },
            Error::Conflict { .. } => 409,
            Error::NotFound { .. } => 404,
            Error::Internal { .. } => 500,
        }
    }
}

// Error conversions for common external error types

impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        Self::Database { source: error, context: "Database operation failed".to_string() }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization { source: error, context: "JSON serialization failed".to_string() }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_creation() {
        let error = Error::config("missing 'client' role");
        assert!(matches!(error, Error::Config { .. }));
        assert_eq!(error.to_string(), "Configuration error: missing 'client' role");
    }

    #[test]
    fn validation_error_carries_field() {
        let error = Error::validation_field("Invalid email format", "email");
        assert!(matches!(error, Error::Validation { .. }));
        if let Error::Validation { field, .. } = error {
            assert_eq!(field, Some("email".to_string()));
        }
    }

    #[test]
    fn status_codes() {
        assert_eq!(Error::validation("test").status_code(), 400);
        assert_eq!(Error::auth("test", AuthErrorType::InvalidCredentials).status_code(), 401);
        assert_eq!(Error::auth("test", AuthErrorType::AccountInactive).status_code(), 403);
        assert_eq!(Error::auth("test", AuthErrorType::UsedResetToken).status_code(), 400);
        assert_eq!(
            Error::auth("test", AuthErrorType::CurrentPasswordIncorrect).status_code(),
            400
        );
        assert_eq!(Error::conflict("test", "account").status_code(), 409);
        assert_eq!(Error::not_found("Account", "abc").status_code(), 404);
        assert_eq!(Error::internal("test").status_code(), 500);
    }

    #[test]
    fn auth_error_type_display() {
        assert_eq!(AuthErrorType::InvalidCredentials.to_string(), "invalid_credentials");
        assert_eq!(AuthErrorType::ExpiredResetToken.to_string(), "expired_reset_token");
        assert_eq!(AuthErrorType::InvalidOrExpiredToken.to_string(), "invalid_or_expired_token");
    }

    #[test]
    fn error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io { .. }));

        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Serialization { .. }));
    }
}
