//! Token Lifecycle Error Types
//!
//! Error hierarchy for token issuance, lookup, renewal and revocation, plus the
//! error type reported by record store collaborators.

use thiserror::Error;

/// Root error type for token lifecycle operations.
#[derive(Error, Debug)]
pub enum TokenLifecycleError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl TokenLifecycleError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "TOKEN_CONFIG",
            Self::Validation(_) => "TOKEN_VALIDATION",
            Self::Authentication(_) => "TOKEN_AUTH",
            Self::Token(TokenError::NotFound { .. }) => "TOKEN_NOT_FOUND",
            Self::Token(TokenError::Expired { .. }) => "TOKEN_EXPIRED",
            Self::Storage(_) => "TOKEN_STORAGE",
        }
    }

    /// Get the HTTP status the transport layer should answer with.
    ///
    /// Missing tokens map to 404 here; the mutating handlers report them as
    /// 400 instead.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Configuration(_) | Self::Storage(_) => 500,
            Self::Validation(_) | Self::Authentication(_) => 400,
            Self::Token(TokenError::NotFound { .. }) => 404,
            Self::Token(TokenError::Expired { .. }) => 400,
        }
    }

    /// Check if the caller may retry the same request.
    ///
    /// Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Check if error requires the subject to log in again.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            Self::Token(TokenError::Expired { .. }) | Self::Token(TokenError::NotFound { .. })
        )
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Missing required setting: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Input shape validation error.
///
/// Raised before any store access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Field {field} must be {expected} characters long, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Field {field} contains characters outside the allowed alphabet")]
    InvalidCharacters { field: &'static str },

    #[error("Renewal requires extend to be true")]
    ExtendNotRequested,
}

/// Credential verification error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("Could not find user")]
    UserNotFound,

    #[error("Password mismatch")]
    PasswordMismatch,
}

/// Token state error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token not found: {id}")]
    NotFound { id: String },

    #[error("Token {id} expired at {expired_at}, cannot extend")]
    Expired { id: String, expired_at: u64 },
}

/// Persistence failure surfaced by the manager.
///
/// The underlying store error is kept in `message` for logs only.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Write failed: {message}")]
    WriteFailed { message: String },

    #[error("Update failed: {message}")]
    UpdateFailed { message: String },

    #[error("Delete failed: {message}")]
    DeleteFailed { message: String },
}

/// Error reported by a record store.
#[derive(Error, Debug)]
pub enum RecordStoreError {
    #[error("Record {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("Record {collection}/{id} already exists")]
    AlreadyExists { collection: String, id: String },

    #[error("Invalid record key: {key}")]
    InvalidKey { key: String },

    #[error("Record serialization failed: {message}")]
    Serialization { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecordStoreError {
    /// Check if the record simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for token lifecycle operations.
pub type TokenLifecycleResult<T> = Result<T, TokenLifecycleError>;

/// Get the short reason string shown to API callers.
///
/// Storage failures never carry the underlying store message.
pub fn get_user_message(error: &TokenLifecycleError) -> String {
    match error {
        TokenLifecycleError::Configuration(_) => "Service is misconfigured".to_string(),
        TokenLifecycleError::Validation(_) => "Missing required fields".to_string(),
        TokenLifecycleError::Authentication(AuthenticationError::UserNotFound) => {
            "Could not find the specified user".to_string()
        }
        TokenLifecycleError::Authentication(AuthenticationError::PasswordMismatch) => {
            "Password did not match the specified user's stored password".to_string()
        }
        TokenLifecycleError::Token(TokenError::NotFound { .. }) => {
            "Specified token does not exist".to_string()
        }
        TokenLifecycleError::Token(TokenError::Expired { .. }) => {
            "The token has already expired and can not be extended".to_string()
        }
        TokenLifecycleError::Storage(StorageError::WriteFailed { .. }) => {
            "Could not persist the new token".to_string()
        }
        TokenLifecycleError::Storage(StorageError::UpdateFailed { .. }) => {
            "Could not persist the token's expiration".to_string()
        }
        TokenLifecycleError::Storage(StorageError::DeleteFailed { .. }) => {
            "Could not persist the token deletion".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            TokenLifecycleError::from(ValidationError::ExtendNotRequested).status_code(),
            400
        );
        assert_eq!(
            TokenLifecycleError::from(AuthenticationError::PasswordMismatch).status_code(),
            400
        );
        assert_eq!(
            TokenLifecycleError::from(TokenError::NotFound { id: "x".into() }).status_code(),
            404
        );
        assert_eq!(
            TokenLifecycleError::from(StorageError::WriteFailed {
                message: "disk full".into()
            })
            .status_code(),
            500
        );
    }

    #[test]
    fn test_needs_reauth() {
        let expired = TokenLifecycleError::from(TokenError::Expired {
            id: "abc".into(),
            expired_at: 10,
        });
        assert!(expired.needs_reauth());
        assert!(!expired.is_retryable());

        let storage = TokenLifecycleError::from(StorageError::DeleteFailed {
            message: "io".into(),
        });
        assert!(!storage.needs_reauth());
        assert!(storage.is_retryable());
    }

    #[test]
    fn test_user_message_hides_storage_detail() {
        let error = TokenLifecycleError::from(StorageError::UpdateFailed {
            message: "/var/data/tokens/abc.json: permission denied".into(),
        });
        let message = get_user_message(&error);
        assert!(!message.contains("/var/data"));
        assert!(message.contains("Could not persist"));
    }

    #[test]
    fn test_error_codes() {
        let error = TokenLifecycleError::from(TokenError::Expired {
            id: "abc".into(),
            expired_at: 1,
        });
        assert_eq!(error.error_code(), "TOKEN_EXPIRED");
        assert_eq!(
            TokenLifecycleError::from(AuthenticationError::UserNotFound).error_code(),
            "TOKEN_AUTH"
        );
    }
}
