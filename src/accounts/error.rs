//! Error types for account operations.

use std::fmt;

/// Errors raised while registering, logging in, or managing user records.
#[derive(Debug, Clone)]
pub enum AccountError {
    /// Username/password pair did not match a stored user.
    ///
    /// Deliberately carries no detail: unknown users and wrong passwords
    /// must look the same.
    InvalidCredentials,

    /// The username is already taken by another user.
    DuplicateUsername(String),

    /// No user with the given id.
    NotFound(String),

    /// The request asked for something the store cannot represent
    /// (an empty username, clearing the password).
    InvalidInput(String),

    /// Credential store failure.
    Database(String),

    /// Any other failure (hashing, token signing).
    Internal(String),
}

impl fmt::Display for AccountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "Incorrect username or password"),
            Self::DuplicateUsername(name) => write!(f, "Username already registered: {}", name),
            Self::NotFound(id) => write!(f, "User not found: {}", id),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::Database(msg) => write!(f, "Database error: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AccountError {}

/// Result type for account operations.
pub type AccountResult<T> = Result<T, AccountError>;

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<surrealdb::Error> for AccountError {
    fn from(err: surrealdb::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_error_display() {
        assert_eq!(
            AccountError::InvalidCredentials.to_string(),
            "Incorrect username or password"
        );
        assert_eq!(
            AccountError::DuplicateUsername("alice".to_string()).to_string(),
            "Username already registered: alice"
        );
        assert_eq!(
            AccountError::NotFound("42".to_string()).to_string(),
            "User not found: 42"
        );
    }

    #[test]
    fn test_from_anyhow_is_internal() {
        let err: AccountError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, AccountError::Internal(msg) if msg == "boom"));
    }
}
