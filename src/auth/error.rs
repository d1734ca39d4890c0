use std::fmt;

/// Authentication errors for bearer-token protected operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No usable `Authorization: Bearer ...` header was presented
    MissingToken,
    /// Signature mismatch, wrong algorithm or malformed payload
    InvalidToken(String),
    /// Token was well-formed but is past its expiry
    Expired,
    /// Token subject no longer resolves to a stored user
    UserNotFound(String),
    /// Store failure while resolving the subject
    Internal(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingToken => write!(f, "Not authenticated"),
            Self::InvalidToken(msg) => write!(f, "Invalid token: {}", msg),
            Self::Expired => write!(f, "Token has expired"),
            Self::UserNotFound(subject) => write!(f, "No user for token subject: {}", subject),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}
