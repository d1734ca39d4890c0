//! Request and response bodies for account operations.

use serde::{Deserialize, Serialize};

use crate::db::{FieldUpdate, UserRecord};
use crate::types::{UserId, Username};

/// Registration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub password: String,
}

/// Partial update of the caller's own account.
///
/// Absent fields are left alone. `first_name`/`last_name` may be set to
/// `null` to clear them; `username` and `password` may not.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub username: FieldUpdate<String>,
    #[serde(default)]
    pub first_name: FieldUpdate<String>,
    #[serde(default)]
    pub last_name: FieldUpdate<String>,
    #[serde(default)]
    pub password: FieldUpdate<String>,
}

/// Public view of a user. Never includes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            first_name: record.first_name,
            last_name: record.last_name,
        }
    }
}

/// Plain acknowledgement returned by update and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
